// Clap definitions in derive style

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{IndexOrder, Settings};
use crate::run::OverwritePolicy;

#[derive(Parser)]
#[command(name = "plcollect", version, about)]
pub struct Cli {
    /// Set the level of verbosity
    /// -v for info, -vv for debug, -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to $XDG_CONFIG_HOME/plcollect/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a playlist from its share link and collect its tracks
    Fetch {
        /// Playlist share link (prompted for when omitted)
        #[arg(value_name = "URL")]
        url: Option<String>,

        /// Songlist endpoint
        #[arg(long = "api-url", value_name = "URL")]
        api_url: Option<String>,

        #[command(flatten)]
        collect: CollectArgs,
    },

    /// Collect the tracks listed in a CSV playlist export
    Csv {
        /// CSV file with a "Track Name" column
        #[arg(value_name = "CSV")]
        csv_file: PathBuf,

        #[command(flatten)]
        collect: CollectArgs,
    },

    /// Show which tracks would be found, without copying anything
    Match {
        /// Playlist share link
        #[arg(value_name = "URL", required_unless_present = "csv_file")]
        url: Option<String>,

        /// Read the playlist from a CSV export instead
        #[arg(long = "csv", value_name = "CSV", conflicts_with = "url")]
        csv_file: Option<PathBuf>,

        /// Music directory to search
        #[arg(short = 'd', long = "dir", value_name = "MUSIC_DIR", required = true)]
        music_dir: PathBuf,

        /// Ordering of indexed files, which decides ties
        #[arg(long, value_enum)]
        order: Option<IndexOrder>,

        /// Songlist endpoint
        #[arg(long = "api-url", value_name = "URL")]
        api_url: Option<String>,
    },
}

#[derive(Args)]
pub struct CollectArgs {
    /// Music directory to search (prompted for when omitted)
    #[arg(short = 'd', long = "dir", value_name = "MUSIC_DIR")]
    pub music_dir: Option<PathBuf>,

    /// Where the playlist folder is created (defaults to the current directory)
    #[arg(short = 't', long = "target", value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Write into an existing playlist folder without asking
    #[arg(short = 'y', long = "yes", conflicts_with = "no_overwrite")]
    pub yes: bool,

    /// Never write into an existing playlist folder; pick a new name instead
    #[arg(short = 'n', long = "no-overwrite")]
    pub no_overwrite: bool,

    /// Number of parallel copies
    #[arg(short = 'j', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Ordering of indexed files, which decides ties
    #[arg(long, value_enum)]
    pub order: Option<IndexOrder>,
}

impl CollectArgs {
    pub fn overwrite_policy(&self) -> OverwritePolicy {
        if self.yes {
            OverwritePolicy::Always
        } else if self.no_overwrite {
            OverwritePolicy::Never
        } else {
            OverwritePolicy::Ask
        }
    }

    /// Fold command-line overrides into the loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(workers) = self.workers {
            settings.copy.workers = workers;
        }
        if let Some(order) = self.order {
            settings.index.order = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_flags_fold_into_settings() {
        let cli = Cli::parse_from([
            "plcollect", "-vv", "fetch", "https://example.com/p/1", "--dir", "/music", "-j", "8",
            "--order", "traversal", "--yes",
        ]);
        assert_eq!(cli.verbose, 2);

        let Commands::Fetch { url, collect, .. } = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(url.as_deref(), Some("https://example.com/p/1"));
        assert_eq!(collect.overwrite_policy(), OverwritePolicy::Always);

        let mut settings = Settings::default();
        collect.apply(&mut settings);
        assert_eq!(settings.copy.workers, 8);
        assert_eq!(settings.index.order, IndexOrder::Traversal);
    }

    #[test]
    fn yes_and_no_overwrite_conflict() {
        let result = Cli::try_parse_from(["plcollect", "csv", "list.csv", "--yes", "--no-overwrite"]);
        assert!(result.is_err());
    }

    #[test]
    fn match_needs_a_source() {
        assert!(Cli::try_parse_from(["plcollect", "match", "--dir", "/music"]).is_err());
        assert!(
            Cli::try_parse_from(["plcollect", "match", "--csv", "a.csv", "--dir", "/music"])
                .is_ok()
        );
    }
}
