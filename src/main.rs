#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, warn};

use plcollect::cancel::Cancel;
use plcollect::cli::{Cli, CollectArgs, Commands};
use plcollect::config::Settings;
use plcollect::error::{PlcollectError, Result};
use plcollect::prompt::{Operator, TerminalOperator};
use plcollect::provider::{CsvProvider, HttpProvider, PlaylistProvider};
use plcollect::run::{RunRequest, RunSummary, Runner};

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // RUST_LOG, when set, wins over -v.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// First Ctrl-C asks the walk and the copy pool to stop; a second one exits.
fn install_interrupt_handler() -> Cancel {
    let cancel = Cancel::new();
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("Stopping after the files in flight...");
        flag.cancel();
    }) {
        warn!("Ctrl-C handler not installed: {}", e);
    }
    cancel
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cancel = install_interrupt_handler();

    match run(cli, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, cancel: Cancel) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    let operator = TerminalOperator::new();
    let current_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Fetch {
            url,
            api_url,
            collect,
        } => {
            if let Some(api_url) = api_url {
                settings.provider.api_url = api_url;
            }
            let url = match url {
                Some(url) => url,
                None => operator.prompt("Playlist share link", None)?,
            };
            if url.is_empty() {
                return Err(PlcollectError::Prompt("no playlist link given".to_string()));
            }

            let provider = HttpProvider::new(&settings.provider);
            collect_playlist(
                &provider,
                &operator,
                settings,
                url,
                &collect,
                &current_dir,
                cancel,
            )
        }
        Commands::Csv { csv_file, collect } => collect_playlist(
            &CsvProvider,
            &operator,
            settings,
            csv_file.to_string_lossy().to_string(),
            &collect,
            &current_dir,
            cancel,
        ),
        Commands::Match {
            url,
            csv_file,
            music_dir,
            order,
            api_url,
        } => {
            if let Some(order) = order {
                settings.index.order = order;
            }
            if let Some(api_url) = api_url {
                settings.provider.api_url = api_url;
            }
            settings.validate()?;

            let http;
            let (provider, source): (&dyn PlaylistProvider, String) = match (csv_file, url) {
                (Some(csv), _) => (&CsvProvider, csv.to_string_lossy().to_string()),
                (None, Some(url)) => {
                    http = HttpProvider::new(&settings.provider);
                    (&http, url)
                }
                (None, None) => {
                    return Err(PlcollectError::Prompt("no playlist source given".to_string()));
                }
            };

            let runner = Runner::new(provider, &operator, &settings).with_cancel(cancel);
            let (playlist, matched) = runner.preview(&source, &music_dir)?;

            println!("Playlist: {} ({} tracks)", playlist.name, playlist.tracks.len());
            for found in &matched.found {
                println!("  ✅ {} -> {}", found.track, found.path.display());
            }
            for track in &matched.missing {
                println!("  ❌ {}", track);
            }
            println!(
                "Found {} tracks, missing {}",
                matched.found.len(),
                matched.missing.len()
            );
            Ok(())
        }
    }
}

fn collect_playlist(
    provider: &dyn PlaylistProvider,
    operator: &dyn Operator,
    mut settings: Settings,
    source: String,
    collect: &CollectArgs,
    current_dir: &Path,
    cancel: Cancel,
) -> Result<()> {
    collect.apply(&mut settings);
    settings.validate()?;

    let search_dir = match &collect.music_dir {
        Some(dir) => dir.clone(),
        None => {
            let cwd = current_dir.to_string_lossy();
            PathBuf::from(operator.prompt("Directory to search", Some(cwd.as_ref()))?)
        }
    };

    let request = RunRequest {
        source,
        search_dir,
        target_parent: collect
            .target
            .clone()
            .unwrap_or_else(|| current_dir.to_path_buf()),
        overwrite: collect.overwrite_policy(),
    };

    println!("Fetching playlist and indexing {}...", request.search_dir.display());
    let runner = Runner::new(provider, operator, &settings).with_cancel(cancel);
    let summary = runner.execute(&request)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Playlist: {} ({} tracks)", summary.playlist_name, summary.track_count);
    println!(
        "Found {} tracks, missing {}",
        summary.found_count,
        summary.missing.len()
    );

    if !summary.skipped_duplicates.is_empty() {
        println!(
            "{} duplicate tracks shared a file name and were copied once",
            summary.skipped_duplicates.len()
        );
    }

    if !summary.failed.is_empty() {
        println!("---------------------------------------------------");
        println!("⚠️  {} found tracks could not be copied:", summary.failed.len());
        for failure in &summary.failed {
            println!("   ❌ {}", PlcollectError::from(failure.clone()));
        }
        println!("---------------------------------------------------");
    }

    if let Some(report) = &summary.report {
        println!("Missing tracks saved to {}", report.display());
    }

    println!(
        "Playlist '{}' created at {}",
        summary.playlist_name,
        summary.destination.display()
    );
}
