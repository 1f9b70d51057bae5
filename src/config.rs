//! Runtime settings.
//!
//! Precedence (highest wins):
//! 1) Environment variables (prefix `PLCOLLECT__`, `__` as nested separator)
//! 2) Config file (`$PLCOLLECT_CONFIG_PATH` or `$XDG_CONFIG_HOME/plcollect/config.toml`)
//! 3) Struct defaults

use std::{env, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::error::{PlcollectError, Result};
use crate::utils::is_plain_file_name;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub index: IndexSettings,
    pub copy: CopySettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Songlist endpoint, queried with `detailed=true&format=song`.
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8081/songlist".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Order in which indexed files are handed to the matcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrder {
    /// Sort the whole snapshot by path. Reproducible across platforms.
    Lexicographic,
    /// Keep walk order (entries sorted by file name within each directory).
    Traversal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Allowed audio extensions, matched case-insensitively.
    pub extensions: Vec<String>,
    pub order: IndexOrder,
    pub follow_links: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "flac", "wav", "m4a", "ogg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            order: IndexOrder::Lexicographic,
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CopySettings {
    /// Upper bound on concurrent copies.
    pub workers: usize,
    pub preserve_timestamps: bool,
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            workers: 4,
            preserve_timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub file_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            file_name: "missing-tracks.txt".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the resolved config file (if any) and the environment.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(resolve_config_path);

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            // An explicitly requested file has to exist.
            builder = builder.add_source(
                ::config::File::from(path.as_path()).required(explicit_path.is_some()),
            );
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("PLCOLLECT")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("index.extensions")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.copy.workers == 0 {
            return Err(PlcollectError::Settings(
                "copy.workers must be >= 1".to_string(),
            ));
        }
        if self.index.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(PlcollectError::Settings(
                "index.extensions must name at least one extension".to_string(),
            ));
        }
        if !is_plain_file_name(&self.report.file_name) {
            return Err(PlcollectError::Settings(format!(
                "report.file_name must be a plain file name, got '{}'",
                self.report.file_name
            )));
        }
        Ok(())
    }
}

/// Resolve the config path from `PLCOLLECT_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("PLCOLLECT_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("plcollect").join("config.toml"))
}
