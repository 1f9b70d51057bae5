use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;

use log::{error, info};

use crate::cancel::Cancel;
use crate::config::Settings;
use crate::error::{PlcollectError, Result};
use crate::fs::{IndexOptions, index};
use crate::materialize::{
    CopyFailure, MaterializeOptions, copy_tracks, resolve_destination, write_missing_report,
};
use crate::matcher::{MatchResult, match_tracks};
use crate::prompt::Operator;
use crate::provider::{Playlist, PlaylistProvider};

/// Lifecycle of one run. `Failed` is terminal; per-file copy failures do not lead there.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Start,
    FetchPlaylist,
    IndexDirectory,
    Match,
    ResolveDestination,
    Copy,
    Report,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Start => "START",
            RunState::FetchPlaylist => "FETCH_PLAYLIST",
            RunState::IndexDirectory => "INDEX_DIRECTORY",
            RunState::Match => "MATCH",
            RunState::ResolveDestination => "RESOLVE_DESTINATION",
            RunState::Copy => "COPY",
            RunState::Report => "REPORT",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What to do when the destination folder already exists.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverwritePolicy {
    Ask,
    Always,
    Never,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Passed verbatim to the playlist provider.
    pub source: String,
    pub search_dir: PathBuf,
    /// Folder the per-playlist directory is created in.
    pub target_parent: PathBuf,
    pub overwrite: OverwritePolicy,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub playlist_name: String,
    pub track_count: usize,
    pub found_count: usize,
    pub missing: Vec<String>,
    /// Found, but not delivered.
    pub failed: Vec<CopyFailure>,
    pub skipped_duplicates: Vec<String>,
    pub destination: PathBuf,
    pub report: Option<PathBuf>,
}

pub struct Runner<'a> {
    provider: &'a dyn PlaylistProvider,
    operator: &'a dyn Operator,
    index_options: IndexOptions,
    materialize_options: MaterializeOptions,
    cancel: Cancel,
}

impl<'a> Runner<'a> {
    pub fn new(
        provider: &'a dyn PlaylistProvider,
        operator: &'a dyn Operator,
        settings: &Settings,
    ) -> Self {
        Runner {
            provider,
            operator,
            index_options: IndexOptions::from(&settings.index),
            materialize_options: MaterializeOptions::from(settings),
            cancel: Cancel::new(),
        }
    }

    /// Share a cancellation flag with the caller.
    pub fn with_cancel(mut self, cancel: Cancel) -> Self {
        self.cancel = cancel;
        self
    }

    fn enter(&self, state: RunState) {
        info!("[{}]", state);
    }

    /// Fetch, index and match without writing anything.
    pub fn preview(&self, source: &str, search_dir: &Path) -> Result<(Playlist, MatchResult)> {
        self.enter(RunState::Start);
        let result = self.fetch_and_match(source, search_dir);
        if let Err(e) = &result {
            self.enter(RunState::Failed);
            error!("{}", e);
        }
        result
    }

    pub fn execute(&self, request: &RunRequest) -> Result<RunSummary> {
        self.enter(RunState::Start);
        match self.try_execute(request) {
            Ok(summary) => {
                self.enter(RunState::Done);
                Ok(summary)
            }
            Err(e) => {
                self.enter(RunState::Failed);
                error!("{}", e);
                Err(e)
            }
        }
    }

    /// The fetch and the directory walk are independent, so they run side by
    /// side. Matching starts only once the whole index is in.
    fn fetch_and_match(&self, source: &str, search_dir: &Path) -> Result<(Playlist, MatchResult)> {
        if !search_dir.is_dir() {
            return Err(PlcollectError::DirectoryNotFound(search_dir.to_path_buf()));
        }

        let index_options = &self.index_options;
        let cancel = &self.cancel;

        let (playlist, files) = thread::scope(|s| {
            let walk = s.spawn(move || {
                info!("[{}] {:?}", RunState::IndexDirectory, search_dir);
                index(search_dir, index_options, cancel)
            });

            self.enter(RunState::FetchPlaylist);
            let playlist = self.provider.fetch(source);
            if playlist.is_err() {
                // The run is lost either way; stop the walk early.
                cancel.cancel();
            }

            let files = walk.join().unwrap_or_else(|_| {
                Err(PlcollectError::Io(std::io::Error::other(
                    "directory walk panicked",
                )))
            });
            (playlist, files)
        });

        let playlist = playlist?;
        let files = files?;

        info!(
            "Playlist '{}' has {} tracks; {} candidate files",
            playlist.name,
            playlist.tracks.len(),
            files.len()
        );

        self.enter(RunState::Match);
        let matched = match_tracks(&playlist.tracks, &files);
        Ok((playlist, matched))
    }

    fn try_execute(&self, request: &RunRequest) -> Result<RunSummary> {
        let (playlist, matched) = self.fetch_and_match(&request.source, &request.search_dir)?;

        self.enter(RunState::ResolveDestination);
        let destination = resolve_destination(&request.target_parent, &playlist.name, |existing| {
            match request.overwrite {
                OverwritePolicy::Always => Ok(true),
                OverwritePolicy::Never => Ok(false),
                OverwritePolicy::Ask => self.operator.confirm(&format!(
                    "Directory {} already exists. Overwrite?",
                    existing.display()
                )),
            }
        })?;

        self.enter(RunState::Copy);
        let outcome = copy_tracks(
            &destination,
            &matched,
            &self.materialize_options,
            &self.cancel,
        )?;

        self.enter(RunState::Report);
        let report = write_missing_report(
            &outcome.destination,
            &playlist.name,
            &matched.missing,
            &self.materialize_options,
        )?;

        Ok(RunSummary {
            playlist_name: playlist.name,
            track_count: playlist.tracks.len(),
            found_count: matched.found.len(),
            missing: matched.missing,
            failed: outcome.failed,
            skipped_duplicates: outcome.skipped_duplicates,
            destination: outcome.destination,
            report,
        })
    }
}
