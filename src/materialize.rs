use std::collections::HashSet;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cancel::Cancel;
use crate::config::Settings;
use crate::error::{PlcollectError, Result};
use crate::matcher::MatchResult;
use crate::utils::{disambiguator, is_plain_file_name, safe_name};

/// Directory name used when the playlist name sanitizes to nothing.
pub const FALLBACK_PLAYLIST_NAME: &str = "playlist";

const MAX_SUFFIX_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    /// The directory already existed and the operator agreed to write into it.
    pub reused: bool,
}

/// Pick the folder a playlist is materialized into, without creating it.
///
/// `confirm_overwrite` is only consulted when `parent/<playlist>` already
/// exists. Declining never touches that folder; a suffixed sibling is chosen
/// instead.
pub fn resolve_destination<F>(
    parent: &Path,
    playlist_name: &str,
    confirm_overwrite: F,
) -> Result<Destination>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    let base = safe_name(playlist_name).unwrap_or_else(|e| {
        warn!("{}; using '{}'", e, FALLBACK_PLAYLIST_NAME);
        FALLBACK_PLAYLIST_NAME.to_string()
    });

    let candidate = parent.join(&base);
    if !candidate.exists() {
        return Ok(Destination {
            path: candidate,
            reused: false,
        });
    }

    if confirm_overwrite(&candidate)? {
        info!("Writing into existing directory {:?}", candidate);
        return Ok(Destination {
            path: candidate,
            reused: true,
        });
    }

    for _ in 0..MAX_SUFFIX_ATTEMPTS {
        let alternate = parent.join(format!("{}{}", base, disambiguator()));
        if !alternate.exists() {
            debug!("{:?} exists, using {:?}", candidate, alternate);
            return Ok(Destination {
                path: alternate,
                reused: false,
            });
        }
    }

    Err(PlcollectError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name next to {}", candidate.display()),
    )))
}

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub workers: usize,
    pub preserve_timestamps: bool,
    pub report_file_name: String,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        MaterializeOptions::from(&Settings::default())
    }
}

impl From<&Settings> for MaterializeOptions {
    fn from(settings: &Settings) -> Self {
        MaterializeOptions {
            workers: settings.copy.workers.max(1),
            preserve_timestamps: settings.copy.preserve_timestamps,
            report_file_name: settings.report.file_name.clone(),
        }
    }
}

/// A matched track whose file could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub track: String,
    pub source_path: PathBuf,
    pub cause: String,
}

impl From<CopyFailure> for PlcollectError {
    fn from(failure: CopyFailure) -> Self {
        PlcollectError::CopyFailed {
            track: failure.track,
            source_path: failure.source_path,
            cause: failure.cause,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    pub destination: PathBuf,
    /// (track, copied file) in playlist order.
    pub copied: Vec<(String, PathBuf)>,
    pub failed: Vec<CopyFailure>,
    /// Found tracks whose target name was already taken by an earlier track.
    pub skipped_duplicates: Vec<String>,
    pub report: Option<PathBuf>,
}

struct CopyJob<'a> {
    track: &'a str,
    source: &'a Path,
    target: PathBuf,
}

/// Target file name for a track: the sanitized track name plus the source's extension.
fn target_file_name(track: &str, position: usize, source: &Path) -> String {
    let stem = safe_name(track).unwrap_or_else(|e| {
        warn!("{}; naming the copy by position", e);
        format!("track-{}", position + 1)
    });

    match source.extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem,
    }
}

fn plan<'a>(destination: &Path, matched: &'a MatchResult) -> (Vec<CopyJob<'a>>, Vec<String>) {
    let mut taken = HashSet::new();
    let mut jobs = Vec::with_capacity(matched.found.len());
    let mut skipped = Vec::new();

    for found in &matched.found {
        let file_name = target_file_name(&found.track, found.position, &found.path);

        // Case-insensitive filesystems would fold these onto one file anyway.
        if !taken.insert(file_name.to_lowercase()) {
            debug!("'{}' already delivered as {}", found.track, file_name);
            skipped.push(found.track.clone());
            continue;
        }

        jobs.push(CopyJob {
            track: &found.track,
            source: &found.path,
            target: destination.join(file_name),
        });
    }

    (jobs, skipped)
}

/// Copies `source` to `target` keeping permissions and, when asked, access and
/// modification times.
fn copy_with_metadata(source: &Path, target: &Path, preserve_timestamps: bool) -> io::Result<()> {
    fs::copy(source, target)?;

    if preserve_timestamps {
        let meta = fs::metadata(source)?;
        let mut times = FileTimes::new().set_modified(meta.modified()?);
        if let Ok(accessed) = meta.accessed() {
            times = times.set_accessed(accessed);
        }
        // fs::copy already gave the target the source's mode, which may be
        // read-only; setting times needs ownership, not write access.
        File::open(target)?.set_times(times)?;
    }

    Ok(())
}

fn write_report(path: &Path, playlist_name: &str, missing: &[String]) -> io::Result<()> {
    let mut content = format!("Missing tracks from playlist '{}':\n\n", playlist_name);
    for (i, track) in missing.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", i + 1, track));
    }
    fs::write(path, content)
}

/// Create the destination and copy every found track into it.
///
/// Copies run on a pool of `options.workers` threads. One failed copy never
/// stops the others; failures are returned in [`MaterializeOutcome::failed`].
pub fn copy_tracks(
    destination: &Destination,
    matched: &MatchResult,
    options: &MaterializeOptions,
    cancel: &Cancel,
) -> Result<MaterializeOutcome> {
    if !is_plain_file_name(&options.report_file_name) {
        return Err(PlcollectError::InvalidName(options.report_file_name.clone()));
    }

    let dir = destination.path.as_path();
    fs::create_dir_all(dir)?;

    let (jobs, skipped_duplicates) = plan(dir, matched);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()?;

    info!("Copying {} files to {:?}", jobs.len(), dir);

    let results: Vec<Option<io::Result<()>>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(copy_with_metadata(
                    job.source,
                    &job.target,
                    options.preserve_timestamps,
                ))
            })
            .collect()
    });

    if cancel.is_cancelled() {
        warn!("Copy cancelled; leaving {:?} as it is", dir);
        return Err(PlcollectError::Cancelled);
    }

    let mut outcome = MaterializeOutcome {
        destination: dir.to_path_buf(),
        skipped_duplicates,
        ..Default::default()
    };

    for (job, result) in jobs.iter().zip(results) {
        match result {
            Some(Ok(())) => outcome.copied.push((job.track.to_string(), job.target.clone())),
            Some(Err(e)) => {
                warn!("Failed to copy {:?} for '{}': {}", job.source, job.track, e);
                outcome.failed.push(CopyFailure {
                    track: job.track.to_string(),
                    source_path: job.source.to_path_buf(),
                    cause: e.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(outcome)
}

/// Write the missing-tracks report into `dir`, replacing any earlier one.
/// Nothing is written when `missing` is empty.
pub fn write_missing_report(
    dir: &Path,
    playlist_name: &str,
    missing: &[String],
    options: &MaterializeOptions,
) -> Result<Option<PathBuf>> {
    if missing.is_empty() {
        return Ok(None);
    }
    if !is_plain_file_name(&options.report_file_name) {
        return Err(PlcollectError::InvalidName(options.report_file_name.clone()));
    }

    let report = dir.join(&options.report_file_name);
    write_report(&report, playlist_name, missing)?;
    info!("Missing tracks saved to {:?}", report);
    Ok(Some(report))
}

/// [`copy_tracks`] followed by [`write_missing_report`], so the report only
/// appears once every copy has resolved.
pub fn materialize(
    destination: &Destination,
    playlist_name: &str,
    matched: &MatchResult,
    options: &MaterializeOptions,
    cancel: &Cancel,
) -> Result<MaterializeOutcome> {
    let mut outcome = copy_tracks(destination, matched, options, cancel)?;
    outcome.report =
        write_missing_report(&outcome.destination, playlist_name, &matched.missing, options)?;
    Ok(outcome)
}
