use std::path::{Path, PathBuf};

use log::{debug, info};

/// One located track: its position in the playlist, its name and the chosen file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundTrack {
    pub position: usize,
    pub track: String,
    pub path: PathBuf,
}

/// The found/missing partition of a playlist.
///
/// Duplicate track names are kept as separate entries, so
/// `found.len() + missing.len()` always equals the number of input tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub found: Vec<FoundTrack>,
    pub missing: Vec<String>,
}

impl MatchResult {
    pub fn total(&self) -> usize {
        self.found.len() + self.missing.len()
    }

    /// The file chosen for the first occurrence of `track`.
    pub fn get(&self, track: &str) -> Option<&Path> {
        self.found
            .iter()
            .find(|f| f.track == track)
            .map(|f| f.path.as_path())
    }
}

/// Case-folds `s` and treats underscores as spaces, the usual stand-in for
/// a space in file names.
fn fold(s: &str) -> String {
    s.to_lowercase().replace('_', " ")
}

/// Folded file name without its extension.
fn candidate_key(path: &Path) -> String {
    path.file_stem()
        .map(|stem| fold(&stem.to_string_lossy()))
        .unwrap_or_default()
}

/// Partition `tracks` into found and missing against the `files` snapshot.
///
/// A file matches when the folded track name is a substring of its folded
/// stem. Folding lowercases and also reads `_` as a space on both sides, which
/// is looser than a plain lowercase substring test: `song_a_live.mp3` matches
/// "Song A", but so does `song a.mp3` match "Song_A". No other character is
/// treated specially.
///
/// The first matching file in snapshot order wins; there is
/// no similarity scoring, so the outcome is only as stable as `files`' order.
pub fn match_tracks<S: AsRef<str>>(tracks: &[S], files: &[PathBuf]) -> MatchResult {
    // normalize once
    let keys: Vec<String> = files.iter().map(|f| candidate_key(f)).collect();

    let mut result = MatchResult::default();

    for (position, track) in tracks.iter().enumerate() {
        let track = track.as_ref();
        let needle = fold(track);

        match keys.iter().position(|key| key.contains(&needle)) {
            Some(i) => {
                debug!("Matched '{}' -> {:?}", track, files[i]);
                result.found.push(FoundTrack {
                    position,
                    track: track.to_string(),
                    path: files[i].clone(),
                });
            }
            None => {
                debug!("No match for '{}'", track);
                result.missing.push(track.to_string());
            }
        }
    }

    info!(
        "Matched {} of {} tracks ({} missing)",
        result.found.len(),
        tracks.len(),
        result.missing.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn substring_of_stem_matches_and_rest_is_missing() {
        let files = paths(&["song_a_live.mp3", "other.flac"]);
        let result = match_tracks(&["Song A", "Song B"], &files);

        assert_eq!(result.get("Song A"), Some(Path::new("song_a_live.mp3")));
        assert_eq!(result.missing, vec!["Song B".to_string()]);
    }

    #[test]
    fn first_candidate_in_snapshot_order_wins() {
        let files = paths(&["x.mp3", "x.flac"]);
        let result = match_tracks(&["X"], &files);
        assert_eq!(result.get("X"), Some(Path::new("x.mp3")));

        let reversed = paths(&["x.flac", "x.mp3"]);
        let result = match_tracks(&["X"], &reversed);
        assert_eq!(result.get("X"), Some(Path::new("x.flac")));
    }

    #[test]
    fn matching_ignores_case() {
        let files = paths(&["/music/HELLO World.MP3"]);
        let result = match_tracks(&["hello world"], &files);
        assert_eq!(result.found.len(), 1);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn underscore_and_space_are_interchangeable_but_nothing_else_is() {
        let files = paths(&["song a.mp3", "b-side.mp3"]);
        let result = match_tracks(&["Song_A", "B Side"], &files);
        assert_eq!(result.get("Song_A"), Some(Path::new("song a.mp3")));
        assert_eq!(result.missing, vec!["B Side".to_string()]);
    }

    #[test]
    fn extension_and_directories_are_not_searched() {
        // "mp3" only appears in the extension, "rock" only in the directory.
        let files = paths(&["/rock/track.mp3"]);
        let result = match_tracks(&["mp3", "rock"], &files);
        assert!(result.found.is_empty());
        assert_eq!(result.missing, vec!["mp3".to_string(), "rock".to_string()]);
    }

    #[test]
    fn duplicates_are_counted_separately() {
        let files = paths(&["a.mp3"]);
        let tracks = ["A", "B", "A", "B"];
        let result = match_tracks(&tracks, &files);

        assert_eq!(result.total(), tracks.len());
        assert_eq!(result.found.len(), 2);
        assert_eq!(result.found[0].position, 0);
        assert_eq!(result.found[1].position, 2);
        assert_eq!(result.missing, vec!["B".to_string(), "B".to_string()]);
    }

    #[test]
    fn missing_preserves_input_order() {
        let result = match_tracks(&["c", "a", "b"], &paths(&["zzz.ogg"]));
        assert_eq!(result.missing, vec!["c", "a", "b"]);
    }

    #[test]
    fn found_paths_come_from_the_snapshot() {
        let files = paths(&["one.mp3", "two.mp3", "three two.wav"]);
        let result = match_tracks(&["two", "three", "one", "four"], &files);

        assert_eq!(result.total(), 4);
        for found in &result.found {
            assert!(files.contains(&found.path));
        }
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];
        let result = match_tracks(&empty, &paths(&["a.mp3"]));
        assert_eq!(result, MatchResult::default());

        let result = match_tracks(&["a"], &[]);
        assert_eq!(result.missing, vec!["a".to_string()]);
    }
}
