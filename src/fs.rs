use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::cancel::Cancel;
use crate::config::{IndexOrder, IndexSettings};
use crate::error::{PlcollectError, Result};

/// Extension allow-list and ordering used while indexing a library.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    extensions: Vec<String>,
    pub order: IndexOrder,
    pub follow_links: bool,
}

impl IndexOptions {
    pub fn new<S: AsRef<str>>(extensions: &[S], order: IndexOrder) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            order,
            follow_links: false,
        }
    }

    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions::from(&IndexSettings::default())
    }
}

impl From<&IndexSettings> for IndexOptions {
    fn from(settings: &IndexSettings) -> Self {
        let mut options = IndexOptions::new(settings.extensions.as_slice(), settings.order);
        options.follow_links = settings.follow_links;
        options
    }
}

/// Recursively collect every audio file under `root`.
///
/// The returned list is a snapshot: the matcher's first-match tie-break runs
/// over it in exactly this order.
pub fn index(root: &Path, options: &IndexOptions, cancel: &Cancel) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PlcollectError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    for entry in walker {
        if cancel.is_cancelled() {
            return Err(PlcollectError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() {
            let path = entry.into_path();
            if options.is_audio_file(&path) {
                files.push(path);
            }
        }
    }

    if options.order == IndexOrder::Lexicographic {
        files.sort();
    }

    info!("Indexed {} audio files under {:?}", files.len(), root);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn audio_filter_is_case_insensitive() {
        let options = IndexOptions::default();
        assert!(options.is_audio_file(Path::new("/tmp/a.mp3")));
        assert!(options.is_audio_file(Path::new("/tmp/a.MP3")));
        assert!(options.is_audio_file(Path::new("/tmp/a.Flac")));
        assert!(options.is_audio_file(Path::new("/tmp/a.m4a")));
        assert!(options.is_audio_file(Path::new("/tmp/a.ogg")));
        assert!(options.is_audio_file(Path::new("/tmp/a.wav")));
        assert!(!options.is_audio_file(Path::new("/tmp/a.txt")));
        assert!(!options.is_audio_file(Path::new("/tmp/mp3")));
    }

    #[test]
    fn configured_extensions_accept_leading_dots() {
        let options = IndexOptions::new(&[".OPUS"], IndexOrder::Traversal);
        assert!(options.is_audio_file(Path::new("x.opus")));
        assert!(!options.is_audio_file(Path::new("x.mp3")));
    }

    #[test]
    fn index_walks_subdirectories_and_skips_other_files() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("root.mp3"), b"x").unwrap();
        fs::write(nested.join("deep.FLAC"), b"x").unwrap();
        fs::write(nested.join("cover.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = index(dir.path(), &IndexOptions::default(), &Cancel::new()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&dir.path().join("root.mp3")));
        assert!(files.contains(&nested.join("deep.FLAC")));
    }

    #[test]
    fn lexicographic_order_sorts_by_full_path() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b").join("x.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a").join("y.mp3"), b"x").unwrap();
        fs::write(dir.path().join("c.mp3"), b"x").unwrap();

        let files = index(dir.path(), &IndexOptions::default(), &Cancel::new()).unwrap();

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
        assert_eq!(files[0], dir.path().join("a").join("y.mp3"));
    }

    #[test]
    fn repeated_walks_are_stable() {
        let dir = tempdir().unwrap();
        for name in ["z.mp3", "m.ogg", "a.wav"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let options = IndexOptions::new(&["mp3", "ogg", "wav"], IndexOrder::Traversal);

        let first = index(dir.path(), &options, &Cancel::new()).unwrap();
        let second = index(dir.path(), &options, &Cancel::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_is_directory_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = index(&missing, &IndexOptions::default(), &Cancel::new()).unwrap_err();
        assert!(matches!(err, PlcollectError::DirectoryNotFound(p) if p == missing));
    }

    #[test]
    fn file_root_is_directory_not_found() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            index(&file, &IndexOptions::default(), &Cancel::new()),
            Err(PlcollectError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn cancelled_walk_stops() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        let cancel = Cancel::new();
        cancel.cancel();
        assert!(matches!(
            index(dir.path(), &IndexOptions::default(), &cancel),
            Err(PlcollectError::Cancelled)
        ));
    }
}
