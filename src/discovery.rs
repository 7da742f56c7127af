//! Input and configuration file auto-discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};

/// Marker in file names produced by a previous run.
const PROCESSED_MARKER: &str = "_processed";

/// Find the only file in `dir` with the given extension.
///
/// `extension` is given without the dot and matched exactly (`"yaml"` does not
/// match `.yml`). Files whose names contain `_processed` are ignored so that
/// earlier outputs never get picked up as input. Returns `None` when no file
/// or more than one file matches.
pub fn find_single_file(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let mut matches = Vec::new();

    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext_matches = path.extension().is_some_and(|e| e == extension);
        let is_output = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(PROCESSED_MARKER));
        if ext_matches && !is_output {
            matches.push(path);
        }
    }

    if matches.len() == 1 {
        Ok(matches.pop())
    } else {
        log::debug!(
            "[Discovery] {} candidate .{} files in {}",
            matches.len(),
            extension,
            dir.display()
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_single_match() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("tracks.csv")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let found = find_single_file(dir.path(), "csv").unwrap();
        assert_eq!(found, Some(dir.path().join("tracks.csv")));
    }

    #[test]
    fn test_ignores_processed_outputs() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("tracks.csv")).unwrap();
        File::create(dir.path().join("tracks_processed.csv")).unwrap();

        let found = find_single_file(dir.path(), "csv").unwrap();
        assert_eq!(found, Some(dir.path().join("tracks.csv")));
    }

    #[test]
    fn test_ambiguous_or_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_single_file(dir.path(), "csv").unwrap(), None);

        File::create(dir.path().join("a.csv")).unwrap();
        File::create(dir.path().join("b.csv")).unwrap();
        assert_eq!(find_single_file(dir.path(), "csv").unwrap(), None);
    }

    #[test]
    fn test_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("archive.csv")).unwrap();
        assert_eq!(find_single_file(dir.path(), "csv").unwrap(), None);
    }

    #[test]
    fn test_extension_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("settings.yml")).unwrap();
        assert_eq!(find_single_file(dir.path(), "yaml").unwrap(), None);
        assert!(find_single_file(dir.path(), "yml").unwrap().is_some());
    }
}
