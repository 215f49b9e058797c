use crate::{chapter::SourceFile, config::Config};
use std::path::PathBuf;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ScanStats {
    /// Regular files visited
    pub(crate) total_files: usize,

    /// Files recognised as chapters
    pub(crate) chapter_files: usize,

    /// Files that didn't follow the naming convention
    pub(crate) ignored_files: usize,

    /// Walk errors (unreadable directories, broken entries)
    pub(crate) errors: usize,
}

/// Walks the root directory and collects chapter files.
pub(crate) struct Scanner {
    root_dir: PathBuf,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            root_dir: config.root_dir.clone(),
        }
    }

    /// Scans the root directory and returns every chapter file, sorted by
    /// relative path.
    ///
    /// Unreadable entries are logged and skipped; the walk never fails as a
    /// whole once the root has been validated.
    pub(crate) fn scan(&self) -> (Vec<SourceFile>, ScanStats) {
        let mut files = Vec::new();
        let mut stats = ScanStats::default();

        debug!("Starting scan of {}", self.root_dir.display());

        for entry in WalkDir::new(&self.root_dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            stats.total_files += 1;

            match SourceFile::from_path(entry.path(), &self.root_dir) {
                Some(file) => {
                    trace!("Found chapter {} at {}", file.id, file.relative_path);
                    stats.chapter_files += 1;
                    files.push(file);
                }
                None => {
                    debug!("Ignoring {}", entry.path().display());
                    stats.ignored_files += 1;
                }
            }
        }

        // Sort for deterministic ordering
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        debug!(
            "Scan complete: {} total, {} chapters, {} ignored, {} errors",
            stats.total_files, stats.chapter_files, stats.ignored_files, stats.errors
        );

        if stats.errors > 0 {
            warn!(
                "Encountered {} errors during scanning (non-fatal)",
                stats.errors
            );
        }

        (files, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::path::Path;

    fn create_test_config(root: &Path) -> Config {
        Config::builder()
            .root_dir(root)
            .output_dir(root.join("out"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_scanner_finds_chapters() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("3084_11641.txt").write_str("one").unwrap();
        temp.child("3084_11642.txt").write_str("two").unwrap();

        let (files, stats) = Scanner::new(&create_test_config(temp.path())).scan();

        assert_eq!(files.len(), 2);
        assert_eq!(stats.chapter_files, 2);
        assert!(files.iter().any(|f| f.relative_path.contains("3084_11641")));
    }

    #[test]
    fn test_scanner_ignores_other_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("3084_11641.txt").write_str("chapter").unwrap();
        temp.child("cover.jpg").write_binary(&[0xFF, 0xD8]).unwrap();
        temp.child("notes.txt").write_str("not a chapter").unwrap();

        let (files, stats) = Scanner::new(&create_test_config(temp.path())).scan();

        assert_eq!(files.len(), 1);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.ignored_files, 2);
    }

    #[test]
    fn test_scanner_nested_directories() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("3084_11641/52310.txt").write_str("a").unwrap();
        temp.child("3084_11641/52311.txt").write_str("b").unwrap();
        temp.child("3084_11700/52400.txt").write_str("c").unwrap();

        let (files, _) = Scanner::new(&create_test_config(temp.path())).scan();

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.id.volume_id.is_some()));
        assert_eq!(files[0].chapter_id(), 52310);
    }

    #[test]
    fn test_scanner_empty_directory() {
        let temp = assert_fs::TempDir::new().unwrap();

        let (files, stats) = Scanner::new(&create_test_config(temp.path())).scan();

        assert!(files.is_empty());
        assert_eq!(stats, ScanStats::default());
    }
}
