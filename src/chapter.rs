//! Chapter file identity.
//!
//! DMZJ downloads are laid out either flat (`3084_11641_52310.txt`) or nested
//! under a volume directory (`3084_11641/52310.txt`). Both are reduced to the
//! same `(novel, volume, chapter)` identifiers here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

static FLAT_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(\d+)(?:_(\d+))?(?:\D.*)?$").expect("valid regex"));

static VOLUME_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(\d+)$").expect("valid regex"));

static NESTED_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\D.*)?$").expect("valid regex"));

/// Identifiers parsed from a chapter file's name and parent directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId {
    /// Novel identifier
    pub novel_id: u64,

    /// Volume identifier, when the layout carries one
    pub volume_id: Option<u64>,

    /// Chapter identifier
    pub chapter_id: u64,
}

impl ChapterId {
    /// Parses the identifiers of a chapter file.
    ///
    /// Returns `None` for files that don't follow the naming convention,
    /// including anything without a `.txt` extension.
    #[must_use]
    pub fn parse(path: &Path) -> Option<Self> {
        if !has_txt_extension(path) {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;
        let parent_volume = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .and_then(parse_volume_dir);

        if let Some(caps) = FLAT_STEM.captures(stem) {
            let first: u64 = caps[1].parse().ok()?;
            let second: u64 = caps[2].parse().ok()?;

            return match caps.get(3) {
                Some(third) => Some(Self {
                    novel_id: first,
                    volume_id: Some(second),
                    chapter_id: third.as_str().parse().ok()?,
                }),
                None => Some(Self {
                    novel_id: first,
                    volume_id: parent_volume
                        .filter(|(novel, _)| *novel == first)
                        .map(|(_, volume)| volume),
                    chapter_id: second,
                }),
            };
        }

        let (novel_id, volume_id) = parent_volume?;
        let caps = NESTED_STEM.captures(stem)?;

        Some(Self {
            novel_id,
            volume_id: Some(volume_id),
            chapter_id: caps[1].parse().ok()?,
        })
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume_id {
            Some(volume) => write!(f, "{}_{}_{}", self.novel_id, volume, self.chapter_id),
            None => write!(f, "{}_{}", self.novel_id, self.chapter_id),
        }
    }
}

/// A discovered chapter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Relative path from the root directory
    pub relative_path: String,

    /// Parsed identifiers
    pub id: ChapterId,
}

impl SourceFile {
    /// Creates a source file from an already parsed identifier.
    #[must_use]
    pub fn new(absolute_path: PathBuf, relative_path: String, id: ChapterId) -> Self {
        Self {
            absolute_path,
            relative_path,
            id,
        }
    }

    /// Builds a source file from a path, if the name follows the convention.
    #[must_use]
    pub fn from_path(path: &Path, root: &Path) -> Option<Self> {
        let id = ChapterId::parse(path)?;
        let relative_path = pathdiff::diff_paths(path, root)
            .unwrap_or_else(|| path.to_path_buf())
            .to_string_lossy()
            .to_string();

        Some(Self::new(path.to_path_buf(), relative_path, id))
    }

    /// Returns the novel identifier.
    #[must_use]
    pub const fn novel_id(&self) -> u64 {
        self.id.novel_id
    }

    /// Returns the chapter identifier.
    #[must_use]
    pub const fn chapter_id(&self) -> u64 {
        self.id.chapter_id
    }

    /// Heading line printed above this chapter's text.
    #[must_use]
    pub fn heading(&self) -> String {
        Path::new(&self.relative_path)
            .with_extension("")
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn parse_volume_dir(name: &str) -> Option<(u64, u64)> {
    let caps = VOLUME_DIR.captures(name)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
