//! Merges chapter files into the groups that become output PDFs.

use crate::{chapter::SourceFile, config::GroupLevel};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A set of chapters rendered into one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group key; also the output file stem
    pub key: String,

    /// Chapters in ascending chapter id order
    pub files: Vec<SourceFile>,
}

impl Group {
    /// Creates a new group.
    #[must_use]
    pub fn new(key: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            key: key.into(),
            files,
        }
    }

    /// Returns the number of chapters in this group.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns true if this group has no chapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Returns the grouping key a chapter carries on its own at the given level.
///
/// The key is the leading underscore-separated identifier prefix:
/// `novel`, `novel_volume` or `novel_volume_chapter`.
///
/// Returns `None` at [`GroupLevel::Volume`] for chapters without a volume
/// id. [`group_files`] merges those per novel into one group named after
/// its first chapter.
#[must_use]
pub fn group_key(file: &SourceFile, level: GroupLevel) -> Option<String> {
    let id = &file.id;
    match level {
        GroupLevel::Novel => Some(id.novel_id.to_string()),
        GroupLevel::Volume => id
            .volume_id
            .map(|volume_id| format!("{}_{}", id.novel_id, volume_id)),
        GroupLevel::Chapter => Some(id.to_string()),
    }
}

/// Groups chapter files by key and orders every group by chapter id.
///
/// Every input file lands in exactly one group. Groups come back in
/// ascending key order.
///
/// At [`GroupLevel::Volume`] the volume-less chapters of a novel form a
/// single group keyed `<novel>_<first chapter>`. At [`GroupLevel::Chapter`]
/// every file keeps its own group. Keys already taken get a `-2`, `-3`, ...
/// suffix in both cases.
#[must_use]
pub fn group_files(files: Vec<SourceFile>, level: GroupLevel) -> Vec<Group> {
    let total = files.len();
    let mut groups: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    let mut loose: BTreeMap<u64, Vec<SourceFile>> = BTreeMap::new();

    for file in files {
        let Some(mut key) = group_key(&file, level) else {
            loose.entry(file.novel_id()).or_default().push(file);
            continue;
        };

        if level == GroupLevel::Chapter && groups.contains_key(&key) {
            let free = unused_key(&groups, &key);
            debug!(
                "Chapter key {} already taken, {} becomes {}",
                key, file.relative_path, free
            );
            key = free;
        }

        trace!("{} -> {}", file.relative_path, key);
        groups.entry(key).or_default().push(file);
    }

    for (novel_id, files) in loose {
        let first = files
            .iter()
            .map(SourceFile::chapter_id)
            .min()
            .unwrap_or_default();
        let key = unused_key(&groups, &format!("{novel_id}_{first}"));

        debug!(
            "{} chapters of novel {} have no volume, grouped as {}",
            files.len(),
            novel_id,
            key
        );
        groups.insert(key, files);
    }

    let groups: Vec<Group> = groups
        .into_iter()
        .map(|(key, mut files)| {
            files.sort_by(|a, b| {
                a.chapter_id()
                    .cmp(&b.chapter_id())
                    .then_with(|| a.relative_path.cmp(&b.relative_path))
            });
            Group::new(key, files)
        })
        .collect();

    debug!(
        "Grouped {} chapters into {} groups at level {}",
        total,
        groups.len(),
        level
    );

    groups
}

/// Returns `base`, or the first `base-<n>` (n >= 2) not yet used as a key.
fn unused_key(groups: &BTreeMap<String, Vec<SourceFile>>, base: &str) -> String {
    let mut key = base.to_string();
    let mut n = 1;
    while groups.contains_key(&key) {
        n += 1;
        key = format!("{base}-{n}");
    }
    key
}
