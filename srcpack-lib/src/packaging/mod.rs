use std::path::PathBuf;

use crate::fs_utils::{CandidateEntry, EntryKind};
use crate::naming::archive_name;

pub mod zip;

pub use self::zip::{Compressor, write_zip};

/// Represents a file or directory to include in the ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub name_in_archive: String,
    pub kind: EntryKind,
}

/// Maps walked entries to their names under the archive's top-level folder.
pub fn prepare_entries(root_name: &str, candidates: &[CandidateEntry]) -> Vec<ArchiveEntry> {
    candidates
        .iter()
        .map(|c| ArchiveEntry {
            path: c.path.clone(),
            name_in_archive: archive_name(root_name, &c.relative, c.kind),
            kind: c.kind,
        })
        .collect()
}
