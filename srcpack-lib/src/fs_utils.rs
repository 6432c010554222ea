use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{IoContext, Result};

/// Whether an entry is a directory or a regular file once symlinks are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A filesystem entry found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub kind: EntryKind,
}

/// True if any blacklist substring occurs anywhere in the full path string.
///
/// This is plain substring matching: `.pyc` also hides `notes.pyc.bak` and
/// everything below a directory called `old.pyc.d`.
pub fn is_blacklisted<S: AsRef<str>>(path: &Path, blacklist: &[S]) -> bool {
    let path_str = path.to_string_lossy();
    blacklist.iter().any(|b| path_str.contains(b.as_ref()))
}

/// Recursively lists every file and directory under `root`, skipping blacklisted paths.
///
/// Directories come before their children and siblings are sorted by name.
/// Symlinked directories are listed but not descended into.
pub fn list_entries<S: AsRef<str>>(root: &Path, blacklist: &[S]) -> Result<Vec<CandidateEntry>> {
    fn walk_dir<S: AsRef<str>>(
        root: &Path,
        dir: &Path,
        blacklist: &[S],
        result: &mut Vec<CandidateEntry>,
    ) -> Result<()> {
        let mut children = Vec::new();
        for entry in fs::read_dir(dir).io_context(|| format!("reading directory {dir:?}"))? {
            let entry = entry.io_context(|| format!("reading directory {dir:?}"))?;
            children.push(entry.path());
        }
        children.sort();

        for path in children {
            // Descendants of a skipped directory share its prefix, so pruning is exact.
            if is_blacklisted(&path, blacklist) {
                debug!(path = %path.display(), "excluded by blacklist");
                continue;
            }

            let link_meta =
                fs::symlink_metadata(&path).io_context(|| format!("reading metadata of {path:?}"))?;
            let is_link = link_meta.file_type().is_symlink();
            let is_dir = if is_link {
                fs::metadata(&path)
                    .io_context(|| format!("following symlink {path:?}"))?
                    .is_dir()
            } else {
                link_meta.is_dir()
            };

            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            let kind = if is_dir { EntryKind::Dir } else { EntryKind::File };
            result.push(CandidateEntry {
                path: path.clone(),
                relative,
                kind,
            });

            if is_dir && !is_link {
                walk_dir(root, &path, blacklist, result)?;
            }
        }
        Ok(())
    }

    let mut result = Vec::new();
    walk_dir(root, root, blacklist, &mut result)?;
    Ok(result)
}

/// Sum of the sizes of all file entries.
pub fn total_size(entries: &[CandidateEntry]) -> Result<u64> {
    let mut total: u64 = 0;
    for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
        let meta = fs::metadata(&entry.path)
            .io_context(|| format!("reading metadata of {:?}", entry.path))?;
        total += meta.len();
    }
    Ok(total)
}
