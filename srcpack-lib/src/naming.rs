use std::env;
use std::path::{Component, Path, PathBuf};

use crate::ARCHIVE_EXTENSION;
use crate::error::{BundleError, IoContext, Result};
use crate::fs_utils::EntryKind;

/// Name of the top-level folder inside the archive: the root's final path component.
pub fn archive_root_name(root: &Path) -> Result<String> {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| BundleError::NoRootName(root.to_path_buf()))
}

/// Builds the in-archive name `<root_name>/<relative>` with `/` separators.
///
/// Directory names carry a trailing `/`, as the ZIP format expects.
pub fn archive_name(root_name: &str, relative: &Path, kind: EntryKind) -> String {
    let mut name = String::from(root_name);
    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    if kind == EntryKind::Dir {
        name.push('/');
    }
    name
}

/// Destination archive path: `<output_dir>/<output_name>.zip`.
pub fn output_path(output_dir: &Path, output_name: &str) -> Result<PathBuf> {
    if output_name.trim().is_empty() {
        return Err(BundleError::InvalidOutputName(output_name.to_string()));
    }
    Ok(output_dir.join(format!("{output_name}.{ARCHIVE_EXTENSION}")))
}

/// Directory containing the running executable.
pub fn default_output_dir() -> Result<PathBuf> {
    let exe = env::current_exe().io_context(|| "locating the running executable")?;
    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_name_is_final_component() {
        assert_eq!(archive_root_name(Path::new("/home/me/src")).unwrap(), "src");
        assert_eq!(
            archive_root_name(Path::new("/home/me/project.v2")).unwrap(),
            "project.v2"
        );
    }

    #[test]
    fn filesystem_root_has_no_name() {
        assert!(matches!(
            archive_root_name(Path::new("/")),
            Err(BundleError::NoRootName(_))
        ));
    }

    #[test]
    fn archive_names_use_forward_slashes() {
        let rel = Path::new("sub").join("deeper").join("b.txt");
        assert_eq!(
            archive_name("root", &rel, EntryKind::File),
            "root/sub/deeper/b.txt"
        );
        assert_eq!(
            archive_name("root", Path::new("sub"), EntryKind::Dir),
            "root/sub/"
        );
    }

    #[test]
    fn output_path_appends_extension() {
        let p = output_path(Path::new("/out"), "submission").unwrap();
        assert_eq!(p, PathBuf::from("/out/submission.zip"));
    }

    #[test]
    fn empty_output_name_is_rejected() {
        assert!(matches!(
            output_path(Path::new("/out"), "  "),
            Err(BundleError::InvalidOutputName(_))
        ));
    }

    #[test]
    fn default_output_dir_exists() {
        assert!(default_output_dir().unwrap().is_dir());
    }
}
