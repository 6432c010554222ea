use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{BundleError, IoContext, Result};
use crate::fs_utils::{CandidateEntry, list_entries};
use crate::naming::{archive_root_name, default_output_dir, output_path};
use crate::packaging::{Compressor, prepare_entries, write_zip};
use crate::size::{bytes_to_mb, exceeds_ceiling, parse_size};
use crate::{Config, DEFAULT_BLACKLIST, DEFAULT_MAX_SIZE_MB};

/// Resolved, immutable bundling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSettings {
    pub blacklist: Vec<String>,
    pub max_size_mb: f64,
    pub output_dir: PathBuf,
    pub compressor: Compressor,
}

impl BundleSettings {
    /// Default blacklist, ceiling and compression, writing into `output_dir`.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            output_dir: output_dir.into(),
            compressor: Compressor::Deflate,
        }
    }
}

/// Result of the walk-and-filter phase.
#[derive(Debug, Clone)]
pub struct BundlePlan {
    pub root: PathBuf,
    pub root_name: String,
    pub entries: Vec<CandidateEntry>,
}

/// What a finished bundle looks like on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleReport {
    pub archive_path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub entries: usize,
    pub exceeds_ceiling: bool,
}

/// Packages a source directory into a single compressed archive.
#[derive(Debug, Clone)]
pub struct Bundler {
    settings: BundleSettings,
}

impl Bundler {
    pub fn new(settings: BundleSettings) -> Self {
        Self { settings }
    }

    /// Builds a bundler from layered config, filling in defaults for unset fields.
    pub fn from_config(config: &Config) -> Result<Self> {
        let output_dir = match &config.output_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_output_dir()?,
        };
        let mut settings = BundleSettings::with_output_dir(output_dir);

        if let Some(blacklist) = &config.blacklist {
            // An empty substring matches every path.
            settings.blacklist = blacklist.iter().filter(|b| !b.is_empty()).cloned().collect();
        }
        if let Some(mb) = config.max_size_mb {
            settings.max_size_mb = mb;
        } else if let Some(size) = &config.max_size {
            settings.max_size_mb = bytes_to_mb(parse_size(size)?);
        }
        if config.compress == Some(false) {
            settings.compressor = Compressor::Stored;
        }

        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &BundleSettings {
        &self.settings
    }

    pub fn archive_path(&self, output_name: &str) -> Result<PathBuf> {
        output_path(&self.settings.output_dir, output_name)
    }

    /// Resolves the source root and lists the entries that survive the blacklist.
    pub fn plan(&self, source: &Path) -> Result<BundlePlan> {
        let root = fs::canonicalize(source).map_err(|e| BundleError::SourceNotFound {
            path: source.to_path_buf(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(BundleError::NotADirectory(root));
        }
        let root_name = archive_root_name(&root)?;
        let entries = list_entries(&root, &self.settings.blacklist)?;
        info!(root = %root.display(), kept = entries.len(), "planned bundle");

        Ok(BundlePlan {
            root,
            root_name,
            entries,
        })
    }

    /// Writes the archive for `source` and prints progress and summary lines to `out`.
    pub fn bundle<W: Write>(
        &self,
        source: &Path,
        output_name: &str,
        out: &mut W,
    ) -> Result<BundleReport> {
        let archive_path = self.archive_path(output_name)?;
        let mut plan = self.plan(source)?;

        // A previous run may have left the archive inside the source tree.
        let existing = fs::canonicalize(&archive_path).ok();
        if let Some(existing) = &existing {
            plan.entries.retain(|e| &e.path != existing);
        }

        let print = |e: std::io::Error| BundleError::io("writing report", e);
        writeln!(out, "Bundling the following files:").map_err(print)?;
        if plan.entries.is_empty() {
            writeln!(out).map_err(print)?;
        }
        for entry in &plan.entries {
            writeln!(out, "{}", entry.relative.display()).map_err(print)?;
        }

        let entries = prepare_entries(&plan.root_name, &plan.entries);
        let size_bytes = write_zip(&archive_path, self.settings.compressor, &entries)?;
        let size_mb = bytes_to_mb(size_bytes);
        let over = exceeds_ceiling(size_mb, self.settings.max_size_mb);

        if over {
            warn!(size_mb, ceiling_mb = self.settings.max_size_mb, "archive exceeds size ceiling");
            writeln!(
                out,
                "Warning: The created zip file ({:.2} MB) is larger than {} MB!",
                size_mb, self.settings.max_size_mb
            )
            .map_err(print)?;
        }

        let archive_path = fs::canonicalize(&archive_path)
            .io_context(|| format!("resolving {archive_path:?}"))?;
        writeln!(out).map_err(print)?;
        writeln!(
            out,
            "Submission created: {} {:.2} MB",
            archive_path.display(),
            size_mb
        )
        .map_err(print)?;
        info!(archive = %archive_path.display(), size_bytes, "bundle complete");

        Ok(BundleReport {
            archive_path,
            size_bytes,
            size_mb,
            entries: entries.len(),
            exceeds_ceiling: over,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_applies_defaults() {
        let cfg = Config {
            output_dir: Some("/tmp/out".into()),
            ..Default::default()
        };
        let bundler = Bundler::from_config(&cfg).unwrap();
        assert_eq!(
            bundler.settings(),
            &BundleSettings::with_output_dir("/tmp/out")
        );
        assert_eq!(bundler.settings().blacklist, DEFAULT_BLACKLIST);
        assert_eq!(bundler.settings().max_size_mb, 40.0);
    }

    #[test]
    fn from_config_overrides() {
        let cfg = Config {
            output_dir: Some("/tmp/out".into()),
            blacklist: Some(vec!["node_modules".into()]),
            max_size: Some("10Mi".into()),
            compress: Some(false),
            ..Default::default()
        };
        let settings = Bundler::from_config(&cfg).unwrap().settings().clone();
        assert_eq!(settings.blacklist, vec!["node_modules".to_string()]);
        assert_eq!(settings.max_size_mb, 10.0);
        assert_eq!(settings.compressor, Compressor::Stored);
    }

    #[test]
    fn empty_blacklist_entries_are_dropped() {
        let cfg = Config {
            output_dir: Some("/tmp/out".into()),
            blacklist: Some(vec!["".into(), ".git".into(), "".into()]),
            ..Default::default()
        };
        let settings = Bundler::from_config(&cfg).unwrap().settings().clone();
        assert_eq!(settings.blacklist, vec![".git".to_string()]);
    }

    #[test]
    fn explicit_megabytes_win_over_size_string() {
        let cfg = Config {
            output_dir: Some("/tmp/out".into()),
            max_size_mb: Some(5.0),
            max_size: Some("10Mi".into()),
            ..Default::default()
        };
        assert_eq!(Bundler::from_config(&cfg).unwrap().settings().max_size_mb, 5.0);
    }

    #[test]
    fn missing_output_dir_defaults_to_executable_dir() {
        let bundler = Bundler::from_config(&Config::default()).unwrap();
        assert_eq!(bundler.settings().output_dir, default_output_dir().unwrap());
    }

    #[test]
    fn plan_rejects_files() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let bundler = Bundler::new(BundleSettings::with_output_dir(tmp.path()));
        assert!(matches!(
            bundler.plan(&file),
            Err(BundleError::NotADirectory(_))
        ));
    }

    #[test]
    fn archive_inside_source_is_not_bundled_into_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("proj");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();

        let bundler = Bundler::new(BundleSettings::with_output_dir(&src));
        let mut sink = Vec::new();
        bundler.bundle(&src, "out", &mut sink).unwrap();
        let report = bundler.bundle(&src, "out", &mut sink).unwrap();
        assert_eq!(report.entries, 1);
    }
}
