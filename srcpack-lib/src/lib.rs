use serde::{Deserialize, Serialize};

pub mod bundler;
pub mod error;
pub mod fs_utils;
pub mod naming;
pub mod packaging;
pub mod size;

pub use bundler::{BundlePlan, BundleReport, BundleSettings, Bundler};
pub use error::{BundleError, Result};

/// Path substrings excluded from every bundle unless a blacklist is configured.
pub const DEFAULT_BLACKLIST: [&str; 3] = ["__pycache__", ".pyc", ".ipynb"];

/// Advisory archive size ceiling in binary megabytes.
pub const DEFAULT_MAX_SIZE_MB: f64 = 40.0;

/// Extension appended to the output name.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Layered configuration shared by the tool and the library.
///
/// Every field is optional so that env, file and CLI layers can be merged
/// field by field; [`Bundler::from_config`] fills in the defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output_dir: Option<String>,
    pub config: Option<String>,
    pub max_size_mb: Option<f64>,
    /// Size string such as `40Mi` or `50MB`; ignored when `max_size_mb` is set.
    pub max_size: Option<String>,
    pub blacklist: Option<Vec<String>>,
    pub dry: Option<bool>,
    pub compress: Option<bool>,
}
