//! Error types for bundling

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while planning or writing a bundle
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("cannot resolve source directory {path:?}: {source}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("source directory has no final path component: {0:?}")]
    NoRootName(PathBuf),

    #[error("invalid output name: {0:?}")]
    InvalidOutputName(String),

    #[error("invalid size format: {0}")]
    InvalidSize(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl BundleError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BundleError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;

/// Attaches a context string to `std::io::Result` values.
pub(crate) trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| BundleError::io(f(), e))
    }
}
