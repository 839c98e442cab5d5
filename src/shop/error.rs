use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating catalog content.
///
/// These only ever surface at load or hot-reload time. A definition that made
/// it into a `ShopRegistry` resolves without error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported catalog file {0:?} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("shop '{shop}' references unknown item '{item}'")]
    UnknownItem { shop: String, item: String },

    #[error("shop '{shop}', item '{item}': {reason}")]
    InvalidOffer {
        shop: String,
        item: String,
        #[source]
        reason: PolicyError,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl CatalogError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, err: impl std::fmt::Display) -> Self {
        CatalogError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// A price or quantity rule that cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{field} is negative ({value})")]
    Negative { field: &'static str, value: i64 },

    #[error("{field} range {min}..={max} has min greater than max")]
    InvertedRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("{field} does not fit in 32 bits ({value})")]
    TooLarge { field: &'static str, value: i64 },

    #[error("scaled price divisor is zero")]
    ZeroDivisor,
}
