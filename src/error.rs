//! Error type shared by the pipeline stages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while generating, packaging or vaulting.
///
/// Every variant is fatal for the unit of work that raised it; nothing retries.
#[derive(Debug, Error)]
pub enum DamError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error at {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid selection pattern segment {segment:?}: {reason}")]
    Pattern { segment: String, reason: String },

    #[error("card numbers for milestone {milestone:?} overflow past {first} (+{count} cards)")]
    NumberOverflow {
        milestone: String,
        first: u64,
        count: usize,
    },

    #[error("packaging failed for {}", .0.join(", "))]
    Packaging(Vec<String>),
}

impl DamError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DamError>;
