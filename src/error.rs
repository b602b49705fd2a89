//! Error types for chart discovery and schema generation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for helm-schema operations
pub type Result<T> = std::result::Result<T, HelmSchemaError>;

/// Errors raised while discovering charts and building their schemas
#[derive(Error, Debug)]
pub enum HelmSchemaError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse Chart.yaml at {}: {source}", path.display())]
    ChartParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse values file {}: {source}", path.display())]
    ValuesParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no values file found in {} (tried: {})", chart_dir.display(), candidates.join(", "))]
    NoValuesFile {
        chart_dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown skip-auto-generation field: {0}")]
    InvalidSkipField(String),

    #[error("failed to sort charts: {0}")]
    Sort(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl HelmSchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
