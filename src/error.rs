use std::path::PathBuf;

/// Errors surfaced by dataset loading, model persistence and run reporting.
#[derive(Debug, thiserror::Error)]
pub enum MelError {
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode mel image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("JSON error at '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown backbone '{0}' (expected one of: {1})")]
    UnknownBackbone(String, String),

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl MelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MelError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        MelError::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, MelError>;
