use thiserror::Error;

pub type Result<T, E = NavError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error(transparent)]
    Vision(#[from] vision_detect::Error),
    #[error(transparent)]
    Intent(#[from] intent_parser::Error),
    #[error("resource unavailable: {0}")]
    Unavailable(String),
}
