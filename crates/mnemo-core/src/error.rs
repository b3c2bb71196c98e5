use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MnemoError {
    #[error("cannot read notes root {}: {reason}", path.display())]
    RootUnreadable { path: PathBuf, reason: String },

    #[error("no note under {} could be read ({failed} failed)", path.display())]
    NothingReadable { path: PathBuf, failed: usize },

    #[error("reload abandoned before swap; previous notes remain active")]
    ReloadAbandoned,

    #[error("note store not initialized: call global::init first")]
    NotInitialized,

    #[error("note not found: {0}")]
    DocumentNotFound(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MnemoError>;
