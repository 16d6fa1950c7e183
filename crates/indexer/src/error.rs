use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Prompt not found: {name}")]
    NotFound { name: String },

    #[error("Failed to load {}: {reason}", path.display())]
    LoadFailure { path: PathBuf, reason: String },

    #[error("Invalid front matter: {0}")]
    FrontMatter(String),

    #[error("Invalid prompt name: {0:?}")]
    InvalidName(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<notify::Error> for IndexerError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}
