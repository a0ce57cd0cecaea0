use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dump: expected exactly one '{key}' assignment, found {count}")]
    MalformedDump { key: String, count: usize },

    #[error("Replacement pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
