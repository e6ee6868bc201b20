
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StowageError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unsupported class kind {kind:?} for '{class}'")]
    Unsupported { class: String, kind: String },
    #[error("Duplicate storage key '{key}' in class '{class}'")]
    DuplicateKey { class: String, key: String },
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, StowageError>;

// Helper conversions
impl From<rusqlite::Error> for StowageError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<config::ConfigError> for StowageError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
