
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TripodError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Format error: {0}")]
    Format(String),
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, TripodError>;

// Helper conversions
impl From<rusqlite::Error> for TripodError {
    fn from(e: rusqlite::Error) -> Self { Self::Store(e.to_string()) }
}
impl From<config::ConfigError> for TripodError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
