//! Error types for the threadview-tui crate

use std::io;
use thiserror::Error;

use crate::theme::ThemeError;

/// Result type alias for threadview-tui operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for threadview-tui
#[derive(Error, Debug)]
pub enum Error {
    /// File and terminal I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Theme loading or compilation errors
    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),

    /// Transcript JSON could not be decoded
    #[error("Transcript error: {0}")]
    Transcript(#[from] serde_json::Error),

    /// Clipboard access errors
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

impl From<arboard::Error> for Error {
    fn from(err: arboard::Error) -> Self {
        Error::Clipboard(err.to_string())
    }
}
