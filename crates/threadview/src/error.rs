use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No message at position {0}")]
    MissingMessage(usize),

    #[error("Message {message} has no code block {block}")]
    MissingCodeBlock { message: usize, block: usize },

    #[error("Copy failed: {0}")]
    Copy(String),

    #[error(transparent)]
    Core(#[from] threadview_tui::Error),
}
