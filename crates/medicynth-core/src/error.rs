//! Error types for the chat client core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure talking to the chat API.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The chat API answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Speech recognition error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Text shown to the user inside an error turn.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
