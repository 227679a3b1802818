//! Error types for ctfetch

use thiserror::Error;

/// Main error type for ctfetch operations
#[derive(Debug, Error)]
pub enum CtError {
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decompression error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the fetch loop and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required page or API field is missing
    Resolution,
    /// Request, status, decompression or body parsing failure
    Transport,
    /// Bad input or client setup
    Config,
    /// The output sink could not be written
    Output,
}

impl CtError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CtError::Resolution(_) => ErrorKind::Resolution,
            CtError::Http(_) | CtError::Status { .. } | CtError::Decode(_) | CtError::Json(_) => {
                ErrorKind::Transport
            }
            CtError::InvalidUrl(_) | CtError::Url(_) | CtError::Regex(_) | CtError::Config(_) => {
                ErrorKind::Config
            }
            CtError::Io(_) => ErrorKind::Output,
        }
    }

    /// Check if the error only affects a single request
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Shorthand for a missing-field error
    pub fn missing(what: &str) -> Self {
        CtError::Resolution(format!("Cannot find {} in the response", what))
    }
}
