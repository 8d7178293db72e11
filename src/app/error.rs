use thiserror::Error;

use crate::domain::ValidationErrors;

#[derive(Error, Debug)]
pub enum PlazaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sign in required (return to {return_to})")]
    AuthRequired { return_to: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inline field messages next to the form.
    Validation,
    /// Transient notification; previous data stays visible.
    Network,
    /// "Not found" state instead of content.
    NotFound,
    /// Redirect to sign-in.
    AuthRequired,
}

impl PlazaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlazaError::Validation(_) => ErrorKind::Validation,
            PlazaError::NotFound(_) => ErrorKind::NotFound,
            PlazaError::AuthRequired { .. } => ErrorKind::AuthRequired,
            _ => ErrorKind::Network,
        }
    }

    /// Points a sign-in failure at the page the action started from.
    pub fn returning_to(self, origin: &str) -> Self {
        match self {
            PlazaError::AuthRequired { .. } => PlazaError::AuthRequired {
                return_to: origin.to_string(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlazaError>;
