//! Arrival feed error types.

use std::fmt;

/// Errors from the arrival feed clients.
#[derive(Debug)]
pub enum EtaError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// Feed returned an error status code
    Api { status: u16, message: String },

    /// Rate limited by the feed
    RateLimited,

    /// Every upstream request for a selection failed; carries the first failure
    AllSourcesFailed(Box<EtaError>),
}

impl fmt::Display for EtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtaError::Http(e) => write!(f, "HTTP error: {e}"),
            EtaError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            EtaError::Api { status, message } => {
                write!(f, "feed error {status}: {message}")
            }
            EtaError::RateLimited => write!(f, "rate limited by arrival feed"),
            EtaError::AllSourcesFailed(e) => {
                write!(f, "all arrival sources failed: {e}")
            }
        }
    }
}

impl std::error::Error for EtaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtaError::Http(e) => Some(e),
            EtaError::AllSourcesFailed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EtaError {
    fn from(err: reqwest::Error) -> Self {
        EtaError::Http(err)
    }
}
