use thiserror::Error;

/// Errors raised by the menu engine and its collaborators.
///
/// None of these are fatal: fetch failures fall back, malformed units are
/// discarded, and remote write failures keep the local change.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MenuError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("remote unavailable: {0}")]
    TransientFetch(String),

    #[error("malformed data in {context}: {reason}")]
    MalformedData { context: String, reason: String },

    #[error("remote {action} failed ({reason}); local change kept")]
    RemoteWrite { action: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl MenuError {
    pub fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        MenuError::MalformedData {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for MenuError {
    fn from(err: reqwest::Error) -> Self {
        MenuError::TransientFetch(err.to_string())
    }
}

impl From<std::io::Error> for MenuError {
    fn from(err: std::io::Error) -> Self {
        MenuError::Storage(err.to_string())
    }
}

pub type MenuResult<T> = Result<T, MenuError>;
