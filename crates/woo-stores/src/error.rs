use thiserror::Error;

/// Failure of a network request
///
/// Carried inside completion actions and failure events, so it is `Clone`
/// and holds rendered messages rather than foreign error sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("no such resource: {method} {path}")]
    NotFound { method: String, path: String },

    #[error("server responded with {code}: {message}")]
    Status { code: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decoding(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Decoding(err.to_string())
    }
}
