use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: connection refused, TLS, malformed response
    /// body. Decode failures from reqwest land here too.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status. `message` is the server's
    /// own description where one could be extracted, otherwise the raw body.
    #[error("api returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// Status code for `Api` errors, `None` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}
