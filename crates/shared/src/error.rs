//! Error types shared between the API gateway and its callers.

/// Failure of a call to an external HTTP API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Upstream answered with a non-success status
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not signed in")]
    Unauthenticated,
}

impl ApiError {
    /// HTTP status when the upstream produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthenticated) || self.status() == Some(401)
    }
}
