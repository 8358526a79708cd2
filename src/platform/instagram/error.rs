/// Failures reported by the Instagram client, grouped by how the caller should react.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstagramError {
    /// The session in the cookies is not allowed to see this post.
    #[error("Login required: {0}")]
    LoginRequired(String),
    /// Instagram rejected the request itself.
    #[error("{0}")]
    Blocked(String),
    /// Network-level trouble that is worth another try.
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for InstagramError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
            InstagramError::Connection(error.to_string())
        } else {
            InstagramError::Unexpected(error.to_string())
        }
    }
}

impl From<std::io::Error> for InstagramError {
    fn from(error: std::io::Error) -> Self {
        InstagramError::Unexpected(error.to_string())
    }
}
