use serde::{Deserialize, Serialize};

use crate::platform::MediaItem;

/// Every way a fetch can fail. The `Display` text is what the caller sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid Instagram URL! Please ensure it contains a valid post code (e.g., instagram.com/p/XXXXX).")]
    InvalidUrl,

    #[error(
        "Cookies file not found at {path}. Ensure {file} exists with valid Instagram cookies in Netscape format."
    )]
    CredentialsFileMissing { path: String, file: String },

    #[error("Failed to load session from cookies.txt: Missing required cookies (sessionid, csrftoken) or invalid format.")]
    CredentialsInvalid,

    #[error(
        "Login required! This post may be private or requires authentication. Provide a valid {file} with active session cookies."
    )]
    AuthenticationRequired { file: String },

    #[error(
        "Instagram blocked the request (403 Forbidden): {reason}. Ensure {file} contains valid, non-expired session cookies."
    )]
    RequestBlocked { reason: String, file: String },

    #[error("Failed after {retries} retries: {reason}.")]
    TransientConnectivity { retries: u32, reason: String },

    #[error(
        "Oops! Something went wrong: {0}. Check your internet connection, URL, cookies file, or try again later."
    )]
    Unclassified(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// The list half of a response, keyed by what it holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    MediaUrls(Vec<String>),
    Files(Vec<String>),
}

impl Payload {
    pub fn values(&self) -> &[String] {
        match self {
            Payload::MediaUrls(values) | Payload::Files(values) => values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    MediaUrls,
    Files,
}

impl PayloadKind {
    pub fn wrap(self, values: Vec<String>) -> Payload {
        match self {
            PayloadKind::MediaUrls => Payload::MediaUrls(values),
            PayloadKind::Files => Payload::Files(values),
        }
    }
}

/// `{"status": ..., "message": ..., "media_urls" | "files": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationResult {
    pub status: ResultStatus,
    pub message: String,
    #[serde(flatten)]
    pub payload: Payload,
}

impl OperationResult {
    pub fn success(kind: PayloadKind, message: impl Into<String>, items: &[MediaItem]) -> Self {
        Self {
            status: ResultStatus::Success,
            message: message.into(),
            payload: kind.wrap(items.iter().map(|item| item.location.to_string()).collect()),
        }
    }

    pub fn error(kind: PayloadKind, message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            message: message.into(),
            payload: kind.wrap(Vec::new()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}
