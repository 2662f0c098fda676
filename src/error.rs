//! Error types for backend access and the recommendation panel.
//!
//! Backend failures are classified three ways for display:
//! - Backend: the server answered with an error status
//! - Unreachable: no response (connect failure, timeout, network)
//! - Client: anything else that went wrong on our side

use thiserror::Error;

/// Label used when an error response carries neither `detail` nor `message`.
pub const GENERIC_BACKEND_MESSAGE: &str = "Backend error response";

/// Display text for requests that never got a response.
pub const UNREACHABLE_MESSAGE: &str = "Backend not reachable (Server OFF / CORS / Network Issue)";

/// Errors from a single backend request.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Returns true if retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            BackendError::Timeout(_) | BackendError::Unreachable(_) => true,
            BackendError::Http(e) => e.is_timeout() || e.is_connect(),
            BackendError::Decode(_) | BackendError::InvalidUrl(_) => false,
        }
    }

    /// Build a `Status` error from an error response body, pulling the
    /// human-readable message out of `detail` or `message`.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        BackendError::Status {
            status,
            message: extract_backend_message(body),
        }
    }
}

/// Extract the server-provided message from an error body.
///
/// String values are returned verbatim. Structured values (validation error
/// arrays) are returned as compact JSON. Anything else falls back to
/// [`GENERIC_BACKEND_MESSAGE`].
pub fn extract_backend_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return GENERIC_BACKEND_MESSAGE.to_string();
    };

    for key in ["detail", "message"] {
        match json.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(serde_json::Value::String(_))
            | Some(serde_json::Value::Null)
            | Some(serde_json::Value::Bool(false))
            | None => continue,
            Some(other) => return other.to_string(),
        }
    }

    GENERIC_BACKEND_MESSAGE.to_string()
}

/// Classified insight failure, as surfaced in the recommendation panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightError {
    #[error("API Error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable,

    #[error("{0}")]
    Client(String),
}

impl From<&BackendError> for InsightError {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Status { status, message } => InsightError::Backend {
                status: *status,
                message: message.clone(),
            },
            BackendError::Timeout(_) | BackendError::Unreachable(_) => InsightError::Unreachable,
            BackendError::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                InsightError::Unreachable
            }
            other => {
                let text = other.to_string();
                if text.is_empty() {
                    InsightError::Client("Unknown Error".to_string())
                } else {
                    InsightError::Client(text)
                }
            }
        }
    }
}

impl From<BackendError> for InsightError {
    fn from(err: BackendError) -> Self {
        InsightError::from(&err)
    }
}

/// Serializable error representation for the view layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelError {
    pub message: String,
    pub kind: PanelErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelErrorKind {
    Backend,
    Unreachable,
    Client,
}

impl InsightError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            InsightError::Backend { .. } => "The backend rejected the request. Check its logs.",
            InsightError::Unreachable => "Check that the backend is running and reachable.",
            InsightError::Client(_) => "Try selecting the pincode again.",
        }
    }
}

impl From<&InsightError> for PanelError {
    fn from(err: &InsightError) -> Self {
        let (kind, status) = match err {
            InsightError::Backend { status, .. } => (PanelErrorKind::Backend, Some(*status)),
            InsightError::Unreachable => (PanelErrorKind::Unreachable, None),
            InsightError::Client(_) => (PanelErrorKind::Client, None),
        };
        PanelError {
            message: err.to_string(),
            kind,
            status,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
