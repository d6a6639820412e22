//! Classification of failed backend calls.
//!
//! Every screen derives its error text from [`classify`] (or one of the
//! transport-level constructors) so the same status always reads the same.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const SESSION_EXPIRED: &str = "Your session has expired or is not authorized. Please sign in again.";
pub const CONNECTIVITY: &str =
    "Could not reach the server. Check your connection or the backend status.";
pub const SERVER_SIDE: &str = "The server hit an internal error. Try again later, and check that your profile (and the professionals' profiles) are complete.";
pub const UNEXPECTED_RESPONSE: &str = "The server sent an unexpected response.";

/// Categories of failed calls, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// 401; the session has been (or is about to be) cleared
    Unauthorized,
    /// The server explained itself in a `message` field
    Server,
    /// Recognized status without a message, mapped to fixed text
    Status,
    /// No response was received
    Transport,
    /// A success response whose body could not be decoded
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Server => write!(f, "server"),
            ApiErrorKind::Status => write!(f, "status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured error for a failed backend call, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Human-readable text shown to the user
    pub message: String,
    /// Raw body or transport diagnostic, for logs
    pub details: Option<String>,
}

impl ApiError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            message: CONNECTIVITY.to_string(),
            details: Some(reason.into()),
        }
    }

    pub fn decode(status: u16, reason: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status: Some(status),
            message: UNEXPECTED_RESPONSE.to_string(),
            details: Some(reason.into()),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Map a non-success status and its body to a displayable error
pub fn classify(status: u16, body: &str) -> ApiError {
    let details = if body.trim().is_empty() {
        None
    } else {
        Some(body.to_string())
    };
    let server_message = extract_message(body);

    if status == 401 {
        return ApiError {
            kind: ApiErrorKind::Unauthorized,
            status: Some(status),
            message: server_message.unwrap_or_else(|| SESSION_EXPIRED.to_string()),
            details,
        };
    }

    if let Some(message) = server_message {
        return ApiError {
            kind: ApiErrorKind::Server,
            status: Some(status),
            message,
            details,
        };
    }

    ApiError {
        kind: ApiErrorKind::Status,
        status: Some(status),
        message: status_fallback(status),
        details,
    }
}

/// Fixed text per status family, used when the server gave no message
pub fn status_fallback(status: u16) -> String {
    match status {
        400 | 422 => "The request was rejected. Check the submitted data and try again.".into(),
        403 => "You do not have permission to perform this action.".into(),
        404 => "The requested resource was not found.".into(),
        409 => "This conflicts with existing data (it may already exist).".into(),
        500..=599 => SERVER_SIDE.into(),
        _ => format!("Request failed with status {status}."),
    }
}

fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_is_verbatim() {
        let err = classify(500, r#"{"message":"Perfil incompleto"}"#);
        assert_eq!(err.kind, ApiErrorKind::Server);
        assert_eq!(err.message, "Perfil incompleto");
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn test_5xx_without_message_uses_fallback() {
        let err = classify(503, "");
        assert_eq!(err.kind, ApiErrorKind::Status);
        assert_eq!(err.message, SERVER_SIDE);
        assert!(err.details.is_none());
    }

    #[test]
    fn test_non_json_body_keeps_details() {
        let err = classify(404, "<html>not found</html>");
        assert_eq!(err.kind, ApiErrorKind::Status);
        assert!(err.is_not_found());
        assert_eq!(err.details.as_deref(), Some("<html>not found</html>"));
    }

    #[test]
    fn test_401_is_unauthorized_even_with_message() {
        let err = classify(401, r#"{"message":"token expirado"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.message, "token expirado");

        let bare = classify(401, "");
        assert_eq!(bare.message, SESSION_EXPIRED);
    }

    #[test]
    fn test_non_string_message_is_ignored() {
        let err = classify(400, r#"{"message":42}"#);
        assert_eq!(err.kind, ApiErrorKind::Status);
        assert!(err.message.starts_with("The request was rejected"));
    }

    #[test]
    fn test_unknown_status() {
        assert_eq!(status_fallback(418), "Request failed with status 418.");
    }

    #[test]
    fn test_transport_is_distinct() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert_eq!(err.message, CONNECTIVITY);
        assert_eq!(err.status, None);
    }
}
