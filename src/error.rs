// Client Error Types
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name -> messages, as returned in the backend's `details` object
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced by the registry client.
///
/// `Clone` because a single in-flight fetch is shared by every caller that
/// asked for the same cache key, and each of them receives the same outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    // Local schema check failed; no request was sent
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    // Request could not complete (timeout, connection failure)
    #[error("Transport error: {message}")]
    Transport { message: String, transient: bool },

    // 4xx/5xx with a body, or a 2xx envelope with success=false
    #[error("Backend rejected request ({status})")]
    Backend {
        status: u16,
        message: Option<String>,
        details: FieldErrors,
    },

    // 401 - reacting to this belongs to the auth collaborator
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

impl ClientError {
    /// HTTP status carried by the error, if it came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Backend { status, .. } => Some(*status),
            ClientError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Stable code for JSON output and logging
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation { .. } => "VALIDATION_ERROR",
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Backend { .. } => "BACKEND_ERROR",
            ClientError::Unauthorized(_) => "UNAUTHORIZED",
            ClientError::Decode(_) => "INVALID_RESPONSE",
            ClientError::UnknownResource(_) => "UNKNOWN_RESOURCE",
        }
    }

    /// Only network-level failures qualify for the silent retry
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport { transient: true, .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// First field-level message, if any
    pub fn field_detail(&self) -> Option<&str> {
        let details = match self {
            ClientError::Validation { field_errors, .. } => field_errors,
            ClientError::Backend { details, .. } => details,
            _ => return None,
        };
        details
            .values()
            .flat_map(|messages| messages.iter())
            .map(String::as_str)
            .find(|m| !m.is_empty())
    }

    /// Message to show the operator.
    ///
    /// Selection order: field-specific detail, then the backend's generic
    /// message, then `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        if let Some(detail) = self.field_detail() {
            return detail.to_string();
        }
        match self {
            ClientError::Validation { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Backend {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ClientError::Unauthorized(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

// Constructors
impl ClientError {
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        ClientError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.into(), vec![message.clone()]);
        ClientError::Validation {
            message,
            field_errors,
        }
    }

    pub fn transport(message: impl Into<String>, transient: bool) -> Self {
        ClientError::Transport {
            message: message.into(),
            transient,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode(message.into())
    }

    /// Build a backend rejection from a response body.
    ///
    /// Understands `{message}`, `{error}` and `{details: {field: [msg, ..]}}`
    /// (a bare string per field is accepted too).
    pub fn from_response(status: u16, body: &Value) -> Self {
        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut details = FieldErrors::new();
        if let Some(Value::Object(fields)) = body.get("details").or_else(|| body.get("errors")) {
            for (field, value) in fields {
                let messages = match value {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                if !messages.is_empty() {
                    details.insert(field.clone(), messages);
                }
            }
        }

        if status == 401 {
            return ClientError::Unauthorized(message.unwrap_or_else(|| "Unauthenticated".to_string()));
        }

        ClientError::Backend {
            status,
            message,
            details,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        let transient = err.is_timeout() || err.is_connect() || err.is_request();
        ClientError::Transport {
            message: err.to_string(),
            transient,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
