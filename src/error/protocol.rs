//! Protocol-level failures: the backend answered, but not with what we wanted,
//! or a request body could not be put into wire form.

use thiserror::Error;

/// The backend replied with a non-2xx status or a body we could not decode,
/// or the request never left because its body would not serialize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Non-2xx status; `message` is the upstream body (or the reason phrase).
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body did not match the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The request body could not be serialized; nothing was sent.
    #[error("could not encode request for {url}: {message}")]
    Encode { url: String, message: String },
}

impl ProtocolError {
    /// Build a status error from the upstream body, falling back to the
    /// canonical reason phrase when the body is empty.
    pub fn status(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            reason_phrase(status).to_string()
        } else {
            trimmed.to_string()
        };
        ProtocolError::Status { status, message }
    }

    /// HTTP status, if this is a status error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProtocolError::Status { status, .. } => Some(*status),
            ProtocolError::Decode { .. } | ProtocolError::Encode { .. } => None,
        }
    }

    /// Upstream message (status errors) or decode detail.
    pub fn message(&self) -> &str {
        match self {
            ProtocolError::Status { message, .. }
            | ProtocolError::Decode { message, .. }
            | ProtocolError::Encode { message, .. } => message,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::Status { status: 401, .. } => "PROTOCOL_UNAUTHORIZED",
            ProtocolError::Status { status: 403, .. } => "PROTOCOL_FORBIDDEN",
            ProtocolError::Status { status: 404, .. } => "PROTOCOL_NOT_FOUND",
            ProtocolError::Status { status: 409, .. } => "PROTOCOL_CONFLICT",
            ProtocolError::Status { status, .. } if *status >= 500 => "PROTOCOL_SERVER",
            ProtocolError::Status { .. } => "PROTOCOL_STATUS",
            ProtocolError::Decode { .. } => "PROTOCOL_DECODE",
            ProtocolError::Encode { .. } => "PROTOCOL_ENCODE",
        }
    }

    /// Get a user-friendly error message that keeps the upstream text.
    pub fn user_message(&self) -> String {
        match self {
            ProtocolError::Status { status, message } => match *status {
                401 => format!("Authentication required: {}", message),
                403 => format!("Access denied: {}", message),
                404 => format!("Not found: {}", message),
                409 => format!("Conflict: {}", message),
                _ => format!("The registry returned an error (HTTP {}): {}", status, message),
            },
            ProtocolError::Decode { .. } => {
                "Received an unexpected response from the registry.".to_string()
            }
            ProtocolError::Encode { .. } => "The request could not be prepared.".to_string(),
        }
    }

    /// True for 401/403 responses.
    pub fn is_auth(&self) -> bool {
        matches!(self.http_status(), Some(401) | Some(403))
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unexpected status",
    }
}
