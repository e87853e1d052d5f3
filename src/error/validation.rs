//! Local validation failures, detected before anything is sent.

use thiserror::Error;

use crate::models::AuthMode;

/// Input rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `auth_data` keys do not match what `auth_mode` requires.
    #[error("auth data does not match {mode} (missing: [{}], unexpected: [{}])", missing.join(", "), unexpected.join(", "))]
    AuthMismatch {
        mode: AuthMode,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A required credential field is present but empty.
    #[error("auth field '{field}' must not be empty for {mode}")]
    EmptyAuthField { mode: AuthMode, field: String },

    /// A required instance field is blank.
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    /// The endpoint is not an http(s) URL.
    #[error("endpoint '{endpoint}' must start with http:// or https://")]
    InvalidEndpoint { endpoint: String },

    /// Unknown auth mode string from a form or the backend.
    #[error("unknown auth mode '{0}'")]
    UnknownAuthMode(String),

    /// Preheat requested with no images.
    #[error("no images submitted for preheating")]
    NoImages,

    /// A workflow operation was attempted while no instance is open.
    #[error("no instance is open for editing")]
    NotOpen,
}

impl ValidationError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::AuthMismatch { .. } => "VALIDATION_AUTH_MISMATCH",
            ValidationError::EmptyAuthField { .. } => "VALIDATION_AUTH_EMPTY",
            ValidationError::MissingField { .. } => "VALIDATION_MISSING_FIELD",
            ValidationError::InvalidEndpoint { .. } => "VALIDATION_ENDPOINT",
            ValidationError::UnknownAuthMode(_) => "VALIDATION_AUTH_MODE",
            ValidationError::NoImages => "VALIDATION_NO_IMAGES",
            ValidationError::NotOpen => "VALIDATION_NOT_OPEN",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::AuthMismatch { mode, missing, .. } if !missing.is_empty() => {
                format!(
                    "{} authentication requires: {}.",
                    mode,
                    missing.join(", ")
                )
            }
            ValidationError::AuthMismatch { mode, unexpected, .. } => format!(
                "{} authentication does not accept: {}.",
                mode,
                unexpected.join(", ")
            ),
            other => {
                let text = other.to_string();
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
                    None => text,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mismatch_display() {
        let err = ValidationError::AuthMismatch {
            mode: AuthMode::OAuth,
            missing: vec!["token".to_string()],
            unexpected: vec!["password".to_string(), "username".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "auth data does not match OAUTH (missing: [token], unexpected: [password, username])"
        );
        assert_eq!(err.user_message(), "OAUTH authentication requires: token.");
    }

    #[test]
    fn test_user_message_capitalizes() {
        assert_eq!(
            ValidationError::NoImages.user_message(),
            "No images submitted for preheating."
        );
    }
}
