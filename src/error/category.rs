//! Error category classification for unified error handling.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout. Transient.
    Network,

    /// The backend answered with a non-2xx status or an unreadable body.
    Server,

    /// Authentication/authorization rejected by the backend.
    Auth,

    /// Input rejected locally before anything was sent.
    User,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    ///
    /// Informational only: nothing in this crate retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Auth => "auth",
            ErrorCategory::User => "user",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the registry is reachable and try again",
            ErrorCategory::Server => {
                "The registry rejected the request. Please try again later"
            }
            ErrorCategory::Auth => "Check the configured credentials",
            ErrorCategory::User => "Please check your input and try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
