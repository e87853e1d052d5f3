//! Error handling for distsync.
//!
//! | Type | Raised when | Category |
//! |------|-------------|----------|
//! | [`TransportError`] | connection refused, timeout, bad URL | Network |
//! | [`ProtocolError`] | non-2xx status, undecodable body | Server / Auth |
//! | [`ValidationError`] | local checks before submission | User |
//!
//! All three fold into [`DistError`]. Nothing in the crate retries on its
//! own; `is_retryable()` is a hint for callers.

mod category;
mod dist_error;
mod protocol;
mod result;
mod transport;
mod validation;

pub use category::ErrorCategory;
pub use dist_error::DistError;
pub use protocol::ProtocolError;
pub use result::{DistResult, ResultExt};
pub use transport::TransportError;
pub use validation::ValidationError;
