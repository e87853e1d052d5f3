//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - HTTP client operations used by the repository

pub mod http;

pub use http::{Headers, HttpClient, HttpError, Response};
