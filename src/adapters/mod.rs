//! Concrete implementations of trait abstractions.
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`mock::MockHttpClient`] - scripted HTTP responses for tests

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
