//! Mock HTTP client for testing.
//!
//! Returns scripted responses per method and URL, records every request, and
//! can park requests behind a gate so tests control exactly when a response
//! is delivered.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET, POST, PUT, DELETE)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST and PUT)
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Return a transport error
    Error(HttpError),
}

impl MockResponse {
    /// 200 with the given JSON document.
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_ok(&value))
    }

    /// Response with the given status and raw body.
    pub fn status(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(body.to_string())))
    }

    /// 200 with an empty body.
    pub fn empty() -> Self {
        MockResponse::Success(Response::new(200, Bytes::new()))
    }
}

#[derive(Debug, Default)]
struct Script {
    /// Persistent responses keyed by "METHOD url"
    responses: HashMap<String, MockResponse>,
    /// One-shot responses consumed before the persistent ones
    queued: HashMap<String, VecDeque<MockResponse>>,
    default_response: Option<MockResponse>,
}

/// Mock HTTP client for testing.
///
/// Clones share responses, recorded requests and the gate.
///
/// # Example
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.set_response("GET", "http://h/api/distribution/instances", MockResponse::json(json!([])));
/// client.hold();
/// // ... start a fetch; it is recorded but does not complete ...
/// client.release();
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    script: Arc<Mutex<Script>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Arc<watch::Sender<bool>>,
}

fn key(method: &str, url: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), url)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(gate),
        }
    }

    /// Set a response for a method and URL. The URL is matched exactly first,
    /// then as a prefix.
    pub fn set_response(&self, method: &str, url: &str, response: MockResponse) {
        lock(&self.script)
            .responses
            .insert(key(method, url), response);
    }

    /// Queue a one-shot response that is returned once before falling back to
    /// the persistent response for the same method and URL.
    pub fn push_response(&self, method: &str, url: &str, response: MockResponse) {
        lock(&self.script)
            .queued
            .entry(key(method, url))
            .or_default()
            .push_back(response);
    }

    /// Set a default response for requests without a specific match.
    pub fn set_default_response(&self, response: MockResponse) {
        lock(&self.script).default_response = Some(response);
    }

    /// Park every request after it is recorded until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    /// Let parked requests (and future ones) complete.
    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of recorded requests with the given method and exact URL.
    pub fn count(&self, method: &str, url: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method) && r.url == url)
            .count()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Clear all configured responses.
    pub fn clear_responses(&self) {
        let mut script = lock(&self.script);
        script.responses.clear();
        script.queued.clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        lock(&self.requests).push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn get_response(&self, method: &str, url: &str) -> Option<MockResponse> {
        let mut script = lock(&self.script);
        let exact = key(method, url);

        if let Some(queue) = script.queued.get_mut(&exact) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        if let Some(response) = script.responses.get(&exact) {
            return Some(response.clone());
        }

        let prefix_match = script
            .responses
            .iter()
            .filter(|(pattern, _)| exact.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefix_match.is_some() {
            return prefix_match;
        }

        script.default_response.clone()
    }

    async fn wait_for_gate(&self) {
        let mut rx = self.gate.subscribe();
        while *rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    async fn respond(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Response, HttpError> {
        self.record_request(method, url, headers, body);
        self.wait_for_gate().await;

        match self.get_response(method, url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!(
                "No mock response for {} {}",
                method, url
            ))),
        }
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("GET", url, headers, None).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("POST", url, headers, Some(body.to_string()))
            .await
    }

    async fn put(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("PUT", url, headers, Some(body.to_string()))
            .await
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("DELETE", url, headers, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_with_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "GET",
            "https://example.com/test",
            MockResponse::Success(Response::new(200, Bytes::from("Hello"))),
        );

        let response = client
            .get("https://example.com/test", &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from("Hello"));

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
    }

    #[tokio::test]
    async fn test_method_is_part_of_the_match() {
        let client = MockHttpClient::new();
        client.set_response("GET", "https://example.com/a", MockResponse::empty());

        let result = client.delete("https://example.com/a", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_queued_response_is_used_once() {
        let client = MockHttpClient::new();
        let url = "https://example.com/list";
        client.set_response("GET", url, MockResponse::json(serde_json::json!([])));
        client.push_response(
            "GET",
            url,
            MockResponse::Error(HttpError::ConnectionFailed("down".to_string())),
        );

        assert!(client.get(url, &Headers::new()).await.is_err());
        assert!(client.get(url, &Headers::new()).await.is_ok());
        assert_eq!(client.count("GET", url), 2);
    }

    #[tokio::test]
    async fn test_put_records_body() {
        let client = MockHttpClient::new();
        client.set_response("PUT", "https://example.com/i/1", MockResponse::empty());

        client
            .put("https://example.com/i/1", r#"{"enabled":true}"#, &Headers::new())
            .await
            .unwrap();

        let requests = client.get_requests();
        assert_eq!(
            requests[0].json_body(),
            Some(serde_json::json!({"enabled": true}))
        );
    }

    #[tokio::test]
    async fn test_hold_parks_requests_until_release() {
        let client = MockHttpClient::new();
        client.set_response("GET", "https://example.com/slow", MockResponse::empty());
        client.hold();

        let task_client = client.clone();
        let task = tokio::spawn(async move {
            task_client
                .get("https://example.com/slow", &Headers::new())
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(client.count("GET", "https://example.com/slow"), 1);
        assert!(!task.is_finished());

        client.release();
        let result = task.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let client = MockHttpClient::new();
        client.set_response("GET", "https://example.com/api", MockResponse::status(404, ""));
        client.set_response("GET", "https://example.com/api/v1", MockResponse::empty());

        let response = client
            .get("https://example.com/api/v1/users", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_default_response() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::status(404, "Not Found"));

        let response = client
            .get("https://example.com/anything", &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 404);
    }
}
