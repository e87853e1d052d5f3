//! REST client for the distribution API.
//!
//! A pure protocol adapter: every method is one round trip, errors carry the
//! upstream message, and nothing is retried or interpreted.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::config::{ApiCredential, ClientConfig};
use crate::error::{DistResult, ProtocolError, TransportError};
use crate::models::{
    Ack, DistributionHistory, DistributionProvider, InstanceId, InstancePatch, InstancePayload,
    PreheatRequest, ProviderInstance,
};
use crate::traits::{Headers, HttpClient, HttpError, Response};

pub const PROVIDERS_PATH: &str = "/api/distribution/providers";
pub const INSTANCES_PATH: &str = "/api/distribution/instances";
pub const PREHEATS_PATH: &str = "/api/distribution/preheats";

/// Client for the `/api/distribution` endpoints.
#[derive(Clone)]
pub struct DistributionRepository {
    base_url: String,
    http: Arc<dyn HttpClient>,
    credential: Option<ApiCredential>,
}

impl DistributionRepository {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            credential: None,
        }
    }

    /// Production repository over reqwest, honouring the configured timeout.
    pub fn from_config(config: &ClientConfig) -> Self {
        let http = ReqwestHttpClient::with_timeout(config.request_timeout);
        let repository = Self::new(config.base_url.clone(), Arc::new(http));
        match &config.credential {
            Some(credential) => repository.with_credential(credential.clone()),
            None => repository,
        }
    }

    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_providers(&self) -> DistResult<Vec<DistributionProvider>> {
        self.get_list(PROVIDERS_PATH).await
    }

    pub async fn list_instances(&self) -> DistResult<Vec<ProviderInstance>> {
        self.get_list(INSTANCES_PATH).await
    }

    pub async fn get_instance(&self, id: &str) -> DistResult<ProviderInstance> {
        let url = self.instance_url(id);
        let response = self.check(&url, self.http.get(&url, &self.headers()).await)?;
        decode(&url, &response)
    }

    /// Create an instance. Returns the backend-assigned id when the response
    /// carries one; an empty body yields `None`.
    pub async fn create_instance(&self, payload: &InstancePayload) -> DistResult<Option<InstanceId>> {
        let url = self.url(INSTANCES_PATH);
        let body = encode(&url, payload)?;
        let response = self.check(&url, self.http.post(&url, &body, &self.headers()).await)?;
        Ok(ack(response).echoed_id())
    }

    /// Apply a full or partial update.
    pub async fn update_instance(&self, id: &str, patch: &InstancePatch) -> DistResult<Ack> {
        let url = self.instance_url(id);
        let body = encode(&url, patch)?;
        let response = self.check(&url, self.http.put(&url, &body, &self.headers()).await)?;
        Ok(ack(response))
    }

    pub async fn delete_instance(&self, id: &str) -> DistResult<Ack> {
        let url = self.instance_url(id);
        let response = self.check(&url, self.http.delete(&url, &self.headers()).await)?;
        Ok(ack(response))
    }

    pub async fn list_history(&self) -> DistResult<Vec<DistributionHistory>> {
        self.get_list(PREHEATS_PATH).await
    }

    /// Ask the providers to preheat the given images. The list is sent as is.
    pub async fn request_preheat(&self, images: &[String]) -> DistResult<Ack> {
        let url = self.url(PREHEATS_PATH);
        let body = encode(
            &url,
            &PreheatRequest {
                images: images.to_vec(),
            },
        )?;
        let response = self.check(&url, self.http.post(&url, &body, &self.headers()).await)?;
        Ok(ack(response))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> DistResult<Vec<T>> {
        let url = self.url(path);
        let response = self.check(&url, self.http.get(&url, &self.headers()).await)?;
        if response.is_empty_body() || response.body.as_ref().trim_ascii() == b"null" {
            return Ok(Vec::new());
        }
        decode(&url, &response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn instance_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base_url, INSTANCES_PATH, urlencoding::encode(id))
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(credential) = &self.credential {
            headers.insert("Authorization".to_string(), credential.header_value());
        }
        headers
    }

    /// Fold transport failures and non-2xx statuses into `DistError`.
    fn check(&self, url: &str, result: Result<Response, HttpError>) -> DistResult<Response> {
        match result {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                let body = String::from_utf8_lossy(&response.body);
                Err(ProtocolError::status(response.status, &body).into())
            }
            Err(HttpError::ServerError { status, message }) => {
                Err(ProtocolError::status(status, &message).into())
            }
            Err(err) => Err(TransportError::from_http(url, err).into()),
        }
    }
}

impl std::fmt::Debug for DistributionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionRepository")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

/// Serialize a request body. Failing here means nothing was sent.
fn encode<T: Serialize>(url: &str, value: &T) -> DistResult<String> {
    serde_json::to_string(value).map_err(|e| {
        ProtocolError::Encode {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

fn decode<T: DeserializeOwned>(url: &str, response: &Response) -> DistResult<T> {
    response.json().map_err(|e| {
        ProtocolError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Non-JSON or empty success bodies are still an acknowledgement.
fn ack(response: Response) -> Ack {
    let body = if response.is_empty_body() {
        None
    } else {
        response.json().ok()
    };
    Ack {
        status: response.status,
        body,
    }
}
