//! Common test utilities for integration tests.
//!
//! [`FakeRegistry`] is a stateful stand-in for the distribution API mounted
//! on a wiremock server, so create/update/delete are visible to later lists.
//!
//! # Example
//!
//! ```ignore
//! let (server, registry) = start_registry().await;
//! let repo = repository_for(&server);
//! ```

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use distsync::config::ClientConfig;
use distsync::repository::DistributionRepository;
use serde_json::{json, Map, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const INSTANCES: &str = "/api/distribution/instances";

/// In-memory instance store speaking the backend's JSON.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    instances: Arc<Mutex<Vec<Map<String, Value>>>>,
    next_id: Arc<Mutex<u64>>,
}

impl FakeRegistry {
    /// Insert an instance directly, as if created earlier.
    pub fn seed(&self, instance: Value) -> String {
        let mut object = instance.as_object().cloned().unwrap_or_default();
        let id = self.allocate_id();
        object.insert("id".to_string(), json!(id));
        self.instances.lock().unwrap().push(object);
        id
    }

    pub fn instance(&self, id: &str) -> Option<Value> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.get("id") == Some(&json!(id)))
            .map(|i| Value::Object(i.clone()))
    }

    pub fn len(&self) -> usize {
        self.instances.lock().unwrap().len()
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        next.to_string()
    }

    fn create(&self, body: &[u8]) -> ResponseTemplate {
        let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(body) else {
            return ResponseTemplate::new(400).set_body_string("invalid instance payload");
        };
        let id = self.allocate_id();
        object.insert("id".to_string(), json!(id));
        object.insert("status".to_string(), json!("Healthy"));
        object.insert("setup_timestamp".to_string(), json!(1_700_000_000));
        self.instances.lock().unwrap().push(object);
        ResponseTemplate::new(200).set_body_json(json!({ "id": id }))
    }

    fn update(&self, id: &str, body: &[u8]) -> ResponseTemplate {
        let Ok(Value::Object(patch)) = serde_json::from_slice::<Value>(body) else {
            return ResponseTemplate::new(400).set_body_string("invalid update payload");
        };
        let mut instances = self.instances.lock().unwrap();
        match instances.iter_mut().find(|i| i.get("id") == Some(&json!(id))) {
            Some(instance) => {
                instance.extend(patch);
                ResponseTemplate::new(200).set_body_json(json!({ "updated": id }))
            }
            None => ResponseTemplate::new(404).set_body_string(format!("instance {} not found", id)),
        }
    }

    fn delete(&self, id: &str) -> ResponseTemplate {
        let mut instances = self.instances.lock().unwrap();
        let before = instances.len();
        instances.retain(|i| i.get("id") != Some(&json!(id)));
        if instances.len() == before {
            ResponseTemplate::new(404).set_body_string(format!("instance {} not found", id))
        } else {
            ResponseTemplate::new(200).set_body_json(json!({ "removed": id }))
        }
    }
}

impl Respond for FakeRegistry {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path();
        let id = path
            .strip_prefix(INSTANCES)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty());

        match (request.method.as_str(), id) {
            ("GET", None) => {
                let list: Vec<Value> = self
                    .instances
                    .lock()
                    .unwrap()
                    .iter()
                    .cloned()
                    .map(Value::Object)
                    .collect();
                ResponseTemplate::new(200).set_body_json(list)
            }
            ("GET", Some(id)) => match self.instance(id) {
                Some(instance) => ResponseTemplate::new(200).set_body_json(instance),
                None => ResponseTemplate::new(404).set_body_string("not found"),
            },
            ("POST", None) => self.create(&request.body),
            ("PUT", Some(id)) => self.update(id, &request.body),
            ("DELETE", Some(id)) => self.delete(id),
            _ => ResponseTemplate::new(405),
        }
    }
}

/// Start a wiremock server serving a fresh [`FakeRegistry`].
pub async fn start_registry() -> (MockServer, FakeRegistry) {
    let server = MockServer::start().await;
    let registry = FakeRegistry::default();
    Mock::given(path_regex(r"^/api/distribution/instances(/.*)?$"))
        .respond_with(registry.clone())
        .mount(&server)
        .await;
    (server, registry)
}

/// Production repository pointed at `server`.
pub fn repository_for(server: &MockServer) -> DistributionRepository {
    let config = ClientConfig::new()
        .with_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(5));
    DistributionRepository::from_config(&config)
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
