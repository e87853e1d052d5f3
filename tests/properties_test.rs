//! End-to-end behaviour of the synchronizer, mutations and setup workflow
//! against a stateful fake backend.

mod common;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use distsync::channel::{ChangeEvent, NotificationChannel};
use distsync::error::DistError;
use distsync::models::{AuthCredentials, AuthMode, DistributionProvider, InstancePayload};
use distsync::mutation::{MutationController, MutationKind};
use distsync::setup::{SetupMode, SetupWorkflow};
use distsync::sync::{InstanceSynchronizer, RefreshOutcome};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{repository_for, start_registry, wait_until};

const SLOW: Duration = Duration::from_secs(3600);

fn seed_instance(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "endpoint": format!("https://{}:9090", name),
        "description": "seeded",
        "status": "Healthy",
        "enabled": true,
        "provider": "dragonfly",
        "auth_mode": "BASIC",
        "auth_data": { "username": "admin", "password": "secret" }
    })
}

#[tokio::test]
async fn test_concurrent_triggers_issue_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/distribution/instances"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": "1", "name": "a" }]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let sync = InstanceSynchronizer::new(repository_for(&server), NotificationChannel::new(), SLOW);
    assert!(sync.trigger());
    for _ in 0..4 {
        assert!(!sync.trigger());
    }
    assert_eq!(sync.refresh().await, RefreshOutcome::Coalesced);

    wait_until(|| sync.total_count() == 1).await;
    assert!(!sync.is_in_flight());

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(sync.stats().coalesced, 5);
    assert_eq!(sync.stats().fetches, 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/distribution/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "a" },
            { "id": "2", "name": "b" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/distribution/instances"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let sync = InstanceSynchronizer::new(repository_for(&server), NotificationChannel::new(), SLOW);

    assert_eq!(sync.refresh().await, RefreshOutcome::Replaced { total: 2 });
    let before = sync.snapshot();

    assert_eq!(sync.refresh().await, RefreshOutcome::Failed);
    assert_eq!(sync.snapshot(), before);
    assert_eq!(sync.total_count(), 2);
    assert!(!sync.is_in_flight());
    assert_eq!(sync.stats().failures, 1);
}

#[tokio::test]
async fn test_create_is_visible_after_notified_refresh() {
    let (server, registry) = start_registry().await;
    let channel = NotificationChannel::new();
    let sync = InstanceSynchronizer::new(repository_for(&server), channel.clone(), SLOW);
    let controller = MutationController::new(repository_for(&server), channel);

    assert_eq!(sync.refresh().await, RefreshOutcome::Replaced { total: 0 });

    let payload = InstancePayload::new(
        "df-east",
        "https://df-east:9090",
        AuthCredentials::basic("admin", "secret"),
    )
    .with_provider("dragonfly");
    let outcome = controller.create(&payload).await.unwrap();

    assert_eq!(outcome.kind, MutationKind::Create);
    assert_eq!(outcome.instance_id.as_deref(), Some("1"));
    assert_eq!(registry.len(), 1);

    wait_until(|| sync.total_count() == 1).await;
    let created = sync.get("1").unwrap();
    assert_eq!(created.name, "df-east");
    assert_eq!(created.endpoint, "https://df-east:9090");
    assert_eq!(created.auth_mode, AuthMode::Basic);
    assert_eq!(
        created.credentials().unwrap(),
        AuthCredentials::basic("admin", "secret")
    );
    assert!(created.is_healthy());
}

#[tokio::test]
async fn test_disable_changes_only_enabled() {
    let (server, registry) = start_registry().await;
    let id = registry.seed(seed_instance("df-east"));
    let before = registry.instance(&id).unwrap();

    let controller = MutationController::new(repository_for(&server), NotificationChannel::new());
    let outcome = controller.disable(&id).await.unwrap();

    assert_eq!(outcome.kind, MutationKind::Disable);
    assert_eq!(outcome.message, format!("Instance {} disabled", id));

    let mut expected = before;
    expected["enabled"] = json!(false);
    assert_eq!(registry.instance(&id).unwrap(), expected);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "enabled": false }));
}

#[tokio::test]
async fn test_delete_then_refresh_drops_instance() {
    let (server, registry) = start_registry().await;
    let keep = registry.seed(seed_instance("df-east"));
    let gone = registry.seed(seed_instance("df-west"));

    let channel = NotificationChannel::new();
    let sync = InstanceSynchronizer::new(repository_for(&server), channel.clone(), SLOW);
    let controller = MutationController::new(repository_for(&server), channel);

    assert_eq!(sync.refresh().await, RefreshOutcome::Replaced { total: 2 });

    controller.delete(&gone).await.unwrap();

    wait_until(|| sync.total_count() == 1).await;
    assert!(sync.get(&gone).is_none());
    assert!(sync.get(&keep).is_some());
}

#[tokio::test]
async fn test_failed_mutation_publishes_nothing() {
    let (server, _registry) = start_registry().await;
    let channel = NotificationChannel::new();
    let events = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&events);
    channel.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let controller = MutationController::new(repository_for(&server), channel);
    let err = controller.delete("404").await.unwrap_err();

    assert!(matches!(err, DistError::Protocol(_)));
    assert_eq!(events.load(Ordering::SeqCst), 0);
}

#[test]
fn test_channel_fans_out_and_unsubscribes() {
    let channel = NotificationChannel::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&seen);
    let a = channel.subscribe(move |tag| first.lock().unwrap().push(format!("a:{}", tag)));
    let second = Arc::clone(&seen);
    let _b = channel.subscribe_events(move |event| {
        second.lock().unwrap().push(format!("b:{}", event.as_str()))
    });

    assert_eq!(channel.publish_event(ChangeEvent::Created), 2);
    assert!(channel.unsubscribe(a));
    assert!(!channel.unsubscribe(a));
    assert_eq!(channel.publish_event(ChangeEvent::Deleted), 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen.contains(&"a:created".to_string()));
    assert!(seen.contains(&"b:created".to_string()));
    assert!(seen.contains(&"b:deleted".to_string()));
    assert!(!seen.contains(&"a:deleted".to_string()));
}

#[tokio::test]
async fn test_oauth_with_basic_fields_is_rejected_locally() {
    let (server, registry) = start_registry().await;
    let controller = MutationController::new(repository_for(&server), NotificationChannel::new());
    let mut workflow = SetupWorkflow::new(controller);

    workflow.open_for_create(Some(DistributionProvider {
        id: "dragonfly".to_string(),
        name: "Dragonfly".to_string(),
        auth_mode: Some(AuthMode::OAuth),
        ..Default::default()
    }));
    workflow.set_auth_mode(workflow.effective_auth_mode()).unwrap();
    {
        let form = workflow.working_copy_mut().unwrap();
        form.name = "df-east".to_string();
        form.endpoint = "https://df-east:9090".to_string();
        form.auth_data = BTreeMap::from([
            ("username".to_string(), "admin".to_string()),
            ("password".to_string(), "secret".to_string()),
        ]);
    }

    let err = workflow.submit().await.unwrap_err();

    assert!(err.is_validation());
    assert!(workflow.is_open());
    assert_eq!(registry.len(), 0);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_setup_create_then_edit_round_trip() {
    let (server, registry) = start_registry().await;
    let channel = NotificationChannel::new();
    let sync = InstanceSynchronizer::new(repository_for(&server), channel.clone(), SLOW);
    let controller = MutationController::new(repository_for(&server), channel);
    let mut workflow = SetupWorkflow::new(controller);

    workflow.open_for_create(Some(DistributionProvider {
        id: "kraken".to_string(),
        name: "Kraken".to_string(),
        ..Default::default()
    }));
    assert_eq!(workflow.effective_auth_mode(), AuthMode::Basic);
    {
        let form = workflow.working_copy_mut().unwrap();
        form.name = "kraken-west".to_string();
        form.endpoint = "http://kraken:8080".to_string();
        form.auth_data.insert("username".to_string(), "admin".to_string());
        form.auth_data.insert("password".to_string(), "secret".to_string());
    }

    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.mode, SetupMode::Create);
    assert!(!workflow.is_open());

    wait_until(|| sync.total_count() == 1).await;
    let id = receipt.outcome.instance_id.unwrap();
    let stored = sync.get(&id).unwrap();
    assert_eq!(stored.provider_kind(), Some("kraken"));

    workflow.open_for_edit(stored);
    workflow.set_auth_mode(AuthMode::OAuth).unwrap();
    {
        let form = workflow.working_copy_mut().unwrap();
        form.description = Some("moved to oauth".to_string());
        form.auth_data.insert("token".to_string(), "t0ken".to_string());
    }
    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.mode, SetupMode::Edit);

    let raw = registry.instance(&id).unwrap();
    assert_eq!(raw["auth_mode"], json!("OAUTH"));
    assert_eq!(raw["auth_data"], json!({ "token": "t0ken" }));
    assert_eq!(raw["description"], json!("moved to oauth"));

    // The update notification may have landed while the create fetch was
    // still settling; one explicit refresh covers that.
    wait_until(|| !sync.is_in_flight()).await;
    sync.refresh().await;
    wait_until(|| {
        sync.get(&id)
            .is_some_and(|instance| instance.auth_mode == AuthMode::OAuth)
    })
    .await;
}
