use pushlink_sdk::channel::mock::{MockChannel, MockProvider};
use pushlink_sdk::launcher::mock::RecordingLauncher;
use pushlink_sdk::{
    ChannelController, ChannelEvent, ChannelProvider, ChannelState, DeviceInfo, PushChannel,
    PushEvent, SdkConfig, StartPushSlot,
};
use pushlink_proto::RequestClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_device() -> DeviceInfo {
    DeviceInfo {
        hwid: "AB12CD34EF56AB12CD34EF56AB12CD34".to_string(),
        os_version: "8.0".to_string(),
        device_model: "Test Device".to_string(),
        language: "en".to_string(),
        timezone_offset_secs: 3600.0,
    }
}

struct Harness {
    controller: ChannelController,
    events: UnboundedReceiver<PushEvent>,
    start_push: Arc<StartPushSlot>,
    launcher: Arc<RecordingLauncher>,
}

fn harness(server: &MockServer, provider: Arc<dyn ChannelProvider>) -> Harness {
    let config = SdkConfig::new("APP-1").with_host(format!("{}/", server.uri()));
    let client = RequestClient::new(config.request_base());
    let launcher = RecordingLauncher::new();
    let start_push = Arc::new(StartPushSlot::new());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let controller = ChannelController::new(
        client,
        config,
        test_device(),
        provider,
        launcher.clone(),
        start_push.clone(),
        tx,
    );

    Harness {
        controller,
        events: rx,
        start_push,
        launcher,
    }
}

async fn mount_ok(server: &MockServer, endpoint: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/json/1.3/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .mount(server)
        .await;
}

async fn next_event(events: &mut UnboundedReceiver<PushEvent>) -> PushEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

// ── Subscribe: create path ──────────────────────────────────────

#[tokio::test]
async fn subscribe_creates_channel_and_registers_on_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/registerDevice"))
        .and(body_partial_json(json!({"request": {
            "application": "APP-1",
            "device_type": 5,
            "push_token": "https://push.example/ch/1",
            "language": "en",
            "timezone": 3600.0
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());

    h.controller.subscribe().await.unwrap();
    assert_eq!(h.controller.state(), ChannelState::Opening);

    let created = provider.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].open_calls(), 1);

    created[0].emit(ChannelEvent::UriUpdated(
        "https://push.example/ch/1".to_string(),
    ));

    assert_eq!(
        next_event(&mut h.events).await,
        PushEvent::TokenReceived("https://push.example/ch/1".to_string())
    );
    assert_eq!(h.controller.state(), ChannelState::Open);
    assert_eq!(h.controller.push_token(), "https://push.example/ch/1");
}

#[tokio::test]
async fn uri_update_triggers_idempotent_binding() {
    let server = MockServer::start().await;
    mount_ok(&server, "registerDevice").await;

    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    let channel = provider.created()[0].clone();
    channel.emit(ChannelEvent::UriUpdated("uri-1".to_string()));
    next_event(&mut h.events).await;

    // Binding happens after the token event; give the loop a beat.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(channel.is_toast_bound());
    assert!(channel.is_tile_bound());

    // A second URI update re-registers but skips the already-bound bindings.
    channel.emit(ChannelEvent::UriUpdated("uri-2".to_string()));
    next_event(&mut h.events).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(channel.toast_bind_calls(), 1);
    assert_eq!(channel.tile_bind_calls(), 1);
}

#[tokio::test]
async fn binding_failure_is_not_fatal() {
    let server = MockServer::start().await;
    mount_ok(&server, "registerDevice").await;

    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    let channel = provider.created()[0].clone();
    channel.fail_toast_bind();
    channel.emit(ChannelEvent::UriUpdated("uri-1".to_string()));

    // Registration still succeeds and the tile binding still happens.
    assert_eq!(
        next_event(&mut h.events).await,
        PushEvent::TokenReceived("uri-1".to_string())
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!channel.is_toast_bound());
    assert!(channel.is_tile_bound());
}

#[tokio::test]
async fn registration_failure_emits_token_failed_with_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/registerDevice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 210,
            "status_message": "Application not found"
        })))
        .mount(&server)
        .await;

    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    provider.created()[0].emit(ChannelEvent::UriUpdated("uri-1".to_string()));

    assert_eq!(
        next_event(&mut h.events).await,
        PushEvent::TokenFailed("Application not found".to_string())
    );
}

// ── Subscribe: reuse path ───────────────────────────────────────

#[tokio::test]
async fn subscribe_reuses_existing_channel_without_opening() {
    let server = MockServer::start().await;
    mount_ok(&server, "registerDevice").await;

    let existing = MockChannel::new();
    let provider = MockProvider::with_existing(existing.clone());
    let h = harness(&server, provider);

    h.controller.subscribe().await.unwrap();

    assert_eq!(existing.open_calls(), 0);
    assert_eq!(h.controller.state(), ChannelState::Opening);
}

#[tokio::test]
async fn reused_channel_with_uri_registers_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/registerDevice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let existing = MockChannel::with_uri("uri-existing");
    let provider = MockProvider::with_existing(existing);
    let mut h = harness(&server, provider);

    h.controller.subscribe().await.unwrap();

    assert_eq!(
        next_event(&mut h.events).await,
        PushEvent::TokenReceived("uri-existing".to_string())
    );
    assert_eq!(h.controller.push_token(), "uri-existing");
}

#[tokio::test]
async fn second_subscribe_is_a_noop() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let h = harness(&server, provider.clone());

    h.controller.subscribe().await.unwrap();
    h.controller.subscribe().await.unwrap();

    assert_eq!(provider.created().len(), 1);
}

// ── Channel errors ──────────────────────────────────────────────

#[tokio::test]
async fn channel_error_emits_token_failed_and_keeps_channel() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    let channel = provider.created()[0].clone();
    channel.emit(ChannelEvent::Error("channel quota exceeded".to_string()));

    assert_eq!(
        next_event(&mut h.events).await,
        PushEvent::TokenFailed("channel quota exceeded".to_string())
    );
    assert_eq!(h.controller.state(), ChannelState::Error);
    assert!(!channel.is_closed());
}

// ── Toast handling ──────────────────────────────────────────────

#[tokio::test]
async fn toast_reports_statistic_and_emits_push_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/pushStat"))
        .and(body_partial_json(json!({"request": {"hash": "H42"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    provider.created()[0].emit(ChannelEvent::ToastReceived(
        "?content=Hello&p=H42&u=extra".to_string(),
    ));

    match next_event(&mut h.events).await {
        PushEvent::PushAccepted(push) => {
            assert_eq!(push.content, "Hello");
            assert_eq!(push.hash, "H42");
            assert!(!push.on_start);
        }
        other => panic!("expected PushAccepted, got {other:?}"),
    }

    assert_eq!(h.controller.last_push_content(), "Hello");
    assert_eq!(h.controller.user_data(), "extra");
    assert!(h.launcher.opened().is_empty());

    // Let the detached statistic land before the mock server verifies.
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn toast_with_url_launches_it() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    provider.created()[0].emit(ChannelEvent::ToastReceived(
        "?content=A&l=http%3A%2F%2Fx.test".to_string(),
    ));
    next_event(&mut h.events).await;

    let opened = h.launcher.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].as_str(), "http://x.test/");
}

#[tokio::test]
async fn toast_with_html_id_launches_backend_content_page() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    provider.created()[0].emit(ChannelEvent::ToastReceived("?content=A&h=3".to_string()));
    next_event(&mut h.events).await;

    let opened = h.launcher.opened();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].as_str().ends_with("/content/3"));
}

#[tokio::test]
async fn toast_without_content_reference_launches_nothing() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let mut h = harness(&server, provider.clone());
    h.controller.subscribe().await.unwrap();

    provider.created()[0].emit(ChannelEvent::ToastReceived("?content=A&p=H".to_string()));

    assert!(matches!(
        next_event(&mut h.events).await,
        PushEvent::PushAccepted(_)
    ));
    assert!(h.launcher.opened().is_empty());
}

// ── Start push replay ───────────────────────────────────────────

#[tokio::test]
async fn start_push_is_replayed_exactly_once() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let mut h = harness(&server, provider);

    h.start_push.set("?content=Launch&p=LP");

    h.controller.subscribe().await.unwrap();
    match next_event(&mut h.events).await {
        PushEvent::PushAccepted(push) => {
            assert_eq!(push.content, "Launch");
            assert!(push.on_start);
        }
        other => panic!("expected PushAccepted, got {other:?}"),
    }

    // Second subscribe: the slot is empty, nothing is replayed.
    h.controller.subscribe().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.events.try_recv().is_err());
    assert!(!h.start_push.is_pending());
}

// ── Unsubscribe ─────────────────────────────────────────────────

#[tokio::test]
async fn unsubscribe_clears_token_and_notifies_backend() {
    let server = MockServer::start().await;
    mount_ok(&server, "registerDevice").await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/unregisterDevice"))
        .and(body_partial_json(json!({"request": {"application": "APP-1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let existing = MockChannel::with_uri("uri-1");
    let provider = MockProvider::with_existing(existing.clone());
    let mut h = harness(&server, provider);

    h.controller.subscribe().await.unwrap();
    next_event(&mut h.events).await;
    assert_eq!(h.controller.push_token(), "uri-1");

    h.controller.unsubscribe().await.unwrap();

    assert_eq!(h.controller.push_token(), "");
    assert_eq!(h.controller.state(), ChannelState::Closed);
    assert!(existing.is_closed());
    assert!(!existing.is_toast_bound());
    assert!(!existing.is_tile_bound());
}

#[tokio::test]
async fn unsubscribe_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_ok(&server, "registerDevice").await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/unregisterDevice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let existing = MockChannel::with_uri("uri-1");
    let provider = MockProvider::with_existing(existing);
    let mut h = harness(&server, provider);

    h.controller.subscribe().await.unwrap();
    next_event(&mut h.events).await;

    h.controller.unsubscribe().await.unwrap();
    // Second call: no channel, no second backend notification, no error.
    h.controller.unsubscribe().await.unwrap();
}

#[tokio::test]
async fn unsubscribe_without_subscribe_is_a_noop() {
    let server = MockServer::start().await;
    let provider = MockProvider::new();
    let h = harness(&server, provider);

    h.controller.unsubscribe().await.unwrap();
    assert_eq!(h.controller.state(), ChannelState::Closed);
}

#[tokio::test]
async fn late_registration_success_cannot_resurrect_token() {
    let server = MockServer::start().await;
    // Registration answers slowly; unsubscription lands in between.
    Mock::given(method("POST"))
        .and(path("/json/1.3/registerDevice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status_code": 200, "status_message": "OK"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/json/1.3/unregisterDevice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 200,
            "status_message": "OK"
        })))
        .mount(&server)
        .await;

    let existing = MockChannel::with_uri("uri-1");
    let provider = MockProvider::with_existing(existing);
    let mut h = harness(&server, provider);

    let controller = h.controller.clone();
    let subscribe = tokio::spawn(async move { controller.subscribe().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    h.controller.unsubscribe().await.unwrap();

    let _ = subscribe.await;

    // The late success is discarded: no token event, token stays cleared.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(h.events.try_recv().is_err());
    assert_eq!(h.controller.push_token(), "");
}
