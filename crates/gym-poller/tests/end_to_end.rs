//! End-to-end scenarios: real API client behind the coordinator, upstream
//! simulated with a mock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::Secret;
use gym_api::{GymApiClient, LOGIN_PATH, build_http_client};
use gym_poller::{Coordinator, PollError, RefreshOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn coordinator(server: &MockServer) -> Coordinator<GymApiClient> {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let client = GymApiClient::with_base_url(
        "member@example.com",
        Secret::new("pw".to_string()),
        http,
        server.uri(),
    );
    Coordinator::new(client, Duration::from_secs(300))
}

fn busyness_body(capacity: u32, status: &str) -> serde_json::Value {
    serde_json::json!({
        "gymLocationId": "G1",
        "gymLocationName": "Test Gym",
        "currentCapacity": capacity,
        "currentPercentage": 41.5,
        "historical": [],
        "status": status,
    })
}

#[tokio::test]
async fn valid_credentials_yield_observables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"uuid": "U1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/np/thegymgroup/v1.0/exerciser/U1/gym-busyness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(busyness_body(50, "open")))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    let snapshot = coordinator.first_refresh().await.unwrap();

    // The two observables map straight off the payload
    assert_eq!(snapshot.current_capacity, 50);
    assert_eq!(snapshot.status, "open");
    assert_eq!(snapshot.gym_location_id, "G1");
    assert_eq!(coordinator.snapshot(), Some(snapshot));

    let health = coordinator.health().await;
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn expired_session_recovers_within_one_refresh() {
    let server = MockServer::start().await;

    // First login issues U1, the re-login after expiry issues U2
    let logins = Arc::new(AtomicUsize::new(0));
    let logins_clone = logins.clone();
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            let n = logins_clone.fetch_add(1, Ordering::SeqCst);
            let uuid = if n == 0 { "U1" } else { "U2" };
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "uuid": uuid }))
        })
        .expect(2)
        .mount(&server)
        .await;

    // The U1 session is already expired server-side; U2 works
    Mock::given(method("GET"))
        .and(path("/np/thegymgroup/v1.0/exerciser/U1/gym-busyness"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/np/thegymgroup/v1.0/exerciser/U2/gym-busyness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(busyness_body(42, "open")))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    let outcome = coordinator.refresh().await;

    match outcome {
        RefreshOutcome::Success(snapshot) => assert_eq!(snapshot.current_capacity, 42),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_relogin_surfaces_auth_failure_and_keeps_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"uuid": "U1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/np/thegymgroup/v1.0/exerciser/U1/gym-busyness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(busyness_body(50, "open")))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    coordinator.first_refresh().await.unwrap();

    // From here on the session is dead and the credentials are rejected
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/np/thegymgroup/v1.0/exerciser/U1/gym-busyness"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = coordinator.refresh().await;
    assert!(
        matches!(outcome, RefreshOutcome::AuthFailure(_)),
        "got {outcome:?}"
    );

    // The stale snapshot stays available to readers
    assert_eq!(
        coordinator.snapshot().map(|s| s.current_capacity),
        Some(50)
    );
    let health = coordinator.health().await;
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn first_refresh_failure_is_a_setup_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    let err = coordinator.first_refresh().await.unwrap_err();
    assert!(matches!(err, PollError::Transient(_)), "got: {err}");
    assert_eq!(coordinator.snapshot(), None);
}
