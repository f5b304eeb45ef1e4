use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use partner_dispatch::api::rest::router;
use partner_dispatch::config::Config;
use partner_dispatch::engine::timers;
use partner_dispatch::models::partner::Partner;
use partner_dispatch::state::AppState;
use partner_dispatch::storage::memory::MemoryStore;
use partner_dispatch::storage::{self, KeyValueStore, AUTH_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        login_delay: Duration::ZERO,
        demo_seed: false,
        rng_seed: Some(7),
        notification_ttl: Duration::from_secs(60),
        ..Config::default()
    }
}

fn setup_with(config: Config) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config, store.clone()));
    (router(state.clone()), state, store)
}

fn setup() -> axum::Router {
    setup_with(test_config()).0
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login(app: &axum::Router) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/session/login",
            json!({ "username": "delivery123", "password": "delivery123" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn seed_verified_partner(store: &MemoryStore) {
    let partner = Partner {
        full_name: "Ravi Kumar".to_string(),
        mobile: "9876543210".to_string(),
        is_onboarded: true,
        is_verified: true,
        ..Partner::default()
    };
    storage::save_partner(store, &partner).await.unwrap();
}

/// Logs in a verified partner and takes them online.
async fn online_app(config: Config) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let (app, state, store) = setup_with(config);
    seed_verified_partner(&store).await;
    login(&app).await;

    let res = app.clone().oneshot(post_request("/partner/online")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["is_online"], true);

    (app, state, store)
}

async fn generate(app: &axum::Router) -> Value {
    let res = app.clone().oneshot(post_request("/orders/generate")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["pending_request"], false);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("order_requests_total"));
}

#[tokio::test]
async fn invalid_credentials_return_failure_shape() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/session/login",
            json!({ "username": "delivery123", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn blank_credentials_are_rejected_before_login() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/session/login",
            json!({ "username": " ", "password": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Please enter both username and password");
}

#[tokio::test]
async fn login_persists_auth_flag_and_partner() {
    let (app, _state, store) = setup_with(test_config());

    let session = login(&app).await;

    assert_eq!(session["is_authenticated"], true);
    assert_eq!(session["screen"], "onboarding");
    assert_eq!(session["partner"]["id"], "DP001");
    assert_eq!(store.get(AUTH_KEY).await.unwrap().as_deref(), Some("true"));
    assert!(storage::load_partner(store.as_ref()).await.unwrap().is_some());

    let res = app.clone().oneshot(post_request("/session/logout")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(store.get(AUTH_KEY).await.unwrap(), None);

    let res = app.oneshot(get_request("/session")).await.unwrap();
    assert_eq!(body_json(res).await["screen"], "login");
}

#[tokio::test]
async fn onboarding_then_verification_reaches_home() {
    let (app, _state, store) = setup_with(Config {
        verification_delay: Duration::from_secs(60),
        ..test_config()
    });
    login(&app).await;

    let res = app
        .clone()
        .oneshot(post_request("/partner/onboarding/complete"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Full name is required");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/partner",
            json!({
                "full_name": "Ravi Kumar",
                "mobile": "9876543210",
                "vehicle_type": "scooter",
                "vehicle_number": "KA01AB1234",
                "bank_details": {
                    "account_number": "1234567890",
                    "ifsc_code": "HDFC0001234",
                    "account_holder_name": "Ravi Kumar"
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["vehicle_type"], "scooter");

    for (kind, uri) in [
        ("profile_photo", "file:///photo.jpg"),
        ("driving_license", "data:image/jpeg;base64,/9j/4AAQ"),
        ("identity_proof", "file:///aadhaar.jpg"),
    ] {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/partner/documents",
                json!({ "kind": kind, "uri": uri }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app
        .clone()
        .oneshot(post_request("/partner/onboarding/complete"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(get_request("/session")).await.unwrap();
    assert_eq!(body_json(res).await["screen"], "verification_pending");

    let res = app
        .clone()
        .oneshot(post_request("/partner/verification/approve"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get_request("/session")).await.unwrap();
    let session = body_json(res).await;
    assert_eq!(session["screen"], "home");
    assert_eq!(
        session["partner"]["driving_license"],
        "data:image/jpeg;base64,/9j/4AAQ"
    );

    let stored = storage::load_partner(store.as_ref()).await.unwrap().unwrap();
    assert!(stored.is_onboarded);
    assert!(stored.is_verified);
}

#[tokio::test]
async fn verification_is_auto_approved_after_delay() {
    let (app, state, store) = setup_with(Config {
        verification_delay: Duration::from_millis(50),
        ..test_config()
    });
    let partner = Partner {
        full_name: "Ravi Kumar".to_string(),
        mobile: "9876543210".to_string(),
        profile_photo: Some("file:///photo.jpg".to_string()),
        vehicle_number: "KA01AB1234".to_string(),
        driving_license: Some("file:///dl.jpg".to_string()),
        identity_proof: Some("file:///id.jpg".to_string()),
        bank_details: partner_dispatch::models::partner::BankDetails {
            account_number: "1234567890".to_string(),
            ifsc_code: "HDFC0001234".to_string(),
            account_holder_name: "Ravi Kumar".to_string(),
        },
        ..Partner::default()
    };
    storage::save_partner(store.as_ref(), &partner).await.unwrap();
    login(&app).await;

    let res = app
        .clone()
        .oneshot(post_request("/partner/onboarding/complete"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(250)).await;

    let verified = state
        .read(|controller| controller.partner().is_some_and(|p| p.is_verified))
        .await;
    assert!(verified);
}

#[tokio::test]
async fn unverified_partner_cannot_go_online() {
    let app = setup();
    login(&app).await;

    let res = app.oneshot(post_request("/partner/online")).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["error"], "Account not verified yet");
}

#[tokio::test]
async fn offline_partner_gets_no_request() {
    let (app, _state, store) = setup_with(test_config());
    seed_verified_partner(&store).await;
    login(&app).await;

    let offered = generate(&app).await;
    assert!(offered.is_null());

    let res = app.oneshot(get_request("/orders/pending")).await.unwrap();
    assert!(body_json(res).await.is_null());
}

#[tokio::test]
async fn full_delivery_flow() {
    let (app, _state, _store) = online_app(test_config()).await;

    let offered = generate(&app).await;
    assert_eq!(offered["status"], "pending");
    let pin = offered["delivery_pin"].as_str().unwrap().to_string();
    let earnings = offered["estimated_earnings"].as_u64().unwrap();

    let second = generate(&app).await;
    assert!(second.is_null());

    let res = app
        .clone()
        .oneshot(post_request("/orders/pending/accept"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "accepted");

    let res = app
        .clone()
        .oneshot(post_request("/partner/online"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(res).await["error"],
        "Cannot go offline during active delivery"
    );

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/current/status",
            json!({ "status": "picked_up" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    for status in ["reached_restaurant", "picked_up", "reached_customer"] {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/orders/current/status",
                json!({ "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], status);
    }

    let wrong_pin = if pin == "0000" { "1111" } else { "0000" };
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/current/complete",
            json!({ "pin": wrong_pin }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid PIN. Please check with customer.");

    let res = app.clone().oneshot(get_request("/history")).await.unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/current/complete",
            json!({ "pin": pin }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["record"]["outcome"], "delivered");
    assert_eq!(body["record"]["earnings"], earnings);

    let res = app.clone().oneshot(get_request("/orders/current")).await.unwrap();
    assert!(body_json(res).await.is_null());

    let res = app.clone().oneshot(get_request("/history")).await.unwrap();
    let history = body_json(res).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["order_id"], offered["id"]);

    let res = app.clone().oneshot(get_request("/earnings")).await.unwrap();
    let totals = body_json(res).await;
    assert_eq!(totals["today"], earnings);
    assert_eq!(totals["this_week"], earnings);
    assert_eq!(totals["this_month"], earnings);
    assert_eq!(totals["today_deliveries"], 1);

    let res = app.oneshot(get_request("/metrics")).await.unwrap();
    let metrics = body_string(res).await;
    assert!(metrics.contains("order_outcomes_total{outcome=\"delivered\"} 1"));
}

#[tokio::test]
async fn three_rejections_block_partner() {
    let (app, _state, store) = online_app(test_config()).await;

    for reason in ["too_far", "vehicle_issue", "other"] {
        let offered = generate(&app).await;
        assert!(!offered.is_null());

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/orders/pending/reject",
                json!({ "reason": reason }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["success"], true);
    }

    let res = app.clone().oneshot(get_request("/session")).await.unwrap();
    let partner = body_json(res).await["partner"].clone();
    assert_eq!(partner["is_blocked"], true);
    assert_eq!(partner["is_online"], false);
    assert_eq!(partner["rejection_count"], 3);
    assert!(partner["block_ends_at"].is_string());

    assert!(generate(&app).await.is_null());

    let res = app.clone().oneshot(post_request("/partner/online")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(res).await["error"],
        "You are temporarily blocked due to frequent rejections"
    );

    let stored = storage::load_partner(store.as_ref()).await.unwrap().unwrap();
    assert!(stored.is_blocked);

    let res = app.oneshot(get_request("/metrics")).await.unwrap();
    assert!(body_string(res).await.contains("partner_blocks_total 1"));
}

#[tokio::test]
async fn invalid_rejection_reason_returns_failure_shape() {
    let (app, _state, _store) = online_app(test_config()).await;
    assert!(!generate(&app).await.is_null());

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders/pending/reject",
            json!({ "reason": "bored" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let res = app.oneshot(get_request("/orders/pending")).await.unwrap();
    assert!(!body_json(res).await.is_null());
}

#[tokio::test]
async fn malformed_login_body_returns_failure_shape() {
    let app = setup();
    let req = Request::builder()
        .method("POST")
        .uri("/session/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["success"], false);
}

#[tokio::test]
async fn block_monitor_lifts_expired_block() {
    let (app, state, store) = online_app(Config {
        block_duration: Duration::from_secs(1),
        block_poll_interval: Duration::from_secs(1),
        ..test_config()
    })
    .await;

    for _ in 0..3 {
        assert!(!generate(&app).await.is_null());
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/orders/pending/reject",
                json!({ "reason": "too_far" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert!(storage::load_partner(store.as_ref()).await.unwrap().unwrap().is_blocked);

    let monitor = tokio::spawn(timers::run_block_monitor(state.clone()));
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let (blocked, count) = state
        .read(|controller| {
            let partner = controller.partner().unwrap();
            (partner.is_blocked, partner.rejection_count)
        })
        .await;
    assert!(!blocked);
    assert_eq!(count, 0);

    let stored = storage::load_partner(store.as_ref()).await.unwrap().unwrap();
    assert!(!stored.is_blocked);
    assert_eq!(stored.block_ends_at, None);

    state.shutdown.cancel();
    monitor.await.unwrap();
}

fn fast_feed_config() -> Config {
    Config {
        order_delay_min: Duration::from_millis(20),
        order_delay_max: Duration::from_millis(20),
        ..test_config()
    }
}

#[tokio::test]
async fn order_feed_offers_requests_to_online_partner() {
    let (app, state, _store) = online_app(fast_feed_config()).await;

    let feed = tokio::spawn(timers::run_order_feed(state.clone()));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let res = app.oneshot(get_request("/orders/pending")).await.unwrap();
    assert!(!body_json(res).await.is_null());
    assert_eq!(state.request_timers.len(), 1);

    state.shutdown.cancel();
    feed.await.unwrap();
}

#[tokio::test]
async fn order_feed_skips_offline_partner() {
    let (app, state, store) = setup_with(fast_feed_config());
    seed_verified_partner(&store).await;
    login(&app).await;

    let feed = tokio::spawn(timers::run_order_feed(state.clone()));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let res = app.oneshot(get_request("/orders/pending")).await.unwrap();
    assert!(body_json(res).await.is_null());
    assert!(state.request_timers.is_empty());

    state.shutdown.cancel();
    feed.await.unwrap();
}

#[tokio::test]
async fn accept_without_request_fails() {
    let (app, _state, _store) = online_app(test_config()).await;

    let res = app.oneshot(post_request("/orders/pending/accept")).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["error"], "No pending order request");
}

#[tokio::test]
async fn unanswered_request_expires_and_counts() {
    let (app, state, _store) = online_app(Config {
        request_timeout: Duration::from_millis(50),
        ..test_config()
    })
    .await;

    let offered = generate(&app).await;
    assert!(!offered.is_null());

    tokio::time::sleep(Duration::from_millis(250)).await;

    let res = app.clone().oneshot(get_request("/orders/pending")).await.unwrap();
    assert!(body_json(res).await.is_null());

    let count = state
        .read(|controller| controller.partner().map(|p| p.rejection_count))
        .await;
    assert_eq!(count, Some(1));
    assert!(state.request_timers.is_empty());
}

#[tokio::test]
async fn accepted_request_is_not_expired_by_countdown() {
    let (app, state, _store) = online_app(Config {
        request_timeout: Duration::from_millis(50),
        ..test_config()
    })
    .await;

    generate(&app).await;
    let res = app
        .clone()
        .oneshot(post_request("/orders/pending/accept"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(250)).await;

    let (has_current, count) = state
        .read(|controller| {
            (
                controller.current_order().is_some(),
                controller.partner().map(|p| p.rejection_count),
            )
        })
        .await;
    assert!(has_current);
    assert_eq!(count, Some(0));
}

#[tokio::test]
async fn notifications_are_capped_and_dismissable() {
    let (app, _state, store) = setup_with(test_config());
    seed_verified_partner(&store).await;
    login(&app).await;

    // every toggle raises one notification
    for _ in 0..14 {
        let res = app.clone().oneshot(post_request("/partner/online")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.clone().oneshot(get_request("/notifications")).await.unwrap();
    let list = body_json(res).await;
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["message"], "You are now offline.");

    let newest = entries[0]["id"].as_u64().unwrap();
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/notifications/{newest}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/notifications/{newest}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notifications_auto_dismiss() {
    let (app, _state, _store) = online_app(Config {
        notification_ttl: Duration::from_millis(50),
        ..test_config()
    })
    .await;

    let res = app.clone().oneshot(get_request("/notifications")).await.unwrap();
    assert!(!body_json(res).await.as_array().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(250)).await;

    let res = app.oneshot(get_request("/notifications")).await.unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn session_is_restored_from_store() {
    let store = Arc::new(MemoryStore::new());
    seed_verified_partner(&store).await;
    storage::set_authenticated(store.as_ref(), true).await.unwrap();

    let state = Arc::new(AppState::new(test_config(), store.clone()));
    assert!(state.restore_session().await.unwrap());

    let app = router(state);
    let res = app.oneshot(get_request("/session")).await.unwrap();
    let session = body_json(res).await;
    assert_eq!(session["is_authenticated"], true);
    assert_eq!(session["screen"], "home");
    assert_eq!(session["partner"]["full_name"], "Ravi Kumar");
}
