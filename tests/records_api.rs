//! CRUD API integration tests.
//!
//! Drives the event/contact/task/profile routes through the full router,
//! session bridge included, with a cookie-borne session and an in-memory
//! SQLite database. The provider is never called: sessions are fresh
//! enough that the bridge leaves them alone.

use axum::http::header::COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use wiremock::MockServer;

use rolo::config::{
    Config, CookieConfig, DatabaseConfig, ProviderConfig, ServerConfig, StoreBackend, StoreConfig,
};
use rolo::db;
use rolo::models::ProviderSession;
use rolo::{api, AppState};

// ============================================================================
// Test Setup Helpers
// ============================================================================

fn test_config(provider_url: &str, backend: StoreBackend) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        provider: ProviderConfig {
            url: provider_url.trim_end_matches('/').to_string(),
            anon_key: "test-anon-key".to_string(),
        },
        store: StoreConfig {
            backend,
            simulated_latency_ms: 0,
        },
        cookies: CookieConfig { secure: false },
    }
}

async fn build_test_app(backend: StoreBackend) -> (TestServer, AppState, MockServer) {
    let provider = MockServer::start().await;

    let pool = db::init_pool(":memory:").await.expect("test database");
    db::initialize_schema(&pool).await.expect("schema");

    let config = test_config(&provider.uri(), backend);
    let state = AppState::from_parts(&config, pool);

    let app = Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state.clone());

    let server = TestServer::new(app).expect("test server");
    (server, state, provider)
}

/// Cookie header carrying a fresh session for `user_id`.
fn session_for(state: &AppState, user_id: &str) -> HeaderValue {
    let session = ProviderSession {
        access_token: format!("access-{}", user_id),
        refresh_token: "refresh-1".to_string(),
        expires_at: Utc::now().timestamp() + 3600,
        user_id: user_id.to_string(),
        email: None,
    };
    HeaderValue::from_str(&format!(
        "{}={}",
        state.session_cookie_base,
        session.to_cookie_value()
    ))
    .unwrap()
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_crud_routes_require_session() {
    let (server, _state, _provider) = build_test_app(StoreBackend::Sqlite).await;

    server.get("/api/events").await.assert_status_unauthorized();
    server.get("/api/contacts").await.assert_status_unauthorized();
    server.get("/api/tasks").await.assert_status_unauthorized();
    server.get("/api/profile").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;

    let stale = ProviderSession {
        access_token: "access-stale".to_string(),
        refresh_token: "refresh-stale".to_string(),
        expires_at: Utc::now().timestamp() - 600,
        user_id: "user-1".to_string(),
        email: None,
    };
    let header = HeaderValue::from_str(&format!(
        "{}={}",
        state.session_cookie_base,
        stale.to_cookie_value()
    ))
    .unwrap();

    // Refresh fails (no mock mounted) and the session stays expired
    let response = server.get("/api/events").add_header(COOKIE, header).await;
    response.assert_status_unauthorized();
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_event_lifecycle_through_api() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;
    let cookie = session_for(&state, "user-1");

    let created = server
        .post("/api/events")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({
            "title": "RustConf 2026",
            "date": "2026-09-10",
            "location": "Montreal",
            "color_index": 2
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let event: Value = created.json();
    let id = event["id"].as_str().unwrap().to_string();
    assert_eq!(event["title"], "RustConf 2026");
    assert_eq!(event["user_id"], "user-1");

    let fetched = server
        .get(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie.clone())
        .await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["id"], id.as_str());

    let updated = server
        .put(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "title": "RustConf" }))
        .await;
    updated.assert_status_ok();
    let body: Value = updated.json();
    assert_eq!(body["title"], "RustConf");
    assert_eq!(body["date"], "2026-09-10");

    let deleted = server
        .delete(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie.clone())
        .await;
    deleted.assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_event_validation_rejects_empty_title() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;
    let cookie = session_for(&state, "user-1");

    let response = server
        .post("/api/events")
        .add_header(COOKIE, cookie)
        .json(&json!({ "title": "  ", "date": "2026-01-01" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_events_are_not_visible_across_users() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;

    let created = server
        .post("/api/events")
        .add_header(COOKIE, session_for(&state, "user-1"))
        .json(&json!({ "title": "Private dinner", "date": "2026-02-02" }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .get(&format!("/api/events/{}", id))
        .add_header(COOKIE, session_for(&state, "user-2"))
        .await
        .assert_status_not_found();
}

// ============================================================================
// Contacts and Tasks
// ============================================================================

#[tokio::test]
async fn test_contacts_filtered_by_event() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;
    let cookie = session_for(&state, "user-1");

    let event = server
        .post("/api/events")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "title": "Meetup", "date": "2026-05-01" }))
        .await;
    let event_id = event.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .post("/api/contacts")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada Lovelace", "event_id": event_id }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/contacts")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "name": "Grace Hopper" }))
        .await
        .assert_status(StatusCode::CREATED);

    let filtered = server
        .get("/api/contacts")
        .add_query_param("event_id", &event_id)
        .add_header(COOKIE, cookie.clone())
        .await;
    let contacts: Vec<Value> = filtered.json();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["name"], "Ada Lovelace");

    let all: Vec<Value> = server
        .get("/api/contacts")
        .add_header(COOKIE, cookie)
        .await
        .json();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_task_completion_flow() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;
    let cookie = session_for(&state, "user-1");

    let created = server
        .post("/api/tasks")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "title": "Send follow-up email", "due_date": "2026-05-03" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let open: Vec<Value> = server
        .get("/api/tasks")
        .add_query_param("completed", "false")
        .add_header(COOKIE, cookie.clone())
        .await
        .json();
    assert_eq!(open.len(), 1);

    server
        .put(&format!("/api/tasks/{}", id))
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "completed": true }))
        .await
        .assert_status_ok();

    let still_open: Vec<Value> = server
        .get("/api/tasks")
        .add_query_param("completed", "false")
        .add_header(COOKIE, cookie)
        .await
        .json();
    assert!(still_open.is_empty());
}

// ============================================================================
// Memory backend through the same routes
// ============================================================================

#[tokio::test]
async fn test_memory_backend_serves_the_same_api() {
    let (server, state, _provider) = build_test_app(StoreBackend::Memory).await;
    let cookie = session_for(&state, "user-1");

    let created = server
        .post("/api/events")
        .add_header(COOKIE, cookie.clone())
        .json(&json!({ "title": "Demo day", "date": "2026-06-01" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let fetched = server
        .get(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie.clone())
        .await;
    fetched.assert_status_ok();

    server
        .delete(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/events/{}", id))
        .add_header(COOKIE, cookie)
        .await
        .assert_status_not_found();
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_created_on_first_read_and_updatable() {
    let (server, state, _provider) = build_test_app(StoreBackend::Sqlite).await;
    let cookie = session_for(&state, "user-1");

    let first = server.get("/api/profile").add_header(COOKIE, cookie.clone()).await;
    first.assert_status_ok();
    let profile: Value = first.json();
    assert_eq!(profile["user_id"], "user-1");
    assert_eq!(profile["display_name"], Value::Null);

    let updated = server
        .put("/api/profile")
        .add_header(COOKIE, cookie)
        .json(&json!({ "display_name": "Jordan Li", "headline": "Founder" }))
        .await;
    updated.assert_status_ok();
    let body: Value = updated.json();
    assert_eq!(body["display_name"], "Jordan Li");
    assert_eq!(body["headline"], "Founder");
}
