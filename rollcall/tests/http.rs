//! Request-layer tests that don't need a database: identity extraction,
//! role enforcement and input validation all reject before the first
//! database round trip, so a lazily-connecting pool never dials out.

use axum_test::TestServer;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use rollcall::auth::{ROLES_HEADER, USER_HEADER};
use rollcall::schedule::Policy;
use rollcall::AppState;

fn test_server() -> TestServer {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/rollcall_never_connected")
        .expect("lazy pool");
    let state = AppState {
        db: pool,
        policy: Policy::default(),
    };
    TestServer::new(rollcall::router(state)).expect("router")
}

#[test_log::test(tokio::test)]
async fn requests_without_identity_headers_are_unauthorized() {
    let server = test_server();

    let response = server.get("/api/v1/templates").await;
    response.assert_status_unauthorized();

    let response = server
        .post("/api/v1/reservations")
        .json(&json!({ "instance_id": Uuid::new_v4() }))
        .await;
    response.assert_status_unauthorized();
}

#[test_log::test(tokio::test)]
async fn member_cannot_administer_templates() {
    let server = test_server();

    let response = server
        .post("/api/v1/templates")
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .add_header(ROLES_HEADER, "member")
        .json(&json!({
            "instructor_id": Uuid::new_v4(),
            "name": "Morning HIIT",
            "weekday": "tue",
            "start_time": "18:00:00",
            "end_time": "19:00:00",
            "capacity": 12
        }))
        .await;
    response.assert_status_forbidden();
}

#[test_log::test(tokio::test)]
async fn instructor_role_is_required_for_generation() {
    let server = test_server();

    let response = server
        .post("/api/v1/instances/generate")
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .add_header(ROLES_HEADER, "member")
        .json(&json!({}))
        .await;
    response.assert_status_forbidden();
}

#[test_log::test(tokio::test)]
async fn template_input_is_validated_before_any_query() {
    let server = test_server();
    let manager = Uuid::new_v4().to_string();

    // Zero capacity.
    let response = server
        .post("/api/v1/templates")
        .add_header(USER_HEADER, manager.as_str())
        .add_header(ROLES_HEADER, "manager")
        .json(&json!({
            "instructor_id": Uuid::new_v4(),
            "name": "Spin",
            "weekday": "tue",
            "start_time": "18:00:00",
            "end_time": "19:00:00",
            "capacity": 0
        }))
        .await;
    response.assert_status_bad_request();

    // Inverted time window.
    let response = server
        .post("/api/v1/templates")
        .add_header(USER_HEADER, manager.as_str())
        .add_header(ROLES_HEADER, "manager")
        .json(&json!({
            "instructor_id": Uuid::new_v4(),
            "name": "Spin",
            "weekday": "tue",
            "start_time": "19:00:00",
            "end_time": "18:00:00",
            "capacity": 10
        }))
        .await;
    response.assert_status_bad_request();

    // Rest day.
    let response = server
        .post("/api/v1/templates")
        .add_header(USER_HEADER, manager.as_str())
        .add_header(ROLES_HEADER, "manager")
        .json(&json!({
            "instructor_id": Uuid::new_v4(),
            "name": "Spin",
            "weekday": "sun",
            "start_time": "18:00:00",
            "end_time": "19:00:00",
            "capacity": 10
        }))
        .await;
    response.assert_status_bad_request();
}

#[test_log::test(tokio::test)]
async fn unknown_forwarded_role_is_rejected() {
    let server = test_server();

    let response = server
        .get("/api/v1/instances/upcoming")
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .add_header(ROLES_HEADER, "janitor")
        .await;
    response.assert_status_bad_request();
}

#[test_log::test(tokio::test)]
async fn openapi_document_is_served() {
    let server = test_server();

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let doc: serde_json::Value = response.json();
    assert_eq!(doc["info"]["title"], "rollcall");
    assert!(doc["paths"]["/api/v1/reservations"].is_object());
}
