//! Marketing-site contact endpoint and public health routes

mod common;

use belay_lms::seed::{DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD};
use common::{get_json, login_active, post_json, send_raw, spawn_server};
use serde_json::json;

#[tokio::test]
async fn valid_submission_is_stored_and_acknowledged() {
    let server = spawn_server().await;

    let (status, body) = post_json(
        server.addr,
        "/contact",
        &json!({
            "name": "Prospective Climber",
            "email": "prospect@example.com",
            "message": "Do you run beginner courses?"
        }),
        None,
    )
    .await;
    assert_eq!(status, 200);
    // Fixed shape the marketing page switches on, no envelope
    assert_eq!(body["status"], "success");
    assert!(body.get("success").is_none());

    let counts = server.store.counts().await.unwrap();
    assert_eq!(counts.contact_messages, 1);

    // The admin inbox shows the row
    let admin = login_active(server.addr, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await;
    let (status, inbox) = get_json(server.addr, "/v1/contact/messages", Some(&admin)).await;
    assert_eq!(status, 200);
    assert_eq!(inbox["data"]["total"], 1);
    assert_eq!(inbox["data"]["messages"][0]["email"], "prospect@example.com");
}

#[tokio::test]
async fn blank_fields_are_rejected_and_nothing_is_stored() {
    let server = spawn_server().await;

    // Whitespace-only counts as empty
    for payload in [
        json!({"name": "   ", "email": "a@b.c", "message": "hi"}),
        json!({"name": "A", "email": "", "message": "hi"}),
        json!({"name": "A", "email": "a@b.c", "message": "\t\n"}),
    ] {
        let (status, body) = post_json(server.addr, "/contact", &payload, None).await;
        assert_eq!(status, 400, "payload {payload} should be rejected");
        assert_eq!(body["status"], "error");
    }

    let counts = server.store.counts().await.unwrap();
    assert_eq!(counts.contact_messages, 0);
}

#[tokio::test]
async fn malformed_json_gets_the_error_shape() {
    let server = spawn_server().await;

    let (status, _, body) = send_raw(
        server.addr,
        "POST",
        "/contact",
        &[("Content-Type", "application/json")],
        b"{not json",
    )
    .await;
    assert_eq!(status, 400);
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "error");
}

#[tokio::test]
async fn health_endpoints_need_no_session() {
    let server = spawn_server().await;

    for path in ["/health", "/v1/health"] {
        let (status, body) = get_json(server.addr, path, None).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }
}

#[tokio::test]
async fn static_site_serves_as_the_fallback() {
    let server = spawn_server().await;

    let (status, head, body) = send_raw(server.addr, "GET", "/", &[], b"").await;
    assert_eq!(status, 200);
    assert!(head.to_lowercase().contains("text/html"));
    assert!(String::from_utf8_lossy(&body).contains("belay"));
}
