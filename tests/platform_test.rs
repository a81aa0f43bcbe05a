//! Courses, uploads, assignments, quizzes, downloads and role gating

mod common;

use belay_lms::seed::{
    DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD,
};
use common::{
    get_json, login_active, multipart_body, post_json, post_multipart, send_raw, spawn_server,
};
use serde_json::json;

#[tokio::test]
async fn content_regions_match_the_seeded_fixtures() {
    let server = spawn_server().await;
    let token = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;

    let (status, body) = get_json(server.addr, "/v1/content", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["pdfs"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 3);

    let quizzes = body["data"]["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 3);
    for quiz in quizzes {
        assert!(quiz.get("answer").is_none(), "answers must not leak");
        assert!(quiz["options"].as_array().unwrap().len() >= 2);
    }
}

#[tokio::test]
async fn admin_uploads_a_course_and_students_cannot() {
    let server = spawn_server().await;
    let admin = login_active(server.addr, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await;
    let student = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;

    let body = multipart_body(
        &[
            ("title", "Rappelling"),
            ("description", "Friction hitches and backups"),
        ],
        &[
            ("files", "rappel notes.pdf", b"pdf bytes"),
            ("files", "rappel_demo.mp4", b"video bytes"),
        ],
    );
    let (status, response) = post_multipart(server.addr, "/v1/courses", body, &admin).await;
    assert_eq!(status, 200, "upload failed: {response}");

    let stored = response["data"]["stored_files"].as_array().unwrap();
    assert_eq!(stored.len(), 2);
    // Timestamp prefix plus the sanitized original name
    assert!(stored[0].as_str().unwrap().ends_with("_rappel_notes.pdf"));
    assert_eq!(
        response["data"]["course"]["files"].as_array().unwrap().len(),
        2
    );

    // Same request from a student is forbidden
    let body = multipart_body(&[("title", "Nope")], &[]);
    let (status, response) = post_multipart(server.addr, "/v1/courses", body, &student).await;
    assert_eq!(status, 403);
    assert_eq!(response["error"]["code"], "AUTH_FORBIDDEN");

    // Empty title is a validation error
    let body = multipart_body(&[("title", "   ")], &[]);
    let (status, response) = post_multipart(server.addr, "/v1/courses", body, &admin).await;
    assert_eq!(status, 400);
    assert_eq!(response["error"]["code"], "VALIDATION_EMPTY_FIELD");
}

#[tokio::test]
async fn student_submits_an_assignment() {
    let server = spawn_server().await;
    let student = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;
    let admin = login_active(server.addr, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await;

    let (_, courses) = get_json(server.addr, "/v1/courses", Some(&student)).await;
    let course_id = courses["data"]["courses"][0]["id"].as_i64().unwrap();

    let body = multipart_body(&[], &[("assignment", "homework one.pdf", b"my answers")]);
    let (status, response) = post_multipart(
        server.addr,
        &format!("/v1/courses/{course_id}/assignments"),
        body,
        &student,
    )
    .await;
    assert_eq!(status, 200, "submission failed: {response}");
    let stored = response["data"]["stored_as"].as_str().unwrap();
    assert!(stored.ends_with("homework_one.pdf"));
    assert!(stored.contains(&format!("_{course_id}_")));

    // Listed under the caller's submissions
    let (status, mine) = get_json(server.addr, "/v1/assignments/mine", Some(&student)).await;
    assert_eq!(status, 200);
    assert_eq!(mine["data"]["total"], 1);
    assert_eq!(mine["data"]["assignments"][0]["filename"], stored);

    // Admins cannot submit, and the student list is student-only
    let body = multipart_body(&[], &[("assignment", "x.pdf", b"x")]);
    let (status, _) = post_multipart(
        server.addr,
        &format!("/v1/courses/{course_id}/assignments"),
        body,
        &admin,
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = get_json(server.addr, "/v1/assignments/mine", Some(&admin)).await;
    assert_eq!(status, 403);

    // Unknown course
    let body = multipart_body(&[], &[("assignment", "x.pdf", b"x")]);
    let (status, _) =
        post_multipart(server.addr, "/v1/courses/9999/assignments", body, &student).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn quiz_grading_is_trim_and_case_insensitive() {
    let server = spawn_server().await;
    let token = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;

    let (status, body) = get_json(server.addr, "/v1/quizzes", Some(&token)).await;
    assert_eq!(status, 200);
    let quizzes = body["data"]["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 3);
    let first_id = quizzes[0]["id"].as_i64().unwrap();
    let second_id = quizzes[1]["id"].as_i64().unwrap();

    // One correct answer with odd casing and padding, one wrong, one
    // unknown id (ignored), one question unanswered
    let (status, body) = post_json(
        server.addr,
        "/v1/quizzes/submit",
        &json!({"answers": {
            first_id.to_string(): "  FIGURE-EIGHT follow-through ",
            second_id.to_string(): "in your pocket",
            "9999": "whatever",
        }}),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200, "submit failed: {body}");
    assert_eq!(body["data"]["score"], 1);
    // Denominator is the whole bank, not the answered subset
    assert_eq!(body["data"]["total"], 3);

    // The attempt shows up on the student dashboard
    let (_, dashboard) = get_json(server.addr, "/v1/dashboard", Some(&token)).await;
    let results = dashboard["data"]["quiz_results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["score"], 1);
}

#[tokio::test]
async fn downloads_are_authenticated_and_traversal_safe() {
    let server = spawn_server().await;
    let token = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;

    // Seeded course file downloads with attachment disposition
    let (status, head, body) = send_raw(
        server.addr,
        "GET",
        "/v1/uploads/knots_handbook.pdf",
        &[("X-Session-Token", &token)],
        b"",
    )
    .await;
    assert_eq!(status, 200);
    assert!(head.contains("attachment; filename=\"knots_handbook.pdf\""));
    assert!(head.to_lowercase().contains("application/pdf"));
    assert!(!body.is_empty());

    // No session, no file
    let (status, _, _) = send_raw(server.addr, "GET", "/v1/uploads/knots_handbook.pdf", &[], b"").await;
    assert_eq!(status, 401);

    // Traversal attempts collapse to the basename and miss the vault
    let (status, body) = get_json(
        server.addr,
        "/v1/uploads/..%2F..%2Fetc%2Fpasswd",
        Some(&token),
    )
    .await;
    assert_eq!(status, 404, "traversal must not escape: {body}");
}

#[tokio::test]
async fn stats_and_inbox_are_admin_only() {
    let server = spawn_server().await;
    let student = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;
    let admin = login_active(server.addr, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await;

    let (status, _) = get_json(server.addr, "/v1/stats", Some(&student)).await;
    assert_eq!(status, 403);
    let (status, _) = get_json(server.addr, "/v1/contact/messages", Some(&student)).await;
    assert_eq!(status, 403);

    let (status, body) = get_json(server.addr, "/v1/stats", Some(&admin)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["platform"]["users"], 2);
    assert_eq!(body["data"]["platform"]["quizzes"], 3);
    assert!(body["data"]["sessions"]["active"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn chatbot_echoes_with_the_fixed_prefix() {
    let server = spawn_server().await;
    let token = login_active(server.addr, DEMO_STUDENT_EMAIL, DEMO_STUDENT_PASSWORD).await;

    let (status, body) = post_json(
        server.addr,
        "/v1/chatbot",
        &json!({"message": "how do I tie in?"}),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["response"],
        "BelayBot says: You typed 'how do I tie in?'"
    );
}

#[tokio::test]
async fn admin_dashboard_carries_platform_counts() {
    let server = spawn_server().await;
    let admin = login_active(server.addr, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await;

    let (status, body) = get_json(server.addr, "/v1/dashboard", Some(&admin)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["platform"]["courses"], 3);
    assert!(body["data"].get("quiz_results").is_none());
}
