//! Shared integration-test harness: spawns the real server on an
//! ephemeral port and drives it over raw TCP.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use belay_lms::{
    create_router, seed, AppConfig, AppState, Mailer, OtpPolicy, Store, TelemetryCollector,
    Uploads,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub struct TestServer {
    pub addr: SocketAddr,
    /// Direct database handle for assertions the API does not expose
    pub store: Store,
    _dir: TempDir,
}

/// Spawn a seeded server on 127.0.0.1:0 with everything under a tempdir
pub async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let upload_dir = dir.path().join("uploads");
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).expect("static dir");
    std::fs::write(static_dir.join("index.html"), "<html>belay</html>").expect("index");

    let mut config = AppConfig::default();
    config.database_path = db_path.to_string_lossy().into_owned();
    config.upload_dir = upload_dir.to_string_lossy().into_owned();
    config.static_dir = static_dir.to_string_lossy().into_owned();
    config.telemetry_dir = dir.path().join("telemetry").to_string_lossy().into_owned();
    config.otp_policy = OtpPolicy::LengthOnly;
    config.session_ttl = Duration::from_secs(3600);
    config.pending_ttl = Duration::from_secs(300);
    config.max_upload_bytes = 1024 * 1024;
    config.mail_relay_url = None;

    let store = Store::open(&config.database_path).expect("open store");
    let uploads = Uploads::open(&config.upload_dir).expect("open uploads");
    seed::seed_demo(&store, &uploads).await.expect("seed demo");

    let telemetry = Arc::new(TelemetryCollector::with_config(
        dir.path().join("telemetry"),
        1000,
    ));
    let mailer = Mailer::log_only("no-reply@belay.test");
    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        uploads,
        mailer,
        telemetry,
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestServer {
        addr,
        store,
        _dir: dir,
    }
}

/// Send one request and return (status, response head, body bytes)
pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> (u16, String, Vec<u8>) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");

    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        req.push_str(&format!("{name}: {value}\r\n"));
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    stream.write_all(req.as_bytes()).await.expect("write head");
    stream.write_all(body).await.expect("write body");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");

    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response separator");
    let head = String::from_utf8_lossy(&response[..split]).into_owned();
    let mut body = response[split + 4..].to_vec();
    if head
        .lines()
        .any(|l| l.to_ascii_lowercase().starts_with("transfer-encoding:") && l.contains("chunked"))
    {
        body = decode_chunked(&body);
    }

    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head, body)
}

/// GET with optional session token, JSON body out
pub async fn get_json(
    addr: SocketAddr,
    path: &str,
    token: Option<&str>,
) -> (u16, serde_json::Value) {
    let mut headers = vec![("Accept", "application/json")];
    if let Some(token) = token {
        headers.push(("X-Session-Token", token));
    }
    let (status, _, body) = send_raw(addr, "GET", path, &headers, b"").await;
    (status, parse_body(&body))
}

/// POST a JSON payload with optional session token
pub async fn post_json(
    addr: SocketAddr,
    path: &str,
    payload: &serde_json::Value,
    token: Option<&str>,
) -> (u16, serde_json::Value) {
    let body = payload.to_string();
    let mut headers = vec![("Content-Type", "application/json")];
    if let Some(token) = token {
        headers.push(("X-Session-Token", token));
    }
    let (status, _, body) = send_raw(addr, "POST", path, &headers, body.as_bytes()).await;
    (status, parse_body(&body))
}

/// Reassemble a chunked transfer-encoded body into its payload bytes
fn decode_chunked(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = raw;
    loop {
        let Some(line_end) = rest.windows(2).position(|w| w == b"\r\n") else {
            break;
        };
        let size_line = String::from_utf8_lossy(&rest[..line_end]);
        let size = usize::from_str_radix(size_line.trim().split(';').next().unwrap_or(""), 16)
            .unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = start + size;
        if end > rest.len() {
            break;
        }
        out.extend_from_slice(&rest[start..end]);
        rest = &rest[(end + 2).min(rest.len())..];
    }
    out
}

fn parse_body(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap_or(serde_json::Value::Null)
}

pub const BOUNDARY: &str = "----belay-test-boundary";

/// Build a multipart/form-data body from text fields and files
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart body with a session token
pub async fn post_multipart(
    addr: SocketAddr,
    path: &str,
    body: Vec<u8>,
    token: &str,
) -> (u16, serde_json::Value) {
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    let headers = vec![
        ("Content-Type", content_type.as_str()),
        ("X-Session-Token", token),
    ];
    let (status, _, body) = send_raw(addr, "POST", path, &headers, &body).await;
    (status, parse_body(&body))
}

/// Run the full password + OTP flow and return an active token
pub async fn login_active(addr: SocketAddr, email: &str, password: &str) -> String {
    let (status, body) = post_json(
        addr,
        "/v1/auth/login",
        &serde_json::json!({"email": email, "password": password}),
        None,
    )
    .await;
    assert_eq!(status, 200, "login failed: {body}");
    let token = body["data"]["token"].as_str().expect("token").to_string();

    let (status, body) = post_json(
        addr,
        "/v1/auth/otp",
        &serde_json::json!({"token": token, "code": "123456"}),
        None,
    )
    .await;
    assert_eq!(status, 200, "otp failed: {body}");
    token
}
