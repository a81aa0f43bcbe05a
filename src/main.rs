//! Belay Learning Platform Server
//!
//! Usage:
//!   cargo run --bin belay_server
//!
//! Environment:
//!   PORT / BELAY_PORT - Server port (default: 8080)
//!   BELAY_HOST        - Server host (default: 0.0.0.0)
//!   BELAY_DB          - SQLite file (default: belay.db)
//!   RUST_LOG          - Log filter (default: info)

use belay_lms::{
    api::{create_router, start_cleanup_task},
    seed, AppConfig, AppState, Mailer, Store, TelemetryCollector, Uploads,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::default();
    info!(
        "⚙️ CONFIG: db={} uploads={} static={} otp_policy={}",
        config.database_path,
        config.upload_dir,
        config.static_dir,
        config.otp_policy.as_str()
    );

    // Wire up shared services
    let store = Store::open(&config.database_path)?;
    let uploads = Uploads::open(&config.upload_dir)?;
    let mailer = Mailer::from_config(&config)?;
    let telemetry = Arc::new(TelemetryCollector::with_config(
        PathBuf::from(&config.telemetry_dir),
        1000,
    ));
    let telemetry_for_shutdown = telemetry.clone();

    // Demo fixtures on an empty database
    if config.demo_seed {
        if let Some(summary) = seed::seed_if_empty(&store, &uploads).await? {
            info!(
                "🌱 Fresh instance seeded: login as {} / {}",
                seed::DEMO_STUDENT_EMAIL,
                seed::DEMO_ADMIN_EMAIL
            );
            let _ = summary;
        }
    }

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = Arc::new(AppState::new(
        config, store, uploads, mailer, telemetry,
    ));

    // Background sweep for stale rate-limit windows
    start_cleanup_task();

    let app = create_router(state);

    info!("🧗 Belay platform starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/auth/login        - Password step (then /v1/auth/otp)");
    info!("  POST /v1/auth/register     - Account registration");
    info!("  GET  /v1/dashboard         - Role-shaped dashboard");
    info!("  GET  /v1/content           - PDFs, videos and quizzes");
    info!("  POST /contact              - Marketing site contact form");
    info!("  GET  /v1/health            - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    println!("{}", stats.usage_summary());

    if let Err(e) = telemetry_for_shutdown.flush() {
        warn!("   ⚠️ Failed to flush event buffer: {}", e);
    }
    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }
    match telemetry_for_shutdown.export_stats_csv() {
        Ok(path) => info!("   ✅ Usage history appended to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to append usage history: {}", e),
    }

    info!("👋 Belay platform shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════╗
    ║                                                  ║
    ║        🧗  B E L A Y   L E A R N I N G  🧗       ║
    ║                                                  ║
    ║            Platform Server v{}                ║
    ║      Courses · Quizzes · Assignments · OTP       ║
    ║                                                  ║
    ╚══════════════════════════════════════════════════╝
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
