//! Belay Seed Tool
//!
//! Bootstraps the schema and inserts the demo fixtures into the
//! configured database, without starting the server.
//!
//! Usage:
//!   cargo run --bin belay_seed
//!
//! Environment:
//!   BELAY_DB         - SQLite file (default: belay.db)
//!   BELAY_UPLOAD_DIR - Upload directory (default: uploads)

use belay_lms::{seed, AppConfig, Store, Uploads};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::default();
    info!(
        "🌱 Seeding {} (uploads in {})",
        config.database_path, config.upload_dir
    );

    let store = Store::open(&config.database_path)?;
    let uploads = Uploads::open(&config.upload_dir)?;

    match seed::seed_if_empty(&store, &uploads).await? {
        Some(summary) => {
            info!(
                "✅ Seeded {} users, {} courses ({} files), {} quizzes",
                summary.users, summary.courses, summary.files, summary.quizzes
            );
            info!(
                "   Demo logins: {} / {} and {} / {}",
                seed::DEMO_STUDENT_EMAIL,
                seed::DEMO_STUDENT_PASSWORD,
                seed::DEMO_ADMIN_EMAIL,
                seed::DEMO_ADMIN_PASSWORD
            );
        }
        None => {
            info!("📭 Database already has accounts; nothing to do");
        }
    }

    Ok(())
}
