//! Demo fixtures
//!
//! An empty database gets two known accounts, three courses with a PDF
//! and a video each, and three quizzes, so a fresh instance is usable
//! without a registration flow or a mail relay. Runs from the server
//! at startup (when `demo_seed` is on) and from the `belay_seed` tool.

use chrono::Utc;
use tracing::info;

use crate::auth::password;
use crate::models::{AppResult, Role};
use crate::store::Store;
use crate::uploads::Uploads;

pub const DEMO_STUDENT_EMAIL: &str = "student@belay.edu";
pub const DEMO_STUDENT_PASSWORD: &str = "student123";
pub const DEMO_ADMIN_EMAIL: &str = "admin@belay.edu";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";

/// What the seeding pass created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub courses: usize,
    pub files: usize,
    pub quizzes: usize,
}

const COURSES: &[(&str, &str, &str, &str)] = &[
    (
        "Knots and Anchors",
        "Figure-eight follow-through, clove hitch and anchor building.",
        "knots_handbook.pdf",
        "knots_walkthrough.mp4",
    ),
    (
        "Belay Fundamentals",
        "PBUS cycle, brake hand discipline and soft catches.",
        "belay_manual.pdf",
        "belay_demo.mp4",
    ),
    (
        "Fall Factors and Forces",
        "Why short falls near the anchor hurt the most.",
        "fall_physics.pdf",
        "fall_factor_lab.mp4",
    ),
];

const QUIZZES: &[(&str, &[&str], &str)] = &[
    (
        "Which knot ties the rope into a harness?",
        &["Figure-eight follow-through", "Clove hitch", "Prusik"],
        "Figure-eight follow-through",
    ),
    (
        "Where does the brake hand go while feeding slack?",
        &["On the rope, below the device", "In your pocket", "On the wall"],
        "On the rope, below the device",
    ),
    (
        "A fall factor of 2 happens when the climber falls...",
        &["Past the belayer with no gear in", "Onto the first bolt", "Onto a top rope"],
        "Past the belayer with no gear in",
    ),
];

/// Seed the demo fixtures if the user table is empty
///
/// Returns `None` when the database already has accounts; seeding
/// never touches existing data.
pub async fn seed_if_empty(store: &Store, uploads: &Uploads) -> AppResult<Option<SeedSummary>> {
    if store.counts().await?.users > 0 {
        return Ok(None);
    }
    seed_demo(store, uploads).await.map(Some)
}

/// Insert the demo accounts, courses and quizzes unconditionally
pub async fn seed_demo(store: &Store, uploads: &Uploads) -> AppResult<SeedSummary> {
    let admin = store
        .create_user(
            "Demo Admin".to_string(),
            DEMO_ADMIN_EMAIL.to_string(),
            password::hash_password(DEMO_ADMIN_PASSWORD),
            Role::Admin,
            None,
        )
        .await?;
    store.mark_verified(admin.id).await?;

    let student = store
        .create_user(
            "Demo Student".to_string(),
            DEMO_STUDENT_EMAIL.to_string(),
            password::hash_password(DEMO_STUDENT_PASSWORD),
            Role::Student,
            None,
        )
        .await?;
    store.mark_verified(student.id).await?;

    let mut files = 0usize;
    for (title, description, pdf, video) in COURSES {
        let course = store
            .create_course(
                title.to_string(),
                description.to_string(),
                admin.id,
                Utc::now(),
            )
            .await?;
        for name in [pdf, video] {
            // Placeholder bytes; real deployments replace these via the
            // admin upload route
            uploads
                .save(name, format!("placeholder for {}\n", name).as_bytes())
                .await?;
            store.append_course_file(course.id, name.to_string()).await?;
            files += 1;
        }
    }

    for (question, options, answer) in QUIZZES {
        store
            .create_quiz(
                question.to_string(),
                options.iter().map(|o| o.to_string()).collect(),
                answer.to_string(),
            )
            .await?;
    }

    let summary = SeedSummary {
        users: 2,
        courses: COURSES.len(),
        files,
        quizzes: QUIZZES.len(),
    };
    info!(
        "🌱 DEMO SEEDED: {} users, {} courses, {} files, {} quizzes",
        summary.users, summary.courses, summary.files, summary.quizzes
    );
    Ok(summary)
}
