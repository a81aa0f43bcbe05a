//! Telemetry Module for the Belay platform
//!
//! Collects anonymous usage statistics for:
//! - Capacity planning (request volume, latency)
//! - Product insight (which features get used)
//!
//! Privacy-first: no emails, names or message bodies are stored

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Domain events worth counting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UsageKind {
    Login,
    OtpPassed,
    Registration,
    Verification,
    CourseUpload,
    AssignmentSubmission,
    QuizAttempt,
    ContactMessage,
    ChatbotPrompt,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Login => "login",
            UsageKind::OtpPassed => "otp_passed",
            UsageKind::Registration => "registration",
            UsageKind::Verification => "verification",
            UsageKind::CourseUpload => "course_upload",
            UsageKind::AssignmentSubmission => "assignment_submission",
            UsageKind::QuizAttempt => "quiz_attempt",
            UsageKind::ContactMessage => "contact_message",
            UsageKind::ChatbotPrompt => "chatbot_prompt",
        }
    }
}

/// Single usage event (anonymized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unix timestamp
    pub timestamp: u64,
    /// What happened
    pub kind: UsageKind,
    /// Handler latency in milliseconds
    pub latency_ms: u64,
    /// Additional context (no PII: role, score, counts)
    pub context: String,
}

impl UsageEvent {
    pub fn new(kind: UsageKind, latency_ms: u64, context: impl Into<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            kind,
            latency_ms,
            context: context.into(),
        }
    }
}

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsageStats {
    /// Total HTTP requests served
    pub total_requests: u64,
    /// Requests that ended in an error response
    pub total_failures: u64,
    /// Domain events by kind
    pub events_by_kind: HashMap<String, u64>,
    /// Successful logins (highlight metric)
    pub logins: u64,
    /// Average request latency (ms)
    pub avg_latency_ms: f64,
    /// Period start timestamp
    pub period_start: u64,
    /// Period end timestamp
    pub period_end: u64,
}

impl UsageStats {
    /// Shutdown summary for the console
    pub fn usage_summary(&self) -> String {
        let period_hours = (self.period_end.saturating_sub(self.period_start)) / 3600;
        let quiz_attempts = self.events_by_kind.get("quiz_attempt").copied().unwrap_or(0);
        let messages = self
            .events_by_kind
            .get("contact_message")
            .copied()
            .unwrap_or(0);

        format!(
            r#"
╔══════════════════════════════════════════════════════╗
║           🧗 BELAY PLATFORM USAGE REPORT             ║
╠══════════════════════════════════════════════════════╣
║   📊 Period: {} hours                                ║
║   🌐 Requests served:   {:>10}                       ║
║   ⚠️ Failed requests:   {:>10}                       ║
║   🔑 Logins:            {:>10}                       ║
║   📝 Quiz attempts:     {:>10}                       ║
║   ✉️ Contact messages:  {:>10}                       ║
║   ⚡ Avg latency:       {:>10.2}ms                    ║
╚══════════════════════════════════════════════════════╝
"#,
            period_hours,
            self.total_requests,
            self.total_failures,
            self.logins,
            quiz_attempts,
            messages,
            self.avg_latency_ms,
        )
    }

    /// Export as JSON for API
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Export as CSV row
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.2}\n",
            self.period_start,
            self.period_end,
            self.total_requests,
            self.total_failures,
            self.logins,
            self.avg_latency_ms,
        )
    }
}

/// Main telemetry collector
pub struct TelemetryCollector {
    /// Event buffer (in-memory)
    events: Arc<RwLock<Vec<UsageEvent>>>,
    /// Atomic counters for fast updates
    total_requests: AtomicU64,
    total_failures: AtomicU64,
    logins: AtomicU64,
    total_latency_ms: AtomicU64,
    /// Event counters by kind
    kind_counts: Arc<RwLock<HashMap<UsageKind, u64>>>,
    /// Session start time
    session_start: u64,
    /// Export directory
    export_dir: PathBuf,
    /// Max events in memory before flush
    max_buffer_size: usize,
}

impl TelemetryCollector {
    /// Create new collector with default settings
    pub fn new() -> Self {
        Self::with_config(PathBuf::from("./telemetry"), 1000)
    }

    /// Create collector with custom config
    pub fn with_config(export_dir: PathBuf, max_buffer_size: usize) -> Self {
        // Ensure export directory exists
        let _ = fs::create_dir_all(&export_dir);

        Self {
            events: Arc::new(RwLock::new(Vec::with_capacity(max_buffer_size))),
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            kind_counts: Arc::new(RwLock::new(HashMap::new())),
            session_start: current_timestamp(),
            export_dir,
            max_buffer_size,
        }
    }

    /// Record one served request; called from middleware on every response
    pub fn record_request(&self, latency_ms: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Record a domain event from a handler
    pub fn record_event(&self, event: UsageEvent) {
        // Track logins separately (key adoption metric)
        if event.kind == UsageKind::Login {
            self.logins.fetch_add(1, Ordering::Relaxed);
        }

        // Update kind counter
        if let Ok(mut counts) = self.kind_counts.write() {
            *counts.entry(event.kind.clone()).or_insert(0) += 1;
        }

        // Buffer event
        if let Ok(mut events) = self.events.write() {
            events.push(event);

            // Auto-flush if buffer full
            if events.len() >= self.max_buffer_size {
                let events_to_flush = std::mem::take(&mut *events);
                drop(events); // Release lock before I/O
                let _ = self.flush_events(&events_to_flush);
            }
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> UsageStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_failures = self.total_failures.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let logins = self.logins.load(Ordering::Relaxed);

        let avg_latency = if total_requests > 0 {
            total_latency as f64 / total_requests as f64
        } else {
            0.0
        };

        let events_by_kind = self
            .kind_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        UsageStats {
            total_requests,
            total_failures,
            events_by_kind,
            logins,
            avg_latency_ms: avg_latency,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Export current stats to JSON file
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        let stats = self.get_stats();
        let filename = format!("stats_{}.json", current_timestamp());
        let path = self.export_dir.join(filename);

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Export stats to CSV (append mode)
    pub fn export_stats_csv(&self) -> Result<PathBuf, std::io::Error> {
        let stats = self.get_stats();
        let path = self.export_dir.join("usage_history.csv");

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        // Write header if new file
        if file.metadata()?.len() == 0 {
            writeln!(
                file,
                "period_start,period_end,total_requests,total_failures,logins,avg_latency_ms"
            )?;
        }

        write!(file, "{}", stats.to_csv_row())?;

        Ok(path)
    }

    /// Flush any buffered events to disk; called on shutdown
    pub fn flush(&self) -> Result<(), std::io::Error> {
        let events_to_flush = self
            .events
            .write()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default();
        self.flush_events(&events_to_flush)
    }

    /// Flush buffered events to disk
    fn flush_events(&self, events: &[UsageEvent]) -> Result<(), std::io::Error> {
        if events.is_empty() {
            return Ok(());
        }

        let filename = format!("events_{}.jsonl", current_timestamp());
        let path = self.export_dir.join(filename);

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        for event in events {
            if let Ok(json) = serde_json::to_string(event) {
                writeln!(file, "{}", json)?;
            }
        }

        Ok(())
    }

    /// Shutdown report for the console
    pub fn generate_usage_report(&self) -> String {
        let stats = self.get_stats();
        stats.usage_summary()
    }

    /// Reset counters (for new reporting period)
    #[allow(dead_code)]
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.total_failures.store(0, Ordering::Relaxed);
        self.logins.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);

        if let Ok(mut counts) = self.kind_counts.write() {
            counts.clear();
        }

        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
