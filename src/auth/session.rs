//! In-Memory Session Store
//!
//! Thread-safe token store for the two-phase login flow. DashMap keeps
//! concurrent handlers off a global lock.
//!
//! Lifecycle:
//! - login issues a `PendingOtp` session with a short TTL
//! - a correct OTP promotes it to `Active` and restarts the clock with
//!   the full session TTL
//! - logout removes it; expiry is lazy on read plus a periodic sweep

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AppError, AppResult, Role};

/// Where a session sits in the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Password accepted, OTP still outstanding
    PendingOtp,
    /// OTP passed; full access for the session TTL
    Active,
}

/// One issued session token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub state: SessionState,
    /// Code issued at login under the `Issued` OTP policy
    pub otp_code: Option<String>,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl
            .as_secs()
            .saturating_sub(self.created_at.elapsed().as_secs())
    }
}

/// Token-keyed session storage shared across handlers
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<DashMap<String, Session>>,
    /// TTL after OTP promotion
    active_ttl: Duration,
    /// TTL between login and OTP
    pending_ttl: Duration,
    issued: Arc<AtomicU64>,
    expired: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new(active_ttl: Duration, pending_ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            active_ttl,
            pending_ttl,
            issued: Arc::new(AtomicU64::new(0)),
            expired: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue a pending session after a successful password check
    pub fn begin(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
        otp_code: Option<String>,
    ) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            email: email.to_string(),
            role,
            state: SessionState::PendingOtp,
            otp_code,
            created_at: Instant::now(),
            ttl: self.pending_ttl,
        };
        self.store.insert(session.token.clone(), session.clone());
        self.issued.fetch_add(1, Ordering::Relaxed);
        info!(
            "🔑 SESSION PENDING: user={} role={} (TTL: {}s)",
            user_id,
            role.as_str(),
            self.pending_ttl.as_secs()
        );
        session
    }

    /// Look up a pending session for the OTP step
    pub fn get_pending(&self, token: &str) -> AppResult<Session> {
        let entry = self.store.get(token).ok_or_else(AppError::session_missing)?;
        if entry.is_expired() {
            drop(entry);
            self.store.remove(token);
            self.expired.fetch_add(1, Ordering::Relaxed);
            debug!("📭 SESSION EXPIRED (pending): {}", token);
            return Err(AppError::session_expired());
        }
        if entry.state != SessionState::PendingOtp {
            // Already active; replaying the OTP step is not an error
            // worth distinguishing for the client.
            return Ok(entry.clone());
        }
        Ok(entry.clone())
    }

    /// Promote a pending session after a passing OTP
    pub fn activate(&self, token: &str) -> AppResult<Session> {
        let mut entry = self
            .store
            .get_mut(token)
            .ok_or_else(AppError::session_missing)?;
        if entry.is_expired() {
            drop(entry);
            self.store.remove(token);
            self.expired.fetch_add(1, Ordering::Relaxed);
            return Err(AppError::session_expired());
        }
        entry.state = SessionState::Active;
        entry.otp_code = None;
        entry.created_at = Instant::now();
        entry.ttl = self.active_ttl;
        info!(
            "✅ SESSION ACTIVE: user={} (TTL: {}s)",
            entry.user_id,
            self.active_ttl.as_secs()
        );
        Ok(entry.clone())
    }

    /// Resolve an active session; pending and expired tokens are rejected
    pub fn get_active(&self, token: &str) -> AppResult<Session> {
        let entry = self.store.get(token).ok_or_else(AppError::session_missing)?;
        if entry.is_expired() {
            drop(entry);
            self.store.remove(token);
            self.expired.fetch_add(1, Ordering::Relaxed);
            debug!("📭 SESSION EXPIRED: {}", token);
            return Err(AppError::session_expired());
        }
        if entry.state != SessionState::Active {
            return Err(AppError::session_pending());
        }
        Ok(entry.clone())
    }

    /// Drop a session on logout; true if it existed
    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.store.remove(token).is_some();
        if removed {
            debug!("🗑️ SESSION REVOKED: {}", token);
        }
        removed
    }

    /// Sweep expired sessions; returns how many were removed
    ///
    /// Removals are counted inside the sweep itself; `begin()` may
    /// insert concurrently, so before/after map sizes are unreliable.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0usize;
        self.store.retain(|_, session| {
            let expired = session.is_expired();
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
            info!("🧹 SESSION CLEANUP: {} expired sessions removed", removed);
        }
        removed
    }

    /// Counters for the stats endpoint
    pub fn stats(&self) -> SessionStats {
        let mut active = 0usize;
        let mut pending = 0usize;
        for entry in self.store.iter() {
            if entry.is_expired() {
                continue;
            }
            match entry.state {
                SessionState::Active => active += 1,
                SessionState::PendingOtp => pending += 1,
            }
        }
        SessionStats {
            active,
            pending,
            issued: self.issued.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Session counters for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStats {
    pub active: usize,
    pub pending: usize,
    pub issued: u64,
    pub expired: u64,
}
