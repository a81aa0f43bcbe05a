//! Upload storage
//!
//! Flat directory of course files and assignment submissions. Names are
//! sanitized on the way in and again on the way out, so a stored name
//! can never point outside the vault.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{AppError, AppResult};

/// Reduce a client-supplied filename to a safe flat name
///
/// Path separators and parent components are dropped, whitespace
/// becomes `_`, and anything outside `[A-Za-z0-9._-]` is removed.
/// Fails when nothing usable remains.
pub fn sanitize_filename(name: &str) -> AppResult<String> {
    // Keep only the final path component of whatever the client sent
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut clean = String::with_capacity(base.len());
    for c in base.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => clean.push(c),
            c if c.is_whitespace() => clean.push('_'),
            _ => {}
        }
    }
    let clean = clean.trim_matches('.').to_string();
    if clean.is_empty() || clean.chars().all(|c| c == '_' || c == '-') {
        return Err(AppError::invalid_filename(name));
    }
    Ok(clean)
}

/// Storage name for admin course uploads: `{yyyymmddHHMMSS}_{name}`
pub fn course_upload_name(now: DateTime<Utc>, original: &str) -> AppResult<String> {
    let clean = sanitize_filename(original)?;
    Ok(format!("{}_{}", now.format("%Y%m%d%H%M%S"), clean))
}

/// Storage name for student submissions: `{user}_{course}_{name}`
pub fn assignment_upload_name(user_id: i64, course_id: i64, original: &str) -> AppResult<String> {
    let clean = sanitize_filename(original)?;
    Ok(format!("{}_{}_{}", user_id, course_id, clean))
}

/// Content type for the download route, by extension
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "webm" => "video/webm",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "txt" || ext == "md" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Flat file vault under one root directory
#[derive(Clone, Debug)]
pub struct Uploads {
    root: PathBuf,
}

impl Uploads {
    /// Open the vault, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("📁 UPLOAD VAULT READY: {}", root.display());
        Ok(Self { root })
    }

    /// Write bytes under an already-sanitized storage name
    pub async fn save(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.root.join(sanitize_filename(name)?);
        tokio::fs::write(&path, bytes).await?;
        debug!("💾 UPLOAD SAVED: {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Read a stored file back; missing files map to a 404-class error
    pub async fn read(&self, name: &str) -> AppResult<Vec<u8>> {
        let clean = sanitize_filename(name).map_err(|_| AppError::file_not_found(name))?;
        let path = self.root.join(&clean);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::file_not_found(&clean))
            }
            Err(e) => Err(e.into()),
        }
    }
}
