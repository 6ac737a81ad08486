//! # Auth Session Persistence
//!
//! Keeps the signed-in backend session at `~/.staybook/session.json` so the
//! CLI commands and the calendar share one login.
//!
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::backend::AuthSession;
use crate::core::config::app_dir;

/// Returns `~/.staybook/session.json`, creating the directory if needed.
pub fn session_path() -> io::Result<PathBuf> {
    let dir = app_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
    fs::create_dir_all(&dir)?;
    Ok(dir.join("session.json"))
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn save_auth_session_to(path: &Path, session: &AuthSession) -> io::Result<()> {
    atomic_write_json(path, session)?;
    debug!("Auth session saved to {}", path.display());
    Ok(())
}

/// Missing file is `Ok(None)`; a corrupt one is an error.
pub fn load_auth_session_from(path: &Path) -> io::Result<Option<AuthSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let session = serde_json::from_str(&json)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(session))
}

pub fn clear_auth_session_at(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
        info!("Auth session cleared");
    }
    Ok(())
}

pub fn save_auth_session(session: &AuthSession) -> io::Result<()> {
    save_auth_session_to(&session_path()?, session)
}

/// Loads the stored session. Unreadable files are logged and treated as signed out.
pub fn load_auth_session() -> Option<AuthSession> {
    let path = match session_path() {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not locate session file: {}", e);
            return None;
        }
    };
    match load_auth_session_from(&path) {
        Ok(session) => session,
        Err(e) => {
            warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            None
        }
    }
}

pub fn clear_auth_session() -> io::Result<()> {
    clear_auth_session_at(&session_path()?)
}
