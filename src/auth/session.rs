use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Persisted credential record. While this record exists on disk, the API
/// client must carry `token` as a bearer credential on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// Single source of truth for "am I logged in, and as whom".
///
/// `data.is_some()` IS the authenticated flag, so the identity can never
/// be present without authentication or vice versa.
pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Hydrate the session from disk. A missing record is a normal
    /// transition to unauthenticated, not an error; returns whether a
    /// record was found.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;
            self.data = Some(data);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save the credential record to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear the in-memory session and erase the persisted record.
    /// Safe to call repeatedly.
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Replace the session wholesale with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> SessionData {
        SessionData {
            token: "tok-123".to_string(),
            username: "alice".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_hydrate_missing_record_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());

        assert!(!session.load().unwrap());
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_save_and_hydrate_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut session = Session::new(dir.path().to_path_buf());
        session.update(sample_data());
        session.save().unwrap();

        let mut restored = Session::new(dir.path().to_path_buf());
        assert!(restored.load().unwrap());
        assert!(restored.is_authenticated());
        assert_eq!(restored.token(), Some("tok-123"));

        let data = restored.data.as_ref().unwrap();
        assert_eq!(data.username, "alice");
        assert_eq!(data.role, Role::Admin);
    }

    #[test]
    fn test_clear_erases_record_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();

        let mut session = Session::new(dir.path().to_path_buf());
        session.update(sample_data());
        session.save().unwrap();

        session.clear().unwrap();
        assert!(!session.is_authenticated());

        // Second clear is a no-op, not an error
        session.clear().unwrap();

        let mut restored = Session::new(dir.path().to_path_buf());
        assert!(!restored.load().unwrap());
    }
}
