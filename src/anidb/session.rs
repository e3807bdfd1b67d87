use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Sessions idle longer than this are assumed dead on the server, which
/// expires them at roughly 35 minutes.
const MAX_IDLE_MINUTES: i64 = 30;

/// An authenticated session persisted between runs. The service ties a
/// session to the source address, so the local port is kept alongside the
/// key and must be rebound to resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub key: String,
    pub local_port: u16,
    pub last_used: DateTime<Utc>,
}

impl SessionState {
    pub fn expired(&self) -> bool {
        Utc::now() - self.last_used > Duration::minutes(MAX_IDLE_MINUTES)
    }
}

/// JSON-on-disk store for the cached session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open_default() -> Result<Self> {
        let cache_dir = directories::ProjectDirs::from("", "", "anicat").map_or_else(
            || PathBuf::from(".anicat"),
            |d| d.cache_dir().to_path_buf(),
        );
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self::at(cache_dir.join("session.json")))
    }

    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the cached session, discarding it when expired or unreadable.
    pub fn load(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) if state.expired() => {
                debug!("cached session expired");
                self.clear()?;
                Ok(None)
            }
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                debug!("discarding unreadable session cache: {e}");
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, state: &SessionState) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::at(dir.path().join("session.json"))
    }

    #[test]
    fn saves_and_loads_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let state = SessionState {
            key: "hS2mK".to_string(),
            local_port: 14443,
            last_used: Utc::now(),
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn expired_sessions_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .save(&SessionState {
                key: "hS2mK".to_string(),
                local_port: 14443,
                last_used: Utc::now() - Duration::minutes(MAX_IDLE_MINUTES + 1),
            })
            .unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_caches_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::write(dir.path().join("session.json"), "not json").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.clear().unwrap();
        store.clear().unwrap();
    }
}
