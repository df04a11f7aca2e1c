//! Pluggable session persistence via the `SessionDriver` trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde_json::Value;

use crate::error::AppError;

pub type SessionData = HashMap<String, Value>;

/// Contract every session persistence backend implements.
///
/// `write` after `read` with no intervening `destroy` must result in `read`
/// returning the written data. `gc` deletes records whose last write
/// timestamp is older than `now - max_lifetime_seconds`.
pub trait SessionDriver: Send + Sync {
    fn open(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn close(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn read(&self, id: &str) -> Result<SessionData, AppError>;

    fn write(&self, id: &str, data: &SessionData) -> Result<(), AppError>;

    fn destroy(&self, id: &str) -> Result<(), AppError>;

    /// Delete records whose last activity predates `now - max_lifetime_seconds`.
    /// Returns the number of deleted records.
    fn gc(&self, max_lifetime_seconds: u64) -> Result<u64, AppError>;
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// In-memory driver. Used for tests and single-process deployments with no
/// persistence requirement.
#[derive(Default)]
pub struct MemoryDriver {
    records: DashMap<String, (SessionData, u64)>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionDriver for MemoryDriver {
    fn read(&self, id: &str) -> Result<SessionData, AppError> {
        Ok(self
            .records
            .get(id)
            .map(|entry| entry.0.clone())
            .unwrap_or_default())
    }

    fn write(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        self.records.insert(id.to_string(), (data.clone(), now_unix()));
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), AppError> {
        self.records.remove(id);
        Ok(())
    }

    fn gc(&self, max_lifetime_seconds: u64) -> Result<u64, AppError> {
        let cutoff = now_unix().saturating_sub(max_lifetime_seconds);
        let expired: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.value().1 < cutoff)
            .map(|entry| entry.key().clone())
            .collect();
        let count = expired.len() as u64;
        for id in expired {
            self.records.remove(&id);
        }
        Ok(count)
    }
}

/// Filesystem driver. Writes are published via temp-file-then-rename so a
/// reader observes either the prior or the new content, never a torn write.
/// Assumes `directory` and its temp files live on the same filesystem —
/// cross-device rename semantics are left undefined.
pub struct FileDriver {
    directory: PathBuf,
}

impl FileDriver {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, AppError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.session.json"))
    }
}

impl SessionDriver for FileDriver {
    fn read(&self, id: &str) -> Result<SessionData, AppError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(SessionData::new());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Internal(format!("session '{id}' is corrupt: {e}")))
    }

    fn write(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        let target = self.path_for(id);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.directory)?;
        let body = serde_json::to_vec(data)
            .map_err(|e| AppError::Internal(format!("session '{id}' serialization failed: {e}")))?;
        std::io::Write::write_all(&mut tmp, &body)?;
        tmp.persist(&target)
            .map_err(|e| AppError::Internal(format!("session '{id}' publish failed: {e}")))?;
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), AppError> {
        let path = self.path_for(id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn gc(&self, max_lifetime_seconds: u64) -> Result<u64, AppError> {
        let cutoff = now_unix().saturating_sub(max_lifetime_seconds);
        let mut deleted = 0u64;
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(u64::MAX);
            if modified < cutoff {
                std::fs::remove_file(&path)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// Contract for the external database connection a `DatabaseDriver` upserts
/// against. The concrete SQL/ORM layer is out of scope for this crate — a
/// host application implements this trait against its own pool.
pub trait DbConnection: Send + Sync {
    /// `UPDATE sessions SET data=?, last_activity=? WHERE id=?`, returning
    /// affected row count.
    fn update(&self, id: &str, data: &[u8], last_activity: u64) -> Result<u64, AppError>;
    /// `INSERT INTO sessions (id, data, last_activity) VALUES (?, ?, ?)`.
    fn insert(&self, id: &str, data: &[u8], last_activity: u64) -> Result<(), AppError>;
    /// `SELECT data FROM sessions WHERE id=?`.
    fn select(&self, id: &str) -> Result<Option<Vec<u8>>, AppError>;
    /// `DELETE FROM sessions WHERE id=?`.
    fn delete(&self, id: &str) -> Result<(), AppError>;
    /// `DELETE FROM sessions WHERE last_activity < ?`, returning deleted count.
    fn delete_older_than(&self, cutoff: u64) -> Result<u64, AppError>;
}

/// Database-backed driver: upsert pattern (`UPDATE` then `INSERT` if no
/// rows affected) against a `(id PK, data, last_activity)` schema.
pub struct DatabaseDriver<C: DbConnection> {
    connection: C,
}

impl<C: DbConnection> DatabaseDriver<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }
}

impl<C: DbConnection> SessionDriver for DatabaseDriver<C> {
    fn read(&self, id: &str) -> Result<SessionData, AppError> {
        match self.connection.select(id)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::Internal(format!("session '{id}' is corrupt: {e}"))),
            None => Ok(SessionData::new()),
        }
    }

    fn write(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        let body = serde_json::to_vec(data)
            .map_err(|e| AppError::Internal(format!("session '{id}' serialization failed: {e}")))?;
        let now = now_unix();
        let affected = self.connection.update(id, &body, now)?;
        if affected == 0 {
            self.connection.insert(id, &body, now)?;
        }
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), AppError> {
        self.connection.delete(id)
    }

    fn gc(&self, max_lifetime_seconds: u64) -> Result<u64, AppError> {
        let cutoff = now_unix().saturating_sub(max_lifetime_seconds);
        self.connection.delete_older_than(cutoff)
    }
}

/// Discards writes, returns empty reads. Used when sessions are disabled.
#[derive(Default)]
pub struct NullDriver;

impl SessionDriver for NullDriver {
    fn read(&self, _id: &str) -> Result<SessionData, AppError> {
        Ok(SessionData::new())
    }

    fn write(&self, _id: &str, _data: &SessionData) -> Result<(), AppError> {
        Ok(())
    }

    fn destroy(&self, _id: &str) -> Result<(), AppError> {
        Ok(())
    }

    fn gc(&self, _max_lifetime_seconds: u64) -> Result<u64, AppError> {
        Ok(0)
    }
}
