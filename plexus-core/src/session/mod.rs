//! Session lifecycle: id generation, attribute storage, flash data, and
//! probabilistic GC.

pub mod driver;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::RngCore;
use serde_json::Value;

pub use driver::{DatabaseDriver, DbConnection, FileDriver, MemoryDriver, NullDriver, SessionDriver};

use crate::error::AppError;

/// `Unstarted ── start() ──▶ Started ── save()/destroy() ──▶ Unstarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Started,
}

/// Probabilistic GC configuration: on `start()`, with probability
/// `gc_probability / gc_divisor`, invoke `driver.gc(gc_max_lifetime)`.
#[derive(Debug, Clone, Copy)]
pub struct GcPolicy {
    pub probability: u32,
    pub divisor: u32,
    pub max_lifetime_seconds: u64,
}

impl Default for GcPolicy {
    fn default() -> Self {
        // Spec default: 1/100.
        Self {
            probability: 1,
            divisor: 100,
            max_lifetime_seconds: 24 * 60 * 60,
        }
    }
}

/// A session: `{ id, attributes, flash_new, flash_old, flash_data, started }`.
pub struct Session {
    id: String,
    state: SessionState,
    attributes: HashMap<String, Value>,
    flash_new: HashSet<String>,
    flash_old: HashSet<String>,
    flash_data: HashMap<String, Value>,
    driver: Arc<dyn SessionDriver>,
    gc_policy: GcPolicy,
}

const FLASH_DATA_KEY: &str = "__flash_data";
const FLASH_OLD_KEY: &str = "__flash_old";

fn generate_id() -> String {
    // 160-bit (20-byte) cryptographically random id, hex-encoded.
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl Session {
    /// Construct a not-yet-started session bound to a driver and GC policy.
    pub fn new(driver: Arc<dyn SessionDriver>, gc_policy: GcPolicy) -> Self {
        Self {
            id: String::new(),
            state: SessionState::Unstarted,
            attributes: HashMap::new(),
            flash_new: HashSet::new(),
            flash_old: HashSet::new(),
            flash_data: HashMap::new(),
            driver,
            gc_policy,
        }
    }

    /// Resume an existing session by id, loading its persisted attributes.
    pub fn resume(
        id: &str,
        driver: Arc<dyn SessionDriver>,
        gc_policy: GcPolicy,
    ) -> Result<Self, AppError> {
        let mut session = Self::new(driver, gc_policy);
        session.id = id.to_string();
        session.load_from_driver()?;
        session.state = SessionState::Started;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    fn load_from_driver(&mut self) -> Result<(), AppError> {
        let mut data = self.driver.read(&self.id)?;
        self.flash_data = match data.remove(FLASH_DATA_KEY) {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        self.flash_old = match data.remove(FLASH_OLD_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => HashSet::new(),
        };
        self.attributes = data;
        Ok(())
    }

    /// Start the session. Reentrant: calling `start()` on an already-started
    /// session is a no-op. Mints a fresh id if none exists, then runs
    /// probabilistic GC.
    pub fn start(&mut self) -> Result<(), AppError> {
        if self.state == SessionState::Started {
            return Ok(());
        }
        if self.id.is_empty() {
            self.id = generate_id();
        } else {
            self.load_from_driver()?;
        }
        self.state = SessionState::Started;

        if self.gc_policy.probability > 0
            && rand::thread_rng().next_u32() % self.gc_policy.divisor < self.gc_policy.probability
        {
            self.driver.gc(self.gc_policy.max_lifetime_seconds)?;
        }
        Ok(())
    }

    /// Persist the session. Ages flash data **before** writing: keys present
    /// in `flash_old` (as of the start of `save()`) are purged from
    /// `flash_data`, then `flash_new` is promoted to `flash_old` and
    /// `flash_new` is cleared.
    pub fn save(&mut self) -> Result<(), AppError> {
        for key in &self.flash_old {
            self.flash_data.remove(key);
        }
        self.flash_old = std::mem::take(&mut self.flash_new);

        let mut payload: HashMap<String, Value> = self.attributes.clone();
        payload.insert(
            FLASH_DATA_KEY.to_string(),
            Value::Object(self.flash_data.clone().into_iter().collect()),
        );
        payload.insert(
            FLASH_OLD_KEY.to_string(),
            Value::Array(self.flash_old.iter().cloned().map(Value::from).collect()),
        );
        self.driver.write(&self.id, &payload)?;
        Ok(())
    }

    /// Discard the session and purge it from the driver.
    pub fn destroy(&mut self) -> Result<(), AppError> {
        if !self.id.is_empty() {
            self.driver.destroy(&self.id)?;
        }
        self.attributes.clear();
        self.flash_new.clear();
        self.flash_old.clear();
        self.flash_data.clear();
        self.state = SessionState::Unstarted;
        Ok(())
    }

    /// Produce a new id. If `destroy_old` is true, the prior record is
    /// deleted in the driver before the session is rewritten under the new id.
    pub fn regenerate(&mut self, destroy_old: bool) -> Result<(), AppError> {
        let old_id = std::mem::replace(&mut self.id, generate_id());
        if destroy_old && !old_id.is_empty() {
            self.driver.destroy(&old_id)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Set a flash value: it survives exactly one subsequent request.
    pub fn flash(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.flash_new.insert(key.clone());
        self.flash_old.remove(&key);
        self.flash_data.insert(key, value.into());
    }

    pub fn get_flash(&self, key: &str) -> Option<&Value> {
        self.flash_data.get(key)
    }

    /// Merge `flash_old` into `flash_new`, re-keeping everything for one
    /// more request.
    pub fn reflash(&mut self) {
        self.flash_new.extend(self.flash_old.iter().cloned());
    }

    /// Re-keep a subset of flash keys for one more request.
    pub fn keep(&mut self, keys: &[&str]) {
        for key in keys {
            if self.flash_old.contains(*key) || self.flash_data.contains_key(*key) {
                self.flash_new.insert((*key).to_string());
            }
        }
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> Session {
        let driver: Arc<dyn SessionDriver> = Arc::new(MemoryDriver::new());
        Session::new(driver, GcPolicy::default())
    }

    #[test]
    fn start_is_reentrant() {
        let mut s = new_session();
        s.start().unwrap();
        let id = s.id().to_string();
        s.start().unwrap();
        assert_eq!(s.id(), id);
    }

    #[test]
    fn save_then_start_round_trips_attributes() {
        let driver: Arc<dyn SessionDriver> = Arc::new(MemoryDriver::new());
        let mut s = Session::new(driver.clone(), GcPolicy::default());
        s.start().unwrap();
        s.set("user_id", 7);
        s.save().unwrap();

        let mut resumed = Session::resume(s.id(), driver, GcPolicy::default()).unwrap();
        assert_eq!(resumed.get("user_id"), Some(&Value::from(7)));
        let _ = resumed.start();
    }

    #[test]
    fn flash_value_survives_exactly_one_save() {
        let mut s = new_session();
        s.start().unwrap();
        s.flash("notice", "welcome");
        assert_eq!(s.get_flash("notice"), Some(&Value::from("welcome")));

        s.save().unwrap(); // ages: notice -> flash_old
        assert_eq!(s.get_flash("notice"), Some(&Value::from("welcome")));

        s.save().unwrap(); // second save purges flash_old entries
        assert_eq!(s.get_flash("notice"), None);
    }

    #[test]
    fn keep_re_keeps_named_flash_value() {
        let mut s = new_session();
        s.start().unwrap();
        s.flash("notice", "welcome");
        s.save().unwrap();
        s.keep(&["notice"]);
        s.save().unwrap();
        assert_eq!(s.get_flash("notice"), Some(&Value::from("welcome")));
    }

    #[test]
    fn regenerate_produces_a_new_id() {
        let mut s = new_session();
        s.start().unwrap();
        let old_id = s.id().to_string();
        s.regenerate(false).unwrap();
        assert_ne!(s.id(), old_id);
    }

    #[test]
    fn destroy_purges_data_and_resets_state() {
        let mut s = new_session();
        s.start().unwrap();
        s.set("k", "v");
        s.destroy().unwrap();
        assert_eq!(s.state(), SessionState::Unstarted);
        assert!(s.get("k").is_none());
    }
}
