//! CSRF token issuance, rotation, and constant-time validation.

use base64::Engine;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::session::Session;

const CSRF_SESSION_KEY: &str = "__csrf_token";

/// Issues, validates, and rotates the CSRF token stored in a session.
///
/// If the session is not started when queried, the manager starts it
/// transparently.
pub struct CsrfTokenManager {
    rotate_on_success: bool,
}

impl CsrfTokenManager {
    pub fn new(rotate_on_success: bool) -> Self {
        Self { rotate_on_success }
    }

    /// Return the current token, generating and storing one on first access.
    pub fn token(&self, session: &mut Session) -> Result<String, crate::AppError> {
        if !session.is_started() {
            session.start()?;
        }
        if let Some(existing) = session.get(CSRF_SESSION_KEY).and_then(|v| v.as_str()) {
            return Ok(existing.to_string());
        }
        let token = generate_token();
        session.set(CSRF_SESSION_KEY, token.clone());
        Ok(token)
    }

    /// Validate `submitted` against the stored token using a constant-time
    /// comparator. Optionally rotates the token after a successful match.
    pub fn validate(&self, session: &mut Session, submitted: &str) -> Result<bool, crate::AppError> {
        if !session.is_started() {
            session.start()?;
        }
        let stored = match session.get(CSRF_SESSION_KEY).and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return Ok(false),
        };
        let matches = stored.as_bytes().ct_eq(submitted.as_bytes()).into();
        if matches && self.rotate_on_success {
            self.regenerate(session);
        }
        Ok(matches)
    }

    /// Discard and replace the token.
    pub fn regenerate(&self, session: &mut Session) {
        session.set(CSRF_SESSION_KEY, generate_token());
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GcPolicy, MemoryDriver, SessionDriver};
    use std::sync::Arc;

    fn new_session() -> Session {
        let driver: Arc<dyn SessionDriver> = Arc::new(MemoryDriver::new());
        Session::new(driver, GcPolicy::default())
    }

    #[test]
    fn validate_accepts_the_issued_token() {
        let manager = CsrfTokenManager::new(false);
        let mut session = new_session();
        let token = manager.token(&mut session).unwrap();
        assert!(manager.validate(&mut session, &token).unwrap());
    }

    #[test]
    fn validate_rejects_wrong_token() {
        let manager = CsrfTokenManager::new(false);
        let mut session = new_session();
        manager.token(&mut session).unwrap();
        assert!(!manager.validate(&mut session, "garbage").unwrap());
    }

    #[test]
    fn regenerate_invalidates_the_old_token() {
        let manager = CsrfTokenManager::new(false);
        let mut session = new_session();
        let old = manager.token(&mut session).unwrap();
        manager.regenerate(&mut session);
        assert!(!manager.validate(&mut session, &old).unwrap());
        let new_token = manager.token(&mut session).unwrap();
        assert!(manager.validate(&mut session, &new_token).unwrap());
    }

    #[test]
    fn starts_session_transparently_when_queried() {
        let manager = CsrfTokenManager::new(false);
        let mut session = new_session();
        assert!(!session.is_started());
        manager.token(&mut session).unwrap();
        assert!(session.is_started());
    }
}
