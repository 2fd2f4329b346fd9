//! Password hashing and bearer-token sessions.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hivebase_core::{HivebaseError, HivebaseResult};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

/// Hash a password with a fresh random salt. Output is `salt$hash`, both
/// hex encoded.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    format!("{salt_hex}${}", digest(&salt_hex, password))
}

/// Constant-shape verification against a stored `salt$hash` credential.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// An authenticated session resolved from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i64,
    pub email: String,
    pub tenant: String,
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// In-memory session store with TTL expiry.
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Issue a session for a verified user.
    pub fn create(
        &self,
        user_id: i64,
        email: &str,
        tenant: &str,
        roles: Vec<String>,
    ) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            email: email.to_string(),
            tenant: tenant.to_string(),
            roles,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        info!(user = %email, tenant = %tenant, "Session created");
        self.sessions.insert(session.token, session.clone());
        session
    }

    /// Resolve a bearer token. Expired sessions are removed on sight.
    pub fn resolve(&self, token: &str) -> HivebaseResult<Session> {
        let token = Uuid::parse_str(token)
            .map_err(|_| HivebaseError::Unauthorized("malformed session token".to_string()))?;
        let session = self
            .sessions
            .get(&token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HivebaseError::Unauthorized("unknown session token".to_string()))?;
        if session.expires_at < Utc::now() {
            self.sessions.remove(&token);
            return Err(HivebaseError::Unauthorized("session expired".to_string()));
        }
        Ok(session)
    }

    pub fn revoke(&self, token: &str) -> bool {
        Uuid::parse_str(token)
            .ok()
            .and_then(|t| self.sessions.remove(&t))
            .is_some()
    }

    /// Drop every expired session; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at >= now);
        before - self.sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("hunter2hunter2");
        assert!(verify_password("hunter2hunter2", &stored));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("hunter2hunter2", "garbage"));

        // Salted: two hashes of the same password differ.
        assert_ne!(stored, hash_password("hunter2hunter2"));
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new(3600);
        let session = store.create(1, "a@example.com", "acme", vec!["admin".to_string()]);

        let resolved = store.resolve(&session.token.to_string()).unwrap();
        assert_eq!(resolved.user_id, 1);
        assert_eq!(resolved.tenant, "acme");

        assert!(store.revoke(&session.token.to_string()));
        assert!(store.resolve(&session.token.to_string()).is_err());
    }

    #[test]
    fn test_expired_sessions_rejected_and_swept() {
        let store = SessionStore::new(0);
        let session = store.create(1, "a@example.com", "default", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert!(store.resolve(&session.token.to_string()).is_err());
        let _ = store.create(2, "b@example.com", "default", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(store.sweep_expired(), 1);
    }

    #[test]
    fn test_malformed_token() {
        let store = SessionStore::new(60);
        assert!(store.resolve("not-a-uuid").is_err());
        assert!(!store.revoke("not-a-uuid"));
    }
}
