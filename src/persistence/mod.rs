//! Key-value persistence
//!
//! The only durable state a game keeps is its high score, so storage is a
//! plain string key-value interface. The web build backs it with
//! LocalStorage (`platform::web::LocalStore`); tests and the native build use
//! [`MemoryStore`].

use std::collections::HashMap;

use serde_json::Value;

use crate::error::HubError;

/// Shared session entry written by the hub's sign-in flow
pub const SESSION_USER_KEY: &str = "dawker_session_user";

/// String key-value storage that may fail (private browsing, quota, sandbox)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, HubError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), HubError>;
    fn remove(&mut self, key: &str) -> Result<(), HubError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    /// Number of successful writes, for observing save paths
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.items.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, HubError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HubError> {
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), HubError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Store that rejects every operation, like LocalStorage in a locked-down iframe
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn refuse(key: &str) -> HubError {
        HubError::Storage {
            key: key.to_string(),
            reason: "storage unavailable".to_string(),
        }
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, key: &str) -> Result<Option<String>, HubError> {
        Err(Self::refuse(key))
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<(), HubError> {
        Err(Self::refuse(key))
    }

    fn remove(&mut self, key: &str) -> Result<(), HubError> {
        Err(Self::refuse(key))
    }
}

/// The signed-in user's id from the shared session entry, as the score
/// service expects it: a JSON number when the id is numeric.
pub fn session_user_id(store: &dyn KeyValueStore) -> Option<Value> {
    let raw = store.get(SESSION_USER_KEY).ok().flatten()?;
    let session: Value = serde_json::from_str(&raw).ok()?;
    match session.get("id")? {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(n) => Some(Value::from(n)),
            Err(_) if !s.is_empty() => Some(Value::String(s.clone())),
            Err(_) => None,
        },
        _ => None,
    }
}
