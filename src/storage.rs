//! Token persistence behind a small trait seam. Keys mirror the shared
//! key-value storage contract of the deployed apps: plain string values
//! under `"token"` and `"refreshToken"`, no expiry metadata. Change
//! events let a session guard observe removals made by another writer,
//! the way a browser tab observes `storage` events from its siblings.

use std::collections::HashMap;
use std::sync::Mutex;

use secrecy::SecretString;
use tokio::sync::broadcast;

use crate::types::TokenPair;

/// Storage key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Change notification from a token store. Carries no payload contract
/// beyond "this key changed"; observers re-read the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
}

/// Key-value persistence for token material.
///
/// Individual operations are atomic; multi-step sequences (read then
/// clear) are not transactional across await points.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SecretString>;
    fn set(&self, key: &str, value: SecretString);
    fn remove(&self, key: &str);
    /// Subscribes to change events for all keys.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    /// Stores both halves of a token pair.
    fn put_tokens(&self, pair: &TokenPair) {
        self.set(ACCESS_TOKEN_KEY, pair.access_token.clone());
        self.set(REFRESH_TOKEN_KEY, pair.refresh_token.clone());
    }

    /// Removes both token keys.
    fn clear_tokens(&self) {
        self.remove(ACCESS_TOKEN_KEY);
        self.remove(REFRESH_TOKEN_KEY);
    }
}

/// In-memory [`TokenStore`], shareable across tasks. The default for tests
/// and for embedders that keep tokens out of disk entirely.
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, SecretString>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            values: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn notify(&self, key: &str) {
        // No receivers is fine; nobody is watching yet.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
        });
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<SecretString> {
        let values = self.values.lock().unwrap_or_else(|err| err.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: SecretString) {
        {
            let mut values = self.values.lock().unwrap_or_else(|err| err.into_inner());
            values.insert(key.to_string(), value);
        }
        self.notify(key);
    }

    fn remove(&self, key: &str) {
        let removed = {
            let mut values = self.values.lock().unwrap_or_else(|err| err.into_inner());
            values.remove(key).is_some()
        };
        if removed {
            self.notify(key);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
