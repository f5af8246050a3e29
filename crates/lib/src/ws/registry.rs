//! Subscription registry: one callback per subscription key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ws::protocol::SubscriptionKey;

/// Callback invoked with each payload routed to a subscription.
pub type Callback = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// A live interest in a channel, optionally narrowed to one address.
#[derive(Clone)]
pub struct Subscription {
    pub channel: String,
    pub address: Option<String>,
    callback: Callback,
}

impl Subscription {
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn new(channel: &str, address: Option<&str>, callback: Callback) -> Self {
        Self {
            channel: channel.to_string(),
            address: address.map(str::to_string),
            callback,
        }
    }

    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(&self.channel, self.address.as_deref())
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Map of subscription key to subscription. Owned by one multiplexer.
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<HashMap<SubscriptionKey, Subscription>>,
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns true when an existing subscription was replaced.
    pub fn insert(&self, subscription: Subscription) -> bool {
        lock(&self.inner)
            .insert(subscription.key(), subscription)
            .is_some()
    }

    pub fn remove(&self, key: &SubscriptionKey) -> Option<Subscription> {
        lock(&self.inner).remove(key)
    }

    /// Remove `key` only while it still holds `callback`. A subscription that replaced it in the
    /// meantime is left alone.
    pub fn remove_if_same(&self, key: &SubscriptionKey, callback: &Callback) -> bool {
        let mut inner = lock(&self.inner);
        match inner.get(key) {
            Some(s) if same_callback(&s.callback, callback) => {
                inner.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Callback for `key`, cloned out so it can run without holding the lock.
    pub fn callback(&self, key: &SubscriptionKey) -> Option<Callback> {
        lock(&self.inner).get(key).map(|s| s.callback.clone())
    }

    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        lock(&self.inner).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.inner).clear();
    }

    /// (channel, address) of every tracked subscription, for re-sending after a reconnect.
    pub fn targets(&self) -> Vec<(String, Option<String>)> {
        lock(&self.inner)
            .values()
            .map(|s| (s.channel.clone(), s.address.clone()))
            .collect()
    }
}
