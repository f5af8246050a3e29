//! Inbound frame routing.
//!
//! Each frame is handled on its own: a bad frame is logged and dropped without touching
//! subscriptions or the connection.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::ws::protocol::PushMessage;
use crate::ws::registry::{lock, SubscriptionRegistry};

type AckSender = oneshot::Sender<Result<serde_json::Value, ClientError>>;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Delivered,
    /// Matched a pending acknowledgment by id.
    Acked,
    /// Subscription acknowledgment without a correlation id.
    Acknowledgment,
    /// Server reported an error; logged.
    ServerError,
    /// No subscription for the frame's key.
    Unmatched,
    /// Not valid JSON, or not a frame object; logged.
    Malformed,
}

#[derive(Default)]
pub struct Router {
    registry: SubscriptionRegistry,
    pending: Mutex<HashMap<String, AckSender>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Register interest in the acknowledgment for frame `id`.
    pub fn expect_ack(
        &self,
        id: &str,
    ) -> oneshot::Receiver<Result<serde_json::Value, ClientError>> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.to_string(), tx);
        rx
    }

    pub fn cancel_ack(&self, id: &str) {
        lock(&self.pending).remove(id);
    }

    /// Drop every pending acknowledgment; waiters see the connection as gone.
    pub fn fail_pending(&self) {
        lock(&self.pending).clear();
    }

    /// Route one inbound text frame.
    pub fn handle_text(&self, text: &str) -> Routed {
        let message: PushMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("error parsing WebSocket message: {}", e);
                return Routed::Malformed;
            }
        };

        if let Some(id) = message.id_text() {
            let waiter = lock(&self.pending).remove(&id);
            if let Some(waiter) = waiter {
                let outcome = match message.error {
                    Some(ref err) => Err(ClientError::Subscription(error_text(err))),
                    None => Ok(message.result.clone().unwrap_or(serde_json::Value::Null)),
                };
                let _ = waiter.send(outcome);
                return Routed::Acked;
            }
        }

        let key = message.key();
        if message.result.is_some() && key.is_none() {
            log::debug!("subscription acknowledged: {:?}", message.result);
            return Routed::Acknowledgment;
        }

        if let Some(ref err) = message.error {
            log::warn!("WebSocket error: {}", err);
            return Routed::ServerError;
        }

        let Some(key) = key else {
            log::debug!("dropping frame without channel (method {:?})", message.method);
            return Routed::Unmatched;
        };
        let Some(callback) = self.registry.callback(&key) else {
            log::debug!("no subscription for {}, dropping frame", key);
            return Routed::Unmatched;
        };

        let payload = match message.result {
            Some(result) => result,
            None => match serde_json::to_value(&message) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("re-encoding frame for {} failed: {}", key, e);
                    return Routed::Malformed;
                }
            },
        };
        callback(payload);
        Routed::Delivered
    }
}

fn error_text(err: &serde_json::Value) -> String {
    err.get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .or_else(|| err.as_str().map(str::to_string))
        .unwrap_or_else(|| err.to_string())
}
