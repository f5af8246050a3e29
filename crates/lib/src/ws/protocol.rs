//! Push-channel wire types: frames, channels and subscription keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One frame on the push channel, outbound (subscribe/unsubscribe) or inbound (data, ack, error).
///
/// Wire: `{ "method", "params"?, "id"?, "result"?, "error"? }`. Inbound ids may be strings or
/// numbers and `method` may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl PushMessage {
    /// `{ "method": "subscribe", "params": { "channel", "address"? } }`
    pub fn subscribe(channel: &str, address: Option<&str>) -> Self {
        Self::control("subscribe", channel, address)
    }

    /// `{ "method": "unsubscribe", "params": { "channel", "address"? } }`
    pub fn unsubscribe(channel: &str, address: Option<&str>) -> Self {
        Self::control("unsubscribe", channel, address)
    }

    fn control(method: &str, channel: &str, address: Option<&str>) -> Self {
        let mut params = serde_json::Map::new();
        params.insert("channel".to_string(), channel.into());
        if let Some(address) = address {
            params.insert("address".to_string(), address.into());
        }
        Self {
            method: method.to_string(),
            params: Some(params),
            ..Self::default()
        }
    }

    /// Attach a correlation id so the server's acknowledgment can be matched.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(serde_json::Value::String(id.into()));
        self
    }

    /// Correlation id as text: `"7"` and `7` both read as `7`.
    pub fn id_text(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn channel(&self) -> Option<&str> {
        self.param_str("channel")
    }

    pub fn address(&self) -> Option<&str> {
        self.param_str("address")
    }

    fn param_str(&self, name: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get(name))
            .and_then(|v| v.as_str())
    }

    /// Routing key from `params.channel` / `params.address`, if the frame names a channel.
    pub fn key(&self) -> Option<SubscriptionKey> {
        self.channel()
            .map(|channel| SubscriptionKey::new(channel, self.address()))
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unique index of a live subscription: `"channel:address"` or `"channel"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey(String);

impl SubscriptionKey {
    pub fn new(channel: &str, address: Option<&str>) -> Self {
        match address {
            Some(address) => Self(format!("{}:{}", channel, address)),
            None => Self(channel.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named topic of push updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Blocks,
    Transactions,
    Accounts,
    Validators,
    /// Any channel this client has no typed payload for.
    Custom(String),
}

impl Channel {
    pub fn as_str(&self) -> &str {
        match self {
            Channel::Blocks => "blocks",
            Channel::Transactions => "transactions",
            Channel::Accounts => "accounts",
            Channel::Validators => "validators",
            Channel::Custom(name) => name,
        }
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        match name {
            "blocks" => Channel::Blocks,
            "transactions" => Channel::Transactions,
            "accounts" => Channel::Accounts,
            "validators" => Channel::Validators,
            other => Channel::Custom(other.to_string()),
        }
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_with_and_without_address() {
        assert_eq!(SubscriptionKey::new("blocks", None).as_str(), "blocks");
        assert_eq!(
            SubscriptionKey::new("accounts", Some("0xabc")).as_str(),
            "accounts:0xabc"
        );
        assert_ne!(
            SubscriptionKey::new("blocks", None),
            SubscriptionKey::new("blocks", Some("0xabc"))
        );
    }

    #[test]
    fn subscribe_frame_omits_absent_address() {
        let frame = serde_json::to_value(PushMessage::subscribe("blocks", None)).unwrap();
        assert_eq!(
            frame,
            json!({ "method": "subscribe", "params": { "channel": "blocks" } })
        );
    }

    #[test]
    fn unsubscribe_frame_carries_address() {
        let frame =
            serde_json::to_value(PushMessage::unsubscribe("accounts", Some("0xabc"))).unwrap();
        assert_eq!(
            frame,
            json!({ "method": "unsubscribe", "params": { "channel": "accounts", "address": "0xabc" } })
        );
    }

    #[test]
    fn inbound_frame_without_method_parses() {
        let msg: PushMessage =
            serde_json::from_str(r#"{ "id": "7", "result": { "subscribed": true } }"#).unwrap();
        assert_eq!(msg.id_text().as_deref(), Some("7"));
        assert!(msg.key().is_none());
    }

    #[test]
    fn numeric_id_and_null_method_parse() {
        let msg: PushMessage = serde_json::from_str(
            r#"{ "method": null, "id": 7, "params": { "channel": "blocks" }, "result": { "height": 1 } }"#,
        )
        .unwrap();
        assert_eq!(msg.method, "");
        assert_eq!(msg.id_text().as_deref(), Some("7"));
        assert_eq!(msg.key(), Some(SubscriptionKey::new("blocks", None)));
    }

    #[test]
    fn key_from_params() {
        let msg: PushMessage = serde_json::from_value(json!({
            "method": "update",
            "params": { "channel": "accounts", "address": "0xabc" }
        }))
        .unwrap();
        assert_eq!(msg.key(), Some(SubscriptionKey::new("accounts", Some("0xabc"))));
    }

    #[test]
    fn channel_names_round_trip() {
        for name in ["blocks", "transactions", "accounts", "validators", "mempool"] {
            assert_eq!(Channel::from(name).as_str(), name);
        }
        assert_eq!(Channel::from("mempool"), Channel::Custom("mempool".to_string()));
    }
}
