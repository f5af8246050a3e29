//! Typed view of pushed payloads.

use serde::{Deserialize, Serialize};

use crate::types::{Block, Transaction, Validator};
use crate::ws::protocol::Channel;

/// Account activity pushed on the `accounts` channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountUpdate {
    pub address: String,
    pub balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transaction_hash: Option<String>,
}

/// Payload decoded according to the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Block(Block),
    Transaction(Transaction),
    Account(AccountUpdate),
    Validator(Validator),
    /// Unknown channel, or a payload that does not match the channel's record.
    Other {
        channel: String,
        payload: serde_json::Value,
    },
}

impl PushEvent {
    pub fn decode(channel: &Channel, payload: serde_json::Value) -> Self {
        let decoded = match channel {
            Channel::Blocks => serde_json::from_value(payload.clone()).map(PushEvent::Block),
            Channel::Transactions => {
                serde_json::from_value(payload.clone()).map(PushEvent::Transaction)
            }
            Channel::Accounts => serde_json::from_value(payload.clone()).map(PushEvent::Account),
            Channel::Validators => {
                serde_json::from_value(payload.clone()).map(PushEvent::Validator)
            }
            Channel::Custom(_) => {
                return PushEvent::Other {
                    channel: channel.to_string(),
                    payload,
                }
            }
        };
        decoded.unwrap_or_else(|e| {
            log::debug!("{} payload did not decode as a typed record: {}", channel, e);
            PushEvent::Other {
                channel: channel.to_string(),
                payload,
            }
        })
    }
}
