//! Ledger records returned by the HTTP API and request bodies for write operations.
//!
//! Amounts, fees, balances and stakes are decimal strings and are never parsed here.

use serde::{Deserialize, Serialize};

/// Network-wide status (`GET /v1/status`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkStatus {
    pub network: String,
    pub version: String,
    pub block_height: u64,
    pub total_transactions: u64,
    pub validators_count: u64,
    pub total_stake: String,
    /// Average block time in seconds.
    pub block_time: f64,
    pub uptime: f64,
    pub last_block_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub timestamp: String,
    pub transactions_count: u64,
    pub validator: String,
    pub shard: String,
    pub workchain: i64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub total_fees: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_block: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Success,
    Failed,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub hash: String,
    pub block_height: u64,
    pub timestamp: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub fee: String,
    pub gas_used: u64,
    pub gas_price: u64,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub address: String,
    pub balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transaction_lt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transaction_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub is_contract: bool,
    pub is_active: bool,
}

/// Account balance (`GET /v1/accounts/{address}/balance`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub balance: String,
    pub currency: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractParam {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractMethod {
    pub name: String,
    pub signature: String,
    pub inputs: Vec<ContractParam>,
    pub outputs: Vec<ContractParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractEvent {
    pub name: String,
    pub signature: String,
    pub inputs: Vec<ContractParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    pub address: String,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub code_hash: String,
    pub data_hash: String,
    pub balance: String,
    pub created_at: String,
    pub methods: Vec<ContractMethod>,
    pub events: Vec<ContractEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validator {
    pub address: String,
    pub stake: String,
    pub commission: f64,
    pub uptime: f64,
    pub blocks_produced: u64,
    pub last_block_time: String,
    pub is_active: bool,
}

/// Body of `POST /v1/transactions/send`. Signing happens outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub from: String,
    pub to: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendTransactionResponse {
    pub hash: String,
    pub status: String,
}

/// Body of `POST /v1/contracts/{address}/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContractRequest {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallContractResponse {
    pub transaction_hash: String,
    pub gas_used: u64,
    /// Method return value; shape depends on the contract.
    pub result: serde_json::Value,
}

/// Hit returned by `GET /v1/search/{hash}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    /// What the hash resolved to (e.g. "block", "transaction").
    #[serde(rename = "type")]
    pub typ: String,
    pub hash: String,
    pub block_height: u64,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_stay_exact_strings() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "hash": "0x1",
            "amount": "123456789012345678901234567890",
            "fee": "0.000000000000000001",
            "status": "success"
        }))
        .unwrap();
        assert_eq!(tx.amount, "123456789012345678901234567890");
        assert_eq!(tx.fee, "0.000000000000000001");
        assert_eq!(tx.status, TransactionStatus::Success);
    }

    #[test]
    fn unknown_transaction_status_is_tolerated() {
        let tx: Transaction =
            serde_json::from_value(serde_json::json!({ "status": "reverted" })).unwrap();
        assert_eq!(tx.status, TransactionStatus::Unknown);
    }

    #[test]
    fn send_request_omits_absent_optionals() {
        let req = SendTransactionRequest {
            from: "0xa".into(),
            to: "0xb".into(),
            amount: "5".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, serde_json::json!({ "from": "0xa", "to": "0xb", "amount": "5" }));
    }

    #[test]
    fn call_request_serializes_gas_when_set() {
        let mut params = serde_json::Map::new();
        params.insert("to".into(), serde_json::json!("0xc"));
        let req = CallContractRequest {
            method: "transfer".into(),
            params,
            from: "0xa".into(),
            gas_limit: Some(21_000),
            gas_price: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["gas_limit"], 21_000);
        assert!(v.get("gas_price").is_none());
        assert_eq!(v["params"]["to"], "0xc");
    }
}
