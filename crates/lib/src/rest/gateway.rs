//! Request gateway: one method per resource path, envelope unwrapping and error normalization.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rest::envelope::{Envelope, EnvelopeStatus};
use crate::types::{
    Account, Balance, Block, CallContractRequest, CallContractResponse, Contract, NetworkStatus,
    SearchResult, SendTransactionRequest, SendTransactionResponse, Transaction, Validator,
};

pub const DEFAULT_LATEST_BLOCKS_LIMIT: u32 = 10;
pub const DEFAULT_ACCOUNT_TX_LIMIT: u32 = 20;
pub const DEFAULT_ACCOUNT_TX_OFFSET: u32 = 0;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// HTTP client for the versioned resource API.
#[derive(Debug, Clone)]
pub struct RequestGateway {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct BlockList {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct TransactionList {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct ValidatorList {
    #[serde(default)]
    validators: Vec<Validator>,
}

#[derive(Debug, Deserialize)]
struct AccountList {
    #[serde(default)]
    accounts: Vec<Account>,
}

impl RequestGateway {
    /// Build the gateway: resolve the base address, default headers and timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.resolved_base_url(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /v1/status
    pub async fn get_status(&self) -> Result<NetworkStatus, ClientError> {
        self.get("/v1/status", &[]).await
    }

    /// GET /v1/blocks/{height}
    pub async fn get_block(&self, height: u64) -> Result<Block, ClientError> {
        self.get(&format!("/v1/blocks/{}", height), &[]).await
    }

    /// GET /v1/blocks/latest?limit=
    pub async fn get_latest_blocks(&self, limit: u32) -> Result<Vec<Block>, ClientError> {
        let list: BlockList = self
            .get("/v1/blocks/latest", &[("limit", limit.to_string())])
            .await?;
        Ok(list.blocks)
    }

    /// GET /v1/transactions/{hash}
    pub async fn get_transaction(&self, hash: &str) -> Result<Transaction, ClientError> {
        self.get(&format!("/v1/transactions/{}", hash), &[]).await
    }

    /// POST /v1/transactions/send
    pub async fn send_transaction(
        &self,
        tx: &SendTransactionRequest,
    ) -> Result<SendTransactionResponse, ClientError> {
        self.post("/v1/transactions/send", tx).await
    }

    /// GET /v1/accounts/{address}
    pub async fn get_account(&self, address: &str) -> Result<Account, ClientError> {
        self.get(&format!("/v1/accounts/{}", address), &[]).await
    }

    /// GET /v1/accounts/{address}/balance
    pub async fn get_balance(&self, address: &str) -> Result<Balance, ClientError> {
        self.get(&format!("/v1/accounts/{}/balance", address), &[])
            .await
    }

    /// GET /v1/accounts/{address}/transactions?limit=&offset=
    pub async fn get_account_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Transaction>, ClientError> {
        let list: TransactionList = self
            .get(
                &format!("/v1/accounts/{}/transactions", address),
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(list.transactions)
    }

    /// GET /v1/contracts/{address}
    pub async fn get_contract(&self, address: &str) -> Result<Contract, ClientError> {
        self.get(&format!("/v1/contracts/{}", address), &[]).await
    }

    /// POST /v1/contracts/{address}/call
    pub async fn call_contract(
        &self,
        address: &str,
        call: &CallContractRequest,
    ) -> Result<CallContractResponse, ClientError> {
        self.post(&format!("/v1/contracts/{}/call", address), call)
            .await
    }

    /// GET /v1/validators
    pub async fn get_validators(&self) -> Result<Vec<Validator>, ClientError> {
        let list: ValidatorList = self.get("/v1/validators", &[]).await?;
        Ok(list.validators)
    }

    /// GET /v1/validators/{address}/stats. Shape is not fixed by the API, so it stays untyped.
    pub async fn get_validator_stats(
        &self,
        address: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.get(&format!("/v1/validators/{}/stats", address), &[])
            .await
    }

    /// GET /v1/search/{hash}
    pub async fn search_by_hash(&self, hash: &str) -> Result<SearchResult, ClientError> {
        self.get(&format!("/v1/search/{}", hash), &[]).await
    }

    /// GET /v1/search/accounts?q=&limit=
    pub async fn search_accounts(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Account>, ClientError> {
        let list: AccountList = self
            .get(
                "/v1/search/accounts",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(list.accounts)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);
        let mut req = self.client.get(&url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let res = req.send().await?;
        read_envelope(res).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {}", url);
        let res = self.client.post(&url).json(body).send().await?;
        read_envelope(res).await
    }
}

/// `Content-Type: application/json` always; `Authorization: Bearer` only with a credential.
fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = config.bearer_token() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::Config("api key is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Decode the envelope. Non-2xx without an envelope is reported as an HTTP error with the raw body.
async fn read_envelope<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
    let status = res.status();
    let text = res.text().await?;
    let envelope: Envelope<serde_json::Value> = match serde_json::from_str(&text) {
        Ok(env) => env,
        Err(e) if status.is_success() => return Err(ClientError::Decode(e)),
        Err(_) => {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: text,
            })
        }
    };
    if !status.is_success() && envelope.status == EnvelopeStatus::Success {
        return Err(ClientError::Http {
            status: status.as_u16(),
            body: text,
        });
    }
    let data = envelope.into_result()?;
    Ok(serde_json::from_value(data)?)
}
