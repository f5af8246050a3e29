//! Unichain client: HTTP resource calls plus the live-update channel.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rest::RequestGateway;
use crate::types::{
    Account, Balance, Block, CallContractRequest, CallContractResponse, Contract, NetworkStatus,
    SearchResult, SendTransactionRequest, SendTransactionResponse, Transaction, Validator,
};
use crate::ws::SubscriptionMultiplexer;

/// Owns one [`RequestGateway`] and one [`SubscriptionMultiplexer`] built from the same config.
pub struct UnichainClient {
    config: ClientConfig,
    rest: RequestGateway,
    ws: SubscriptionMultiplexer,
}

impl UnichainClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let config = config.resolved();
        let rest = RequestGateway::new(&config)?;
        let ws = SubscriptionMultiplexer::new(&config)?;
        log::debug!(
            "unichain client for {} at {}",
            config.network.as_str(),
            rest.base_url()
        );
        Ok(Self { config, rest, ws })
    }

    /// Snapshot of the configuration, with the base address resolved.
    pub fn config(&self) -> ClientConfig {
        self.config.clone()
    }

    pub fn rest(&self) -> &RequestGateway {
        &self.rest
    }

    /// Live-update channel: connect, subscribe, unsubscribe, disconnect.
    pub fn ws(&self) -> &SubscriptionMultiplexer {
        &self.ws
    }

    pub async fn connect_websocket(&self) -> Result<(), ClientError> {
        self.ws.connect().await
    }

    pub async fn disconnect_websocket(&self) {
        self.ws.disconnect().await
    }

    pub fn subscribe<F>(
        &self,
        channel: impl AsRef<str>,
        address: Option<&str>,
        callback: F,
    ) -> Result<(), ClientError>
    where
        F: Fn(serde_json::Value) + Send + Sync + 'static,
    {
        self.ws.subscribe(channel, address, callback)
    }

    pub fn unsubscribe(&self, channel: impl AsRef<str>, address: Option<&str>) {
        self.ws.unsubscribe(channel, address)
    }

    pub async fn get_status(&self) -> Result<NetworkStatus, ClientError> {
        self.rest.get_status().await
    }

    pub async fn get_block(&self, height: u64) -> Result<Block, ClientError> {
        self.rest.get_block(height).await
    }

    pub async fn get_latest_blocks(&self, limit: u32) -> Result<Vec<Block>, ClientError> {
        self.rest.get_latest_blocks(limit).await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<Transaction, ClientError> {
        self.rest.get_transaction(hash).await
    }

    pub async fn send_transaction(
        &self,
        tx: &SendTransactionRequest,
    ) -> Result<SendTransactionResponse, ClientError> {
        self.rest.send_transaction(tx).await
    }

    pub async fn get_account(&self, address: &str) -> Result<Account, ClientError> {
        self.rest.get_account(address).await
    }

    pub async fn get_balance(&self, address: &str) -> Result<Balance, ClientError> {
        self.rest.get_balance(address).await
    }

    pub async fn get_account_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Transaction>, ClientError> {
        self.rest
            .get_account_transactions(address, limit, offset)
            .await
    }

    pub async fn get_contract(&self, address: &str) -> Result<Contract, ClientError> {
        self.rest.get_contract(address).await
    }

    pub async fn call_contract(
        &self,
        address: &str,
        call: &CallContractRequest,
    ) -> Result<CallContractResponse, ClientError> {
        self.rest.call_contract(address, call).await
    }

    pub async fn get_validators(&self) -> Result<Vec<Validator>, ClientError> {
        self.rest.get_validators().await
    }

    pub async fn get_validator_stats(
        &self,
        address: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.rest.get_validator_stats(address).await
    }

    pub async fn search_by_hash(&self, hash: &str) -> Result<SearchResult, ClientError> {
        self.rest.search_by_hash(hash).await
    }

    pub async fn search_accounts(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Account>, ClientError> {
        self.rest.search_accounts(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    #[test]
    fn config_snapshot_has_resolved_base_url() {
        let client = UnichainClient::new(ClientConfig::new(Network::Local)).unwrap();
        let snapshot = client.config();
        assert_eq!(snapshot.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(snapshot.timeout_ms, 30_000);
        assert_eq!(client.ws().ws_url(), "ws://localhost:8080/v1/ws");
    }

    #[test]
    fn mutating_snapshot_does_not_touch_client() {
        let client = UnichainClient::new(ClientConfig::new(Network::Testnet)).unwrap();
        let mut snapshot = client.config();
        snapshot.base_url = Some("http://evil.example".to_string());
        snapshot.api_key = Some("stolen".to_string());
        assert_eq!(
            client.config().base_url.as_deref(),
            Some("https://testnet-api.unichain.org")
        );
        assert_eq!(client.config().api_key, None);
        assert_eq!(client.rest().base_url(), "https://testnet-api.unichain.org");
    }
}
