//! Integration tests: RequestGateway against a wiremock stub of the HTTP API.

use std::time::Duration;

use serde_json::json;
use unichain::types::{CallContractRequest, SendTransactionRequest, TransactionStatus};
use unichain::{ClientConfig, ClientError, Network, UnichainClient};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> UnichainClient {
    let mut config = ClientConfig::new(Network::Local).with_base_url(server.uri());
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }
    UnichainClient::new(config).expect("build client")
}

fn success(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "data": data }))
}

#[tokio::test]
async fn get_status_unwraps_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(success(json!({
            "network": "local",
            "version": "1.0.0",
            "block_height": 42,
            "total_stake": "1000000000000000000000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server, None).get_status().await.unwrap();
    assert_eq!(status.block_height, 42);
    assert_eq!(status.total_stake, "1000000000000000000000000");
}

#[tokio::test]
async fn service_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": "error",
            "error": { "code": 404, "message": "not found" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, None).get_block(999999).await.unwrap_err();
    assert_eq!(err.to_string(), "not found");
    assert_eq!(err.service_message(), Some("not found"));
    assert!(matches!(err, ClientError::Service { code: 404, .. }));
}

#[tokio::test]
async fn service_message_survives_unusual_error_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": "error",
            "error": { "code": "NOT_FOUND", "message": "not found", "details": { "height": 999999 } }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, None).get_block(999999).await.unwrap_err();
    assert_eq!(err.to_string(), "not found");
    assert_eq!(err.service_message(), Some("not found"));
}

#[tokio::test]
async fn error_envelope_with_200_is_still_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/transactions/0xdead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "error": { "code": 400, "message": "bad hash", "details": "odd length" }
        })))
        .mount(&server)
        .await;

    match client_for(&server, None).get_transaction("0xdead").await {
        Err(ClientError::Service { message, details, .. }) => {
            assert_eq!(message, "bad hash");
            assert_eq!(details.as_deref(), Some("odd length"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn non_envelope_failure_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/validators"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    match client_for(&server, None).get_validators().await {
        Err(ClientError::Http { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = UnichainClient::new(
        ClientConfig::new(Network::Local).with_base_url(format!("http://127.0.0.1:{}", port)),
    )
    .unwrap();
    assert!(matches!(
        client.get_status().await,
        Err(ClientError::Transport(_))
    ));
}

#[tokio::test]
async fn bearer_header_sent_once_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .respond_with(success(json!({ "block_height": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, Some("test-key"))
        .get_status()
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let auth: Vec<_> = requests[0].headers.get_all("authorization").iter().collect();
    assert_eq!(auth.len(), 1);
}

#[tokio::test]
async fn bearer_header_sent_once_on_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transactions/send"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(success(json!({ "hash": "0xtx", "status": "pending" })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, Some("test-key"))
        .send_transaction(&SendTransactionRequest {
            from: "0xa".into(),
            to: "0xb".into(),
            amount: "1".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(headers.get_all("authorization").iter().count(), 1);
    assert_eq!(headers.get_all("content-type").iter().count(), 1);
}

#[tokio::test]
async fn configured_timeout_bounds_each_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(success(json!({ "block_height": 1 })).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = UnichainClient::new(
        ClientConfig::new(Network::Local)
            .with_base_url(server.uri())
            .with_timeout_ms(100),
    )
    .unwrap();
    match client.get_status().await {
        Err(ClientError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn no_authorization_header_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(success(json!({ "block_height": 1 })))
        .mount(&server)
        .await;

    client_for(&server, None).get_status().await.unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn latest_blocks_passes_limit_and_unwraps_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/latest"))
        .and(query_param("limit", "10"))
        .respond_with(success(json!({
            "blocks": [
                { "height": 11, "hash": "0xb11", "total_fees": "0.5" },
                { "height": 10, "hash": "0xb10", "total_fees": "0" }
            ]
        })))
        .mount(&server)
        .await;

    let blocks = client_for(&server, None).get_latest_blocks(10).await.unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].height, 11);
    assert_eq!(blocks[0].total_fees, "0.5");
}

#[tokio::test]
async fn account_transactions_pass_limit_and_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/0xabc/transactions"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "40"))
        .respond_with(success(json!({
            "transactions": [{ "hash": "0xt1", "amount": "18446744073709551616", "status": "failed" }]
        })))
        .mount(&server)
        .await;

    let txs = client_for(&server, None)
        .get_account_transactions("0xabc", 20, 40)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, "18446744073709551616");
    assert_eq!(txs[0].status, TransactionStatus::Failed);
}

#[tokio::test]
async fn balance_keeps_decimal_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/0xabc/balance"))
        .respond_with(success(json!({
            "balance": "340282366920938463463374607431768211456",
            "currency": "UNI",
            "decimals": 18
        })))
        .mount(&server)
        .await;

    let balance = client_for(&server, None).get_balance("0xabc").await.unwrap();
    assert_eq!(balance.balance, "340282366920938463463374607431768211456");
    assert_eq!(balance.decimals, 18);
}

#[tokio::test]
async fn send_transaction_posts_body_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transactions/send"))
        .and(body_json(json!({
            "from": "0xa",
            "to": "0xb",
            "amount": "100000000000000000000",
            "signature": "0xsig"
        })))
        .respond_with(success(json!({ "hash": "0xtx", "status": "pending" })))
        .expect(1)
        .mount(&server)
        .await;

    let res = client_for(&server, None)
        .send_transaction(&SendTransactionRequest {
            from: "0xa".into(),
            to: "0xb".into(),
            amount: "100000000000000000000".into(),
            signature: Some("0xsig".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(res.hash, "0xtx");
    assert_eq!(res.status, "pending");
}

#[tokio::test]
async fn call_contract_posts_to_address_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/contracts/0xc0/call"))
        .and(body_json(json!({
            "method": "balanceOf",
            "params": { "owner": "0xa" },
            "from": "0xa",
            "gas_limit": 50000
        })))
        .respond_with(success(json!({
            "transaction_hash": "0xcall",
            "gas_used": 21000,
            "result": { "balance": "7" }
        })))
        .mount(&server)
        .await;

    let mut params = serde_json::Map::new();
    params.insert("owner".into(), json!("0xa"));
    let res = client_for(&server, None)
        .call_contract(
            "0xc0",
            &CallContractRequest {
                method: "balanceOf".into(),
                params,
                from: "0xa".into(),
                gas_limit: Some(50_000),
                gas_price: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(res.gas_used, 21000);
    assert_eq!(res.result["balance"], "7");
}

#[tokio::test]
async fn contract_and_account_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contracts/0xc0"))
        .respond_with(success(json!({
            "address": "0xc0",
            "name": "Token",
            "type": "erc20",
            "methods": [{ "name": "transfer", "signature": "transfer(address,uint256)",
                          "inputs": [{ "name": "to", "type": "address" }], "outputs": [] }],
            "events": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/0xabc"))
        .respond_with(success(json!({ "address": "0xabc", "balance": "5", "is_active": true })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let contract = client.get_contract("0xc0").await.unwrap();
    assert_eq!(contract.typ, "erc20");
    assert_eq!(contract.methods[0].inputs[0].typ, "address");

    let account = client.get_account("0xabc").await.unwrap();
    assert_eq!(account.balance, "5");
    assert!(account.is_active);
}

#[tokio::test]
async fn validators_and_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/validators"))
        .respond_with(success(json!({
            "validators": [{ "address": "0xv", "stake": "9", "commission": 0.05, "is_active": true }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/validators/0xv/stats"))
        .respond_with(success(json!({ "missed_blocks": 3 })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let validators = client.get_validators().await.unwrap();
    assert_eq!(validators[0].stake, "9");
    let stats = client.get_validator_stats("0xv").await.unwrap();
    assert_eq!(stats["missed_blocks"], 3);
}

#[tokio::test]
async fn search_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/0xfeed"))
        .respond_with(success(json!({
            "type": "transaction", "hash": "0xfeed", "block_height": 7, "timestamp": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/accounts"))
        .and(query_param("q", "ali ce"))
        .and(query_param("limit", "10"))
        .respond_with(success(json!({ "accounts": [{ "address": "0xa11ce" }] })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let hit = client.search_by_hash("0xfeed").await.unwrap();
    assert_eq!(hit.typ, "transaction");
    assert_eq!(hit.block_height, 7);

    let accounts = client.search_accounts("ali ce", 10).await.unwrap();
    assert_eq!(accounts[0].address, "0xa11ce");
}

#[tokio::test]
async fn success_envelope_with_wrong_shape_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/1"))
        .respond_with(success(json!("not a block")))
        .mount(&server)
        .await;

    assert!(matches!(
        client_for(&server, None).get_block(1).await,
        Err(ClientError::Decode(_))
    ));
}
