//! Router-level tests against a mocked 1Shot API.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use mockito::{mock, Matcher};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use oneshot_mcp_server::{
    actions::ActionContext,
    api,
    blockchain::{LocalSigner, LocalWalletSigner, NetworkInfo},
    config::Config,
    oneshot::OneShotClient,
    session::AgentSession,
    AppState,
};

const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn test_config() -> Config {
    Config {
        base_url: mockito::server_url(),
        business_id: Uuid::new_v4(),
        poll_interval_ms: 10,
        poll_max_attempts: Some(5),
        ..Default::default()
    }
}

fn create_test_app(config: Config, signer: Option<Arc<dyn LocalSigner>>) -> Router {
    let service = Arc::new(OneShotClient::from_config(&config));
    let context = ActionContext::new(&config, service, signer);
    let state = AppState {
        config: Arc::new(config),
        session: Arc::new(AgentSession::new(Arc::new(context))),
    };
    api::router(state)
}

fn local_signer() -> Arc<dyn LocalSigner> {
    // Signing is offline; the RPC URL is never contacted in these tests.
    Arc::new(
        LocalWalletSigner::new(
            TEST_KEY,
            "http://127.0.0.1:8545",
            NetworkInfo {
                network_id: "base-sepolia".into(),
                chain_id: 84532,
            },
        )
        .unwrap(),
    )
}

fn token_mock() -> mockito::Mock {
    mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-it","expires_in":3600}"#)
        .create()
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn method_json(id: Uuid, state_mutability: &str) -> String {
    json!({
        "id": id,
        "chainId": 84532,
        "contractAddress": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
        "functionName": "transfer",
        "stateMutability": state_mutability
    })
    .to_string()
}

#[tokio::test]
async fn health_reports_registered_actions() {
    let app = create_test_app(test_config(), None);
    let (status, body) = send(app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["actions"], json!(12));
    assert_eq!(body["localWallet"], json!(false));
}

#[tokio::test]
async fn actions_are_listed_with_schemas() {
    let app = create_test_app(test_config(), None);
    let (status, body) = send(app, Method::GET, "/api/actions", None).await;

    assert_eq!(status, StatusCode::OK);
    let actions = body["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 12);
    assert!(actions
        .iter()
        .any(|a| a["name"] == json!("delegate-to-1shot-wallet")));
}

#[tokio::test]
async fn unknown_action_is_not_found() {
    let app = create_test_app(test_config(), None);
    let (status, _) = send(app, Method::POST, "/api/actions/drain-wallet", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_search_is_a_successful_empty_list() {
    let _token = token_mock();
    let _search = mock("POST", "/prompts/search")
        .match_body(Matcher::Json(json!({ "query": "bridge to mars" })))
        .with_status(200)
        .with_body("[]")
        .create();

    let app = create_test_app(test_config(), None);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/actions/search-prompts",
        Some(json!({ "query": "bridge to mars" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "count": 0, "result": [] }));
}

#[tokio::test]
async fn remote_execution_polls_until_completed() {
    let method_id = Uuid::new_v4();
    let tx_id = Uuid::new_v4();

    let _token = token_mock();
    let _method = mock("GET", format!("/methods/{}", method_id).as_str())
        .with_status(200)
        .with_body(method_json(method_id, "nonpayable"))
        .create();
    let execute = mock("POST", format!("/methods/{}/execute", method_id).as_str())
        .match_body(Matcher::Regex(r#""memo":"rent""#.to_string()))
        .with_status(200)
        .with_body(json!({ "id": tx_id, "status": "Submitted" }).to_string())
        .expect(1)
        .create();
    let poll = mock("GET", format!("/transactions/{}", tx_id).as_str())
        .with_status(200)
        .with_body(
            json!({ "id": tx_id, "status": "Completed", "transactionHash": "0xabc" }).to_string(),
        )
        .expect(1)
        .create();

    let app = create_test_app(test_config(), None);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/actions/execute-contract-method-with-1shot-wallet",
        Some(json!({
            "contractMethodId": method_id,
            "params": { "to": TEST_ADDRESS, "amount": "1000000" },
            "memo": "rent"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["result"]["status"], json!("Completed"));
    execute.assert();
    poll.assert();
}

#[tokio::test]
async fn read_of_payable_method_is_rejected_before_calling_read() {
    let method_id = Uuid::new_v4();

    let _token = token_mock();
    let _method = mock("GET", format!("/methods/{}", method_id).as_str())
        .with_status(200)
        .with_body(method_json(method_id, "payable"))
        .create();
    let read = mock("POST", format!("/methods/{}/read", method_id).as_str())
        .expect(0)
        .create();

    let app = create_test_app(test_config(), None);
    let (_, body) = send(
        app,
        Method::POST,
        "/api/actions/read-contract-method",
        Some(json!({ "contractMethodId": method_id, "params": {} })),
    )
    .await;

    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errorKind"], json!("state_mutability_mismatch"));
    read.assert();
}

#[tokio::test]
async fn remote_errors_are_enveloped() {
    let wallet_id = Uuid::new_v4();

    let _token = token_mock();
    let _wallet = mock("GET", Matcher::Regex(format!("^/wallets/{}", wallet_id)))
        .with_status(404)
        .with_body("wallet not found")
        .create();

    let app = create_test_app(test_config(), None);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/actions/get-wallet",
        Some(json!({ "walletId": wallet_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errorKind"], json!("remote_service"));
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn delegation_is_signed_locally_and_stored() {
    let wallet_id = Uuid::new_v4();
    let record_id = Uuid::new_v4();
    let escrow = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    let _token = token_mock();
    let _wallet = mock("GET", Matcher::Regex(format!("^/wallets/{}", wallet_id)))
        .with_status(200)
        .with_body(
            json!({ "id": wallet_id, "accountAddress": escrow, "chainId": 84532 }).to_string(),
        )
        .create();
    let store = mock("POST", format!("/wallets/{}/delegations", wallet_id).as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""startTime":1700000000"#.to_string()),
            Matcher::Regex(r#""endTime":1800000000"#.to_string()),
            Matcher::Regex("delegationData".to_string()),
            Matcher::Regex(TEST_ADDRESS.to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "id": record_id,
                "walletId": wallet_id,
                "delegationData": "{}",
                "startTime": 1700000000u64,
                "endTime": 1800000000u64
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let app = create_test_app(test_config(), Some(local_signer()));
    let (status, body) = send(
        app,
        Method::POST,
        "/api/actions/delegate-to-1shot-wallet",
        Some(json!({
            "walletId": wallet_id,
            "startTime": 1700000000u64,
            "endTime": 1800000000u64,
            "methods": ["transfer(address,uint256)"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["result"]["id"], json!(record_id));
    store.assert();
}

#[tokio::test]
async fn rpc_tools_list_over_http() {
    let app = create_test_app(test_config(), None);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/rpc",
        Some(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 12);
}
