// HTTP API tests driving the router in-process

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

use room_market::{
    build_router, AppConfig, AppState, ArenaTimings, NetworkConfig, RoomMarket, Wallet, WalletError,
    WalletProvider, DEMO_IDENTITY,
};

fn app() -> Router {
    app_with_wallet(Wallet::demo(Duration::ZERO))
}

fn app_with_wallet(wallet: Wallet) -> Router {
    let config = AppConfig::default();
    let room = RoomMarket::new(wallet, config.activity_log_cap)
        .with_rng(StdRng::seed_from_u64(7));
    let state = AppState::new(config)
        .with_room(room)
        .with_timings(ArenaTimings::instant())
        .shared();
    build_router(state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_lobby_lists_presets() {
    let app = app();
    let (status, body) = call(&app, "GET", "/markets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);

    let (status, body) = call(&app, "GET", "/markets/hackathon-winner-main", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["options"].as_array().unwrap().len(), 20);
    assert_eq!(body["is_active"], false);
    assert!(body["share"]["url"].as_str().unwrap().ends_with("/?market=hackathon-winner-main"));

    let (status, body) = call(&app, "GET", "/markets/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_connect_and_disconnect_demo_identity() {
    let app = app();
    let (status, body) = call(&app, "POST", "/wallet/connect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"], DEMO_IDENTITY);
    assert_eq!(body["display_name"], "Demo User");
    assert_eq!(body["chain_id"], 10143);

    call(&app, "POST", "/markets/btc-hash/select", None).await;
    call(&app, "POST", "/wallet/disconnect", None).await;

    let (_, session) = call(&app, "GET", "/session", None).await;
    assert_eq!(session["identity"], Value::Null);
    assert_eq!(session["active_market"], Value::Null);
}

#[tokio::test]
async fn test_created_prediction_market_takes_bets() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/markets",
        Some(json!({ "kind": "PREDICTION", "title": "A or B?", "options": ["A", " ", "B"], "entry_fee": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["market"]["options"], json!(["A", "B"]));

    call(&app, "POST", "/prediction/bet", Some(json!({ "option": 0, "amount": 2.0 }))).await;
    let (status, body) = call(&app, "POST", "/prediction/bet", Some(json!({ "option": 1, "amount": 3.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pool"], 5.0);
    assert_eq!(body["option_lines"][0]["odds"], 2.5);
    assert_eq!(body["option_lines"][0]["share"], 40.0);

    let (status, _) = call(&app, "POST", "/prediction/bet", Some(json!({ "option": 5, "amount": 1.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, screen) = call(&app, "GET", "/session/bigscreen", None).await;
    assert_eq!(screen["participant_count"], 2);
    assert_eq!(screen["ticker"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_wrong_mode_is_rejected() {
    let app = app();
    let (status, _) = call(&app, "POST", "/redpacket/claim", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    call(&app, "POST", "/markets/btc-hash/select", None).await;
    let (status, body) = call(&app, "POST", "/redpacket/claim", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    call(&app, "POST", "/markets/red-packet-1/select", None).await;
    let (status, body) = call(&app, "POST", "/redpacket/claim", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["amount"].as_f64().unwrap() <= 20.0);
}

#[tokio::test]
async fn test_arena_round_runs_to_result() {
    let app = app();
    call(&app, "POST", "/markets/arena-speed-1/select", None).await;

    let (status, body) = call(&app, "POST", "/arena/join", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paid"], true);

    let mut phase = Value::Null;
    for _ in 0..200 {
        let (_, arena) = call(&app, "GET", "/arena", None).await;
        phase = arena["round"]["phase"].clone();
        if phase == "RESULT" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(phase, "RESULT");

    let (status, body) = call(&app, "POST", "/arena/join", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, "POST", "/arena/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, "POST", "/arena/join", None).await;
    assert_eq!(body["paid"], false);
}

#[tokio::test]
async fn test_generate_without_key_returns_mock() {
    let app = app();
    let (status, body) = call(&app, "POST", "/generate", Some(json!({ "prompt": "coffee" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_mock"], true);
    assert_eq!(body["options"], json!(["Yes", "No"]));
}

/// Wallet whose transfers take a while to be approved
struct SlowApprovalWallet {
    sending: Notify,
    approval_delay: Duration,
}

#[async_trait]
impl WalletProvider for SlowApprovalWallet {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, WalletError> {
        match method {
            "eth_requestAccounts" => Ok(json!(["0xb0b0000000000000000000000000000000000002"])),
            "wallet_switchEthereumChain" => Ok(Value::Null),
            "eth_sendTransaction" => {
                self.sending.notify_one();
                tokio::time::sleep(self.approval_delay).await;
                Ok(json!("0xbeef"))
            }
            other => Err(WalletError::InvalidResponse(format!("unexpected {}", other))),
        }
    }
}

#[tokio::test]
async fn test_reads_proceed_while_payment_pending() {
    let provider = Arc::new(SlowApprovalWallet {
        sending: Notify::new(),
        approval_delay: Duration::from_millis(1500),
    });
    let shared: Arc<dyn WalletProvider> = provider.clone();
    let app = app_with_wallet(Wallet::new(Some(shared), NetworkConfig::monad_testnet(), Duration::ZERO));
    call(&app, "POST", "/markets/btc-hash/select", None).await;

    let bet = tokio::spawn({
        let app = app.clone();
        async move { call(&app, "POST", "/prediction/bet", Some(json!({ "option": 3, "amount": 1.0 }))).await }
    });
    provider.sending.notified().await;

    let (status, lobby) = tokio::time::timeout(Duration::from_millis(300), call(&app, "GET", "/markets", None))
        .await
        .expect("lobby read waited on the pending payment");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lobby["total"], 4);

    let (_, market) = call(&app, "GET", "/markets/btc-hash", None).await;
    assert_eq!(market["total_pool"], 300.0);
    assert!(!bet.is_finished());

    let (status, body) = bet.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pool"], 301.0);
}

#[tokio::test]
async fn test_negative_option_is_invalid_selection() {
    let app = app();
    call(&app, "POST", "/markets/btc-hash/select", None).await;

    let (status, body) = call(&app, "POST", "/prediction/bet", Some(json!({ "option": -1, "amount": 1.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid selection: option -1");

    let (_, session) = call(&app, "GET", "/session", None).await;
    assert_eq!(session["participants"].as_array().unwrap().len(), 0);
}
