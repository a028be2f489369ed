// Wallet routes for Room Market
// Connecting goes through the wallet gateway; without a provider the demo identity is used

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app_state::SharedState;
use crate::handlers::{error_response, ApiResult};
use crate::wallet::{is_demo_identity, shorten};

/// POST /wallet/connect
pub async fn connect_wallet(State(state): State<SharedState>) -> ApiResult {
    let mut app = state.lock().await;
    let identity = app.room.connect().await.map_err(error_response)?;
    let network = app.room.wallet().network();

    Ok(Json(json!({
        "success": true,
        "identity": identity,
        "display_name": shorten(&identity),
        "is_demo": is_demo_identity(&identity),
        "chain_id": network.chain_id,
        "currency": network.currency_symbol,
    })))
}

/// POST /wallet/disconnect
/// Clears identity, active market, participants and log
pub async fn disconnect_wallet(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    let mut app = state.lock().await;
    app.room.reset_session();
    (StatusCode::OK, Json(json!({ "success": true })))
}
