// HTTP request handlers for the Room Market API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::{spawn_arena_round, SharedState};
use crate::room::PaymentIntent;
use crate::wallet::Wallet;
use crate::catalog::templates;
use crate::engines::ArenaEntry;
use crate::errors::RoomError;
use crate::models::{Market, MarketKind, Participant};
use crate::projection;
use crate::share::share_link;
use crate::wallet::shorten;

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn status_for(err: &RoomError) -> StatusCode {
    match err {
        RoomError::MarketNotFound(_) => StatusCode::NOT_FOUND,
        RoomError::NoActiveMarket
        | RoomError::WrongMarketKind { .. }
        | RoomError::InvalidSelection(_)
        | RoomError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        RoomError::ConnectionFailed(_) => StatusCode::UNAUTHORIZED,
        RoomError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
        RoomError::InvalidTransition { .. } => StatusCode::CONFLICT,
    }
}

pub fn error_response(err: RoomError) -> (StatusCode, Json<Value>) {
    (status_for(&err), Json(json!({ "success": false, "error": err.to_string() })))
}

/// Await a prepared payment with the room unlocked so reads keep flowing
async fn pay_unlocked(intent: &PaymentIntent, wallet: &Wallet) -> Result<(), (StatusCode, Json<Value>)> {
    if intent.requires_payment() {
        info!("💸 Awaiting payment of {} from {}", intent.amount, shorten(&intent.identity));
    }
    intent.pay(wallet).await.map_err(error_response)
}

fn market_summary(m: &Market) -> Value {
    json!({
        "id": m.id,
        "kind": m.kind,
        "title": m.title,
        "options": m.options,
        "entry_fee": m.entry_fee,
        "total_pool": m.total_pool,
        "status": m.status,
        "creator": m.creator,
        "created_at": m.created_at,
    })
}

// ===== REQUEST TYPES =====

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub kind: MarketKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub entry_fee: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct BetRequest {
    /// Signed so a negative index is reported as an invalid selection
    pub option: i64,
    pub amount: f64,
}

// ===== MARKET ENDPOINTS =====

pub async fn health_check() -> &'static str {
    "Room Market - Online ✅"
}

pub async fn get_markets(State(state): State<SharedState>) -> Json<Value> {
    let app = state.lock().await;
    let markets: Vec<Value> = app.room.catalog().lobby().iter().map(market_summary).collect();
    Json(json!({ "markets": markets, "total": app.room.list_markets().len() }))
}

pub async fn get_market(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let app = state.lock().await;
    let market = app.room.market(&id).map_err(error_response)?;

    let session = app.room.session();
    let is_active = session.active_market.as_deref() == Some(id.as_str());
    let participants: &[Participant] = if is_active { session.participants.as_slice() } else { &[] };

    let mut body = market_summary(market);
    body["is_active"] = json!(is_active);
    body["participant_count"] = json!(participants.len());
    if market.kind == MarketKind::Prediction {
        body["option_lines"] = json!(projection::option_lines(market, participants));
    }
    if market.kind == MarketKind::RedPacket {
        body["claimed_total"] = json!(projection::claimed_total(participants));
    }
    body["share"] = json!(share_link(&app.config.origin, &market.id));
    Ok(Json(body))
}

pub async fn get_share(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let app = state.lock().await;
    let market = app.room.market(&id).map_err(error_response)?;
    Ok(Json(json!(share_link(&app.config.origin, &market.id))))
}

pub async fn create_market(State(state): State<SharedState>, Json(payload): Json<CreateMarketRequest>) -> ApiResult {
    let mut app = state.lock().await;
    let market = app
        .room
        .create_market(payload.kind, &payload.title, payload.options, payload.entry_fee)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "success": true, "market": market_summary(&market) })))
}

pub async fn select_market(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let mut app = state.lock().await;
    let session = app.room.select_market(&id).await.map_err(error_response)?;
    Ok(Json(json!({ "success": true, "session": session })))
}

pub async fn get_templates() -> Json<Value> {
    Json(json!({ "templates": templates() }))
}

pub async fn generate_market(State(state): State<SharedState>, Json(payload): Json<GenerateRequest>) -> Json<Value> {
    // The service call can be slow; do not hold the room while waiting
    let generator = state.lock().await.generator.clone();
    let generated = generator.generate(&payload.prompt).await;
    Json(json!(generated))
}

// ===== SESSION ENDPOINTS =====

pub async fn get_session(State(state): State<SharedState>) -> Json<Value> {
    let app = state.lock().await;
    let session = app.room.session();
    Json(json!({
        "identity": session.identity,
        "display_name": session.identity.as_deref().map(shorten),
        "active_market": session.active_market,
        "participants": session.participants,
        "log": session.log,
    }))
}

pub async fn get_big_screen(State(state): State<SharedState>) -> ApiResult {
    let app = state.lock().await;
    let screen = app.room.big_screen().map_err(error_response)?;
    Ok(Json(json!(screen)))
}

// ===== ARENA ENDPOINTS =====

pub async fn get_arena(State(state): State<SharedState>) -> Json<Value> {
    let app = state.lock().await;
    Json(json!({ "round_id": app.room.arena_round_id(), "round": app.room.arena() }))
}

pub async fn join_arena(State(state): State<SharedState>) -> ApiResult {
    let (intent, wallet) = {
        let mut app = state.lock().await;
        let intent = app.room.prepare_arena_join().await.map_err(error_response)?;
        (intent, app.room.wallet().clone())
    };
    pay_unlocked(&intent, &wallet).await?;

    let (entry, round_id) = {
        let mut app = state.lock().await;
        let entry = app.room.finish_arena_join(&intent).map_err(error_response)?;
        (entry, app.room.arena_round_id())
    };

    spawn_arena_round(state.clone(), round_id);
    info!("⏱️  Arena round {} running", round_id);
    Ok(Json(json!({
        "success": true,
        "paid": entry == ArenaEntry::Pay,
        "round_id": round_id,
    })))
}

pub async fn arena_click(State(state): State<SharedState>) -> ApiResult {
    let mut app = state.lock().await;
    let score = app.room.arena_click().map_err(error_response)?;
    Ok(Json(json!({ "score": score, "time_left": app.room.arena().time_left })))
}

pub async fn reset_arena(State(state): State<SharedState>) -> ApiResult {
    let mut app = state.lock().await;
    app.room.reset_arena().map_err(error_response)?;
    Ok(Json(json!({ "success": true, "round": app.room.arena() })))
}

// ===== PREDICTION & RED PACKET ENDPOINTS =====

pub async fn place_bet(State(state): State<SharedState>, Json(payload): Json<BetRequest>) -> ApiResult {
    let option = usize::try_from(payload.option)
        .map_err(|_| error_response(RoomError::InvalidSelection(payload.option)))?;

    let (intent, wallet) = {
        let mut app = state.lock().await;
        let intent = app.room.prepare_bet(option, payload.amount).await.map_err(error_response)?;
        (intent, app.room.wallet().clone())
    };
    pay_unlocked(&intent, &wallet).await?;

    let mut app = state.lock().await;
    app.room.finish_bet(&intent).map_err(error_response)?;
    let total_pool = app.room.active_market().map_err(error_response)?.total_pool;
    let option_lines = app.room.option_lines().map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "total_pool": total_pool,
        "option_lines": option_lines,
    })))
}

pub async fn claim_red_packet(State(state): State<SharedState>) -> ApiResult {
    let (intent, wallet) = {
        let mut app = state.lock().await;
        let intent = app.room.prepare_claim().await.map_err(error_response)?;
        (intent, app.room.wallet().clone())
    };
    pay_unlocked(&intent, &wallet).await?;

    let mut app = state.lock().await;
    let amount = app.room.finish_claim(&intent).map_err(error_response)?;
    let remaining = app.room.active_market().map_err(error_response)?.total_pool;
    Ok(Json(json!({ "success": true, "amount": amount, "remaining_pool": remaining })))
}
