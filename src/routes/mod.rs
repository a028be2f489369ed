// Routes module - assembles every HTTP endpoint into one router

pub mod wallet;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

pub use wallet::*;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== MARKETS =====
        .route("/markets", get(get_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/share", get(get_share))
        .route("/markets/:id/select", post(select_market))
        .route("/templates", get(get_templates))
        .route("/generate", post(generate_market))

        // ===== WALLET & SESSION =====
        .route("/wallet/connect", post(connect_wallet))
        .route("/wallet/disconnect", post(disconnect_wallet))
        .route("/session", get(get_session))
        .route("/session/bigscreen", get(get_big_screen))

        // ===== MODE ENGINES =====
        .route("/arena", get(get_arena))
        .route("/arena/join", post(join_arena))
        .route("/arena/click", post(arena_click))
        .route("/arena/reset", post(reset_arena))
        .route("/prediction/bet", post(place_bet))
        .route("/redpacket/claim", post(claim_red_packet))

        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))

        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
