// Room Market - Main Entry Point
// Live-event markets: click arena, prediction pools and red packets

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use room_market::{build_router, AppConfig, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("═══════════════════════════════════════════════");
    info!("     🎪 Room Market - live event markets");
    info!("═══════════════════════════════════════════════");

    let config = AppConfig::from_env();
    let addr = config.bind_addr;
    let state = AppState::new(config).shared();
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", addr);
    info!("📋 Endpoints:");
    info!("   GET  /markets              - Lobby (first 20 markets)");
    info!("   POST /markets              - Create market");
    info!("   GET  /markets/:id          - Market detail + odds");
    info!("   GET  /markets/:id/share    - Share link + QR");
    info!("   POST /markets/:id/select   - Enter a market");
    info!("   POST /generate             - Generate title/options");
    info!("   POST /wallet/connect       - Connect wallet");
    info!("   POST /wallet/disconnect    - Reset session");
    info!("   GET  /session/bigscreen    - Big-screen projection");
    info!("   POST /arena/join|click|reset, /prediction/bet, /redpacket/claim");

    // All state is in memory; nothing to flush on shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to install CTRL+C handler: {}", e);
        }
        info!("🛑 Shutdown signal received, goodbye 👋");
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!("❌ Server error: {}", e);
    }
}
