// Environment configuration for the Room Market service

use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";
pub const DEFAULT_ORIGIN: &str = "http://localhost:1234";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Simulated block time used for demo-identity payments
pub const MOCK_DELAY_MS: u64 = 400;

/// Activity entries kept per session before the oldest are dropped
pub const DEFAULT_ACTIVITY_LOG_CAP: usize = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Origin used to build share links
    pub origin: String,
    /// JSON-RPC endpoint of the wallet provider; None runs in demo mode
    pub wallet_rpc_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub mock_delay: Duration,
    pub activity_log_cap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            origin: DEFAULT_ORIGIN.to_string(),
            wallet_rpc_url: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            mock_delay: Duration::from_millis(MOCK_DELAY_MS),
            activity_log_cap: DEFAULT_ACTIVITY_LOG_CAP,
        }
    }
}

impl AppConfig {
    /// Load from the process environment, after reading `.env` if present
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = non_empty("ROOM_MARKET_ADDR")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);

        let mock_delay = non_empty("MOCK_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.mock_delay);

        let activity_log_cap = non_empty("ACTIVITY_LOG_CAP")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|cap| *cap > 0)
            .unwrap_or(defaults.activity_log_cap);

        Self {
            bind_addr,
            origin: non_empty("ROOM_MARKET_ORIGIN")
                .map(|o| o.trim_end_matches('/').to_string())
                .unwrap_or(defaults.origin),
            wallet_rpc_url: non_empty("WALLET_RPC_URL"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            mock_delay,
            activity_log_cap,
        }
    }

    pub fn log_status(&self) {
        match &self.wallet_rpc_url {
            Some(url) => tracing::info!("🔗 Wallet provider: {}", url),
            None => tracing::warn!("⚠️  No wallet provider configured, running with demo identity"),
        }
        if self.gemini_api_key.is_none() {
            tracing::warn!("⚠️  GEMINI_API_KEY not set, market generation uses mock data");
        }
    }
}
