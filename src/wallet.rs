/// Room Market - Identity / Payment Gateway
///
/// Talks to an EIP-1193 style wallet provider over JSON-RPC. Without a
/// provider the gateway hands out a demo identity and every payment made by
/// a demo identity is a fixed-delay success.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::AppConfig;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Identity handed out when no wallet is available
pub const DEMO_IDENTITY: &str = "0x71C...Demo";

/// Creator of the startup presets and fallback for malformed recipients; payments to it are burned
pub const BURN_ADDRESS: &str = "0x000000000000000000000000000000000000dEaD";

/// Provider error code for "unrecognized chain"
pub const UNKNOWN_CHAIN_ERROR: i64 = 4902;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const WEI_PER_UNIT: Decimal = dec!(1_000_000_000_000_000_000);

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalletError {
    /// No provider attached
    NoProvider,
    /// User rejected the request or no account was returned
    Rejected(String),
    /// Provider returned a JSON-RPC error
    Rpc { code: i64, message: String },
    /// Transport failure
    RequestFailed(String),
    /// Unexpected response shape
    InvalidResponse(String),
    /// Amount cannot be expressed in wei
    InvalidAmount(f64),
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::NoProvider => write!(f, "No wallet provider available"),
            WalletError::Rejected(msg) => write!(f, "Request rejected: {}", msg),
            WalletError::Rpc { code, message } => write!(f, "Provider error {}: {}", code, message),
            WalletError::RequestFailed(msg) => write!(f, "Provider request failed: {}", msg),
            WalletError::InvalidResponse(msg) => write!(f, "Invalid provider response: {}", msg),
            WalletError::InvalidAmount(amount) => write!(f, "Invalid payment amount: {}", amount),
        }
    }
}

impl std::error::Error for WalletError {}

// ============================================================================
// NETWORK
// ============================================================================

/// EVM test network the wallet is switched to on connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub decimals: u8,
    pub explorer_url: String,
}

impl NetworkConfig {
    pub fn monad_testnet() -> Self {
        Self {
            chain_id: 10143,
            chain_name: "Monad Testnet".to_string(),
            rpc_url: "https://testnet-rpc.monad.xyz".to_string(),
            currency_name: "MON".to_string(),
            currency_symbol: "MON".to_string(),
            decimals: 18,
            explorer_url: "https://testnet.monadexplorer.com".to_string(),
        }
    }

    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "rpcUrls": [self.rpc_url],
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.currency_symbol,
                "decimals": self.decimals,
            },
            "blockExplorerUrls": [self.explorer_url],
        }])
    }
}

// ============================================================================
// IDENTITY HELPERS
// ============================================================================

pub fn is_demo_identity(identity: &str) -> bool {
    identity.to_lowercase().contains("demo")
}

/// `0x1234...abcd`, or "Demo User" for the demo identity
pub fn shorten(identity: &str) -> String {
    if is_demo_identity(identity) {
        return "Demo User".to_string();
    }
    let chars: Vec<char> = identity.chars().collect();
    if chars.len() <= 10 {
        return identity.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// `0x` followed by 20 hex-encoded bytes
pub fn is_address(value: &str) -> bool {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

/// Convert a native-currency amount to wei without float rounding
pub fn to_wei(amount: f64) -> Result<u128, WalletError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(WalletError::InvalidAmount(amount));
    }
    Decimal::from_str(&amount.to_string())
        .ok()
        .and_then(|d| d.checked_mul(WEI_PER_UNIT))
        .and_then(|wei| wei.trunc().to_u128())
        .ok_or(WalletError::InvalidAmount(amount))
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Request channel to a wallet, EIP-1193 style
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

/// Provider reached over HTTP JSON-RPC
pub struct JsonRpcProvider {
    endpoint_url: String,
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(endpoint_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            endpoint_url: endpoint_url.to_string(),
            client,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self.client
            .post(&self.endpoint_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WalletError::RequestFailed(
                format!("provider returned status {}", response.status())
            ));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(e.to_string()))?;

        if let Some(err) = rpc.error {
            return Err(WalletError::Rpc { code: err.code, message: err.message });
        }
        rpc.result.ok_or_else(|| WalletError::InvalidResponse("missing result".to_string()))
    }
}

// ============================================================================
// GATEWAY
// ============================================================================

#[derive(Clone)]
pub struct Wallet {
    provider: Option<Arc<dyn WalletProvider>>,
    network: NetworkConfig,
    mock_delay: Duration,
}

impl Wallet {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, network: NetworkConfig, mock_delay: Duration) -> Self {
        Self { provider, network, mock_delay }
    }

    /// Gateway with no provider: demo identity only
    pub fn demo(mock_delay: Duration) -> Self {
        Self::new(None, NetworkConfig::monad_testnet(), mock_delay)
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let provider = config
            .wallet_rpc_url
            .as_deref()
            .map(|url| Arc::new(JsonRpcProvider::new(url)) as Arc<dyn WalletProvider>);
        Self::new(provider, NetworkConfig::monad_testnet(), config.mock_delay)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Connect an identity. Falls back to the demo identity when no provider is
    /// attached; `None` means the user rejected or the provider failed.
    pub async fn connect(&self) -> Option<String> {
        let provider = match &self.provider {
            Some(p) => p,
            None => {
                warn!("⚠️  No wallet provider, continuing as {}", DEMO_IDENTITY);
                return Some(DEMO_IDENTITY.to_string());
            }
        };

        match self.connect_with(provider.as_ref()).await {
            Ok(address) => {
                info!("💳 Wallet connected: {}", shorten(&address));
                Some(address)
            }
            Err(e) => {
                error!("❌ Wallet connection failed: {}", e);
                None
            }
        }
    }

    async fn connect_with(&self, provider: &dyn WalletProvider) -> Result<String, WalletError> {
        let accounts = provider.request("eth_requestAccounts", json!([])).await?;
        let address = accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(|a| a.as_str())
            .map(str::to_string)
            .ok_or_else(|| WalletError::Rejected("no account returned".to_string()))?;

        self.ensure_network(provider).await?;
        Ok(address)
    }

    /// Switch to the configured chain, adding it when the wallet does not know it
    async fn ensure_network(&self, provider: &dyn WalletProvider) -> Result<(), WalletError> {
        let switch = provider
            .request("wallet_switchEthereumChain", json!([{ "chainId": self.network.chain_id_hex() }]))
            .await;

        match switch {
            Ok(_) => Ok(()),
            Err(WalletError::Rpc { code, .. }) if code == UNKNOWN_CHAIN_ERROR => {
                info!("🌐 Adding {} to wallet", self.network.chain_name);
                provider
                    .request("wallet_addEthereumChain", self.network.add_chain_params())
                    .await
                    .map(|_| ())
            }
            Err(e) => {
                warn!("⚠️  Network switch failed, staying on current chain: {}", e);
                Ok(())
            }
        }
    }

    /// Transfer `amount` from `from` to `to`. Demo identities and zero
    /// amounts only wait the simulated block time.
    pub async fn pay(&self, from: &str, to: &str, amount: f64) -> Result<(), WalletError> {
        if is_demo_identity(from) || amount == 0.0 {
            tokio::time::sleep(self.mock_delay).await;
            return Ok(());
        }

        let provider = self.provider.as_ref().ok_or(WalletError::NoProvider)?;
        let wei = to_wei(amount)?;

        let recipient = if is_address(to) {
            to
        } else {
            warn!("⚠️  Invalid recipient {}, burning to {}", to, BURN_ADDRESS);
            BURN_ADDRESS
        };

        let tx = json!([{
            "from": from,
            "to": recipient,
            "value": format!("0x{:x}", wei),
        }]);

        match provider.request("eth_sendTransaction", tx).await {
            Ok(hash) => {
                info!("📤 Transaction sent: {} ({} {})", hash, amount, self.network.currency_symbol);
                Ok(())
            }
            Err(e) => {
                error!("❌ Payment failed: {}", e);
                Err(e)
            }
        }
    }
}
