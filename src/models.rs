// Data models for the Room Market state module

use serde::{Deserialize, Serialize};

/// Maximum number of options a Prediction market can carry
pub const MAX_OPTIONS: usize = 20;

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

// ===== MARKET =====

/// Interaction mode of a market, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketKind {
    Arena,
    Prediction,
    RedPacket,
}

impl MarketKind {
    /// Title used when a market is created with an empty one
    pub fn placeholder_title(&self) -> &'static str {
        match self {
            MarketKind::Arena => "Speed Arena",
            MarketKind::Prediction => "Untitled Market",
            MarketKind::RedPacket => "Lucky Red Packet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketKind::Arena => "arena",
            MarketKind::Prediction => "prediction",
            MarketKind::RedPacket => "red packet",
        }
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Open,
    Active,
    Settled,
}

/// One configured engagement unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub kind: MarketKind,
    pub title: String,
    /// Candidate outcomes, only meaningful for Prediction markets
    pub options: Vec<String>,
    /// 0 means free (gas only)
    pub entry_fee: f64,
    pub total_pool: f64,
    pub created_at: u64,
    pub status: MarketStatus,
    /// Receives entry-fee payments
    pub creator: String,
}

impl Market {
    pub fn is_free(&self) -> bool {
        self.entry_fee <= 0.0
    }

    /// Applies `total_pool = max(0, total_pool + delta)`
    pub fn apply_pool_delta(&mut self, delta: f64) {
        self.total_pool = (self.total_pool + delta).max(0.0);
    }
}

// ===== PARTICIPANT =====

/// One identity's involvement in the active session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub address: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_option: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_amount: Option<f64>,
}

impl Participant {
    pub fn player(address: &str) -> Self {
        Self {
            address: address.to_string(),
            score: 0,
            bet_option: None,
            bet_amount: None,
            claimed_amount: None,
        }
    }

    pub fn bettor(address: &str, option: usize, amount: f64) -> Self {
        Self {
            bet_option: Some(option),
            bet_amount: Some(amount),
            ..Self::player(address)
        }
    }

    pub fn claimer(address: &str, amount: f64) -> Self {
        Self {
            claimed_amount: Some(amount),
            ..Self::player(address)
        }
    }
}

// ===== ACTIVITY LOG =====

/// What happened, with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Activity {
    PlayerJoined { address: String },
    ScoreCommitted { address: String, score: u32 },
    BetPlaced { address: String, option: usize, amount: f64 },
    PacketClaimed { address: String, amount: f64 },
}

impl Activity {
    pub fn emoji(&self) -> &'static str {
        match self {
            Activity::PlayerJoined { .. } => "⚡",
            Activity::ScoreCommitted { .. } => "🏁",
            Activity::BetPlaced { .. } => "🎯",
            Activity::PacketClaimed { .. } => "🧧",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Activity::PlayerJoined { address } => format!("{} joined", address),
            Activity::ScoreCommitted { address, score } => format!("{} scored {}", address, score),
            Activity::BetPlaced { address, option, amount } => {
                format!("{} bet {} on option {}", address, amount, option)
            }
            Activity::PacketClaimed { address, amount } => format!("{} claimed {}", address, amount),
        }
    }
}

/// Append-only feed entry used by the recent-activity list and the big-screen ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: u64,
    #[serde(flatten)]
    pub activity: Activity,
}

impl ActivityEntry {
    pub fn now(activity: Activity) -> Self {
        Self { timestamp: now_millis(), activity }
    }
}
