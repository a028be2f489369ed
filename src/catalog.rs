// Market Catalog - ordered collection of markets
//
// Seeded with the startup presets and extended by user-created markets,
// which are prepended so the lobby shows the newest first.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{now_millis, Market, MarketKind, MarketStatus, MAX_OPTIONS};
use crate::wallet::BURN_ADDRESS;

/// Pool a freshly created red packet is pre-funded with
pub const RED_PACKET_SEED_POOL: f64 = 10.0;

/// Markets shown in the lobby
pub const LOBBY_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketCatalog {
    markets: Vec<Market>,
}

impl MarketCatalog {
    pub fn new() -> Self {
        Self { markets: Vec::new() }
    }

    /// Catalog holding the startup presets
    pub fn with_presets() -> Self {
        let markets = presets();
        info!("📊 Market catalog seeded with {} presets", markets.len());
        Self { markets }
    }

    pub fn list_markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn lobby(&self) -> &[Market] {
        &self.markets[..self.markets.len().min(LOBBY_LIMIT)]
    }

    pub fn get(&self, market_id: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.id == market_id)
    }

    pub(crate) fn get_mut(&mut self, market_id: &str) -> Option<&mut Market> {
        self.markets.iter_mut().find(|m| m.id == market_id)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Create a market with a fresh id and prepend it to the catalog
    pub fn create_market(
        &mut self,
        kind: MarketKind,
        title: &str,
        options: Vec<String>,
        entry_fee: f64,
        creator: &str,
    ) -> Market {
        let title = match title.trim() {
            "" => kind.placeholder_title().to_string(),
            t => t.to_string(),
        };

        let options = match kind {
            MarketKind::Prediction => options
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .take(MAX_OPTIONS)
                .collect(),
            MarketKind::Arena | MarketKind::RedPacket => Vec::new(),
        };

        let entry_fee = if entry_fee.is_finite() { entry_fee.max(0.0) } else { 0.0 };

        let market = Market {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            title,
            options,
            entry_fee,
            total_pool: if kind == MarketKind::RedPacket { RED_PACKET_SEED_POOL } else { 0.0 },
            created_at: now_millis(),
            status: MarketStatus::Open,
            creator: creator.to_string(),
        };

        info!("📊 Market created: {} [{}] by {}", market.title, market.kind, market.creator);
        self.markets.insert(0, market.clone());
        market
    }

    /// `total_pool = max(0, total_pool + delta)`; unknown ids are ignored
    pub fn adjust_pool(&mut self, market_id: &str, delta: f64) {
        match self.get_mut(market_id) {
            Some(market) => {
                market.apply_pool_delta(delta);
                debug!("💰 Pool {} {:+} -> {}", market_id, delta, market.total_pool);
            }
            None => debug!("Pool adjustment for unknown market {}", market_id),
        }
    }

    /// Record that an entry action happened; Red Packets drained to 0 settle
    pub(crate) fn mark_participation(&mut self, market_id: &str) {
        if let Some(market) = self.get_mut(market_id) {
            if market.status == MarketStatus::Open {
                market.status = MarketStatus::Active;
            }
            if market.kind == MarketKind::RedPacket && market.total_pool <= 0.0 {
                market.status = MarketStatus::Settled;
                info!("🧧 Red packet {} fully claimed", market_id);
            }
        }
    }
}

// ===== PRESETS & TEMPLATES =====

fn preset(id: &str, kind: MarketKind, title: &str, options: Vec<String>, entry_fee: f64, pool: f64) -> Market {
    Market {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        options,
        entry_fee,
        total_pool: pool,
        created_at: now_millis(),
        status: MarketStatus::Open,
        creator: BURN_ADDRESS.to_string(),
    }
}

/// Markets available at startup
pub fn presets() -> Vec<Market> {
    let projects = (1..=MAX_OPTIONS).map(|i| format!("Project #{:02}", i)).collect();
    let digits = (0..10).map(|d| d.to_string()).collect();

    vec![
        preset("arena-speed-1", MarketKind::Arena, "Live Click Battle (15s showdown)", vec![], 0.1, 120.5),
        preset("red-packet-1", MarketKind::RedPacket, "Kick-off Red Packet (random amounts)", vec![], 0.0, 100.0),
        preset("hackathon-winner-main", MarketKind::Prediction, "Who wins tonight's hackathon?", projects, 2.0, 2880.0),
        preset("btc-hash", MarketKind::Prediction, "Last digit (0-9) of the next BTC block hash?", digits, 0.5, 300.0),
    ]
}

/// Pre-fill for the market generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTemplate {
    pub name: String,
    pub kind: MarketKind,
    pub title: String,
    pub options: Vec<String>,
    pub entry_fee: f64,
}

pub fn templates() -> Vec<MarketTemplate> {
    let make = |name: &str, kind: MarketKind, title: &str, options: &[&str], entry_fee: f64| MarketTemplate {
        name: name.to_string(),
        kind,
        title: title.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        entry_fee,
    };

    vec![
        make(
            "hackathon",
            MarketKind::Prediction,
            "Who will win the Monad Blitz Hackathon?",
            &["Team Alpha", "Room-Market", "DeFi King", "SpeedRacer"],
            1.0,
        ),
        make(
            "sports",
            MarketKind::Prediction,
            "Lakers vs Warriors - Who wins tonight?",
            &["Lakers", "Warriors", "Draw"],
            5.0,
        ),
        make("arena", MarketKind::Arena, "Monad Speed Arena - Click Battle", &[], 1.0),
    ]
}

pub fn template(name: &str) -> Option<MarketTemplate> {
    templates().into_iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_presets_respect_invariants() {
        let catalog = MarketCatalog::with_presets();
        assert_eq!(catalog.len(), 4);
        for market in catalog.list_markets() {
            assert!(market.options.len() <= MAX_OPTIONS);
            assert!(market.total_pool >= 0.0);
            assert_eq!(market.status, MarketStatus::Open);
            assert_eq!(market.creator, BURN_ADDRESS);
        }
        assert_eq!(catalog.get("btc-hash").unwrap().options.len(), 10);
    }

    #[test]
    fn test_create_prepends_with_unique_ids() {
        let mut catalog = MarketCatalog::with_presets();
        let mut ids = HashSet::new();
        for i in 0..50 {
            let market = catalog.create_market(MarketKind::Arena, &format!("arena {}", i), vec![], 1.0, "0xabc");
            assert!(ids.insert(market.id.clone()));
            assert_eq!(catalog.list_markets()[0].id, market.id);
        }
        assert_eq!(catalog.len(), 54);
        assert_eq!(catalog.lobby().len(), LOBBY_LIMIT);
    }

    #[test]
    fn test_create_applies_defaults() {
        let mut catalog = MarketCatalog::new();

        let packet = catalog.create_market(MarketKind::RedPacket, "  ", vec!["ignored".into()], 0.0, "0xabc");
        assert_eq!(packet.title, "Lucky Red Packet");
        assert_eq!(packet.total_pool, RED_PACKET_SEED_POOL);
        assert!(packet.options.is_empty());

        let options: Vec<String> = (0..30).map(|i| format!("opt {}", i)).chain(["".to_string()]).collect();
        let prediction = catalog.create_market(MarketKind::Prediction, "", options, -3.0, "0xabc");
        assert_eq!(prediction.title, "Untitled Market");
        assert_eq!(prediction.options.len(), MAX_OPTIONS);
        assert_eq!(prediction.total_pool, 0.0);
        assert_eq!(prediction.entry_fee, 0.0);
    }

    #[test]
    fn test_adjust_pool_never_goes_negative() {
        let mut catalog = MarketCatalog::with_presets();
        for delta in [5.0, -200.0, 3.0, -1.0, -1000.0, 0.25] {
            catalog.adjust_pool("red-packet-1", delta);
            assert!(catalog.get("red-packet-1").unwrap().total_pool >= 0.0);
        }
        assert_eq!(catalog.get("red-packet-1").unwrap().total_pool, 0.25);

        catalog.adjust_pool("missing", 10.0);
    }

    #[test]
    fn test_templates_lookup() {
        let sports = template("sports").unwrap();
        assert_eq!(sports.options, vec!["Lakers", "Warriors", "Draw"]);
        assert!(template("chess").is_none());
    }
}
