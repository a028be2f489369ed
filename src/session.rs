// Session state for the currently selected market

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DEFAULT_ACTIVITY_LOG_CAP;
use crate::models::{Activity, ActivityEntry, Participant};

/// The live, resettable state of the selected market.
/// Switching markets or disconnecting clears participants and log;
/// the catalog is never touched from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub active_market: Option<String>,
    pub identity: Option<String>,
    pub participants: Vec<Participant>,
    pub log: VecDeque<ActivityEntry>,
    #[serde(skip, default = "default_cap")]
    log_cap: usize,
}

fn default_cap() -> usize {
    DEFAULT_ACTIVITY_LOG_CAP
}

impl Default for Session {
    fn default() -> Self {
        Self::with_log_cap(DEFAULT_ACTIVITY_LOG_CAP)
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_cap(log_cap: usize) -> Self {
        Self {
            active_market: None,
            identity: None,
            participants: Vec::new(),
            log: VecDeque::new(),
            log_cap: log_cap.max(1),
        }
    }

    pub fn connect(&mut self, identity: &str) {
        info!("🔐 Identity connected: {}", identity);
        self.identity = Some(identity.to_string());
    }

    /// Make `market_id` the active market with an empty session
    pub fn select(&mut self, market_id: &str) {
        self.active_market = Some(market_id.to_string());
        self.participants.clear();
        self.log.clear();
        info!("🎪 Session switched to market {}", market_id);
    }

    /// Clear everything, identity included (disconnect)
    pub fn reset(&mut self) {
        self.active_market = None;
        self.identity = None;
        self.participants.clear();
        self.log.clear();
        info!("👋 Session reset");
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    pub fn participant(&self, address: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.address == address)
    }

    pub fn participant_mut(&mut self, address: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.address == address)
    }

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    /// Append to the activity log, dropping the oldest entries past the cap
    pub fn record(&mut self, activity: Activity) {
        info!("[{}] {} {}", chrono::Local::now().format("%H:%M:%S"), activity.emoji(), activity.describe());
        self.log.push_back(ActivityEntry::now(activity));
        while self.log.len() > self.log_cap {
            self.log.pop_front();
        }
    }

    /// Most recent entries first
    pub fn recent_activity(&self, limit: usize) -> Vec<&ActivityEntry> {
        self.log.iter().rev().take(limit).collect()
    }
}
