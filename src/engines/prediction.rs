// Prediction Engine - option staking with pool-derived odds
//
// Every bet is its own participant record, so one identity can hold several
// positions. Bet bookkeeping and `Market::total_pool` are tracked separately:
// option pools sum to the recorded stakes, not to the market pool.

use tracing::info;

use crate::catalog::MarketCatalog;
use crate::errors::{RoomError, RoomResult};
use crate::models::{Activity, Market, MarketKind, Participant};
use crate::session::Session;
use super::require_kind;

/// Odds shown for an option nobody has backed yet
pub const DEFAULT_ODDS: f64 = 2.0;

pub fn validate_bet(market: &Market, option_index: usize, amount: f64) -> RoomResult<()> {
    require_kind(market, MarketKind::Prediction)?;
    if option_index >= market.options.len() {
        return Err(RoomError::InvalidSelection(i64::try_from(option_index).unwrap_or(i64::MAX)));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(RoomError::InvalidAmount(amount));
    }
    Ok(())
}

/// Record a paid bet: new participant record, log entry, pool += amount
pub fn apply_bet(
    catalog: &mut MarketCatalog,
    session: &mut Session,
    market_id: &str,
    identity: &str,
    option_index: usize,
    amount: f64,
) -> RoomResult<()> {
    let market = catalog.get(market_id).ok_or_else(|| RoomError::MarketNotFound(market_id.to_string()))?;
    validate_bet(market, option_index, amount)?;

    session.add_participant(Participant::bettor(identity, option_index, amount));
    session.record(Activity::BetPlaced { address: identity.to_string(), option: option_index, amount });
    catalog.adjust_pool(market_id, amount);
    catalog.mark_participation(market_id);
    info!("🎯 {} staked {} on option {} of {}", identity, amount, option_index, market_id);
    Ok(())
}

/// Sum of `bet_amount` per option index
pub fn option_pools(participants: &[Participant], options_count: usize) -> Vec<f64> {
    let mut pools = vec![0.0; options_count];
    for participant in participants {
        if let (Some(option), Some(amount)) = (participant.bet_option, participant.bet_amount) {
            if let Some(pool) = pools.get_mut(option) {
                *pool += amount;
            }
        }
    }
    pools
}

/// `total / pool` for a backed option, `DEFAULT_ODDS` otherwise
pub fn odds(total_pool: f64, option_pool: f64) -> f64 {
    if option_pool > 0.0 {
        total_pool / option_pool
    } else {
        DEFAULT_ODDS
    }
}

/// Percentage of all staked value on one option, 0 when nothing is staked
pub fn share(option_pool: f64, pools: &[f64]) -> f64 {
    let sum: f64 = pools.iter().sum();
    if sum > 0.0 {
        option_pool / sum * 100.0
    } else {
        0.0
    }
}
