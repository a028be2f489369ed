// Red Packet Engine - randomized claims against a pre-funded pool
//
// A single claim draws from [0, pool / 5) where pool is the market pool at
// claim time. Nothing caps the cumulative amount claimed beyond clamping the
// pool at zero.

use rand::Rng;
use tracing::info;

use crate::catalog::MarketCatalog;
use crate::errors::{RoomError, RoomResult};
use crate::models::{Activity, Market, MarketKind, Participant};
use crate::session::Session;
use super::require_kind;

/// A single claim draws at most pool / CLAIM_DIVISOR
pub const CLAIM_DIVISOR: f64 = 5.0;

pub fn validate_claim(market: &Market) -> RoomResult<()> {
    require_kind(market, MarketKind::RedPacket)
}

/// Uniform draw in `[0, total_pool / 5]`, floored to cents so it never exceeds the ceiling
pub fn draw_claim<R: Rng + ?Sized>(total_pool: f64, rng: &mut R) -> f64 {
    let ceiling = total_pool / CLAIM_DIVISOR;
    if !ceiling.is_finite() || ceiling <= 0.0 {
        return 0.0;
    }
    let raw = rng.gen_range(0.0..ceiling);
    (raw * 100.0).floor() / 100.0
}

/// Draw and record a claim: participant, log entry, pool -= amount. Returns the amount.
pub fn apply_claim<R: Rng + ?Sized>(
    catalog: &mut MarketCatalog,
    session: &mut Session,
    market_id: &str,
    identity: &str,
    rng: &mut R,
) -> RoomResult<f64> {
    let market = catalog.get(market_id).ok_or_else(|| RoomError::MarketNotFound(market_id.to_string()))?;
    validate_claim(market)?;
    let amount = draw_claim(market.total_pool, rng);

    session.add_participant(Participant::claimer(identity, amount));
    session.record(Activity::PacketClaimed { address: identity.to_string(), amount });
    catalog.adjust_pool(market_id, -amount);
    catalog.mark_participation(market_id);
    info!("🧧 {} claimed {} from {}", identity, amount, market_id);
    Ok(amount)
}
