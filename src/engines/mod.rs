// ============================================================================
// Mode Engines - one state machine per market kind
// ============================================================================
//
//   - arena: timed click scoring with simulated verification
//   - prediction: option staking and pool-derived odds
//   - red_packet: randomized claims against a pre-funded pool
//
// Engines validate against the catalog and session and apply transitions.
// Payment happens before `apply_*` is called, so a failed payment never
// reaches them.
// ============================================================================

pub mod arena;
pub mod prediction;
pub mod red_packet;

pub use arena::*;
pub use prediction::*;
pub use red_packet::*;

use crate::errors::{RoomError, RoomResult};
use crate::models::{Market, MarketKind};

pub(crate) fn require_kind(market: &Market, expected: MarketKind) -> RoomResult<()> {
    if market.kind != expected {
        return Err(RoomError::WrongMarketKind { expected, actual: market.kind });
    }
    Ok(())
}
