// Error types for the Room Market state module

use serde::{Deserialize, Serialize};
use crate::models::MarketKind;

/// Failure of a user action. Every variant leaves prior state intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomError {
    /// No market with this id in the catalog
    MarketNotFound(String),
    /// Action needs a selected market
    NoActiveMarket,
    /// Action belongs to another mode engine
    WrongMarketKind { expected: MarketKind, actual: MarketKind },
    /// Option index outside the market's option list
    InvalidSelection(i64),
    /// Negative, zero or non-finite stake
    InvalidAmount(f64),
    /// No identity could be connected
    ConnectionFailed(String),
    /// Payment rejected or provider error
    PaymentFailed(String),
    /// Arena action not allowed in the current state
    InvalidTransition { state: String, action: String },
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::MarketNotFound(id) => write!(f, "Market not found: {}", id),
            RoomError::NoActiveMarket => write!(f, "No market selected"),
            RoomError::WrongMarketKind { expected, actual } => {
                write!(f, "Wrong market kind: expected {}, got {}", expected, actual)
            }
            RoomError::InvalidSelection(idx) => write!(f, "Invalid selection: option {}", idx),
            RoomError::InvalidAmount(amount) => write!(f, "Invalid amount: {}", amount),
            RoomError::ConnectionFailed(msg) => write!(f, "Wallet connection failed: {}", msg),
            RoomError::PaymentFailed(msg) => write!(f, "Payment failed: {}", msg),
            RoomError::InvalidTransition { state, action } => {
                write!(f, "Cannot {} while {}", action, state)
            }
        }
    }
}

impl std::error::Error for RoomError {}

pub type RoomResult<T> = Result<T, RoomError>;
