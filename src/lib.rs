/// Room Market - ephemeral live-event markets
/// Exports all modules for use as a library crate

pub mod models;
pub mod errors;
pub mod config;
pub mod catalog;
pub mod session;
pub mod engines;
pub mod projection;
pub mod wallet;
pub mod generator;
pub mod share;
pub mod room;
pub mod app_state;
pub mod handlers;
pub mod routes;

pub use models::{Market, MarketKind, MarketStatus, Participant, Activity, ActivityEntry, MAX_OPTIONS};
pub use errors::{RoomError, RoomResult};
pub use config::AppConfig;
pub use catalog::{MarketCatalog, MarketTemplate, RED_PACKET_SEED_POOL};
pub use session::Session;
pub use engines::{
    ArenaRound, ArenaPhase, ArenaEntry, ArenaOutcome, ArenaTimings, TickOutcome, VerificationStep,
    option_pools, odds, share as option_share, draw_claim,
};
pub use projection::{BigScreen, OptionLine, LeaderboardRow, ChartRow};
pub use wallet::{Wallet, WalletProvider, JsonRpcProvider, WalletError, NetworkConfig, DEMO_IDENTITY, shorten, is_demo_identity};
pub use generator::{Generator, GenerationService, GeminiClient, GeneratedMarket, GeneratorError, mock_market};
pub use share::{ShareLink, share_link};
pub use room::{PaymentIntent, PaymentPurpose, RoomMarket};
pub use app_state::{AppState, SharedState, spawn_arena_round, run_arena_round};
pub use routes::build_router;
