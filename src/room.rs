// ============================================================================
// RoomMarket - owner of the catalog, the session and the arena round
// ============================================================================
//
// Every mutation goes through the methods below. A paid action runs in
// three steps: `prepare_*` validates and connects, the returned intent is
// paid, and `finish_*` re-checks the session and applies the transition.
// A failure anywhere leaves the state as it was.
// ============================================================================

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::catalog::MarketCatalog;
use crate::config::AppConfig;
use crate::engines::{
    arena, prediction, red_packet, ArenaEntry, ArenaOutcome, ArenaRound, TickOutcome,
};
use crate::errors::{RoomError, RoomResult};
use crate::models::{Market, MarketKind};
use crate::projection::{self, BigScreen, OptionLine};
use crate::session::Session;
use crate::wallet::Wallet;

pub struct RoomMarket {
    catalog: MarketCatalog,
    session: Session,
    arena: ArenaRound,
    /// Bumped whenever a new arena round starts or the round is discarded
    arena_round_id: u64,
    /// Bumped whenever the session is replaced (select, create, disconnect)
    session_generation: u64,
    wallet: Wallet,
    rng: StdRng,
}

/// What a prepared payment will buy once it clears
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentPurpose {
    ArenaEntry(ArenaEntry),
    Bet { option_index: usize, amount: f64 },
    RedPacketClaim,
}

/// A validated action waiting on its payment. Built under the room lock,
/// paid without it, then handed back to the matching `finish_*` method.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub market_id: String,
    pub identity: String,
    pub payee: String,
    pub amount: f64,
    pub purpose: PaymentPurpose,
    session_generation: u64,
    arena_round_id: u64,
}

impl PaymentIntent {
    /// Arena re-entries are free
    pub fn requires_payment(&self) -> bool {
        self.purpose != PaymentPurpose::ArenaEntry(ArenaEntry::Rejoin)
    }

    pub async fn pay(&self, wallet: &Wallet) -> RoomResult<()> {
        if !self.requires_payment() {
            return Ok(());
        }
        wallet
            .pay(&self.identity, &self.payee, self.amount)
            .await
            .map_err(|e| RoomError::PaymentFailed(e.to_string()))
    }
}

impl RoomMarket {
    pub fn new(wallet: Wallet, activity_log_cap: usize) -> Self {
        Self {
            catalog: MarketCatalog::with_presets(),
            session: Session::with_log_cap(activity_log_cap),
            arena: ArenaRound::new(),
            arena_round_id: 0,
            session_generation: 0,
            wallet,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Wallet::from_config(config), config.activity_log_cap)
    }

    /// Replace the random source, e.g. with a seeded one
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_catalog(mut self, catalog: MarketCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    // ===== READS =====

    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn arena(&self) -> &ArenaRound {
        &self.arena
    }

    pub fn arena_round_id(&self) -> u64 {
        self.arena_round_id
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn list_markets(&self) -> &[Market] {
        self.catalog.list_markets()
    }

    pub fn market(&self, market_id: &str) -> RoomResult<&Market> {
        self.catalog
            .get(market_id)
            .ok_or_else(|| RoomError::MarketNotFound(market_id.to_string()))
    }

    pub fn active_market(&self) -> RoomResult<&Market> {
        let id = self.session.active_market.as_deref().ok_or(RoomError::NoActiveMarket)?;
        self.market(id)
    }

    fn active_of_kind(&self, kind: MarketKind) -> RoomResult<Market> {
        let market = self.active_market()?;
        if market.kind != kind {
            return Err(RoomError::WrongMarketKind { expected: kind, actual: market.kind });
        }
        Ok(market.clone())
    }

    pub fn option_lines(&self) -> RoomResult<Vec<OptionLine>> {
        let market = self.active_of_kind(MarketKind::Prediction)?;
        Ok(projection::option_lines(&market, &self.session.participants))
    }

    pub fn big_screen(&self) -> RoomResult<BigScreen> {
        Ok(projection::big_screen(self.active_market()?, &self.session))
    }

    // ===== IDENTITY & SESSION =====

    /// Connect through the wallet unless an identity is already connected
    pub async fn connect(&mut self) -> RoomResult<String> {
        if let Some(identity) = &self.session.identity {
            return Ok(identity.clone());
        }
        let identity = self
            .wallet
            .connect()
            .await
            .ok_or_else(|| RoomError::ConnectionFailed("wallet returned no identity".to_string()))?;
        self.session.connect(&identity);
        Ok(identity)
    }

    /// Disconnect: clears the session and discards any arena round
    pub fn reset_session(&mut self) -> &Session {
        self.session.reset();
        self.replace_session();
        &self.session
    }

    /// Activate a market with an empty session, connecting an identity first if needed
    pub async fn select_market(&mut self, market_id: &str) -> RoomResult<&Session> {
        self.market(market_id)?;
        self.connect().await?;
        self.session.select(market_id);
        self.replace_session();
        Ok(&self.session)
    }

    /// Create a market owned by the connected identity and make it active
    pub async fn create_market(
        &mut self,
        kind: MarketKind,
        title: &str,
        options: Vec<String>,
        entry_fee: f64,
    ) -> RoomResult<Market> {
        let creator = self.connect().await?;
        let market = self.catalog.create_market(kind, title, options, entry_fee, &creator);
        self.session.select(&market.id);
        self.replace_session();
        Ok(market)
    }

    fn replace_session(&mut self) {
        self.session_generation += 1;
        self.discard_arena_round();
    }

    fn discard_arena_round(&mut self) {
        self.arena = ArenaRound::new();
        self.arena_round_id += 1;
    }

    fn intent(&self, market: &Market, identity: String, amount: f64, purpose: PaymentPurpose) -> PaymentIntent {
        PaymentIntent {
            market_id: market.id.clone(),
            identity,
            payee: market.creator.clone(),
            amount,
            purpose,
            session_generation: self.session_generation,
            arena_round_id: self.arena_round_id,
        }
    }

    /// The session an intent was prepared in must still be the live one
    fn check_intent(&self, intent: &PaymentIntent, kind: MarketKind) -> RoomResult<Market> {
        let market = self.active_of_kind(kind)?;
        let same_identity = self.session.identity.as_deref() == Some(intent.identity.as_str());
        if market.id != intent.market_id
            || !same_identity
            || self.session_generation != intent.session_generation
        {
            warn!("💸 Session changed while paying {} to {}", intent.amount, intent.payee);
            return Err(RoomError::InvalidTransition {
                state: "session replaced".to_string(),
                action: "apply payment".to_string(),
            });
        }
        Ok(market)
    }

    fn wrong_purpose(intent: &PaymentIntent, action: &str) -> RoomError {
        RoomError::InvalidTransition { state: format!("{:?}", intent.purpose), action: action.to_string() }
    }

    // ===== ARENA =====

    /// Validate entry from Idle and connect; the entry fee is not paid yet
    pub async fn prepare_arena_join(&mut self) -> RoomResult<PaymentIntent> {
        let market = self.active_of_kind(MarketKind::Arena)?;
        let identity = self.connect().await?;
        let entry = self.arena.entry_guard(&self.session, &identity)?;
        Ok(self.intent(&market, identity, market.entry_fee, PaymentPurpose::ArenaEntry(entry)))
    }

    /// Record a paid entry (or a re-entry) and start the round
    pub fn finish_arena_join(&mut self, intent: &PaymentIntent) -> RoomResult<ArenaEntry> {
        let entry = match intent.purpose {
            PaymentPurpose::ArenaEntry(entry) => entry,
            _ => return Err(Self::wrong_purpose(intent, "join")),
        };
        let market = self.check_intent(intent, MarketKind::Arena)?;
        if self.arena_round_id != intent.arena_round_id {
            return Err(RoomError::InvalidTransition {
                state: "round replaced".to_string(),
                action: "join".to_string(),
            });
        }
        if self.arena.entry_guard(&self.session, &intent.identity)? != entry {
            return Err(Self::wrong_purpose(intent, "join"));
        }

        if entry == ArenaEntry::Pay {
            arena::apply_join(&mut self.catalog, &mut self.session, &market.id, &intent.identity)?;
        } else {
            info!("🔁 {} re-entering arena without payment", intent.identity);
        }

        self.arena.start(&intent.identity)?;
        self.arena_round_id += 1;
        Ok(entry)
    }

    /// Enter the arena: pay once per session, then start a round
    pub async fn join_arena(&mut self) -> RoomResult<ArenaEntry> {
        let intent = self.prepare_arena_join().await?;
        intent.pay(&self.wallet).await?;
        self.finish_arena_join(&intent)
    }

    pub fn arena_click(&mut self) -> RoomResult<u32> {
        self.arena.click()
    }

    /// Count down one tick; on expiry the final score is committed to the session
    pub fn arena_tick(&mut self) -> RoomResult<TickOutcome> {
        let outcome = self.arena.tick()?;
        if let TickOutcome::Expired { final_score } = outcome {
            match self.arena.player.clone() {
                Some(player) => arena::commit_score(&mut self.session, &player, final_score),
                None => warn!("Arena round expired without a player"),
            }
        }
        Ok(outcome)
    }

    pub fn advance_arena_verification(&mut self) -> RoomResult<Option<ArenaOutcome>> {
        let total_pool = self.active_of_kind(MarketKind::Arena)?.total_pool;
        self.arena.advance_verification(total_pool, &mut self.rng)
    }

    pub fn reset_arena(&mut self) -> RoomResult<()> {
        self.arena.reset()
    }

    // ===== PREDICTION =====

    pub async fn prepare_bet(&mut self, option_index: usize, amount: f64) -> RoomResult<PaymentIntent> {
        let market = self.active_of_kind(MarketKind::Prediction)?;
        prediction::validate_bet(&market, option_index, amount)?;
        let identity = self.connect().await?;
        Ok(self.intent(&market, identity, amount, PaymentPurpose::Bet { option_index, amount }))
    }

    pub fn finish_bet(&mut self, intent: &PaymentIntent) -> RoomResult<()> {
        let (option_index, amount) = match intent.purpose {
            PaymentPurpose::Bet { option_index, amount } => (option_index, amount),
            _ => return Err(Self::wrong_purpose(intent, "bet")),
        };
        let market = self.check_intent(intent, MarketKind::Prediction)?;
        prediction::apply_bet(&mut self.catalog, &mut self.session, &market.id, &intent.identity, option_index, amount)
    }

    pub async fn place_bet(&mut self, option_index: usize, amount: f64) -> RoomResult<()> {
        let intent = self.prepare_bet(option_index, amount).await?;
        intent.pay(&self.wallet).await?;
        self.finish_bet(&intent)
    }

    // ===== RED PACKET =====

    pub async fn prepare_claim(&mut self) -> RoomResult<PaymentIntent> {
        let market = self.active_of_kind(MarketKind::RedPacket)?;
        let identity = self.connect().await?;
        Ok(self.intent(&market, identity, market.entry_fee, PaymentPurpose::RedPacketClaim))
    }

    /// Draw against the pool as it is now, not as it was when the claim was prepared
    pub fn finish_claim(&mut self, intent: &PaymentIntent) -> RoomResult<f64> {
        if intent.purpose != PaymentPurpose::RedPacketClaim {
            return Err(Self::wrong_purpose(intent, "claim"));
        }
        let market = self.check_intent(intent, MarketKind::RedPacket)?;
        red_packet::apply_claim(&mut self.catalog, &mut self.session, &market.id, &intent.identity, &mut self.rng)
    }

    pub async fn claim_red_packet(&mut self) -> RoomResult<f64> {
        let intent = self.prepare_claim().await?;
        intent.pay(&self.wallet).await?;
        self.finish_claim(&intent)
    }
}
