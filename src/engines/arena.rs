// ============================================================================
// Arena Engine - timed click battle
// ============================================================================
//
// States: Idle -> Playing -> Settling -> Result, and Result -> Idle on reset.
//
//   Idle      entry guard decides between paying and re-entering directly
//   Playing   clicks add 1 to the local score, ticks count down from 15
//   Settling  four simulated verification stages, cannot be cancelled
//   Result    rank and prize are shown; the prize is asserted, never paid
//
// Timers live outside this module: the round is advanced by `tick()` and
// `advance_verification()` so a driver decides how long each step takes.
// ============================================================================

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{RoomError, RoomResult};
use crate::models::{Activity, Market, MarketKind, Participant};
use crate::catalog::MarketCatalog;
use crate::session::Session;
use super::require_kind;

/// Countdown length in ticks
pub const ARENA_COUNTDOWN: u32 = 15;

/// Scores above this always take rank 1
pub const WINNING_SCORE: u32 = 100;

/// Share of the pool asserted to the winner
pub const WINNER_SHARE: f64 = 0.8;

pub const MAX_RANK: u32 = 10;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArenaPhase {
    Idle,
    Playing,
    Settling,
    Result,
}

impl std::fmt::Display for ArenaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArenaPhase::Idle => "idle",
            ArenaPhase::Playing => "playing",
            ArenaPhase::Settling => "settling",
            ArenaPhase::Result => "showing result",
        };
        f.write_str(name)
    }
}

/// Simulated verification stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStep {
    Upload,
    NodeA,
    NodeB,
    Consensus,
}

impl VerificationStep {
    fn next(self) -> Option<Self> {
        match self {
            VerificationStep::Upload => Some(VerificationStep::NodeA),
            VerificationStep::NodeA => Some(VerificationStep::NodeB),
            VerificationStep::NodeB => Some(VerificationStep::Consensus),
            VerificationStep::Consensus => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Durations the round driver waits between transitions
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaTimings {
    pub tick: Duration,
    /// Delay spent in each verification stage, indexed by `VerificationStep`
    pub stage_delays: [Duration; 4],
}

impl Default for ArenaTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            stage_delays: [
                Duration::from_millis(800),
                Duration::from_millis(800),
                Duration::from_millis(800),
                Duration::from_millis(600),
            ],
        }
    }
}

impl ArenaTimings {
    pub fn instant() -> Self {
        Self { tick: Duration::ZERO, stage_delays: [Duration::ZERO; 4] }
    }

    pub fn stage_delay(&self, step: VerificationStep) -> Duration {
        self.stage_delays[step.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaOutcome {
    pub score: u32,
    pub rank: u32,
    pub prize: f64,
    pub clicks_per_second: f64,
}

/// How an identity enters the arena from Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaEntry {
    /// First entry this session; the entry fee must be paid
    Pay,
    /// Already a participant; skip payment and play again
    Rejoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { time_left: u32 },
    /// Countdown hit zero, round moved to Settling
    Expired { final_score: u32 },
}

/// One identity's arena round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaRound {
    pub phase: ArenaPhase,
    pub player: Option<String>,
    pub time_left: u32,
    pub local_score: u32,
    pub verification: VerificationStep,
    pub outcome: Option<ArenaOutcome>,
}

impl Default for ArenaRound {
    fn default() -> Self {
        Self {
            phase: ArenaPhase::Idle,
            player: None,
            time_left: ARENA_COUNTDOWN,
            local_score: 0,
            verification: VerificationStep::Upload,
            outcome: None,
        }
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

impl ArenaRound {
    pub fn new() -> Self {
        Self::default()
    }

    fn invalid(&self, action: &str) -> RoomError {
        RoomError::InvalidTransition { state: self.phase.to_string(), action: action.to_string() }
    }

    /// Guard evaluated once when entering from Idle
    pub fn entry_guard(&self, session: &Session, identity: &str) -> RoomResult<ArenaEntry> {
        if self.phase != ArenaPhase::Idle {
            return Err(self.invalid("join"));
        }
        Ok(match session.participant(identity) {
            Some(_) => ArenaEntry::Rejoin,
            None => ArenaEntry::Pay,
        })
    }

    /// Idle -> Playing with a fresh countdown and score
    pub fn start(&mut self, identity: &str) -> RoomResult<()> {
        if self.phase != ArenaPhase::Idle {
            return Err(self.invalid("start"));
        }
        *self = Self {
            phase: ArenaPhase::Playing,
            player: Some(identity.to_string()),
            ..Self::default()
        };
        info!("⚡ Arena round started for {}", identity);
        Ok(())
    }

    pub fn click(&mut self) -> RoomResult<u32> {
        if self.phase != ArenaPhase::Playing {
            return Err(self.invalid("click"));
        }
        self.local_score += 1;
        Ok(self.local_score)
    }

    pub fn tick(&mut self) -> RoomResult<TickOutcome> {
        if self.phase != ArenaPhase::Playing {
            return Err(self.invalid("tick"));
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return Ok(TickOutcome::Running { time_left: self.time_left });
        }

        self.phase = ArenaPhase::Settling;
        self.verification = VerificationStep::Upload;
        info!("🏁 Arena countdown over, final score {}", self.local_score);
        Ok(TickOutcome::Expired { final_score: self.local_score })
    }

    /// Move to the next verification stage. Past Consensus the round is
    /// ranked against `total_pool` and moves to Result.
    pub fn advance_verification<R: Rng + ?Sized>(
        &mut self,
        total_pool: f64,
        rng: &mut R,
    ) -> RoomResult<Option<ArenaOutcome>> {
        if self.phase != ArenaPhase::Settling {
            return Err(self.invalid("verify"));
        }
        if let Some(next) = self.verification.next() {
            self.verification = next;
            debug!("🛰️  Verification stage {:?}", next);
            return Ok(None);
        }

        let outcome = settle(self.local_score, total_pool, rng);
        self.outcome = Some(outcome);
        self.phase = ArenaPhase::Result;
        info!("🏆 Arena settled: rank {} prize {}", outcome.rank, outcome.prize);
        Ok(Some(outcome))
    }

    /// Result -> Idle. Idle stays Idle; a running or settling round cannot be cancelled.
    pub fn reset(&mut self) -> RoomResult<()> {
        match self.phase {
            ArenaPhase::Idle | ArenaPhase::Result => {
                *self = Self::default();
                Ok(())
            }
            ArenaPhase::Playing | ArenaPhase::Settling => Err(self.invalid("reset")),
        }
    }
}

/// Rank 1 for scores above the winning score, otherwise a uniform draw in 1..=10
pub fn settle<R: Rng + ?Sized>(score: u32, total_pool: f64, rng: &mut R) -> ArenaOutcome {
    let rank = if score > WINNING_SCORE { 1 } else { rng.gen_range(1..=MAX_RANK) };
    let prize = if rank == 1 { total_pool * WINNER_SHARE } else { 0.0 };
    ArenaOutcome {
        score,
        rank,
        prize,
        clicks_per_second: score as f64 / ARENA_COUNTDOWN as f64,
    }
}

// ============================================================================
// SESSION TRANSITIONS
// ============================================================================

pub fn validate_join(market: &Market) -> RoomResult<()> {
    require_kind(market, MarketKind::Arena)
}

/// Record a paid entry: participant with score 0, log entry, pool += entry fee
pub fn apply_join(catalog: &mut MarketCatalog, session: &mut Session, market_id: &str, identity: &str) -> RoomResult<()> {
    let market = catalog.get(market_id).ok_or_else(|| RoomError::MarketNotFound(market_id.to_string()))?;
    validate_join(market)?;
    let fee = market.entry_fee;

    session.add_participant(Participant::player(identity));
    session.record(Activity::PlayerJoined { address: identity.to_string() });
    catalog.adjust_pool(market_id, fee);
    catalog.mark_participation(market_id);
    Ok(())
}

/// Write the round's final score into the session participant
pub fn commit_score(session: &mut Session, identity: &str, score: u32) {
    match session.participant_mut(identity) {
        Some(participant) => participant.score = score,
        None => {
            let mut participant = Participant::player(identity);
            participant.score = score;
            session.add_participant(participant);
        }
    }
    session.record(Activity::ScoreCommitted { address: identity.to_string(), score });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn play(round: &mut ArenaRound, clicks: u32) -> u32 {
        round.start("0xplayer").unwrap();
        for _ in 0..clicks {
            round.click().unwrap();
        }
        let mut last = None;
        for _ in 0..ARENA_COUNTDOWN {
            last = Some(round.tick().unwrap());
        }
        match last {
            Some(TickOutcome::Expired { final_score }) => final_score,
            other => panic!("countdown did not expire: {:?}", other),
        }
    }

    fn settle_round(round: &mut ArenaRound, pool: f64, rng: &mut StdRng) -> ArenaOutcome {
        for _ in 0..3 {
            assert!(round.advance_verification(pool, rng).unwrap().is_none());
        }
        assert_eq!(round.verification, VerificationStep::Consensus);
        round.advance_verification(pool, rng).unwrap().unwrap()
    }

    #[test]
    fn test_countdown_commits_click_count() {
        let mut round = ArenaRound::new();
        let score = play(&mut round, 37);
        assert_eq!(score, 37);
        assert_eq!(round.phase, ArenaPhase::Settling);
        assert!(round.click().is_err());
    }

    #[test]
    fn test_high_score_wins_prize() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut round = ArenaRound::new();
        play(&mut round, 101);

        let outcome = settle_round(&mut round, 200.0, &mut rng);
        assert_eq!(outcome.rank, 1);
        assert_eq!(outcome.prize, 160.0);
        assert_eq!(round.phase, ArenaPhase::Result);
    }

    #[test]
    fn test_score_of_exactly_winning_score_is_not_automatic_win() {
        let mut rng = StdRng::seed_from_u64(5);
        let outcomes: Vec<ArenaOutcome> = (0..100).map(|_| settle(WINNING_SCORE, 200.0, &mut rng)).collect();

        assert!(outcomes.iter().any(|o| o.rank != 1));
        for outcome in &outcomes {
            let expected = if outcome.rank == 1 { 160.0 } else { 0.0 };
            assert_eq!(outcome.prize, expected);
        }

        let above = settle(WINNING_SCORE + 1, 200.0, &mut rng);
        assert_eq!(above.rank, 1);
        assert_eq!(above.prize, 160.0);
    }

    #[test]
    fn test_low_score_rank_in_range_and_prize_only_for_first() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let outcome = settle(10, 50.0, &mut rng);
            assert!((1..=MAX_RANK).contains(&outcome.rank));
            if outcome.rank != 1 {
                assert_eq!(outcome.prize, 0.0);
            } else {
                assert_eq!(outcome.prize, 40.0);
            }
        }
    }

    #[test]
    fn test_settling_cannot_be_cancelled() {
        let mut round = ArenaRound::new();
        play(&mut round, 1);
        assert!(round.reset().is_err());
        assert!(round.tick().is_err());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut round = ArenaRound::new();
        play(&mut round, 120);
        settle_round(&mut round, 10.0, &mut rng);

        round.reset().unwrap();
        assert_eq!(round.phase, ArenaPhase::Idle);
        assert_eq!(round.time_left, ARENA_COUNTDOWN);
        assert_eq!(round.local_score, 0);
        assert!(round.outcome.is_none());
    }

    #[test]
    fn test_entry_guard_detects_existing_participant() {
        let mut session = Session::new();
        let round = ArenaRound::new();
        assert_eq!(round.entry_guard(&session, "0xa").unwrap(), ArenaEntry::Pay);

        session.add_participant(Participant::player("0xa"));
        assert_eq!(round.entry_guard(&session, "0xa").unwrap(), ArenaEntry::Rejoin);
    }

    #[test]
    fn test_apply_join_adds_fee_to_pool() {
        let mut catalog = MarketCatalog::with_presets();
        let mut session = Session::new();
        session.select("arena-speed-1");

        apply_join(&mut catalog, &mut session, "arena-speed-1", "0xa").unwrap();
        assert!((catalog.get("arena-speed-1").unwrap().total_pool - 120.6).abs() < 1e-9);
        assert_eq!(session.participants.len(), 1);
        assert_eq!(session.log.len(), 1);

        let err = apply_join(&mut catalog, &mut session, "btc-hash", "0xa").unwrap_err();
        assert!(matches!(err, RoomError::WrongMarketKind { .. }));
    }

    #[test]
    fn test_commit_score_updates_in_place() {
        let mut session = Session::new();
        session.add_participant(Participant::player("0xa"));
        commit_score(&mut session, "0xa", 55);
        assert_eq!(session.participants.len(), 1);
        assert_eq!(session.participant("0xa").unwrap().score, 55);
    }
}
