// Application state management

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::engines::{ArenaTimings, TickOutcome};
use crate::generator::Generator;
use crate::room::RoomMarket;

/// One local actor drives the room at a time; actions hold the lock across
/// their payment step so a transition is applied atomically.
pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    pub room: RoomMarket,
    pub generator: Generator,
    pub config: AppConfig,
    pub timings: ArenaTimings,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        info!("🚀 Initializing Room Market...");
        config.log_status();

        let state = Self {
            room: RoomMarket::from_config(&config),
            generator: Generator::from_config(&config),
            config,
            timings: ArenaTimings::default(),
        };

        info!("✅ Room Market ready with {} markets", state.room.list_markets().len());
        state
    }

    pub fn with_room(mut self, room: RoomMarket) -> Self {
        self.room = room;
        self
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_timings(mut self, timings: ArenaTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

/// Run the countdown and the verification stages of arena round `round_id`
/// in the background
pub fn spawn_arena_round(state: SharedState, round_id: u64) -> JoinHandle<()> {
    tokio::spawn(run_arena_round(state, round_id))
}

/// Drive one arena round to its result. The lock is taken per step and never
/// held across a sleep; the driver stops as soon as the round is replaced.
pub async fn run_arena_round(state: SharedState, round_id: u64) {
    let timings = state.lock().await.timings.clone();

    loop {
        tokio::time::sleep(timings.tick).await;
        let mut app = state.lock().await;
        if app.room.arena_round_id() != round_id {
            debug!("Arena round {} replaced, countdown stopped", round_id);
            return;
        }
        match app.room.arena_tick() {
            Ok(TickOutcome::Running { .. }) => continue,
            Ok(TickOutcome::Expired { .. }) => break,
            Err(_) => return,
        }
    }

    loop {
        let step = {
            let app = state.lock().await;
            if app.room.arena_round_id() != round_id {
                return;
            }
            app.room.arena().verification
        };
        tokio::time::sleep(timings.stage_delay(step)).await;

        let mut app = state.lock().await;
        if app.room.arena_round_id() != round_id {
            return;
        }
        match app.room.advance_arena_verification() {
            Ok(None) => continue,
            Ok(Some(_)) | Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::ArenaPhase;
    use crate::wallet::Wallet;
    use std::time::Duration;

    fn state() -> SharedState {
        let config = AppConfig::default();
        let room = RoomMarket::new(Wallet::demo(Duration::ZERO), config.activity_log_cap);
        AppState::new(config).with_room(room).shared()
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_runs_round_to_result() {
        let state = state();
        let round_id = {
            let mut app = state.lock().await;
            app.room.select_market("arena-speed-1").await.unwrap();
            app.room.join_arena().await.unwrap();
            for _ in 0..5 {
                app.room.arena_click().unwrap();
            }
            app.room.arena_round_id()
        };

        spawn_arena_round(state.clone(), round_id).await.unwrap();

        let app = state.lock().await;
        assert_eq!(app.room.arena().phase, ArenaPhase::Result);
        assert_eq!(app.room.arena().outcome.unwrap().score, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_stops_when_round_replaced() {
        let state = state();
        let round_id = {
            let mut app = state.lock().await;
            app.room.select_market("arena-speed-1").await.unwrap();
            app.room.join_arena().await.unwrap();
            app.room.arena_round_id()
        };

        let handle = spawn_arena_round(state.clone(), round_id);
        tokio::time::sleep(Duration::from_millis(3500)).await;
        {
            let mut app = state.lock().await;
            assert_eq!(app.room.arena().time_left, 12);
            app.room.reset_session();
        }
        handle.await.unwrap();

        let app = state.lock().await;
        assert_eq!(app.room.arena().phase, ArenaPhase::Idle);
    }
}
