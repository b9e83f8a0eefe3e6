//! Rocket: stop the rocket before it crashes.
//!
//! The stake is taken up front. Every tick adds a tenth of the bet to the
//! accumulated prize and then risks a crash. Stopping pays back the stake plus the
//! accumulated prize; a crash or running out of time loses the stake.

use crate::{
    core::{cooldown, ledger, wager::validate_wager},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::time::Duration;

/// Smallest accepted wager
pub const MINIMUM_WAGER: i64 = 50;
/// Cooldown between games
pub const COOLDOWN: Duration = Duration::from_secs(60);
/// Time between ticks
pub const TICK: Duration = Duration::from_secs(1);
/// How long the player has to stop the rocket
pub const GAME_TIMEOUT: Duration = Duration::from_secs(60);
/// Crash chance per tick
pub const CRASH_CHANCE: f64 = 0.2;
/// Crash chance per tick for bets above [`HIGH_STAKES_THRESHOLD`]
pub const HIGH_STAKES_CRASH_CHANCE: f64 = 0.4;
/// Bets above this crash more often
pub const HIGH_STAKES_THRESHOLD: i64 = 100;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still flying
    Climbing,
    /// Crashed; the stake is lost
    Crashed,
}

/// One rocket flight.
#[derive(Debug, Clone)]
pub struct RocketGame {
    bet: i64,
    accumulated: i64,
    altitude: u32,
    crashed: bool,
}

impl RocketGame {
    /// Starts a flight for `bet`.
    #[must_use]
    pub const fn new(bet: i64) -> Self {
        Self {
            bet,
            accumulated: 0,
            altitude: 0,
            crashed: false,
        }
    }

    /// Crash chance that applies to this bet
    #[must_use]
    pub const fn crash_chance(&self) -> f64 {
        if self.bet > HIGH_STAKES_THRESHOLD {
            HIGH_STAKES_CRASH_CHANCE
        } else {
            CRASH_CHANCE
        }
    }

    /// Advances one tick with a uniform `roll` in `[0, 1)`.
    pub fn tick(&mut self, roll: f64) -> Tick {
        if self.crashed {
            return Tick::Crashed;
        }
        self.accumulated += self.bet / 10;
        self.altitude += 1;
        if roll < self.crash_chance() {
            self.crashed = true;
            return Tick::Crashed;
        }
        Tick::Climbing
    }

    /// Prize accumulated so far
    #[must_use]
    pub const fn accumulated(&self) -> i64 {
        self.accumulated
    }

    /// Ticks survived, including the crashing one
    #[must_use]
    pub const fn altitude(&self) -> u32 {
        self.altitude
    }
}

/// Validates wager and cooldown, then takes the stake. Returns the balance afterwards.
pub async fn start(
    db: &DatabaseConnection,
    user_id: &str,
    bet: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let txn = db.begin().await?;
    cooldown::check(&txn, user_id, "rocket", COOLDOWN, now).await?;
    let balance = ledger::balance_of(&txn, user_id).await?;
    validate_wager(bet, MINIMUM_WAGER, balance)?;
    cooldown::record(&txn, user_id, "rocket", now).await?;
    let balance = ledger::adjust(&txn, user_id, -bet).await?;
    txn.commit().await?;
    Ok(balance)
}

/// Pays a stopped flight: the stake back plus the accumulated prize.
pub async fn cash_out(db: &DatabaseConnection, user_id: &str, game: &RocketGame) -> Result<i64> {
    ledger::credit(db, user_id, game.bet + game.accumulated).await
}
