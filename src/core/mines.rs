//! Mines: reveal cells on a 3x3 grid hiding two bombs.
//!
//! The stake is taken up front. Each diamond found adds 5% of the bet to the
//! cash-out value; cashing out requires at least one diamond. Hitting a bomb
//! forfeits everything, and running out of time cashes out whatever was found.

use crate::{
    core::{ledger, wager::validate_wager},
    errors::{Error, Result},
};
use rand::seq::index;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::time::Duration;

/// Smallest accepted wager
pub const MINIMUM_WAGER: i64 = 50;
/// Cells per side of the grid
pub const GRID_SIDE: usize = 3;
/// Total cells
pub const CELL_COUNT: usize = GRID_SIDE * GRID_SIDE;
/// Hidden bombs
pub const BOMB_COUNT: usize = 2;
/// How long the player has before the game cashes out automatically
pub const GAME_TIMEOUT: Duration = Duration::from_secs(60);
/// Percent of the bet each diamond is worth
pub const DIAMOND_PERCENT: i64 = 5;

/// What a reveal uncovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    /// A diamond; the game continues
    Diamond,
    /// A bomb; the game is lost
    Bomb,
    /// The cell was already open or out of range
    Ignored,
}

/// One game of mines.
#[derive(Debug, Clone)]
pub struct MinesGame {
    bet: i64,
    bombs: [bool; CELL_COUNT],
    revealed: [bool; CELL_COUNT],
    diamonds: u32,
    exploded: bool,
}

impl MinesGame {
    /// Places [`BOMB_COUNT`] bombs at random.
    pub fn new(bet: i64, rng: &mut impl rand::Rng) -> Self {
        let positions: Vec<usize> = index::sample(rng, CELL_COUNT, BOMB_COUNT).into_vec();
        Self::with_bombs(bet, &positions)
    }

    /// Places bombs at the given cell indices.
    #[must_use]
    pub fn with_bombs(bet: i64, positions: &[usize]) -> Self {
        let mut bombs = [false; CELL_COUNT];
        for &pos in positions.iter().filter(|&&p| p < CELL_COUNT) {
            bombs[pos] = true;
        }
        Self {
            bet,
            bombs,
            revealed: [false; CELL_COUNT],
            diamonds: 0,
            exploded: false,
        }
    }

    /// Opens a cell.
    pub fn reveal(&mut self, cell: usize) -> Reveal {
        if self.exploded || cell >= CELL_COUNT || self.revealed[cell] {
            return Reveal::Ignored;
        }
        self.revealed[cell] = true;
        if self.bombs[cell] {
            self.exploded = true;
            Reveal::Bomb
        } else {
            self.diamonds += 1;
            Reveal::Diamond
        }
    }

    /// Diamonds found so far
    #[must_use]
    pub const fn diamonds(&self) -> u32 {
        self.diamonds
    }

    /// Whether the cell has been opened
    #[must_use]
    pub fn is_revealed(&self, cell: usize) -> bool {
        self.revealed.get(cell).copied().unwrap_or(false)
    }

    /// Whether the cell hides a bomb
    #[must_use]
    pub fn is_bomb(&self, cell: usize) -> bool {
        self.bombs.get(cell).copied().unwrap_or(false)
    }

    /// Whether every diamond has been found
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.diamonds as usize == CELL_COUNT - BOMB_COUNT
    }

    /// Current cash-out value
    #[must_use]
    pub const fn winnings(&self) -> i64 {
        self.diamonds as i64 * self.bet * DIAMOND_PERCENT / 100
    }

    /// Value paid by a voluntary cash-out.
    ///
    /// # Errors
    /// Rejects cashing out before the first diamond.
    pub fn cash_out_value(&self) -> Result<i64> {
        if self.diamonds == 0 {
            return Err(Error::invalid_target(
                "You need to find at least one diamond before cashing out!",
            ));
        }
        Ok(self.winnings())
    }
}

/// Validates the bet and takes the stake. Returns the balance afterwards.
pub async fn start(db: &DatabaseConnection, user_id: &str, bet: i64) -> Result<i64> {
    let txn = db.begin().await?;
    let balance = ledger::balance_of(&txn, user_id).await?;
    validate_wager(bet, MINIMUM_WAGER, balance)?;
    let balance = ledger::adjust(&txn, user_id, -bet).await?;
    txn.commit().await?;
    Ok(balance)
}

/// Pays the winnings of a cashed-out (or timed-out) game. Returns the balance afterwards.
pub async fn pay_out(db: &DatabaseConnection, user_id: &str, winnings: i64) -> Result<i64> {
    if winnings <= 0 {
        return ledger::balance_of(db, user_id).await;
    }
    ledger::credit(db, user_id, winnings).await
}
