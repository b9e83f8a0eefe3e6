//! Blackjack against the house.
//!
//! The stake is taken when the game starts (and again on double down), so the
//! balance can never go negative mid-game. Settlement pays back the stake plus the
//! winnings minus a 10% house commission on a win, returns the stake on a push, and
//! keeps it on a loss. The house collects the commission on wins and losses.

use crate::{
    core::{cooldown, ledger, wager::validate_wager},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::{fmt, time::Duration};

/// Smallest accepted wager
pub const MINIMUM_WAGER: i64 = 50;
/// Cooldown between games
pub const COOLDOWN: Duration = Duration::from_secs(60);
/// How long the player has to finish the game
pub const GAME_TIMEOUT: Duration = Duration::from_secs(60);
/// House commission in percent of the total stake
pub const COMMISSION_PERCENT: i64 = 10;

const SUITS: [char; 4] = ['♥', '♦', '♣', '♠'];
const RANKS: [&str; 13] = [
    "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A",
];

/// A playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    /// Index into the ranks, 0 = "2" through 12 = "A"
    rank: usize,
    suit: char,
}

impl Card {
    /// Builds a card from a rank label ("2".."10", "J", "Q", "K", "A") and a suit.
    #[must_use]
    pub fn new(rank: &str, suit: char) -> Option<Self> {
        RANKS
            .iter()
            .position(|r| *r == rank)
            .map(|rank| Self { rank, suit })
    }

    const fn is_ace(self) -> bool {
        self.rank == 12
    }

    /// Hard value (aces count 11 here; [`hand_value`] demotes them as needed).
    const fn value(self) -> u32 {
        match self.rank {
            12 => 11,
            9..=11 => 10,
            n => n as u32 + 2,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", RANKS[self.rank], self.suit)
    }
}

/// Best total of a hand, counting aces as 1 when 11 would bust.
#[must_use]
pub fn hand_value(hand: &[Card]) -> u32 {
    let mut total: u32 = hand.iter().map(|c| c.value()).sum();
    let mut aces = hand.iter().filter(|c| c.is_ace()).count();
    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    total
}

/// Renders a hand as space-separated cards.
#[must_use]
pub fn format_hand(hand: &[Card]) -> String {
    hand.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// How a finished game ended for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Player beat the dealer or the dealer busted
    Win,
    /// Player busted or the dealer scored higher
    Loss,
    /// Equal totals
    Push,
}

/// Decides the outcome from final totals.
#[must_use]
pub const fn determine_outcome(player_total: u32, dealer_total: u32) -> Outcome {
    if player_total > 21 {
        Outcome::Loss
    } else if dealer_total > 21 || player_total > dealer_total {
        Outcome::Win
    } else if player_total < dealer_total {
        Outcome::Loss
    } else {
        Outcome::Push
    }
}

/// State of one hand of blackjack.
#[derive(Debug, Clone)]
pub struct BlackjackGame {
    deck: Vec<Card>,
    player: Vec<Card>,
    dealer: Vec<Card>,
    bet: i64,
    doubled: bool,
}

impl BlackjackGame {
    /// Deals a new game from a freshly shuffled 52-card deck.
    pub fn deal(bet: i64, rng: &mut impl rand::Rng) -> Self {
        let mut deck: Vec<Card> = SUITS
            .iter()
            .flat_map(|&suit| (0..RANKS.len()).map(move |rank| Card { rank, suit }))
            .collect();
        deck.shuffle(rng);
        Self::from_deck(bet, deck)
    }

    /// Deals from `cards` in order: two to the player, then two to the dealer.
    #[must_use]
    pub fn from_deck(bet: i64, mut cards: Vec<Card>) -> Self {
        cards.reverse();
        let mut game = Self {
            deck: cards,
            player: Vec::new(),
            dealer: Vec::new(),
            bet,
            doubled: false,
        };
        for _ in 0..2 {
            game.draw_player();
        }
        for _ in 0..2 {
            game.draw_dealer();
        }
        game
    }

    fn draw_player(&mut self) {
        if let Some(card) = self.deck.pop() {
            self.player.push(card);
        }
    }

    fn draw_dealer(&mut self) {
        if let Some(card) = self.deck.pop() {
            self.dealer.push(card);
        }
    }

    /// Player's cards
    #[must_use]
    pub fn player_hand(&self) -> &[Card] {
        &self.player
    }

    /// Dealer's cards
    #[must_use]
    pub fn dealer_hand(&self) -> &[Card] {
        &self.dealer
    }

    /// Total points at stake (doubled after a double down)
    #[must_use]
    pub const fn total_stake(&self) -> i64 {
        if self.doubled { self.bet * 2 } else { self.bet }
    }

    /// Whether double down is still allowed (only on the opening two cards)
    #[must_use]
    pub fn can_double_down(&self) -> bool {
        self.player.len() == 2 && !self.doubled
    }

    /// Draws one card for the player. Returns the outcome if the player busted.
    pub fn hit(&mut self) -> Option<Outcome> {
        self.draw_player();
        (hand_value(&self.player) > 21).then_some(Outcome::Loss)
    }

    /// Dealer draws to 17 and the game is decided.
    pub fn stand(&mut self) -> Outcome {
        while hand_value(&self.dealer) < 17 && !self.deck.is_empty() {
            self.draw_dealer();
        }
        determine_outcome(hand_value(&self.player), hand_value(&self.dealer))
    }

    /// Doubles the stake, draws exactly one card and stands.
    ///
    /// # Errors
    /// Returns a rejection once the opening hand has been played.
    pub fn double_down(&mut self) -> Result<Outcome> {
        if !self.can_double_down() {
            return Err(Error::invalid_target(
                "You can only double down on your first move.",
            ));
        }
        self.doubled = true;
        if let Some(outcome) = self.hit() {
            return Ok(outcome);
        }
        Ok(self.stand())
    }
}

/// House commission on a total stake.
#[must_use]
pub const fn commission(total_stake: i64) -> i64 {
    total_stake * COMMISSION_PERCENT / 100
}

/// Validates the wager and cooldown, then takes the stake.
///
/// Returns the player's balance after the stake was taken.
pub async fn start(
    db: &DatabaseConnection,
    user_id: &str,
    bet: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let txn = db.begin().await?;
    cooldown::check(&txn, user_id, "blackjack", COOLDOWN, now).await?;
    let balance = ledger::balance_of(&txn, user_id).await?;
    validate_wager(bet, MINIMUM_WAGER, balance)?;
    cooldown::record(&txn, user_id, "blackjack", now).await?;
    let balance = ledger::adjust(&txn, user_id, -bet).await?;
    txn.commit().await?;
    Ok(balance)
}

/// Takes the second stake of a double down.
///
/// # Errors
/// Returns [`Error::InsufficientFunds`] if the player can't match the bet.
pub async fn take_double_down_stake(
    db: &DatabaseConnection,
    user_id: &str,
    bet: i64,
) -> Result<i64> {
    ledger::debit(db, user_id, bet).await
}

/// Points moved when a game is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Net change of the player's balance compared to before the game
    pub net: i64,
    /// Commission paid to the house
    pub commission: i64,
    /// Player's balance afterwards
    pub balance: i64,
}

/// Settles a finished game whose `total_stake` was already taken.
pub async fn settle(
    db: &DatabaseConnection,
    user_id: &str,
    house_id: &str,
    total_stake: i64,
    outcome: Outcome,
) -> Result<Settlement> {
    let fee = commission(total_stake);
    let (payout, house_cut) = match outcome {
        Outcome::Win => (total_stake * 2 - fee, fee),
        Outcome::Push => (total_stake, 0),
        Outcome::Loss => (0, fee),
    };

    let txn = db.begin().await?;
    let balance = if payout > 0 {
        ledger::adjust(&txn, user_id, payout).await?
    } else {
        ledger::balance_of(&txn, user_id).await?
    };
    if house_cut > 0 {
        ledger::adjust(&txn, house_id, house_cut).await?;
    }
    txn.commit().await?;

    tracing::info!("Blackjack for {user_id} settled as {outcome:?} on a stake of {total_stake}");
    Ok(Settlement {
        net: payout - total_stake,
        commission: house_cut,
        balance,
    })
}

/// Returns the stake of a game abandoned before it was decided.
pub async fn refund(db: &DatabaseConnection, user_id: &str, total_stake: i64) -> Result<i64> {
    ledger::credit(db, user_id, total_stake).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn cards(labels: &[&str]) -> Vec<Card> {
        labels.iter().map(|l| Card::new(l, '♠').unwrap()).collect()
    }

    #[test]
    fn test_hand_value_demotes_aces() {
        assert_eq!(hand_value(&cards(&["A", "K"])), 21);
        assert_eq!(hand_value(&cards(&["A", "A", "9"])), 21);
        assert_eq!(hand_value(&cards(&["K", "Q", "5"])), 25);
        assert_eq!(format_hand(&cards(&["10", "J"])), "10♠ J♠");
    }

    #[test]
    fn test_determine_outcome() {
        assert_eq!(determine_outcome(22, 18), Outcome::Loss);
        assert_eq!(determine_outcome(18, 22), Outcome::Win);
        assert_eq!(determine_outcome(20, 19), Outcome::Win);
        assert_eq!(determine_outcome(17, 19), Outcome::Loss);
        assert_eq!(determine_outcome(19, 19), Outcome::Push);
    }

    #[test]
    fn test_stand_draws_dealer_to_seventeen() {
        // player 10+8, dealer 6+5 then draws 7 => 18 vs 18
        let mut game = BlackjackGame::from_deck(100, cards(&["10", "8", "6", "5", "7", "9"]));
        assert_eq!(game.stand(), Outcome::Push);
        assert_eq!(hand_value(game.dealer_hand()), 18);
    }

    #[test]
    fn test_double_down_only_on_opening_hand() {
        let mut game = BlackjackGame::from_deck(100, cards(&["5", "6", "10", "7", "2", "9"]));
        assert!(game.hit().is_none());
        assert!(game.double_down().is_err());

        let mut game = BlackjackGame::from_deck(100, cards(&["5", "6", "10", "7", "10"]));
        assert_eq!(game.double_down().unwrap(), Outcome::Win);
        assert_eq!(game.total_stake(), 200);
    }

    #[tokio::test]
    async fn test_settlement_amounts() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        let now = chrono::Utc::now();

        assert_eq!(start(&db, "A", 100, now).await?, 900);
        let win = settle(&db, "A", "house", 100, Outcome::Win).await?;
        assert_eq!(win.net, 90);
        assert_eq!(win.balance, 1_090);
        assert_eq!(ledger::balance_of(&db, "house").await?, 10);

        set_balance(&db, "B", 500).await?;
        start(&db, "B", 200, now).await?;
        let loss = settle(&db, "B", "house", 200, Outcome::Loss).await?;
        assert_eq!((loss.net, loss.balance), (-200, 300));
        assert_eq!(ledger::balance_of(&db, "house").await?, 30);

        set_balance(&db, "C", 50).await?;
        start(&db, "C", 50, now).await?;
        let push = settle(&db, "C", "house", 50, Outcome::Push).await?;
        assert_eq!((push.net, push.balance, push.commission), (0, 50, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        let now = chrono::Utc::now();

        let err = start(&db, "A", 49, now).await.unwrap_err();
        assert!(matches!(err, Error::WagerBelowMinimum { .. }));
        assert_eq!(ledger::balance_of(&db, "A").await?, 1_000);

        start(&db, "A", 50, now).await?;
        let err = start(&db, "A", 50, now).await.unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
        Ok(())
    }
}
