//! Staff events (riddles, drops, reaction races) and the `taxa` price helper.

use crate::{
    core::{
        history::{self, HistoryKind, NewRecord},
        ledger,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::time::Duration;

/// How long a riddle or drop stays open
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(60);
/// How long the reaction button stays clickable
pub const REACTION_TIMEOUT: Duration = Duration::from_secs(60);
/// Points won by the fastest click
pub const REACTION_POINTS: i64 = 10;
/// Drop phrases longer than this can be flagged as pasted
pub const PASTE_MIN_LENGTH: usize = 9;
/// Answers to long phrases faster than this are treated as pasted
pub const PASTE_MAX_DELAY: Duration = Duration::from_millis(100);
/// Largest net amount a single pass may be priced for
pub const PASS_NET_LIMIT: u64 = 2_000;

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Normalizes a riddle answer: lowercase, accents stripped, only ASCII letters and digits.
#[must_use]
pub fn normalize_answer(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Whether `guess` solves a riddle whose answer is `answer`.
#[must_use]
pub fn matches_answer(guess: &str, answer: &str) -> bool {
    let answer = normalize_answer(answer);
    !answer.is_empty() && normalize_answer(guess) == answer
}

/// Whether a correct drop answer arrived too fast to have been typed.
#[must_use]
pub fn looks_pasted(phrase: &str, elapsed: Duration) -> bool {
    phrase.chars().count() > PASTE_MIN_LENGTH && elapsed < PASTE_MAX_DELAY
}

/// Validates the points offered by a staff event.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for non-positive rewards.
pub const fn validate_reward(points: i64) -> Result<()> {
    if points <= 0 {
        return Err(Error::InvalidAmount { amount: points });
    }
    Ok(())
}

/// Reward after the booster bonus.
#[must_use]
pub const fn boosted(points: i64, is_booster: bool) -> i64 {
    if is_booster { points * 2 } else { points }
}

/// Credits an event winner. Riddle wins are also counted in the history.
///
/// Returns the winner's balance afterwards.
pub async fn award(
    db: &DatabaseConnection,
    winner_id: &str,
    points: i64,
    riddle: bool,
) -> Result<i64> {
    validate_reward(points)?;
    let txn = db.begin().await?;
    let balance = ledger::adjust(&txn, winner_id, points).await?;
    if riddle {
        history::record(
            &txn,
            NewRecord {
                kind: HistoryKind::Riddle,
                actor_id: winner_id,
                counterpart_id: None,
                amount: points,
                success: true,
                detail: None,
            },
        )
        .await?;
    }
    txn.commit().await?;
    tracing::info!("{winner_id} won {points} points in a staff event");
    Ok(balance)
}

/// Answer of the `taxa <n>` message helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPrice {
    /// Price to set on the pass so the seller nets the requested amount
    Gross {
        /// Requested net amount
        net: u64,
        /// Price to set
        gross: u64,
    },
    /// The requested amount is above [`PASS_NET_LIMIT`]
    OverLimit,
}

/// Parses a `taxa <n>` request anywhere in a message, ignoring case.
///
/// Numbers too large for `u64` saturate, so they still price as over the limit.
#[must_use]
pub fn parse_pass_request(content: &str) -> Option<u64> {
    let words: Vec<&str> = content.split_whitespace().collect();
    words.windows(2).find_map(|pair| {
        if !pair[0].eq_ignore_ascii_case("taxa") {
            return None;
        }
        let word = pair[1].trim_end_matches(is_trailing_punctuation);
        let digits: String = word.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() || digits.len() != word.len() {
            return None;
        }
        Some(digits.parse().unwrap_or(u64::MAX))
    })
}

const fn is_trailing_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ';' | ':')
}

/// Price that nets `net` after the 30% marketplace fee: `ceil(net / 0.7)`.
#[must_use]
pub const fn gross_price(net: u64) -> u64 {
    // Integer form of ceil(net / 0.7) avoids float rounding.
    (net * 10).div_ceil(7)
}

/// Answers a `taxa` request, refusing amounts above [`PASS_NET_LIMIT`].
#[must_use]
pub const fn pass_price(net: u64) -> PassPrice {
    if net > PASS_NET_LIMIT {
        return PassPrice::OverLimit;
    }
    PassPrice::Gross {
        net,
        gross: gross_price(net),
    }
}
