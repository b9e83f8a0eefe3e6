//! Wager validation shared by every betting game.

use crate::errors::{Error, Result};

/// Validates `amount` against a game's `minimum` and the caller's `balance`.
///
/// Checks run in a fixed order (positive, minimum, balance) and none of them touch
/// storage, so a rejected wager never mutates anything.
pub const fn validate_wager(amount: i64, minimum: i64, balance: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    if amount < minimum {
        return Err(Error::WagerBelowMinimum { amount, minimum });
    }
    if amount > balance {
        return Err(Error::InsufficientFunds {
            current: balance,
            required: amount,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_wager() {
        assert!(validate_wager(50, 50, 50).is_ok());
        assert!(matches!(
            validate_wager(0, 1, 100),
            Err(Error::InvalidAmount { amount: 0 })
        ));
        assert!(matches!(
            validate_wager(49, 50, 1_000),
            Err(Error::WagerBelowMinimum {
                amount: 49,
                minimum: 50
            })
        ));
        assert!(matches!(
            validate_wager(101, 1, 100),
            Err(Error::InsufficientFunds {
                current: 100,
                required: 101
            })
        ));
    }

    #[test]
    fn test_minimum_is_checked_before_balance() {
        // A broke caller with a tiny wager hears about the minimum first.
        assert!(matches!(
            validate_wager(10, 50, 0),
            Err(Error::WagerBelowMinimum { .. })
        ));
    }
}
