//! Unified error type for `SnooCredits`.
//!
//! Variants fall into two groups. Rejections are validation failures caused by the
//! caller (not enough points, cooldown still running, full faction, ...). They are
//! rendered back to the user as a short message and never logged as failures.
//! Everything else is an unexpected failure that bubbles up to the framework's
//! `on_error` hook.

use std::time::Duration;
use thiserror::Error;

/// Application error type shared by the core and bot layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Any database failure reported by `SeaORM`
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Error raised by serenity or poise
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),

    /// Formatting a response failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A wager or amount that is zero or negative
    #[error("The amount must be greater than zero (got {amount}).")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// A wager below the game's declared minimum
    #[error("The minimum wager is {minimum} points (got {amount}).")]
    WagerBelowMinimum {
        /// The rejected wager
        amount: i64,
        /// The game's minimum
        minimum: i64,
    },

    /// The account cannot cover the requested amount
    #[error("Insufficient points: you have {current}, but {required} are needed.")]
    InsufficientFunds {
        /// Current balance
        current: i64,
        /// Amount that was required
        required: i64,
    },

    /// A command was used again before its window elapsed
    #[error("You need to wait {} before using `{command}` again.", format_remaining(.remaining))]
    CooldownActive {
        /// Command name
        command: String,
        /// Time left in the window
        remaining: Duration,
    },

    /// The target of a command is not allowed
    #[error("{reason}")]
    InvalidTarget {
        /// Why the target was refused
        reason: String,
    },

    /// No faction matches the given name or membership
    #[error("Faction not found: {name}")]
    FactionNotFound {
        /// Name (or description) of what was looked up
        name: String,
    },

    /// A faction rule was violated (membership, leadership, capacity, ...)
    #[error("{reason}")]
    FactionRule {
        /// Why the request was refused
        reason: String,
    },

    /// Shop item lookup or purchase rule failure
    #[error("{reason}")]
    PurchaseRejected {
        /// Why the purchase was refused
        reason: String,
    },

    /// The caller lacks the role or identity required for a command
    #[error("You don't have permission to use this command.")]
    PermissionDenied,
}

impl Error {
    /// Returns true for validation failures that should be answered to the caller
    /// instead of being treated as command failures.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::WagerBelowMinimum { .. }
                | Self::InsufficientFunds { .. }
                | Self::CooldownActive { .. }
                | Self::InvalidTarget { .. }
                | Self::FactionNotFound { .. }
                | Self::FactionRule { .. }
                | Self::PurchaseRejected { .. }
                | Self::PermissionDenied
        )
    }

    /// Shorthand for an [`Error::InvalidTarget`] rejection.
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`Error::FactionRule`] rejection.
    pub fn faction_rule(reason: impl Into<String>) -> Self {
        Self::FactionRule {
            reason: reason.into(),
        }
    }
}

/// Renders a remaining cooldown as "Xh Ym", "Ym Zs" or "Zs".
#[must_use]
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn format_remaining(remaining: &Duration) -> String {
    let secs = remaining.as_secs().max(1);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_classified() {
        assert!(Error::InvalidAmount { amount: 0 }.is_rejection());
        assert!(Error::PermissionDenied.is_rejection());
        assert!(Error::faction_rule("full").is_rejection());
        assert!(!Error::Database("boom".to_string()).is_rejection());
        assert!(
            !Error::Config {
                message: "missing".to_string()
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(&Duration::from_secs(3)), "3s");
        assert_eq!(format_remaining(&Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_remaining(&Duration::from_secs(5 * 3600 + 60)), "5h 1m");
        assert_eq!(format_remaining(&Duration::ZERO), "1s");
    }

    #[test]
    fn test_cooldown_message_mentions_command() {
        let err = Error::CooldownActive {
            command: "claim".to_string(),
            remaining: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "You need to wait 1m 30s before using `claim` again."
        );
    }
}
