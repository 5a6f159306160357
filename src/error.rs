//! Error taxonomy for the table engine.
//!
//! Every error except [`MahjongError::InvariantViolation`] is recoverable:
//! the rejected request leaves the table untouched and is reported back to
//! the client that sent it. An invariant violation ends the affected table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Seat, TableId};

/// Why an action was refused by the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Rejection {
    #[error("it is not this seat's turn")]
    NotYourTurn,
    #[error("action not allowed while the table is {0}")]
    WrongStatus(String),
    #[error("action not allowed in the current phase")]
    WrongPhase,
    #[error("tile {0} is not in the hand")]
    TileNotInHand(String),
    #[error("tile {0} may not be discarded right after this call")]
    SwapCallForbidden(String),
    #[error("riichi requires a closed hand")]
    HandNotClosed,
    #[error("seat already declared riichi")]
    AlreadyRiichi,
    #[error("a riichi hand may only discard the drawn tile")]
    RiichiLocked,
    #[error("not enough points: need {needed}, have {available}")]
    InsufficientPoints { needed: i32, available: i32 },
    #[error("not enough tiles left in the wall")]
    WallTooShort,
    #[error("hand would not be tenpai")]
    NotTenpai,
    #[error("this call is not available")]
    CallNotAvailable,
    #[error("seat already answered the call window")]
    AlreadyResponded,
    #[error("seat is furiten")]
    Furiten,
    #[error("hand is not complete")]
    HandNotComplete,
    #[error("no more kans may be declared this round")]
    KanLimit,
    #[error("only the host may do this")]
    NotHost,
    #[error("all four seats must be occupied")]
    SeatsNotFilled,
    #[error("conditions for nine terminals are not met")]
    NotNineTerminals,
}

/// Engine-wide error type.
#[derive(Debug, Error)]
pub enum MahjongError {
    #[error("invalid action: {0}")]
    InvalidAction(#[from] Rejection),

    #[error("invalid rule: {0}")]
    RuleInvalid(String),

    #[error("hand has no valid yaku or is below the minimum han")]
    NoValidHand,

    #[error("{0} not found")]
    TableNotFound(TableId),

    #[error("{0} is unavailable")]
    SeatUnavailable(Seat),

    #[error("parse error on '{input}': {message}")]
    Parse { input: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid service configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{0} is closed")]
    TableClosed(TableId),
}

impl MahjongError {
    /// Fatal errors end the table they occurred on.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, MahjongError::InvariantViolation(_))
    }

    pub(crate) fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        MahjongError::Parse {
            input: input.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MahjongError {
    fn from(err: serde_json::Error) -> Self {
        MahjongError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for MahjongError {
    fn from(err: bincode::Error) -> Self {
        MahjongError::Serialization(err.to_string())
    }
}

pub type MahjongResult<T> = Result<T, MahjongError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_converts_to_invalid_action() {
        let err: MahjongError = Rejection::NotYourTurn.into();
        assert!(matches!(err, MahjongError::InvalidAction(Rejection::NotYourTurn)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_display() {
        let err = MahjongError::InvalidAction(Rejection::InsufficientPoints {
            needed: 1000,
            available: 500,
        });
        assert_eq!(
            err.to_string(),
            "invalid action: not enough points: need 1000, have 500"
        );
        assert!(MahjongError::InvariantViolation("x".into()).is_fatal());
    }
}
