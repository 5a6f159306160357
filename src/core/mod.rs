//! Core table types: seats, actions, rules, RNG.
//!
//! These are shared by every other module. Nothing here knows how a round is
//! played; the table state machine gives them meaning.

pub mod action;
pub mod rng;
pub mod rule;
pub mod seat;

pub use action::{ActionKind, ActionRecord, ActionRequest};
pub use rng::TableRng;
pub use rule::{
    GameLength, MahjongRule, MinimumHan, RedFive, RuleDocument, ThinkingTime, YakumanStacking,
    MAX_POINTS, MIN_POINTS, RIICHI_STAKE, RULE_DOCUMENT_VERSION,
};
pub use seat::{Seat, SeatMap, TableId, Wind, SEAT_COUNT};
