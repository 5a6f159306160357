//! # mahjong-table
//!
//! A server-authoritative Riichi Mahjong table engine.
//!
//! ## Design Principles
//!
//! 1. **The table decides**: clients only send [`ActionRequest`]s. Every
//!    request is validated against the current state and either applied in
//!    full or rejected without a trace.
//!
//! 2. **One writer per table**: a table is a plain value owned by one tokio
//!    task. Tables share nothing and run in parallel.
//!
//! 3. **Time is a scheduler concern**: the state machine never waits. The
//!    scheduler turns deadlines and missing players into ordinary requests.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: history, discard piles and settlements
//!   use `im` vectors, so applying an action to a copy and committing it
//!   only when every invariant holds is cheap.
//!
//! - **Deterministic RNG**: each table is seeded and forks one stream per
//!   round. The same seed and the same requests replay the same game.
//!
//! ## Modules
//!
//! - `core`: seats, winds, actions, rules, RNG
//! - `tiles`: tiles, hands, melds, decomposition, waits and shanten
//! - `scoring`: yaku, fu, han and payments
//! - `table`: the table state machine, call windows and settlements
//! - `scheduler`: turn deadlines and bot takeover
//! - `protocol`: client messages, per-viewer snapshots, wire formats
//! - `server`: per-table tokio actors and the table registry

pub mod core;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod scoring;
pub mod server;
pub mod table;
pub mod tiles;

// Re-export commonly used types
pub use crate::core::{
    ActionKind, ActionRecord, ActionRequest, GameLength, MahjongRule, Seat, SeatMap, TableId,
    TableRng, ThinkingTime, Wind,
};

pub use crate::error::{MahjongError, MahjongResult, Rejection};

pub use crate::tiles::{Hand, Meld, MeldKind, Tile};

pub use crate::scoring::{score_hand, HandScore, ScoringPolicy, WinContext, Yaku};

pub use crate::table::{
    GameResult, Occupant, Settlement, SettlementKind, Table, TableEvent, TableStatus, TurnPhase,
};

pub use crate::scheduler::{SchedulerConfig, SeatPolicy, SimpleBot, TurnTimer, UniformBot};

pub use crate::protocol::{ClientMessage, SeatEvent, ServerMessage, TableSnapshot, WireFormat};

pub use crate::server::{ServiceConfig, TableHandle, TableRegistry};
