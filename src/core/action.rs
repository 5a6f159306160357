//! Action representation.
//!
//! Every change to a table goes through an [`ActionRequest`]: clients send
//! them, the scheduler manufactures them on timeout and bots choose them.
//! The table never distinguishes where a request came from.
//!
//! ```
//! use mahjong_table::core::{ActionKind, ActionRequest, Seat, TableId};
//! use mahjong_table::tiles::Tile;
//!
//! let discard = ActionRequest::new(TableId(1), Seat::new(0), ActionKind::Discard(Tile::man(3)));
//! assert!(discard.kind.is_turn_action());
//! assert!(ActionKind::Pass.is_call_response());
//! ```

use serde::{Deserialize, Serialize};

use super::rule::MahjongRule;
use super::seat::{Seat, TableId};
use crate::tiles::Tile;

/// What a seat wants to do.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Host starts the game.
    Start,
    /// Draw from the live wall.
    Draw,
    Discard(Tile),
    /// Chi the current discard using these two concealed tiles.
    Chi([Tile; 2]),
    Pon,
    /// Open kan on the current discard, or a closed/added kan of this tile's
    /// kind on the seat's own turn.
    Kan(Tile),
    /// Declare riichi while discarding the tile.
    Riichi(Tile),
    Ron,
    Tsumo,
    /// Decline the open call window.
    Pass,
    /// Abort the round with nine different terminals or honors.
    NineTerminals,
    /// Acknowledge a settlement or a finished game.
    Continue,
    ChangeRule(MahjongRule),
}

impl ActionKind {
    /// Actions taken by the seat whose turn it is.
    #[must_use]
    pub fn is_turn_action(&self) -> bool {
        matches!(
            self,
            ActionKind::Draw
                | ActionKind::Discard(_)
                | ActionKind::Riichi(_)
                | ActionKind::Tsumo
                | ActionKind::NineTerminals
        )
    }

    /// Answers to an open call window. `Kan` counts only when a window is
    /// open; on the seat's own turn it is a turn action.
    #[must_use]
    pub fn is_call_response(&self) -> bool {
        matches!(
            self,
            ActionKind::Chi(_) | ActionKind::Pon | ActionKind::Kan(_) | ActionKind::Ron | ActionKind::Pass
        )
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Start => "start",
            ActionKind::Draw => "draw",
            ActionKind::Discard(_) => "discard",
            ActionKind::Chi(_) => "chi",
            ActionKind::Pon => "pon",
            ActionKind::Kan(_) => "kan",
            ActionKind::Riichi(_) => "riichi",
            ActionKind::Ron => "ron",
            ActionKind::Tsumo => "tsumo",
            ActionKind::Pass => "pass",
            ActionKind::NineTerminals => "nine-terminals",
            ActionKind::Continue => "continue",
            ActionKind::ChangeRule(_) => "change-rule",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Discard(t) | ActionKind::Kan(t) | ActionKind::Riichi(t) => {
                write!(f, "{} {}", self.name(), t)
            }
            ActionKind::Chi([a, b]) => write!(f, "chi {a}{b}"),
            _ => f.write_str(self.name()),
        }
    }
}

/// A request to act at a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub table_id: TableId,
    pub seat: Seat,
    pub kind: ActionKind,
}

impl ActionRequest {
    #[must_use]
    pub fn new(table_id: TableId, seat: Seat, kind: ActionKind) -> Self {
        Self {
            table_id,
            seat,
            kind,
        }
    }
}

/// An accepted action, kept in the table's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seat: Seat,
    pub kind: ActionKind,

    /// Turn counter of the round when the action was applied.
    pub turn: u32,

    /// Position in the table's history.
    pub sequence: u32,
}

impl ActionRecord {
    #[must_use]
    pub fn new(seat: Seat, kind: ActionKind, turn: u32, sequence: u32) -> Self {
        Self {
            seat,
            kind,
            turn,
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ActionKind::Draw.is_turn_action());
        assert!(ActionKind::Tsumo.is_turn_action());
        assert!(!ActionKind::Pass.is_turn_action());
        assert!(ActionKind::Ron.is_call_response());
        assert!(ActionKind::Kan(Tile::pin(3)).is_call_response());
        assert!(!ActionKind::Continue.is_call_response());
    }

    #[test]
    fn test_display() {
        assert_eq!(ActionKind::Discard(Tile::sou(9)).to_string(), "discard 9s");
        assert_eq!(
            ActionKind::Chi([Tile::man(2), Tile::man(3)]).to_string(),
            "chi 2m3m"
        );
        assert_eq!(ActionKind::NineTerminals.to_string(), "nine-terminals");
    }

    #[test]
    fn test_request_serialization() {
        let request = ActionRequest::new(
            TableId(9),
            Seat::new(3),
            ActionKind::Chi([Tile::pin(4), Tile::pin(6)]),
        );
        let json = serde_json::to_string(&request).unwrap();
        let back: ActionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);

        let bytes = bincode::serialize(&request).unwrap();
        let back: ActionRequest = bincode::deserialize(&bytes).unwrap();
        assert_eq!(request, back);
    }

    #[test]
    fn test_record() {
        let record = ActionRecord::new(Seat::new(1), ActionKind::Pon, 4, 17);
        assert_eq!(record.seat, Seat::new(1));
        assert_eq!(record.sequence, 17);
    }
}
