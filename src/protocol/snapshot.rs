//! Per-viewer table snapshots.
//!
//! A snapshot is what one client is allowed to see. Concealed tiles are only
//! included for the viewer's own seat; other seats show counts, melds and
//! discard piles. Spectators (`viewer == None`) see no concealed tiles at
//! all, and nothing but the table status when the rule forbids spectating.

use serde::{Deserialize, Serialize};

use crate::core::{ActionKind, ActionRecord, MahjongRule, Seat, TableId, Wind};
use crate::error::{MahjongError, MahjongResult};
use crate::table::{
    Discard, GameResult, Occupant, RiichiState, Round, Table, TableStatus, TurnPhase,
};
use crate::tiles::{Meld, Tile};

/// Where the round stands, without the call options of other seats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseView {
    AwaitingDraw(Seat),
    AwaitingDiscard(Seat),
    AwaitingCalls { tile: Tile, discarder: Seat },
    Finished,
}

impl From<&TurnPhase> for PhaseView {
    fn from(phase: &TurnPhase) -> Self {
        match phase {
            TurnPhase::AwaitingDraw(seat) => PhaseView::AwaitingDraw(*seat),
            TurnPhase::AwaitingDiscard { seat, .. } => PhaseView::AwaitingDiscard(*seat),
            TurnPhase::AwaitingCalls(window) => PhaseView::AwaitingCalls {
                tile: window.tile,
                discarder: window.discarder,
            },
            TurnPhase::Finished => PhaseView::Finished,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub wind: Wind,
    pub number: u8,
    pub dealer: Seat,
    pub honba: u32,
    pub deposits: i32,
    pub turn: u32,
    pub phase: PhaseView,
    pub wall_remaining: usize,
    pub dora_indicators: Vec<Tile>,
}

impl From<&Round> for RoundView {
    fn from(round: &Round) -> Self {
        Self {
            wind: round.wind,
            number: round.number(),
            dealer: round.dealer,
            honba: round.honba,
            deposits: round.deposits,
            turn: round.turn,
            phase: PhaseView::from(&round.phase),
            wall_remaining: round.wall.remaining(),
            dora_indicators: round.wall.dora_indicators().to_vec(),
        }
    }
}

/// The public part of a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: Seat,
    pub occupant: Occupant,
    pub points: i32,
    /// Seat wind this round.
    pub wind: Option<Wind>,
    pub riichi: RiichiState,
    pub concealed_count: usize,
    pub melds: Vec<Meld>,
    pub discards: Vec<Discard>,
}

/// Everything one viewer may know about a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table_id: TableId,
    /// Accepted actions so far. Snapshots with a higher sequence are newer.
    pub sequence: u32,
    pub status: TableStatus,
    pub rule: MahjongRule,
    pub viewer: Option<Seat>,
    pub round: Option<RoundView>,
    pub seats: Vec<SeatView>,
    pub last_action: Option<ActionRecord>,
    /// What the viewer may submit now.
    pub legal_actions: Vec<ActionKind>,
    /// The viewer's concealed tiles, sorted.
    pub hand: Vec<Tile>,
    /// The tile the viewer just drew, if it is their turn.
    pub drawn: Option<Tile>,
    pub result: Option<GameResult>,
}

impl TableSnapshot {
    /// Capture `table` as seen from `viewer`. Fails with
    /// [`MahjongError::SeatUnavailable`] for a viewer that is not a seat.
    pub fn capture(table: &Table, viewer: Option<Seat>) -> MahjongResult<Self> {
        if let Some(seat) = viewer.filter(|s| !s.is_valid()) {
            return Err(MahjongError::SeatUnavailable(seat));
        }
        let hidden = viewer.is_none() && !table.rule().spectate;
        let round = table.round();

        let seats = if hidden {
            Vec::new()
        } else {
            table
                .seats()
                .iter()
                .map(|(seat, state)| SeatView {
                    seat,
                    occupant: state.occupant.clone(),
                    points: state.points,
                    wind: round.map(|r| seat.wind(r.dealer)),
                    riichi: state.riichi,
                    concealed_count: state.hand.concealed().len(),
                    melds: state.hand.melds().to_vec(),
                    discards: state.discards.iter().copied().collect(),
                })
                .collect()
        };

        let (hand, drawn, legal_actions) = match viewer {
            Some(seat) => {
                let mut hand = table.seat(seat).hand.concealed().to_vec();
                hand.sort_unstable();
                let drawn = match table.phase() {
                    Some(TurnPhase::AwaitingDiscard { seat: turn, drawn, .. }) if *turn == seat => {
                        *drawn
                    }
                    _ => None,
                };
                (hand, drawn, table.legal_actions(seat))
            }
            None => (Vec::new(), None, Vec::new()),
        };

        Ok(Self {
            table_id: table.id(),
            sequence: table.sequence(),
            status: table.status(),
            rule: table.rule().clone(),
            viewer,
            round: if hidden { None } else { round.map(RoundView::from) },
            seats,
            last_action: table.history().last().cloned(),
            legal_actions,
            hand,
            drawn,
            result: table.result().cloned(),
        })
    }

    /// The viewer's own seat view.
    #[must_use]
    pub fn own_seat(&self) -> Option<&SeatView> {
        let viewer = self.viewer?;
        self.seats.iter().find(|s| s.seat == viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionRequest, MahjongRule};

    fn started() -> Table {
        let mut table = Table::new(TableId(5), MahjongRule::default(), 21)
            .with_occupant(Seat::new(0), Occupant::participant("ann"));
        for seat in 1..4 {
            table = table.with_occupant(Seat::new(seat), Occupant::Bot);
        }
        table
            .submit(&ActionRequest::new(table.id(), Seat::new(0), ActionKind::Start))
            .unwrap();
        table
            .submit(&ActionRequest::new(table.id(), Seat::new(0), ActionKind::Draw))
            .unwrap();
        table
    }

    #[test]
    fn test_viewer_sees_only_own_tiles() {
        let table = started();
        let own = TableSnapshot::capture(&table, Some(Seat::new(0))).unwrap();
        assert_eq!(own.hand.len(), 14);
        assert!(own.drawn.is_some());
        assert!(own
            .legal_actions
            .iter()
            .any(|a| matches!(a, ActionKind::Discard(_))));
        assert_eq!(own.own_seat().map(|s| s.concealed_count), Some(14));

        let other = TableSnapshot::capture(&table, Some(Seat::new(2))).unwrap();
        assert_eq!(other.hand.len(), 13);
        assert_eq!(other.drawn, None);
        assert!(other.legal_actions.is_empty());
        assert_eq!(other.seats[0].concealed_count, 14);
        assert_eq!(other.last_action.as_ref().map(|a| &a.kind), Some(&ActionKind::Draw));
    }

    #[test]
    fn test_spectators() {
        let table = started();
        let open = TableSnapshot::capture(&table, None).unwrap();
        assert!(open.hand.is_empty());
        assert_eq!(open.seats.len(), 4);
        let round = open.round.expect("round view");
        assert_eq!(round.phase, PhaseView::AwaitingDiscard(Seat::new(0)));
        assert_eq!(round.dora_indicators.len(), 1);
        assert_eq!(round.wall_remaining, 136 - 14 - 52 - 1);

        let mut closed = Table::new(TableId(6), MahjongRule::default(), 1);
        closed = closed.with_occupant(Seat::new(0), Occupant::Bot);
        let mut rule = MahjongRule::default();
        rule.spectate = false;
        closed
            .submit(&ActionRequest::new(closed.id(), Seat::new(0), ActionKind::ChangeRule(rule)))
            .unwrap();
        let hidden = TableSnapshot::capture(&closed, None).unwrap();
        assert!(hidden.seats.is_empty());
        assert!(hidden.round.is_none());
    }

    #[test]
    fn test_unknown_viewer_is_refused() {
        let table = started();
        let err = TableSnapshot::capture(&table, Some(Seat(7))).unwrap_err();
        assert!(matches!(err, MahjongError::SeatUnavailable(Seat(7))));
    }
}
