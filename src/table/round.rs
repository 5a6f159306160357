//! Seat and round state.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::calls::CallWindow;
use super::wall::Wall;
use crate::core::{GameLength, Seat, Wind};
use crate::tiles::{Hand, Tile};

/// Who sits in a seat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    #[default]
    Empty,
    Participant { name: String, connected: bool },
    Bot,
}

impl Occupant {
    #[must_use]
    pub fn participant(name: impl Into<String>) -> Self {
        Occupant::Participant {
            name: name.into(),
            connected: true,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Occupant::Empty)
    }

    #[must_use]
    pub fn is_participant(&self) -> bool {
        matches!(self, Occupant::Participant { .. })
    }

    /// Disconnected participants and bots are driven by the scheduler.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Occupant::Participant { connected: true, .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiichiState {
    #[default]
    None,
    Riichi,
    DoubleRiichi,
}

impl RiichiState {
    #[must_use]
    pub fn is_declared(self) -> bool {
        self != RiichiState::None
    }
}

/// One tile in a discard pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Discard {
    pub tile: Tile,
    /// Claimed by another seat. The tile stays in the pile for display.
    pub called: bool,
    /// The riichi declaration tile.
    pub riichi: bool,
    /// Discarded straight after drawing it.
    pub tsumogiri: bool,
}

/// Everything the table tracks about one seat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatState {
    pub occupant: Occupant,
    pub points: i32,

    // Per round.
    pub hand: Hand,
    pub discards: Vector<Discard>,
    pub riichi: RiichiState,
    pub ippatsu: bool,
    /// Passed on a winning tile since the seat's last draw.
    pub temporary_furiten: bool,
    /// Passed on a winning tile after declaring riichi.
    pub riichi_furiten: bool,
    /// Kinds that may not be discarded right after a call.
    pub forbidden: SmallVec<[u8; 2]>,
    /// Has not discarded yet this round.
    pub first_turn: bool,
}

impl SeatState {
    /// Clear per-round state and take a new hand.
    pub fn reset_for_round(&mut self, tiles: Vec<Tile>) {
        self.hand = Hand::new(tiles);
        self.discards = Vector::new();
        self.riichi = RiichiState::None;
        self.ippatsu = false;
        self.temporary_furiten = false;
        self.riichi_furiten = false;
        self.forbidden.clear();
        self.first_turn = true;
    }

    /// Furiten from the seat's own discards against `waits`, plus the
    /// missed-ron flags.
    #[must_use]
    pub fn is_furiten(&self, waits: &[u8]) -> bool {
        self.temporary_furiten
            || self.riichi_furiten
            || self.discards.iter().any(|d| waits.contains(&d.tile.kind()))
    }

    /// Discards nobody claimed.
    #[must_use]
    pub fn uncalled_discards(&self) -> usize {
        self.discards.iter().filter(|d| !d.called).count()
    }
}

/// Where the current turn stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingDraw(Seat),
    /// `drawn` is `None` after a chi or pon.
    AwaitingDiscard {
        seat: Seat,
        drawn: Option<Tile>,
        rinshan: bool,
    },
    AwaitingCalls(CallWindow),
    /// The round is over and waiting for `Continue`.
    Finished,
}

impl TurnPhase {
    /// Seat whose turn it is, if any.
    #[must_use]
    pub fn active_seat(&self) -> Option<Seat> {
        match self {
            TurnPhase::AwaitingDraw(seat) | TurnPhase::AwaitingDiscard { seat, .. } => Some(*seat),
            TurnPhase::AwaitingCalls(window) => Some(window.discarder),
            TurnPhase::Finished => None,
        }
    }
}

/// One hand of play, from the deal to the settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub wind: Wind,
    pub dealer: Seat,
    pub honba: u32,
    /// Riichi stakes on the table.
    pub deposits: i32,
    pub turn: u32,
    pub phase: TurnPhase,
    pub wall: Wall,
    pub kans: u8,
    /// No call has interrupted the first go-around.
    pub uninterrupted: bool,
    pub riichi_declared: u8,
    /// Seat whose riichi stake is paid once its discard survives.
    pub pending_riichi: Option<Seat>,
}

impl Round {
    #[must_use]
    pub fn new(wind: Wind, dealer: Seat, honba: u32, deposits: i32, wall: Wall) -> Self {
        Self {
            wind,
            dealer,
            honba,
            deposits,
            turn: 0,
            phase: TurnPhase::AwaitingDraw(dealer),
            wall,
            kans: 0,
            uninterrupted: true,
            riichi_declared: 0,
            pending_riichi: None,
        }
    }

    /// Hand number within the wind, 1-4.
    #[must_use]
    pub fn number(&self) -> u8 {
        self.dealer.0 + 1
    }

    /// Rounds since East 1, ignoring repeats.
    #[must_use]
    pub fn index(&self) -> u8 {
        self.wind.index() as u8 * 4 + self.dealer.0
    }

    /// Whether this round is past the scheduled end of `length`.
    #[must_use]
    pub fn in_extension(&self, length: GameLength) -> bool {
        self.index() > length.final_round()
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}", self.wind, self.number())?;
        if self.honba > 0 {
            write!(f, " ({} honba)", self.honba)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TableRng;
    use crate::tiles::parse_tiles;

    #[test]
    fn test_round_numbering() {
        let wall = Wall::shuffled([0, 0, 0], &mut TableRng::new(1));
        let round = Round::new(Wind::South, Seat::new(2), 1, 0, wall);
        assert_eq!(round.number(), 3);
        assert_eq!(round.index(), 6);
        assert!(!round.in_extension(GameLength::South));
        assert!(round.in_extension(GameLength::East));
        assert_eq!(round.to_string(), "South 3 (1 honba)");
    }

    #[test]
    fn test_furiten() {
        let mut seat = SeatState::default();
        seat.reset_for_round(parse_tiles("123m456p789s1122z").unwrap());
        assert!(!seat.is_furiten(&[27, 28]));

        seat.discards.push_back(Discard {
            tile: Tile::new(28),
            called: false,
            riichi: false,
            tsumogiri: true,
        });
        assert!(seat.is_furiten(&[27, 28]));
        assert!(!seat.is_furiten(&[0]));

        seat.temporary_furiten = true;
        assert!(seat.is_furiten(&[0]));
    }

    #[test]
    fn test_occupant() {
        assert!(Occupant::default().is_empty());
        assert!(Occupant::participant("ann").is_connected());
        assert!(!Occupant::Bot.is_connected());
        let away = Occupant::Participant {
            name: "bo".into(),
            connected: false,
        };
        assert!(away.is_participant() && !away.is_connected());
    }
}
