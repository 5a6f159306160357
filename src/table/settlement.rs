//! Round settlements and final ranking.
//!
//! A [`Settlement`] is produced once per round and never changes after.
//! Its `deltas` are the exact point changes applied to each seat. They sum
//! to the riichi `deposits` the winner takes off the table, so seat points
//! plus deposits never change.

use serde::{Deserialize, Serialize};

use crate::core::{Seat, SeatMap, Wind};
use crate::scoring::HandScore;
use crate::tiles::Hand;

/// Points moved between tenpai and noten seats at an exhaustive draw.
pub const NOTEN_PENALTY: i32 = 3000;

/// Why a round was aborted without a winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// Nine different terminals or honors on an uninterrupted first draw.
    NineTerminals,
    /// All four seats declared riichi.
    FourRiichi,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementKind {
    Ron { discarder: Seat },
    Tsumo,
    ExhaustiveDraw { tenpai: Vec<Seat> },
    AbortiveDraw(AbortReason),
}

/// One winning hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub seat: Seat,
    /// The completed hand, winning tile included.
    pub hand: Hand,
    pub score: HandScore,
}

/// Outcome of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub wind: Wind,
    /// Hand number within the wind.
    pub number: u8,
    pub dealer: Seat,
    pub honba: u32,
    pub kind: SettlementKind,
    pub wins: Vec<WinRecord>,
    /// Point change per seat, honba and deposits included.
    pub deltas: SeatMap<i32>,
    /// Riichi deposits taken off the table by the winner.
    pub deposits: i32,
}

impl Settlement {
    #[must_use]
    pub fn winners(&self) -> Vec<Seat> {
        self.wins.iter().map(|w| w.seat).collect()
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self.kind,
            SettlementKind::ExhaustiveDraw { .. } | SettlementKind::AbortiveDraw(_)
        )
    }

    /// Whether the dealer keeps the seat for the next round.
    #[must_use]
    pub fn dealer_repeats(&self) -> bool {
        match &self.kind {
            SettlementKind::Ron { .. } | SettlementKind::Tsumo => {
                self.wins.iter().any(|w| w.seat == self.dealer)
            }
            SettlementKind::ExhaustiveDraw { tenpai } => tenpai.contains(&self.dealer),
            SettlementKind::AbortiveDraw(_) => true,
        }
    }

    /// Honba counter for the next round.
    #[must_use]
    pub fn next_honba(&self) -> u32 {
        if self.is_draw() || self.dealer_repeats() {
            self.honba + 1
        } else {
            0
        }
    }
}

/// Tenpai/noten exchange at an exhaustive draw.
///
/// ```
/// use mahjong_table::core::Seat;
/// use mahjong_table::table::noten_payments;
///
/// let deltas = noten_payments(&[Seat::new(1)]);
/// assert_eq!(deltas[Seat::new(1)], 3000);
/// assert_eq!(deltas[Seat::new(0)], -1000);
/// ```
#[must_use]
pub fn noten_payments(tenpai: &[Seat]) -> SeatMap<i32> {
    let winners = tenpai.len() as i32;
    if winners == 0 || winners == 4 {
        return SeatMap::with_value(0);
    }
    let gain = NOTEN_PENALTY / winners;
    let loss = NOTEN_PENALTY / (4 - winners);
    SeatMap::new(|seat| if tenpai.contains(&seat) { gain } else { -loss })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// 1 for first place.
    pub place: u8,
    pub seat: Seat,
    pub points: i32,
}

/// Final ranking of a finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub placements: Vec<Placement>,
    /// The game was stopped by an internal failure rather than played out.
    pub abnormal: bool,
}

impl GameResult {
    /// Rank seats by points, ties going to the lower seat. Leftover
    /// `deposits` are added to first place.
    #[must_use]
    pub fn rank(points: &SeatMap<i32>, deposits: i32) -> Self {
        let mut order: Vec<(Seat, i32)> = points.iter().map(|(s, p)| (s, *p)).collect();
        order.sort_by_key(|(seat, points)| (std::cmp::Reverse(*points), seat.index()));
        if let Some(first) = order.first_mut() {
            first.1 += deposits;
        }
        let placements = order
            .into_iter()
            .enumerate()
            .map(|(i, (seat, points))| Placement {
                place: i as u8 + 1,
                seat,
                points,
            })
            .collect();
        Self {
            placements,
            abnormal: false,
        }
    }

    #[must_use]
    pub fn winner(&self) -> Option<Seat> {
        self.placements.first().map(|p| p.seat)
    }

    #[must_use]
    pub fn place_of(&self, seat: Seat) -> Option<u8> {
        self.placements
            .iter()
            .find(|p| p.seat == seat)
            .map(|p| p.place)
    }
}
