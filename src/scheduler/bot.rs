//! Policies that choose actions for seats nobody is playing.
//!
//! A policy only picks from [`Table::legal_actions`]; the table still
//! validates whatever it returns.

use crate::core::{ActionKind, Seat, TableRng};
use crate::table::Table;
use crate::tiles::{kind_number, shanten, Tile, KIND_COUNT};

/// Chooses an action for a seat the scheduler is driving.
pub trait SeatPolicy: Send + Sync {
    /// Returns `None` if the seat has nothing to do.
    fn choose_action(&self, table: &Table, seat: Seat, rng: &mut TableRng) -> Option<ActionKind>;
}

/// Picks uniformly among the legal actions.
#[derive(Clone, Debug, Default)]
pub struct UniformBot;

impl SeatPolicy for UniformBot {
    fn choose_action(&self, table: &Table, seat: Seat, rng: &mut TableRng) -> Option<ActionKind> {
        let actions = table.legal_actions(seat);
        rng.choose(&actions).cloned()
    }
}

/// Wins when it can, never calls, and otherwise discards towards the
/// lowest shanten, throwing isolated honors and terminals first.
#[derive(Clone, Debug, Default)]
pub struct SimpleBot;

impl SeatPolicy for SimpleBot {
    fn choose_action(&self, table: &Table, seat: Seat, _rng: &mut TableRng) -> Option<ActionKind> {
        let actions = table.legal_actions(seat);
        for preferred in [
            ActionKind::Tsumo,
            ActionKind::Ron,
            ActionKind::Continue,
            ActionKind::Draw,
            ActionKind::Pass,
        ] {
            if actions.contains(&preferred) {
                return Some(preferred);
            }
        }

        let discards: Vec<Tile> = actions
            .iter()
            .filter_map(|a| match a {
                ActionKind::Discard(tile) => Some(*tile),
                _ => None,
            })
            .collect();
        best_discard(table, seat, &discards).map(ActionKind::Discard)
    }
}

/// The discard leaving the lowest shanten, least connected tile first.
fn best_discard(table: &Table, seat: Seat, candidates: &[Tile]) -> Option<Tile> {
    let hand = &table.seat(seat).hand;
    let counts = hand.counts();
    let melds = hand.melds().len();

    candidates.iter().copied().min_by_key(|tile| {
        let mut rest = counts;
        rest[tile.index()] -= 1;
        let kind = tile.kind();
        // Keep red fives unless they are the only choice.
        (shanten(&rest, melds), connectivity(&rest, kind), tile.is_red(), kind)
    })
}

/// How many remaining tiles work together with `kind`.
fn connectivity(counts: &[u8; KIND_COUNT], kind: u8) -> u8 {
    let same = counts[kind as usize];
    if kind >= 27 {
        return same * 2;
    }
    let number = kind_number(kind);
    let mut near = 0;
    for offset in [-2i8, -1, 1, 2] {
        let n = number as i8 + offset;
        if (1..=9).contains(&n) {
            near += counts[(kind as i8 + offset) as usize];
        }
    }
    // Simples connect in both directions.
    let simple = u8::from(number != 1 && number != 9);
    same * 2 + near + simple
}
