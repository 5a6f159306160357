//! Base points, limits and payments.

use serde::{Deserialize, Serialize};

use crate::core::{Seat, SeatMap};

/// Named scoring limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limit {
    Mangan,
    Haneman,
    Baiman,
    Sanbaiman,
    /// Thirteen or more han from ordinary yaku and dora.
    CountedYakuman,
    /// Yakuman with its multiple.
    Yakuman(u32),
}

/// What the losing side pays, before honba and deposits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payment {
    /// Paid in full by the discarder.
    Ron { amount: i32 },
    /// Paid by every other seat. `dealer` is zero when the winner is the
    /// dealer.
    Tsumo { dealer: i32, non_dealer: i32 },
}

impl Payment {
    /// Total received by the winner.
    #[must_use]
    pub fn total(&self) -> i32 {
        match *self {
            Payment::Ron { amount } => amount,
            Payment::Tsumo {
                dealer: 0,
                non_dealer,
            } => non_dealer * 3,
            Payment::Tsumo { dealer, non_dealer } => dealer + non_dealer * 2,
        }
    }
}

/// Round up to the next multiple of 100.
#[must_use]
pub const fn round_up_100(points: u32) -> u32 {
    points.div_ceil(100) * 100
}

/// Base points `fu * 2^(2 + han)` with limits applied.
///
/// A non-zero `yakuman` multiple overrides han and fu.
///
/// ```
/// use mahjong_table::scoring::{base_points, Limit};
///
/// assert_eq!(base_points(1, 30, 0), (240, None));
/// assert_eq!(base_points(4, 40, 0), (2000, Some(Limit::Mangan)));
/// assert_eq!(base_points(0, 0, 2), (16000, Some(Limit::Yakuman(2))));
/// ```
#[must_use]
pub fn base_points(han: u32, fu: u32, yakuman: u32) -> (u32, Option<Limit>) {
    if yakuman > 0 {
        return (8000 * yakuman, Some(Limit::Yakuman(yakuman)));
    }
    match han {
        13.. => (8000, Some(Limit::CountedYakuman)),
        11..=12 => (6000, Some(Limit::Sanbaiman)),
        8..=10 => (4000, Some(Limit::Baiman)),
        6..=7 => (3000, Some(Limit::Haneman)),
        _ => {
            let base = fu << (2 + han);
            if base >= 2000 {
                (2000, Some(Limit::Mangan))
            } else {
                (base, None)
            }
        }
    }
}

/// Payment for a win worth `base` points.
#[must_use]
pub fn payment_for(base: u32, dealer: bool, tsumo: bool) -> Payment {
    let pay = |multiple: u32| round_up_100(base * multiple) as i32;
    match (dealer, tsumo) {
        (true, false) => Payment::Ron { amount: pay(6) },
        (false, false) => Payment::Ron { amount: pay(4) },
        (true, true) => Payment::Tsumo {
            dealer: 0,
            non_dealer: pay(2),
        },
        (false, true) => Payment::Tsumo {
            dealer: pay(2),
            non_dealer: pay(1),
        },
    }
}

/// Point deltas for one winner.
///
/// `discarder` is `None` for tsumo. Honba adds 300 to a ron and 100 per
/// payer on tsumo; `deposits` go to the winner unchanged.
///
/// ```
/// use mahjong_table::core::Seat;
/// use mahjong_table::scoring::{win_transfers, Payment};
///
/// let deltas = win_transfers(
///     Payment::Ron { amount: 3900 },
///     Seat::new(1),
///     Seat::new(0),
///     Some(Seat::new(2)),
///     1,
///     1000,
/// );
/// assert_eq!(deltas[Seat::new(1)], 5200);
/// assert_eq!(deltas[Seat::new(2)], -4200);
/// ```
#[must_use]
pub fn win_transfers(
    payment: Payment,
    winner: Seat,
    dealer: Seat,
    discarder: Option<Seat>,
    honba: u32,
    deposits: i32,
) -> SeatMap<i32> {
    let mut deltas: SeatMap<i32> = SeatMap::with_value(0);
    let honba = honba as i32;
    match (payment, discarder) {
        (Payment::Ron { amount }, Some(from)) => {
            let owed = amount + 300 * honba;
            deltas[from] -= owed;
            deltas[winner] += owed;
        }
        (Payment::Tsumo { dealer: from_dealer, non_dealer }, _) => {
            for payer in winner.others_in_turn_order() {
                let base = if payer == dealer { from_dealer } else { non_dealer };
                let owed = base + 100 * honba;
                deltas[payer] -= owed;
                deltas[winner] += owed;
            }
        }
        // A ron without a discarder has nobody to pay it.
        (Payment::Ron { .. }, None) => {}
    }
    deltas[winner] += deposits;
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up() {
        assert_eq!(round_up_100(0), 0);
        assert_eq!(round_up_100(1920), 2000);
        assert_eq!(round_up_100(2000), 2000);
        assert_eq!(round_up_100(7680), 7700);
    }

    #[test]
    fn test_limits() {
        assert_eq!(base_points(5, 30, 0), (2000, Some(Limit::Mangan)));
        assert_eq!(base_points(3, 70, 0), (2000, Some(Limit::Mangan)));
        assert_eq!(base_points(3, 60, 0), (1920, None));
        assert_eq!(base_points(7, 30, 0).0, 3000);
        assert_eq!(base_points(10, 30, 0).0, 4000);
        assert_eq!(base_points(12, 30, 0).0, 6000);
        assert_eq!(base_points(14, 30, 0), (8000, Some(Limit::CountedYakuman)));
    }

    #[test]
    fn test_payment_tables() {
        // 30 fu 4 han = 1920 base.
        assert_eq!(payment_for(1920, false, false), Payment::Ron { amount: 7700 });
        assert_eq!(payment_for(1920, true, false), Payment::Ron { amount: 11600 });
        assert_eq!(
            payment_for(1920, false, true),
            Payment::Tsumo {
                dealer: 3900,
                non_dealer: 2000
            }
        );
        assert_eq!(
            payment_for(1920, true, true),
            Payment::Tsumo {
                dealer: 0,
                non_dealer: 3900
            }
        );
        assert_eq!(payment_for(1920, true, true).total(), 11700);
        assert_eq!(payment_for(1920, false, true).total(), 7900);
    }

    #[test]
    fn test_tsumo_transfers_are_zero_sum() {
        let payment = payment_for(2000, false, true);
        let deltas = win_transfers(payment, Seat::new(2), Seat::new(0), None, 2, 2000);
        assert_eq!(deltas[Seat::new(0)], -4200);
        assert_eq!(deltas[Seat::new(1)], -2200);
        assert_eq!(deltas[Seat::new(3)], -2200);
        assert_eq!(deltas[Seat::new(2)], 8600 + 2000);
        // Deposits come from the table, not from seats.
        assert_eq!(deltas.values().sum::<i32>(), 2000);
    }
}
