//! Fu calculation.

use super::{Reading, Wait, WinContext};
use crate::tiles::{is_dragon, is_terminal_or_honor, wind_kind, Decomposition, Set, SetKind};

/// Fu for a reading, rounded up to the next 10.
pub(crate) fn fu(reading: &Reading, closed: bool, ctx: &WinContext, pinfu: bool) -> u32 {
    let (pair, sets) = match &reading.decomposition {
        Decomposition::SevenPairs { .. } => return 25,
        Decomposition::ThirteenOrphans { .. } => return 0,
        Decomposition::Standard { pair, sets } => (*pair, sets),
    };

    if pinfu {
        return if ctx.tsumo { 20 } else { 30 };
    }

    let mut fu = 20;
    if ctx.tsumo {
        fu += 2;
    } else if closed {
        fu += 10;
    }
    fu += sets.iter().map(set_fu).sum::<u32>();
    fu += pair_fu(pair, ctx);
    if matches!(reading.wait, Wait::Kanchan | Wait::Penchan | Wait::Tanki) {
        fu += 2;
    }

    // An open hand with nothing else still scores 30.
    match fu.div_ceil(10) * 10 {
        20 => 30,
        rounded => rounded,
    }
}

fn set_fu(set: &Set) -> u32 {
    let base = match (set.open, is_terminal_or_honor(set.first)) {
        (true, false) => 2,
        (true, true) | (false, false) => 4,
        (false, true) => 8,
    };
    match set.kind {
        SetKind::Sequence => 0,
        SetKind::Triplet => base,
        SetKind::Quad => base * 4,
    }
}

fn pair_fu(pair: u8, ctx: &WinContext) -> u32 {
    if is_dragon(pair) {
        return 2;
    }
    let mut fu = 0;
    if pair == wind_kind(ctx.seat_wind) {
        fu += 2;
    }
    if pair == wind_kind(ctx.round_wind) {
        fu += 2;
    }
    fu
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Seat, Wind};
    use crate::tiles::{parse_tiles, Meld, MeldKind, Tile};
    use smallvec::smallvec;

    fn reading(pair: u8, sets: Vec<Set>, wait: Wait) -> Reading {
        Reading {
            decomposition: Decomposition::Standard {
                pair,
                sets: sets.into_iter().collect(),
            },
            wait,
        }
    }

    #[test]
    fn test_closed_ron_with_triplets() {
        // 20 + 10 closed ron + 8 (concealed 111m) + 4 (concealed 555p) = 42 -> 50
        let r = reading(
            18,
            vec![
                Set::concealed(SetKind::Triplet, 0),
                Set::concealed(SetKind::Triplet, 13),
                Set::concealed(SetKind::Sequence, 19),
                Set::concealed(SetKind::Sequence, 3),
            ],
            Wait::Ryanmen,
        );
        let ctx = WinContext::ron(Tile::sou(3), Wind::South, Wind::East);
        assert_eq!(fu(&r, true, &ctx, false), 50);
    }

    #[test]
    fn test_quads_and_wind_pair() {
        let kan = Meld::new(
            MeldKind::ClosedKan,
            &parse_tiles("7777z").unwrap(),
            None,
            None,
        );
        let open = Meld::new(
            MeldKind::OpenKan,
            &parse_tiles("2222m").unwrap(),
            Some(Tile::man(2)),
            Some(Seat::new(2)),
        );
        let r = reading(
            27,
            vec![
                Set::from_meld(&kan),
                Set::from_meld(&open),
                Set::concealed(SetKind::Sequence, 9),
                Set::concealed(SetKind::Sequence, 18),
            ],
            Wait::Tanki,
        );
        // Dealer in the East round: double wind pair.
        let ctx = WinContext::tsumo(Tile::new(27), Wind::East, Wind::East);
        // 20 + 2 tsumo + 32 + 8 + 4 pair + 2 tanki = 68 -> 70
        assert_eq!(fu(&r, false, &ctx, false), 70);
    }

    #[test]
    fn test_open_minimum_thirty() {
        let r = Reading {
            decomposition: Decomposition::Standard {
                pair: 4,
                sets: smallvec![
                    Set {
                        kind: SetKind::Sequence,
                        first: 0,
                        open: true,
                        declared: true,
                    },
                    Set::concealed(SetKind::Sequence, 9),
                    Set::concealed(SetKind::Sequence, 12),
                    Set::concealed(SetKind::Sequence, 18),
                ],
            },
            wait: Wait::Ryanmen,
        };
        let ctx = WinContext::ron(Tile::pin(1), Wind::South, Wind::East);
        assert_eq!(fu(&r, false, &ctx, false), 30);
    }

    #[test]
    fn test_special_shapes() {
        let ctx = WinContext::ron(Tile::man(1), Wind::South, Wind::East);
        let pairs = Reading {
            decomposition: Decomposition::SevenPairs {
                pairs: [0, 1, 2, 3, 4, 5, 6],
            },
            wait: Wait::Tanki,
        };
        assert_eq!(fu(&pairs, true, &ctx, false), 25);

        let pinfu = reading(4, Vec::new(), Wait::Ryanmen);
        assert_eq!(fu(&pinfu, true, &ctx, true), 30);
        let tsumo = WinContext::tsumo(Tile::man(1), Wind::South, Wind::East);
        assert_eq!(fu(&pinfu, true, &tsumo, true), 20);
    }
}
