//! Hand valuation: yaku, han, fu and payments.
//!
//! The engine is stateless. [`score_hand`] takes a complete hand and the
//! circumstances of the win and returns the best [`HandScore`] over every
//! decomposition and every placement of the winning tile.
//!
//! ## Ranking
//!
//! When several readings are valid, the highest payment wins, then the most
//! han, then the most fu, then the yaku list that comes first in catalog
//! order.
//!
//! ```
//! use mahjong_table::core::Wind;
//! use mahjong_table::scoring::{score_hand, ScoringPolicy, WinContext, Yaku};
//! use mahjong_table::tiles::{parse_tiles, Hand, Tile};
//!
//! let hand = Hand::new(parse_tiles("234m345p456s678s55p").unwrap());
//! let ctx = WinContext::tsumo(Tile::sou(8), Wind::South, Wind::East);
//! let score = score_hand(&hand, &ctx, &ScoringPolicy::default()).unwrap();
//! assert!(score.has(Yaku::Tanyao));
//! assert!(score.has(Yaku::MenzenTsumo));
//! ```

mod fu;
mod points;
mod yaku;

pub use points::{base_points, payment_for, round_up_100, win_transfers, Limit, Payment};
pub use yaku::Yaku;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{MahjongRule, Wind, YakumanStacking};
use crate::error::{MahjongError, MahjongResult};
use crate::tiles::{decompose, dora_from_indicator, Decomposition, Hand, SetKind, Tile};

/// Everything about a win that is not in the hand itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinContext {
    /// The tile that completed the hand. Must be among the concealed tiles.
    pub win_tile: Tile,
    pub tsumo: bool,
    pub seat_wind: Wind,
    pub round_wind: Wind,
    pub riichi: bool,
    /// Riichi declared on the first uninterrupted discard. Implies `riichi`.
    pub double_riichi: bool,
    pub ippatsu: bool,
    /// Tsumo on the last live tile.
    pub haitei: bool,
    /// Ron on the last discard.
    pub houtei: bool,
    /// Tsumo on a kan replacement tile.
    pub rinshan: bool,
    /// Ron on a tile added to a pon.
    pub chankan: bool,
    /// Win on the seat's first draw with no call made before it.
    pub first_turn: bool,
    pub dora_indicators: Vec<Tile>,
    /// Only counted for riichi hands.
    pub ura_indicators: Vec<Tile>,
}

impl WinContext {
    #[must_use]
    pub fn tsumo(win_tile: Tile, seat_wind: Wind, round_wind: Wind) -> Self {
        Self {
            win_tile,
            tsumo: true,
            seat_wind,
            round_wind,
            riichi: false,
            double_riichi: false,
            ippatsu: false,
            haitei: false,
            houtei: false,
            rinshan: false,
            chankan: false,
            first_turn: false,
            dora_indicators: Vec::new(),
            ura_indicators: Vec::new(),
        }
    }

    #[must_use]
    pub fn ron(win_tile: Tile, seat_wind: Wind, round_wind: Wind) -> Self {
        Self {
            tsumo: false,
            ..Self::tsumo(win_tile, seat_wind, round_wind)
        }
    }

    #[must_use]
    pub fn with_riichi(mut self, double: bool, ippatsu: bool) -> Self {
        self.riichi = true;
        self.double_riichi = double;
        self.ippatsu = ippatsu;
        self
    }

    #[must_use]
    pub fn with_dora(mut self, dora: Vec<Tile>, ura: Vec<Tile>) -> Self {
        self.dora_indicators = dora;
        self.ura_indicators = ura;
        self
    }

    #[must_use]
    pub fn is_dealer(&self) -> bool {
        self.seat_wind == Wind::East
    }
}

/// The rule knobs the scoring engine reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Minimum yaku han, dora excluded.
    pub minimum_han: u32,
    pub open_tanyao: bool,
    pub yakuman_stacking: YakumanStacking,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::from(&MahjongRule::default())
    }
}

impl From<&MahjongRule> for ScoringPolicy {
    fn from(rule: &MahjongRule) -> Self {
        Self {
            minimum_han: rule.minimum_han.han(),
            open_tanyao: rule.open_tanyao,
            yakuman_stacking: rule.yakuman_stacking,
        }
    }
}

/// How the winning tile completed the hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wait {
    /// Two-sided sequence wait.
    Ryanmen,
    /// Middle of a sequence.
    Kanchan,
    /// Edge wait on 3 or 7.
    Penchan,
    /// Two pairs, one becomes a triplet.
    Shanpon,
    /// Single-tile pair wait.
    Tanki,
    /// Thirteen orphans waiting on all thirteen kinds.
    ThirteenSided,
}

/// A decomposition with the winning tile placed.
///
/// On a ron the triplet completed by the winning tile counts as open.
#[derive(Clone, Debug)]
pub(crate) struct Reading {
    pub decomposition: Decomposition,
    pub wait: Wait,
}

/// Final valuation of a winning hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandScore {
    /// Yaku with their han, in catalog order.
    pub yaku: Vec<(Yaku, u32)>,
    /// Han from yaku alone.
    pub yaku_han: u32,
    pub dora: u32,
    pub ura_dora: u32,
    pub red_fives: u32,
    /// Total han including dora.
    pub han: u32,
    pub fu: u32,
    /// Yakuman multiple, 0 for ordinary hands.
    pub yakuman: u32,
    pub limit: Option<Limit>,
    pub base_points: u32,
    pub payment: Payment,
}

impl HandScore {
    #[must_use]
    pub fn has(&self, yaku: Yaku) -> bool {
        self.yaku.iter().any(|(y, _)| *y == yaku)
    }

    /// Whether this reading should be chosen over `other`.
    #[must_use]
    pub fn outranks(&self, other: &HandScore) -> bool {
        let key = |s: &HandScore| (s.payment.total(), s.han, s.fu);
        match key(self).cmp(&key(other)) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                let names = |s: &HandScore| s.yaku.iter().map(|(y, _)| *y).collect::<Vec<_>>();
                names(self) < names(other)
            }
        }
    }
}

/// Value a complete 14-tile hand.
///
/// Fails with [`MahjongError::NoValidHand`] when the hand is not complete,
/// has no yaku, or its yaku han are below the policy minimum.
pub fn score_hand(
    hand: &Hand,
    ctx: &WinContext,
    policy: &ScoringPolicy,
) -> MahjongResult<HandScore> {
    if !hand.contains(ctx.win_tile) {
        return Err(MahjongError::NoValidHand);
    }

    let mut best: Option<HandScore> = None;
    for decomposition in decompose(hand) {
        for reading in readings(&decomposition, ctx) {
            let Some(score) = evaluate(&reading, hand, ctx, policy) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| score.outranks(b)) {
                best = Some(score);
            }
        }
    }
    best.ok_or(MahjongError::NoValidHand)
}

/// Every placement of the winning tile within a decomposition.
fn readings(decomposition: &Decomposition, ctx: &WinContext) -> Vec<Reading> {
    let win = ctx.win_tile.kind();
    match decomposition {
        Decomposition::SevenPairs { .. } => vec![Reading {
            decomposition: decomposition.clone(),
            wait: Wait::Tanki,
        }],
        Decomposition::ThirteenOrphans { pair } => vec![Reading {
            decomposition: decomposition.clone(),
            wait: if *pair == win {
                Wait::ThirteenSided
            } else {
                Wait::Tanki
            },
        }],
        Decomposition::Standard { pair, sets } => {
            let mut out = Vec::new();
            if *pair == win {
                out.push(Reading {
                    decomposition: decomposition.clone(),
                    wait: Wait::Tanki,
                });
            }
            let mut seen: SmallVec<[(SetKind, u8); 4]> = SmallVec::new();
            for (i, set) in sets.iter().enumerate() {
                if set.declared || !set.contains_kind(win) || seen.contains(&(set.kind, set.first)) {
                    continue;
                }
                seen.push((set.kind, set.first));

                let wait = match set.kind {
                    SetKind::Sequence => sequence_wait(set.first, win),
                    _ => Wait::Shanpon,
                };
                let mut placed = sets.clone();
                if set.kind == SetKind::Triplet && !ctx.tsumo {
                    placed[i].open = true;
                }
                out.push(Reading {
                    decomposition: Decomposition::Standard {
                        pair: *pair,
                        sets: placed,
                    },
                    wait,
                });
            }
            out
        }
    }
}

fn sequence_wait(first: u8, win: u8) -> Wait {
    let position = first % 9;
    if win == first + 1 {
        Wait::Kanchan
    } else if (win == first && position == 6) || (win == first + 2 && position == 0) {
        Wait::Penchan
    } else {
        Wait::Ryanmen
    }
}

fn evaluate(
    reading: &Reading,
    hand: &Hand,
    ctx: &WinContext,
    policy: &ScoringPolicy,
) -> Option<HandScore> {
    let closed = hand.is_closed();
    let found = yaku::find_yaku(reading, hand, ctx, policy);
    if found.is_empty() {
        return None;
    }

    let yakuman: u32 = found.iter().map(|y| y.yakuman_multiplier()).sum();
    if yakuman > 0 {
        let yakuman = match policy.yakuman_stacking {
            YakumanStacking::Single => 1,
            YakumanStacking::Cumulative => yakuman,
        };
        let yaku: Vec<(Yaku, u32)> = found
            .iter()
            .map(|y| (*y, 13 * y.yakuman_multiplier()))
            .collect();
        let (base, limit) = base_points(0, 0, yakuman);
        return Some(HandScore {
            yaku,
            yaku_han: 13 * yakuman,
            dora: 0,
            ura_dora: 0,
            red_fives: 0,
            han: 13 * yakuman,
            fu: 0,
            yakuman,
            limit,
            base_points: base,
            payment: payment_for(base, ctx.is_dealer(), ctx.tsumo),
        });
    }

    let yaku: Vec<(Yaku, u32)> = found.iter().map(|y| (*y, y.han(closed))).collect();
    let yaku_han: u32 = yaku.iter().map(|(_, h)| h).sum();
    if yaku_han < policy.minimum_han {
        return None;
    }

    let (dora, ura_dora, red_fives) = count_dora(hand, ctx);
    let han = yaku_han + dora + ura_dora + red_fives;
    let fu = fu::fu(reading, closed, ctx, found.contains(&Yaku::Pinfu));
    let (base, limit) = base_points(han, fu, 0);

    Some(HandScore {
        yaku,
        yaku_han,
        dora,
        ura_dora,
        red_fives,
        han,
        fu,
        yakuman: 0,
        limit,
        base_points: base,
        payment: payment_for(base, ctx.is_dealer(), ctx.tsumo),
    })
}

fn count_dora(hand: &Hand, ctx: &WinContext) -> (u32, u32, u32) {
    let count = |indicators: &[Tile]| -> u32 {
        indicators
            .iter()
            .map(|ind| {
                let dora = dora_from_indicator(ind.kind());
                hand.all_tiles().filter(|t| t.kind() == dora).count() as u32
            })
            .sum()
    };
    let dora = count(&ctx.dora_indicators);
    let ura = if ctx.riichi || ctx.double_riichi {
        count(&ctx.ura_indicators)
    } else {
        0
    };
    let red = hand.all_tiles().filter(|t| t.is_red()).count() as u32;
    (dora, ura, red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MinimumHan, Seat};
    use crate::tiles::{parse_tiles, Meld, MeldKind};

    fn hand(s: &str) -> Hand {
        Hand::new(parse_tiles(s).unwrap())
    }

    fn tile(s: &str) -> Tile {
        s.parse().unwrap()
    }

    #[test]
    fn test_pinfu_ron_thirty_fu() {
        // 23m waiting on 1m/4m, ron on 4m.
        let h = hand("234m567p234s678s55p");
        let ctx = WinContext::ron(tile("4m"), Wind::South, Wind::East);
        let score = score_hand(&h, &ctx, &ScoringPolicy::default()).unwrap();
        assert!(score.has(Yaku::Pinfu));
        assert!(score.has(Yaku::Tanyao));
        assert_eq!(score.fu, 30);
        assert_eq!(score.han, 2);
        // 30 fu 2 han non-dealer ron: 30 * 16 * 4 = 1920 -> 2000.
        assert_eq!(score.payment, Payment::Ron { amount: 2000 });
    }

    #[test]
    fn test_pinfu_tsumo_twenty_fu() {
        let h = hand("234m567p234s678s55p");
        let ctx = WinContext::tsumo(tile("4m"), Wind::East, Wind::East);
        let score = score_hand(&h, &ctx, &ScoringPolicy::default()).unwrap();
        assert!(score.has(Yaku::Pinfu));
        assert!(score.has(Yaku::MenzenTsumo));
        assert_eq!(score.fu, 20);
        assert_eq!(score.han, 3);
        // 20 fu 3 han dealer tsumo: 20 * 32 * 2 = 1280 -> 1300 each.
        assert_eq!(
            score.payment,
            Payment::Tsumo {
                dealer: 0,
                non_dealer: 1300
            }
        );
    }

    #[test]
    fn test_no_yaku_is_invalid() {
        // Open hand without yaku.
        let chi = Meld::new(
            MeldKind::Chi,
            &parse_tiles("123m").unwrap(),
            Some(tile("1m")),
            Some(Seat::new(3)),
        );
        let h = Hand::with_melds(parse_tiles("456p789s345s11s").unwrap(), vec![chi]);
        let ctx = WinContext::ron(tile("3s"), Wind::South, Wind::East);
        assert!(matches!(
            score_hand(&h, &ctx, &ScoringPolicy::default()),
            Err(MahjongError::NoValidHand)
        ));
    }

    #[test]
    fn test_dora_does_not_count_for_minimum() {
        let h = hand("234m567p234s678s55p");
        let ctx = WinContext::ron(tile("4m"), Wind::South, Wind::East)
            .with_dora(vec![tile("4p")], Vec::new());
        let mut policy = ScoringPolicy::default();
        policy.minimum_han = MinimumHan::Four.han();
        assert!(score_hand(&h, &ctx, &policy).is_err());

        policy.minimum_han = MinimumHan::Two.han();
        let score = score_hand(&h, &ctx, &policy).unwrap();
        // Three 5p in the hand.
        assert_eq!(score.dora, 3);
        assert_eq!(score.han, 5);
    }

    #[test]
    fn test_ura_dora_only_with_riichi() {
        let h = hand("234m567p234s678s55p");
        let base = WinContext::ron(tile("4m"), Wind::South, Wind::East)
            .with_dora(Vec::new(), vec![tile("4p")]);
        let plain = score_hand(&h, &base, &ScoringPolicy::default()).unwrap();
        assert_eq!(plain.ura_dora, 0);

        let riichi = base.with_riichi(false, false);
        let score = score_hand(&h, &riichi, &ScoringPolicy::default()).unwrap();
        assert_eq!(score.ura_dora, 3);
        assert!(score.has(Yaku::Riichi));
    }

    #[test]
    fn test_ron_on_shanpon_breaks_concealed_triplet() {
        // Three concealed triplets, but the ron completes one of them.
        let h = hand("222m444p666s789s33z");
        let tsumo = WinContext::tsumo(tile("6s"), Wind::South, Wind::East);
        let score = score_hand(&h, &tsumo, &ScoringPolicy::default()).unwrap();
        assert!(score.has(Yaku::Sanankou));

        let ron = WinContext::ron(tile("6s"), Wind::South, Wind::East);
        assert!(score_hand(&h, &ron, &ScoringPolicy::default()).is_err());
    }

    #[test]
    fn test_best_reading_chosen() {
        // 111222333m: three concealed triplets beat three sequences.
        let h = hand("111222333m789p55s");
        let ctx = WinContext::tsumo(tile("9p"), Wind::South, Wind::East);
        let score = score_hand(&h, &ctx, &ScoringPolicy::default()).unwrap();
        assert!(score.has(Yaku::Sanankou));
        assert!(!score.has(Yaku::Iipeikou));
    }

    #[test]
    fn test_yakuman_stacking() {
        // Daisangen plus tsuuiisou.
        let h = hand("555666777z111z22z");
        let ctx = WinContext::tsumo(tile("2z"), Wind::South, Wind::East);

        let single = score_hand(&h, &ctx, &ScoringPolicy::default()).unwrap();
        assert!(single.has(Yaku::Daisangen));
        assert!(single.has(Yaku::Tsuuiisou));
        assert_eq!(single.yakuman, 1);
        assert_eq!(single.base_points, 8000);

        let policy = ScoringPolicy {
            yakuman_stacking: YakumanStacking::Cumulative,
            ..ScoringPolicy::default()
        };
        let stacked = score_hand(&h, &ctx, &policy).unwrap();
        assert!(stacked.yakuman >= 3);
        assert_eq!(stacked.base_points, 8000 * stacked.yakuman);
    }

    #[test]
    fn test_win_tile_must_be_in_hand() {
        let h = hand("234m567p234s678s55p");
        let ctx = WinContext::ron(tile("9m"), Wind::South, Wind::East);
        assert!(score_hand(&h, &ctx, &ScoringPolicy::default()).is_err());
    }

    #[test]
    fn test_outranks_tie_break_on_yaku_order() {
        let a = HandScore {
            yaku: vec![(Yaku::Riichi, 1)],
            yaku_han: 1,
            dora: 0,
            ura_dora: 0,
            red_fives: 0,
            han: 1,
            fu: 30,
            yakuman: 0,
            limit: None,
            base_points: 240,
            payment: Payment::Ron { amount: 1000 },
        };
        let b = HandScore {
            yaku: vec![(Yaku::Tanyao, 1)],
            ..a.clone()
        };
        assert!(a.outranks(&b));
        assert!(!b.outranks(&a));
    }
}
