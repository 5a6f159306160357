//! Yaku catalog and detection.
//!
//! Variant order is catalog order. It is used for tie-breaks between
//! equally valued readings, so do not reorder.

use serde::{Deserialize, Serialize};

use super::{Reading, ScoringPolicy, Wait, WinContext};
use crate::tiles::{
    counts_of, is_dragon, is_terminal, is_terminal_or_honor, is_wind, kind_suit, wind_kind,
    Decomposition, Hand, Set, SetKind, Suit, Tile, TileCounts,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Yaku {
    Riichi,
    DoubleRiichi,
    Ippatsu,
    MenzenTsumo,
    Pinfu,
    Iipeikou,
    Tanyao,
    White,
    Green,
    Red,
    SeatWind,
    RoundWind,
    Haitei,
    Houtei,
    Rinshan,
    Chankan,
    SevenPairs,
    Toitoi,
    Sanankou,
    SanshokuDoujun,
    SanshokuDoukou,
    Ittsu,
    Chanta,
    Sankantsu,
    Shousangen,
    Honroutou,
    Junchan,
    Honitsu,
    Ryanpeikou,
    Chinitsu,
    // Yakuman
    Tenhou,
    Chiihou,
    ThirteenOrphans,
    ThirteenOrphansThirteenSided,
    Suuankou,
    SuuankouTanki,
    Daisangen,
    Shousuushi,
    Daisuushi,
    Tsuuiisou,
    Chinroutou,
    Ryuuiisou,
    ChuurenPoutou,
    PureChuurenPoutou,
    Suukantsu,
}

impl Yaku {
    /// Han value, with the open-hand reduction applied when `closed` is false.
    #[must_use]
    pub fn han(self, closed: bool) -> u32 {
        let reduced = |full: u32| if closed { full } else { full - 1 };
        match self {
            Yaku::Riichi
            | Yaku::Ippatsu
            | Yaku::MenzenTsumo
            | Yaku::Pinfu
            | Yaku::Iipeikou
            | Yaku::Tanyao
            | Yaku::White
            | Yaku::Green
            | Yaku::Red
            | Yaku::SeatWind
            | Yaku::RoundWind
            | Yaku::Haitei
            | Yaku::Houtei
            | Yaku::Rinshan
            | Yaku::Chankan => 1,
            Yaku::DoubleRiichi
            | Yaku::SevenPairs
            | Yaku::Toitoi
            | Yaku::Sanankou
            | Yaku::SanshokuDoukou
            | Yaku::Sankantsu
            | Yaku::Shousangen
            | Yaku::Honroutou => 2,
            Yaku::SanshokuDoujun | Yaku::Ittsu | Yaku::Chanta => reduced(2),
            Yaku::Junchan | Yaku::Honitsu => reduced(3),
            Yaku::Ryanpeikou => 3,
            Yaku::Chinitsu => reduced(6),
            _ => 13 * self.yakuman_multiplier(),
        }
    }

    /// Yakuman multiple, 0 for ordinary yaku.
    #[must_use]
    pub fn yakuman_multiplier(self) -> u32 {
        match self {
            Yaku::ThirteenOrphansThirteenSided | Yaku::SuuankouTanki | Yaku::PureChuurenPoutou => 2,
            Yaku::Tenhou
            | Yaku::Chiihou
            | Yaku::ThirteenOrphans
            | Yaku::Suuankou
            | Yaku::Daisangen
            | Yaku::Shousuushi
            | Yaku::Daisuushi
            | Yaku::Tsuuiisou
            | Yaku::Chinroutou
            | Yaku::Ryuuiisou
            | Yaku::ChuurenPoutou
            | Yaku::Suukantsu => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_yakuman(self) -> bool {
        self.yakuman_multiplier() > 0
    }
}

impl std::fmt::Display for Yaku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Yaku::Riichi => "Riichi",
            Yaku::DoubleRiichi => "Double Riichi",
            Yaku::Ippatsu => "Ippatsu",
            Yaku::MenzenTsumo => "Menzen Tsumo",
            Yaku::Pinfu => "Pinfu",
            Yaku::Iipeikou => "Iipeikou",
            Yaku::Tanyao => "Tanyao",
            Yaku::White => "Yakuhai White",
            Yaku::Green => "Yakuhai Green",
            Yaku::Red => "Yakuhai Red",
            Yaku::SeatWind => "Seat Wind",
            Yaku::RoundWind => "Round Wind",
            Yaku::Haitei => "Haitei",
            Yaku::Houtei => "Houtei",
            Yaku::Rinshan => "Rinshan Kaihou",
            Yaku::Chankan => "Chankan",
            Yaku::SevenPairs => "Chiitoitsu",
            Yaku::Toitoi => "Toitoi",
            Yaku::Sanankou => "Sanankou",
            Yaku::SanshokuDoujun => "Sanshoku Doujun",
            Yaku::SanshokuDoukou => "Sanshoku Doukou",
            Yaku::Ittsu => "Ittsu",
            Yaku::Chanta => "Chanta",
            Yaku::Sankantsu => "Sankantsu",
            Yaku::Shousangen => "Shousangen",
            Yaku::Honroutou => "Honroutou",
            Yaku::Junchan => "Junchan",
            Yaku::Honitsu => "Honitsu",
            Yaku::Ryanpeikou => "Ryanpeikou",
            Yaku::Chinitsu => "Chinitsu",
            Yaku::Tenhou => "Tenhou",
            Yaku::Chiihou => "Chiihou",
            Yaku::ThirteenOrphans => "Kokushi Musou",
            Yaku::ThirteenOrphansThirteenSided => "Kokushi Musou 13-sided",
            Yaku::Suuankou => "Suuankou",
            Yaku::SuuankouTanki => "Suuankou Tanki",
            Yaku::Daisangen => "Daisangen",
            Yaku::Shousuushi => "Shousuushi",
            Yaku::Daisuushi => "Daisuushi",
            Yaku::Tsuuiisou => "Tsuuiisou",
            Yaku::Chinroutou => "Chinroutou",
            Yaku::Ryuuiisou => "Ryuuiisou",
            Yaku::ChuurenPoutou => "Chuuren Poutou",
            Yaku::PureChuurenPoutou => "Junsei Chuuren Poutou",
            Yaku::Suukantsu => "Suukantsu",
        };
        f.write_str(name)
    }
}

/// Facts about a reading shared by several yaku checks.
struct Shape<'a> {
    pair: Option<u8>,
    sets: &'a [Set],
    /// Counts over every tile the seat holds, meld tiles included.
    all: TileCounts,
    closed: bool,
}

impl Shape<'_> {
    fn sequences(&self) -> impl Iterator<Item = &Set> {
        self.sets.iter().filter(|s| s.kind == SetKind::Sequence)
    }

    fn triplets(&self) -> impl Iterator<Item = &Set> {
        self.sets.iter().filter(|s| s.is_triplet_like())
    }

    fn quads(&self) -> usize {
        self.sets.iter().filter(|s| s.kind == SetKind::Quad).count()
    }

    fn concealed_triplets(&self) -> usize {
        self.triplets().filter(|s| !s.open).count()
    }

    fn has_triplet(&self, kind: u8) -> bool {
        self.triplets().any(|s| s.first == kind)
    }

    fn kinds(&self) -> impl Iterator<Item = u8> + '_ {
        self.all
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(k, _)| k as u8)
    }

    fn suits(&self) -> (usize, bool) {
        let mut suited = [false; 3];
        let mut honors = false;
        for kind in self.kinds() {
            match kind_suit(kind) {
                Suit::Man => suited[0] = true,
                Suit::Pin => suited[1] = true,
                Suit::Sou => suited[2] = true,
                Suit::Honor => honors = true,
            }
        }
        (suited.iter().filter(|&&s| s).count(), honors)
    }

    /// Pairs of identical concealed sequences.
    fn identical_sequence_pairs(&self) -> usize {
        let mut firsts: Vec<u8> = self.sequences().map(|s| s.first).collect();
        firsts.sort_unstable();
        let mut pairs = 0;
        let mut i = 0;
        while i + 1 < firsts.len() {
            if firsts[i] == firsts[i + 1] {
                pairs += 1;
                i += 2;
            } else {
                i += 1;
            }
        }
        pairs
    }

    fn every_group_has_terminal_or_honor(&self) -> bool {
        let pair_ok = self.pair.map_or(false, is_terminal_or_honor);
        pair_ok
            && self.sets.iter().all(|s| match s.kind {
                SetKind::Sequence => s.first % 9 == 0 || s.first % 9 == 6,
                _ => is_terminal_or_honor(s.first),
            })
    }
}

/// Yaku for one reading. Returns only yakuman when any apply.
pub(crate) fn find_yaku(
    reading: &Reading,
    hand: &Hand,
    ctx: &WinContext,
    policy: &ScoringPolicy,
) -> Vec<Yaku> {
    let all_tiles: Vec<Tile> = hand.all_tiles().copied().collect();
    let empty: [Set; 0] = [];
    let shape = match &reading.decomposition {
        Decomposition::Standard { pair, sets } => Shape {
            pair: Some(*pair),
            sets: sets.as_slice(),
            all: counts_of(&all_tiles),
            closed: hand.is_closed(),
        },
        _ => Shape {
            pair: None,
            sets: &empty,
            all: counts_of(&all_tiles),
            closed: true,
        },
    };

    let yakuman = find_yakuman(reading, &shape, hand, ctx);
    if !yakuman.is_empty() {
        return yakuman;
    }

    let mut found = Vec::new();
    situational_yaku(ctx, shape.closed, &mut found);

    let (suit_count, honors) = shape.suits();
    let all_simple = shape.kinds().all(|k| !is_terminal_or_honor(k));
    if all_simple && (shape.closed || policy.open_tanyao) {
        found.push(Yaku::Tanyao);
    }
    if suit_count == 1 && honors {
        found.push(Yaku::Honitsu);
    }
    if suit_count == 1 && !honors {
        found.push(Yaku::Chinitsu);
    }
    if shape.kinds().all(is_terminal_or_honor) && suit_count > 0 && honors {
        found.push(Yaku::Honroutou);
    }

    match &reading.decomposition {
        Decomposition::SevenPairs { .. } => found.push(Yaku::SevenPairs),
        Decomposition::Standard { pair, .. } => standard_yaku(&shape, *pair, reading.wait, ctx, &mut found),
        Decomposition::ThirteenOrphans { .. } => {}
    }

    found.sort_unstable();
    found
}

fn situational_yaku(ctx: &WinContext, closed: bool, found: &mut Vec<Yaku>) {
    if ctx.double_riichi {
        found.push(Yaku::DoubleRiichi);
    } else if ctx.riichi {
        found.push(Yaku::Riichi);
    }
    if ctx.ippatsu && (ctx.riichi || ctx.double_riichi) {
        found.push(Yaku::Ippatsu);
    }
    if ctx.tsumo && closed {
        found.push(Yaku::MenzenTsumo);
    }
    if ctx.haitei && ctx.tsumo && !ctx.rinshan {
        found.push(Yaku::Haitei);
    }
    if ctx.houtei && !ctx.tsumo {
        found.push(Yaku::Houtei);
    }
    if ctx.rinshan && ctx.tsumo {
        found.push(Yaku::Rinshan);
    }
    if ctx.chankan && !ctx.tsumo {
        found.push(Yaku::Chankan);
    }
}

fn standard_yaku(shape: &Shape, pair: u8, wait: Wait, ctx: &WinContext, found: &mut Vec<Yaku>) {
    let seat_wind = wind_kind(ctx.seat_wind);
    let round_wind = wind_kind(ctx.round_wind);

    for (kind, yaku) in [(31, Yaku::White), (32, Yaku::Green), (33, Yaku::Red)] {
        if shape.has_triplet(kind) {
            found.push(yaku);
        }
    }
    if shape.has_triplet(seat_wind) {
        found.push(Yaku::SeatWind);
    }
    if shape.has_triplet(round_wind) {
        found.push(Yaku::RoundWind);
    }

    let sequences = shape.sequences().count();
    let value_pair = is_dragon(pair) || pair == seat_wind || pair == round_wind;
    if shape.closed && sequences == 4 && !value_pair && wait == Wait::Ryanmen {
        found.push(Yaku::Pinfu);
    }

    if shape.closed {
        match shape.identical_sequence_pairs() {
            0 => {}
            1 => found.push(Yaku::Iipeikou),
            _ => found.push(Yaku::Ryanpeikou),
        }
    }

    if shape.triplets().count() == 4 {
        found.push(Yaku::Toitoi);
    }
    if shape.concealed_triplets() == 3 {
        found.push(Yaku::Sanankou);
    }
    if shape.quads() == 3 {
        found.push(Yaku::Sankantsu);
    }

    if same_number_in_three_suits(shape.sequences()) {
        found.push(Yaku::SanshokuDoujun);
    }
    if same_number_in_three_suits(shape.triplets().filter(|s| s.first < 27)) {
        found.push(Yaku::SanshokuDoukou);
    }

    let firsts: Vec<u8> = shape.sequences().map(|s| s.first).collect();
    if [0u8, 9, 18]
        .iter()
        .any(|&base| [base, base + 3, base + 6].iter().all(|f| firsts.contains(f)))
    {
        found.push(Yaku::Ittsu);
    }

    if sequences > 0 && shape.every_group_has_terminal_or_honor() {
        let honors = pair >= 27 || shape.triplets().any(|s| s.first >= 27);
        found.push(if honors { Yaku::Chanta } else { Yaku::Junchan });
    }

    let dragon_triplets = (31..=33).filter(|&k| shape.has_triplet(k)).count();
    if dragon_triplets == 2 && is_dragon(pair) {
        found.push(Yaku::Shousangen);
    }
}

fn same_number_in_three_suits<'a>(sets: impl Iterator<Item = &'a Set>) -> bool {
    let mut seen = [[false; 3]; 9];
    for set in sets {
        if set.first < 27 {
            seen[(set.first % 9) as usize][(set.first / 9) as usize] = true;
        }
    }
    seen.iter().any(|suits| suits.iter().all(|&s| s))
}

fn find_yakuman(reading: &Reading, shape: &Shape, hand: &Hand, ctx: &WinContext) -> Vec<Yaku> {
    let mut found = Vec::new();

    if ctx.first_turn && ctx.tsumo && shape.closed {
        found.push(if ctx.is_dealer() {
            Yaku::Tenhou
        } else {
            Yaku::Chiihou
        });
    }

    if let Decomposition::ThirteenOrphans { .. } = reading.decomposition {
        found.push(if reading.wait == Wait::ThirteenSided {
            Yaku::ThirteenOrphansThirteenSided
        } else {
            Yaku::ThirteenOrphans
        });
    }

    if shape.kinds().all(|k| k >= 27) {
        found.push(Yaku::Tsuuiisou);
    }
    if shape.kinds().all(is_terminal) {
        found.push(Yaku::Chinroutou);
    }
    const GREEN: [u8; 6] = [19, 20, 21, 23, 25, 32];
    if shape.kinds().all(|k| GREEN.contains(&k)) {
        found.push(Yaku::Ryuuiisou);
    }

    if let Decomposition::Standard { pair, .. } = &reading.decomposition {
        if shape.closed && shape.concealed_triplets() == 4 {
            found.push(if reading.wait == Wait::Tanki {
                Yaku::SuuankouTanki
            } else {
                Yaku::Suuankou
            });
        }
        if (31..=33).all(|k| shape.has_triplet(k)) {
            found.push(Yaku::Daisangen);
        }
        let wind_triplets = (27..=30).filter(|&k| shape.has_triplet(k)).count();
        if wind_triplets == 4 {
            found.push(Yaku::Daisuushi);
        } else if wind_triplets == 3 && is_wind(*pair) {
            found.push(Yaku::Shousuushi);
        }
        if shape.quads() == 4 {
            found.push(Yaku::Suukantsu);
        }
        if let Some(pure) = nine_gates(hand, ctx.win_tile) {
            found.push(if pure {
                Yaku::PureChuurenPoutou
            } else {
                Yaku::ChuurenPoutou
            });
        }
    }

    found.sort_unstable();
    found
}

/// `Some(pure)` when the hand is nine gates; pure when it waited on nine
/// kinds before the winning tile.
fn nine_gates(hand: &Hand, win_tile: Tile) -> Option<bool> {
    if !hand.melds().is_empty() {
        return None;
    }
    let counts = hand.counts();
    let suit = kind_suit(win_tile.kind());
    if suit == Suit::Honor {
        return None;
    }
    let base = win_tile.kind() - win_tile.kind() % 9;
    let in_suit: u8 = counts[base as usize..base as usize + 9].iter().sum();
    if in_suit != 14 {
        return None;
    }
    const GATES: [u8; 9] = [3, 1, 1, 1, 1, 1, 1, 1, 3];
    let mut rest = [0u8; 9];
    rest.copy_from_slice(&counts[base as usize..base as usize + 9]);
    if rest.iter().zip(GATES.iter()).any(|(c, g)| c < g) {
        return None;
    }
    rest[(win_tile.kind() - base) as usize] -= 1;
    Some(rest == GATES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Seat, Wind};
    use crate::scoring::{score_hand, ScoringPolicy};
    use crate::tiles::{parse_tiles, Meld, MeldKind};

    fn best(hand: &Hand, ctx: &WinContext) -> Vec<Yaku> {
        score_hand(hand, ctx, &ScoringPolicy::default())
            .map(|s| s.yaku.into_iter().map(|(y, _)| y).collect())
            .unwrap_or_default()
    }

    fn tile(s: &str) -> Tile {
        s.parse().unwrap()
    }

    #[test]
    fn test_catalog_order_and_han() {
        assert!(Yaku::Riichi < Yaku::Chinitsu);
        assert!(Yaku::Chinitsu < Yaku::Tenhou);
        assert_eq!(Yaku::Chinitsu.han(true), 6);
        assert_eq!(Yaku::Chinitsu.han(false), 5);
        assert_eq!(Yaku::Ryanpeikou.han(true), 3);
        assert_eq!(Yaku::Suuankou.han(true), 13);
        assert_eq!(Yaku::SuuankouTanki.yakuman_multiplier(), 2);
        assert!(!Yaku::Toitoi.is_yakuman());
    }

    #[test]
    fn test_yakuhai_and_double_wind() {
        let hand = Hand::new(parse_tiles("111z555z234m678p99s").unwrap());
        let ctx = WinContext::ron(tile("9s"), Wind::East, Wind::East);
        let yaku = best(&hand, &ctx);
        assert!(yaku.contains(&Yaku::SeatWind));
        assert!(yaku.contains(&Yaku::RoundWind));
        assert!(yaku.contains(&Yaku::White));
    }

    #[test]
    fn test_open_tanyao_policy() {
        let pon = Meld::new(
            MeldKind::Pon,
            &parse_tiles("222m").unwrap(),
            Some(tile("2m")),
            Some(Seat::new(1)),
        );
        let hand = Hand::with_melds(parse_tiles("345p678s34566s").unwrap(), vec![pon]);
        let ctx = WinContext::ron(tile("6s"), Wind::South, Wind::East);
        assert!(best(&hand, &ctx).contains(&Yaku::Tanyao));

        let strict = ScoringPolicy {
            open_tanyao: false,
            ..ScoringPolicy::default()
        };
        assert!(score_hand(&hand, &ctx, &strict).is_err());
    }

    #[test]
    fn test_flushes_and_kuisagari() {
        let chi = Meld::new(
            MeldKind::Chi,
            &parse_tiles("123m").unwrap(),
            Some(tile("1m")),
            Some(Seat::new(3)),
        );
        let hand = Hand::with_melds(parse_tiles("456m789m555z11m").unwrap(), vec![chi]);
        let ctx = WinContext::ron(tile("1m"), Wind::South, Wind::East);
        let score = score_hand(&hand, &ctx, &ScoringPolicy::default()).unwrap();
        assert!(score.has(Yaku::Honitsu));
        assert!(score.has(Yaku::Ittsu));
        assert!(score.has(Yaku::White));
        // Honitsu 2 + ittsu 1 + white 1 when open.
        assert_eq!(score.yaku_han, 4);
    }

    #[test]
    fn test_seven_pairs_vs_ryanpeikou() {
        let hand = Hand::new(parse_tiles("223344m556677p88s").unwrap());
        let ctx = WinContext::ron(tile("8s"), Wind::South, Wind::East);
        let score = score_hand(&hand, &ctx, &ScoringPolicy::default()).unwrap();
        // Ryanpeikou 3 + tanyao 1 beats chiitoitsu 2 + tanyao 1.
        assert!(score.has(Yaku::Ryanpeikou));
        assert!(!score.has(Yaku::SevenPairs));
    }

    #[test]
    fn test_chanta_junchan() {
        let hand = Hand::new(parse_tiles("123m789p123s999s11z").unwrap());
        let ctx = WinContext::ron(tile("1z"), Wind::South, Wind::West);
        assert!(best(&hand, &ctx).contains(&Yaku::Chanta));

        let hand = Hand::new(parse_tiles("123m789p123s999s11p").unwrap());
        let ctx = WinContext::ron(tile("1p"), Wind::South, Wind::West);
        assert!(best(&hand, &ctx).contains(&Yaku::Junchan));
    }

    #[test]
    fn test_sanshoku() {
        let hand = Hand::new(parse_tiles("345m345p345s789s22m").unwrap());
        let ctx = WinContext::ron(tile("9s"), Wind::South, Wind::East);
        assert!(best(&hand, &ctx).contains(&Yaku::SanshokuDoujun));
    }

    #[test]
    fn test_thirteen_orphans_variants() {
        let hand = Hand::new(parse_tiles("19m19p19s12345677z").unwrap());
        let ctx = WinContext::ron(tile("7z"), Wind::South, Wind::East);
        assert_eq!(best(&hand, &ctx), vec![Yaku::ThirteenOrphansThirteenSided]);

        let ctx = WinContext::ron(tile("1m"), Wind::South, Wind::East);
        assert_eq!(best(&hand, &ctx), vec![Yaku::ThirteenOrphans]);
    }

    #[test]
    fn test_nine_gates() {
        let hand = Hand::new(parse_tiles("11123455678999m").unwrap());
        let ctx = WinContext::ron(tile("5m"), Wind::South, Wind::East);
        assert!(best(&hand, &ctx).contains(&Yaku::PureChuurenPoutou));

        let ctx = WinContext::ron(tile("1m"), Wind::South, Wind::East);
        assert!(best(&hand, &ctx).contains(&Yaku::ChuurenPoutou));
    }

    #[test]
    fn test_tenhou_and_chiihou() {
        let hand = Hand::new(parse_tiles("123m456p789s234s55z").unwrap());
        let mut ctx = WinContext::tsumo(tile("5z"), Wind::East, Wind::East);
        ctx.first_turn = true;
        assert_eq!(best(&hand, &ctx), vec![Yaku::Tenhou]);

        ctx.seat_wind = Wind::West;
        assert_eq!(best(&hand, &ctx), vec![Yaku::Chiihou]);
    }

    #[test]
    fn test_situational() {
        let hand = Hand::new(parse_tiles("123m456p789s234s55z").unwrap());
        let mut ctx = WinContext::tsumo(tile("4s"), Wind::South, Wind::East);
        ctx.rinshan = true;
        ctx.haitei = true;
        let yaku = best(&hand, &ctx);
        assert!(yaku.contains(&Yaku::Rinshan));
        assert!(!yaku.contains(&Yaku::Haitei));

        let mut ctx = WinContext::ron(tile("4s"), Wind::South, Wind::East);
        ctx.houtei = true;
        assert_eq!(best(&hand, &ctx), vec![Yaku::Houtei]);
    }
}
