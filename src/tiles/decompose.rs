//! Hand decomposition, waits and shanten.
//!
//! `decompose` enumerates every interpretation of a complete hand. Yaku
//! detection runs on each of them, so nothing may be pruned: `111222333m`
//! yields both the three-triplet and the three-sequence reading.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::hand::{Hand, Meld, MeldKind};
use super::tile::{kind_suit, Suit, TileCounts, KIND_COUNT, TERMINALS_AND_HONORS};

/// Shape of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SetKind {
    Sequence,
    Triplet,
    Quad,
}

/// One set within a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Set {
    pub kind: SetKind,
    /// Lowest kind in the set.
    pub first: u8,
    /// Formed by a call. Closed kans are declared but not open.
    pub open: bool,
    /// Comes from a declared meld rather than the concealed tiles.
    pub declared: bool,
}

impl Set {
    #[must_use]
    pub fn concealed(kind: SetKind, first: u8) -> Self {
        Self {
            kind,
            first,
            open: false,
            declared: false,
        }
    }

    #[must_use]
    pub fn from_meld(meld: &Meld) -> Self {
        let kind = match meld.kind {
            MeldKind::Chi => SetKind::Sequence,
            MeldKind::Pon => SetKind::Triplet,
            MeldKind::OpenKan | MeldKind::AddedKan | MeldKind::ClosedKan => SetKind::Quad,
        };
        Self {
            kind,
            first: meld.first_kind(),
            open: meld.is_open(),
            declared: true,
        }
    }

    /// Triplets and quads.
    #[must_use]
    pub fn is_triplet_like(&self) -> bool {
        self.kind != SetKind::Sequence
    }

    #[must_use]
    pub fn contains_kind(&self, kind: u8) -> bool {
        match self.kind {
            SetKind::Sequence => (self.first..self.first + 3).contains(&kind),
            _ => self.first == kind,
        }
    }

    /// Kinds in the set, one entry per distinct tile position.
    pub fn kinds(&self) -> impl Iterator<Item = u8> {
        let (first, len) = match self.kind {
            SetKind::Sequence => (self.first, 3),
            SetKind::Triplet => (self.first, 1),
            SetKind::Quad => (self.first, 1),
        };
        (0..len).map(move |i| first + i)
    }
}

/// One interpretation of a complete hand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decomposition {
    /// Four sets and a pair. Sets include declared melds.
    Standard { pair: u8, sets: SmallVec<[Set; 4]> },
    /// Seven distinct pairs.
    SevenPairs { pairs: [u8; 7] },
    /// One of each terminal and honor plus one duplicate.
    ThirteenOrphans { pair: u8 },
}

/// Every decomposition of a complete hand. Empty if the hand is not complete.
#[must_use]
pub fn decompose(hand: &Hand) -> Vec<Decomposition> {
    decompose_counts(&hand.counts(), hand.melds())
}

/// Every decomposition of concealed `counts` with `melds` as fixed sets.
#[must_use]
pub fn decompose_counts(counts: &TileCounts, melds: &[Meld]) -> Vec<Decomposition> {
    let concealed: usize = counts.iter().map(|&c| c as usize).sum();
    if melds.len() > 4 || concealed != 3 * (4 - melds.len()) + 2 {
        return Vec::new();
    }

    let fixed: SmallVec<[Set; 4]> = melds.iter().map(Set::from_meld).collect();
    let mut results = Vec::new();
    let mut work = *counts;

    for pair in 0..KIND_COUNT {
        if work[pair] < 2 {
            continue;
        }
        work[pair] -= 2;
        let mut sets = fixed.clone();
        extract_sets(&mut work, &mut sets, &mut |found: &SmallVec<[Set; 4]>| {
            let mut sets = found.clone();
            sets.sort_unstable();
            results.push(Decomposition::Standard {
                pair: pair as u8,
                sets,
            });
        });
        work[pair] += 2;
    }

    if melds.is_empty() {
        if let Some(pairs) = seven_pairs(counts) {
            results.push(Decomposition::SevenPairs { pairs });
        }
        if let Some(pair) = thirteen_orphans(counts) {
            results.push(Decomposition::ThirteenOrphans { pair });
        }
    }

    results.sort();
    results.dedup();
    results
}

fn extract_sets(
    counts: &mut TileCounts,
    sets: &mut SmallVec<[Set; 4]>,
    found: &mut dyn FnMut(&SmallVec<[Set; 4]>),
) {
    let Some(i) = counts.iter().position(|&c| c > 0) else {
        found(sets);
        return;
    };

    if counts[i] >= 3 {
        counts[i] -= 3;
        sets.push(Set::concealed(SetKind::Triplet, i as u8));
        extract_sets(counts, sets, found);
        sets.pop();
        counts[i] += 3;
    }

    if starts_sequence(i) && counts[i + 1] > 0 && counts[i + 2] > 0 {
        counts[i] -= 1;
        counts[i + 1] -= 1;
        counts[i + 2] -= 1;
        sets.push(Set::concealed(SetKind::Sequence, i as u8));
        extract_sets(counts, sets, found);
        sets.pop();
        counts[i] += 1;
        counts[i + 1] += 1;
        counts[i + 2] += 1;
    }
}

fn starts_sequence(kind: usize) -> bool {
    kind_suit(kind as u8) != Suit::Honor && kind % 9 <= 6
}

fn seven_pairs(counts: &TileCounts) -> Option<[u8; 7]> {
    let mut pairs = [0u8; 7];
    let mut n = 0;
    for (kind, &c) in counts.iter().enumerate() {
        match c {
            0 => {}
            2 if n < 7 => {
                pairs[n] = kind as u8;
                n += 1;
            }
            _ => return None,
        }
    }
    (n == 7).then_some(pairs)
}

fn thirteen_orphans(counts: &TileCounts) -> Option<u8> {
    let total: u8 = counts.iter().sum();
    if total != 14 {
        return None;
    }
    let mut pair = None;
    for &kind in &TERMINALS_AND_HONORS {
        match counts[kind as usize] {
            1 => {}
            2 if pair.is_none() => pair = Some(kind),
            _ => return None,
        }
    }
    pair
}

/// Whether concealed `counts` with `melds` form a complete hand.
#[must_use]
pub fn is_complete(counts: &TileCounts, melds: &[Meld]) -> bool {
    !decompose_counts(counts, melds).is_empty()
}

/// Kinds that would complete a 13-tile hand.
#[must_use]
pub fn waits(counts: &TileCounts, melds: &[Meld]) -> Vec<u8> {
    let mut work = *counts;
    let mut result = Vec::new();
    for kind in 0..KIND_COUNT {
        if work[kind] >= 4 {
            continue;
        }
        work[kind] += 1;
        if is_complete(&work, melds) {
            result.push(kind as u8);
        }
        work[kind] -= 1;
    }
    result
}

#[must_use]
pub fn is_tenpai(counts: &TileCounts, melds: &[Meld]) -> bool {
    !waits(counts, melds).is_empty()
}

/// Shanten number: tiles away from tenpai. `-1` is a complete hand.
///
/// Takes the minimum over the standard shape and, for closed hands, seven
/// pairs and thirteen orphans.
#[must_use]
pub fn shanten(counts: &TileCounts, meld_count: usize) -> i8 {
    let mut best = standard_shanten(counts, meld_count);
    if meld_count == 0 {
        best = best
            .min(seven_pairs_shanten(counts))
            .min(thirteen_orphans_shanten(counts));
    }
    best
}

fn standard_shanten(counts: &TileCounts, meld_count: usize) -> i8 {
    let mut work = *counts;
    let mut best = 8;
    let mut search = ShantenSearch {
        meld_count,
        best: &mut best,
    };
    search.run(&mut work, 0, 0, 0, false);
    for pair in 0..KIND_COUNT {
        if work[pair] >= 2 {
            work[pair] -= 2;
            search.run(&mut work, 0, 0, 0, true);
            work[pair] += 2;
        }
    }
    best
}

struct ShantenSearch<'a> {
    meld_count: usize,
    best: &'a mut i8,
}

impl ShantenSearch<'_> {
    fn run(&mut self, c: &mut TileCounts, start: usize, sets: usize, partials: usize, pair: bool) {
        let Some(offset) = c[start..].iter().position(|&n| n > 0) else {
            self.score(sets, partials, pair);
            return;
        };
        let i = start + offset;
        let total_sets = sets + self.meld_count;

        if c[i] >= 3 {
            c[i] -= 3;
            self.run(c, i, sets + 1, partials, pair);
            c[i] += 3;
        }
        if starts_sequence(i) && c[i + 1] > 0 && c[i + 2] > 0 {
            c[i] -= 1;
            c[i + 1] -= 1;
            c[i + 2] -= 1;
            self.run(c, i, sets + 1, partials, pair);
            c[i] += 1;
            c[i + 1] += 1;
            c[i + 2] += 1;
        }
        if total_sets + partials < 4 {
            if c[i] >= 2 {
                c[i] -= 2;
                self.run(c, i, sets, partials + 1, pair);
                c[i] += 2;
            }
            let suited = kind_suit(i as u8) != Suit::Honor;
            if suited && i % 9 <= 7 && c[i + 1] > 0 {
                c[i] -= 1;
                c[i + 1] -= 1;
                self.run(c, i, sets, partials + 1, pair);
                c[i] += 1;
                c[i + 1] += 1;
            }
            if suited && i % 9 <= 6 && c[i + 2] > 0 {
                c[i] -= 1;
                c[i + 2] -= 1;
                self.run(c, i, sets, partials + 1, pair);
                c[i] += 1;
                c[i + 2] += 1;
            }
        }

        // Treat the tile as isolated.
        c[i] -= 1;
        self.run(c, i, sets, partials, pair);
        c[i] += 1;
    }

    fn score(&mut self, sets: usize, partials: usize, pair: bool) {
        let total_sets = sets + self.meld_count;
        let usable = partials.min(4usize.saturating_sub(total_sets));
        let value = 8 - 2 * total_sets as i8 - usable as i8 - i8::from(pair);
        if value < *self.best {
            *self.best = value;
        }
    }
}

fn seven_pairs_shanten(counts: &TileCounts) -> i8 {
    let pairs = counts.iter().filter(|&&c| c >= 2).count() as i8;
    let kinds = counts.iter().filter(|&&c| c > 0).count() as i8;
    6 - pairs + (7 - kinds).max(0)
}

fn thirteen_orphans_shanten(counts: &TileCounts) -> i8 {
    let kinds = TERMINALS_AND_HONORS
        .iter()
        .filter(|&&k| counts[k as usize] > 0)
        .count() as i8;
    let has_pair = TERMINALS_AND_HONORS
        .iter()
        .any(|&k| counts[k as usize] >= 2);
    13 - kinds - i8::from(has_pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Seat;
    use crate::tiles::{counts_of, parse_tiles, Tile};

    fn counts(s: &str) -> TileCounts {
        counts_of(&parse_tiles(s).unwrap())
    }

    #[test]
    fn test_simple_standard_hand() {
        let result = decompose_counts(&counts("123m456p789s11122z"), &[]);
        assert_eq!(result.len(), 1);
        match &result[0] {
            Decomposition::Standard { pair, sets } => {
                assert_eq!(*pair, 28);
                assert_eq!(sets.len(), 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_hand_enumerates_all() {
        // 111222333m + 789p + 55s: triplets or sequences.
        let result = decompose_counts(&counts("111222333m789p55s"), &[]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_seven_pairs_and_standard() {
        // 112233m 112233p 55s: seven pairs and two iipeikou readings.
        let result = decompose_counts(&counts("112233m112233p55s"), &[]);
        assert!(result
            .iter()
            .any(|d| matches!(d, Decomposition::SevenPairs { .. })));
        assert!(result
            .iter()
            .any(|d| matches!(d, Decomposition::Standard { .. })));
    }

    #[test]
    fn test_thirteen_orphans() {
        let result = decompose_counts(&counts("19m19p19s12345677z"), &[]);
        assert_eq!(result, vec![Decomposition::ThirteenOrphans { pair: 33 }]);
    }

    #[test]
    fn test_with_melds() {
        let pon = Meld::new(
            MeldKind::Pon,
            &parse_tiles("555z").unwrap(),
            Some(Tile::new(31)),
            Some(Seat::new(1)),
        );
        let result = decompose_counts(&counts("123m456p789s11z"), std::slice::from_ref(&pon));
        assert_eq!(result.len(), 1);
        if let Decomposition::Standard { sets, .. } = &result[0] {
            assert!(sets.iter().any(|s| s.declared && s.open && s.first == 31));
        }

        // Seven pairs is never available with melds.
        assert!(decompose_counts(&counts("1122m3344p55s"), &[pon]).is_empty());
    }

    #[test]
    fn test_wrong_count_is_empty() {
        assert!(decompose_counts(&counts("123m456p789s1112z"), &[]).is_empty());
    }

    #[test]
    fn test_waits() {
        assert!(waits(&counts("123m456p789s1234z"), &[]).is_empty());
        assert_eq!(waits(&counts("123m456p789s11z23s"), &[]), vec![18, 21]);
        // Nine gates waits on every man tile.
        let nine = waits(&counts("1112345678999m"), &[]);
        assert_eq!(nine, (0..9).collect::<Vec<u8>>());
        // Thirteen-sided orphans wait.
        assert_eq!(waits(&counts("19m19p19s1234567z"), &[]).len(), 13);
    }

    #[test]
    fn test_shanten() {
        assert_eq!(shanten(&counts("123m456p789s11122z"), 0), -1);
        assert_eq!(shanten(&counts("123m456p789s1122z"), 0), 0);
        assert_eq!(shanten(&counts("123m456p789s1357z"), 0), 2);
        assert_eq!(shanten(&counts("1122m3344p5566s7z"), 0), 0);
        assert_eq!(shanten(&counts("19m19p19s1234567z"), 0), 0);
        assert_eq!(shanten(&counts("11m"), 4), -1);
        assert_eq!(shanten(&counts("1m"), 4), 0);
    }
}
