//! Hands and declared melds.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::tile::{counts_of, Tile, TileCounts};
use crate::core::Seat;

/// How a meld was formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldKind {
    /// Sequence claimed from the previous seat.
    Chi,
    /// Triplet claimed from any seat.
    Pon,
    /// Quad formed by claiming a discard onto a concealed triplet.
    OpenKan,
    /// Quad formed by adding the fourth tile to an existing pon.
    AddedKan,
    /// Quad declared entirely from concealed tiles.
    ClosedKan,
}

/// A declared meld.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,

    /// All tiles of the meld, sorted by kind.
    pub tiles: SmallVec<[Tile; 4]>,

    /// The claimed tile. `None` for closed kans.
    pub taken: Option<Tile>,

    /// Seat the claimed tile came from. `None` for closed kans.
    pub from: Option<Seat>,
}

impl Meld {
    /// Create a meld, sorting its tiles.
    #[must_use]
    pub fn new(kind: MeldKind, tiles: &[Tile], taken: Option<Tile>, from: Option<Seat>) -> Self {
        let mut tiles: SmallVec<[Tile; 4]> = SmallVec::from_slice(tiles);
        tiles.sort_unstable();
        Self {
            kind,
            tiles,
            taken,
            from,
        }
    }

    /// Open melds break a closed hand. Closed kans do not.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.kind != MeldKind::ClosedKan
    }

    #[must_use]
    pub fn is_kan(&self) -> bool {
        matches!(
            self.kind,
            MeldKind::OpenKan | MeldKind::AddedKan | MeldKind::ClosedKan
        )
    }

    /// Lowest kind in the meld.
    #[must_use]
    pub fn first_kind(&self) -> u8 {
        self.tiles.iter().map(|t| t.kind()).min().unwrap_or(0)
    }
}

/// A seat's tiles: the concealed multiset plus declared melds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    concealed: Vec<Tile>,
    melds: SmallVec<[Meld; 4]>,
}

impl Hand {
    /// Closed hand holding `tiles`.
    #[must_use]
    pub fn new(tiles: Vec<Tile>) -> Self {
        let mut hand = Self {
            concealed: tiles,
            melds: SmallVec::new(),
        };
        hand.concealed.sort_unstable();
        hand
    }

    /// Hand with the given melds already declared.
    #[must_use]
    pub fn with_melds(tiles: Vec<Tile>, melds: Vec<Meld>) -> Self {
        let mut hand = Self::new(tiles);
        hand.melds = melds.into_iter().collect();
        hand
    }

    #[must_use]
    pub fn concealed(&self) -> &[Tile] {
        &self.concealed
    }

    #[must_use]
    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    /// Per-kind counts of the concealed tiles.
    #[must_use]
    pub fn counts(&self) -> TileCounts {
        counts_of(&self.concealed)
    }

    /// A hand is closed when it has no open melds.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.melds.iter().all(|m| !m.is_open())
    }

    /// Concealed tiles plus three per meld: 13 at rest, 14 after a draw.
    #[must_use]
    pub fn effective_count(&self) -> usize {
        self.concealed.len() + 3 * self.melds.len()
    }

    /// Every physical tile the seat holds, kans counted as four.
    #[must_use]
    pub fn physical_count(&self) -> usize {
        self.concealed.len() + self.melds.iter().map(|m| m.tiles.len()).sum::<usize>()
    }

    /// All tiles including meld tiles.
    pub fn all_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.concealed
            .iter()
            .chain(self.melds.iter().flat_map(|m| m.tiles.iter()))
    }

    #[must_use]
    pub fn contains(&self, tile: Tile) -> bool {
        self.concealed.contains(&tile)
    }

    #[must_use]
    pub fn count_kind(&self, kind: u8) -> usize {
        self.concealed.iter().filter(|t| t.kind() == kind).count()
    }

    pub fn add(&mut self, tile: Tile) {
        let pos = self.concealed.partition_point(|t| *t < tile);
        self.concealed.insert(pos, tile);
    }

    /// Remove one tile with exactly this identity.
    pub fn remove(&mut self, tile: Tile) -> bool {
        match self.concealed.iter().position(|t| *t == tile) {
            Some(pos) => {
                self.concealed.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove `n` tiles of `kind`, plain tiles first.
    ///
    /// Returns `None` and leaves the hand untouched if there are fewer.
    pub fn take_kind(&mut self, kind: u8, n: usize) -> Option<Vec<Tile>> {
        if self.count_kind(kind) < n {
            return None;
        }
        let mut candidates: Vec<Tile> = self
            .concealed
            .iter()
            .copied()
            .filter(|t| t.kind() == kind)
            .collect();
        candidates.sort_by_key(|t| t.is_red());
        let taken: Vec<Tile> = candidates.into_iter().take(n).collect();
        for tile in &taken {
            self.remove(*tile);
        }
        Some(taken)
    }

    pub fn push_meld(&mut self, meld: Meld) {
        self.melds.push(meld);
    }

    /// Turn the pon of `kind` into an added kan with `tile`.
    pub fn upgrade_pon(&mut self, kind: u8, tile: Tile) -> bool {
        let Some(meld) = self
            .melds
            .iter_mut()
            .find(|m| m.kind == MeldKind::Pon && m.first_kind() == kind)
        else {
            return false;
        };
        meld.kind = MeldKind::AddedKan;
        meld.tiles.push(tile);
        meld.tiles.sort_unstable();
        true
    }

    #[must_use]
    pub fn kan_count(&self) -> usize {
        self.melds.iter().filter(|m| m.is_kan()).count()
    }
}
