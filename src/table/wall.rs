//! The wall: live tiles plus the dead wall.
//!
//! The dead wall always holds 14 tiles: four kan replacement tiles, five
//! dora indicators and the five ura-dora beneath them. After each
//! replacement draw the last live tile moves into the dead wall to keep the
//! count at 14.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::TableRng;
use crate::tiles::{full_set, Tile};

/// Tiles held back from the live wall.
pub const DEAD_WALL_SIZE: usize = 14;

/// Replacement tiles available for kans.
pub const REPLACEMENT_TILES: usize = 4;

/// Maximum number of dora indicators.
pub const MAX_INDICATORS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    live: VecDeque<Tile>,
    replacements: Vec<Tile>,
    indicators: Vec<Tile>,
    ura_indicators: Vec<Tile>,
    /// Live tiles moved into the dead wall after replacement draws.
    backfill: Vec<Tile>,
    revealed: usize,
}

impl Wall {
    /// Build a wall from tiles in draw order. The first 14 form the dead
    /// wall; the first dora indicator is revealed.
    ///
    /// Returns `None` if there are not enough tiles for a dead wall.
    #[must_use]
    pub fn from_tiles(tiles: Vec<Tile>) -> Option<Self> {
        (tiles.len() >= DEAD_WALL_SIZE).then(|| Self::split(tiles))
    }

    /// A freshly shuffled 136-tile wall.
    pub fn shuffled(red_fives: [u8; 3], rng: &mut TableRng) -> Self {
        let mut tiles = full_set(red_fives);
        rng.shuffle(&mut tiles);
        Self::split(tiles)
    }

    fn split(mut tiles: Vec<Tile>) -> Self {
        let live: VecDeque<Tile> = tiles.split_off(DEAD_WALL_SIZE).into();
        let ura_indicators = tiles.split_off(REPLACEMENT_TILES + MAX_INDICATORS);
        let indicators = tiles.split_off(REPLACEMENT_TILES);
        Self {
            live,
            replacements: tiles,
            indicators,
            ura_indicators,
            backfill: Vec::new(),
            revealed: 1,
        }
    }

    /// Tiles left to draw.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.live.is_empty()
    }

    pub fn draw(&mut self) -> Option<Tile> {
        self.live.pop_front()
    }

    /// Deal `n` tiles from the live wall.
    pub fn deal(&mut self, n: usize) -> Vec<Tile> {
        let n = n.min(self.live.len());
        self.live.drain(..n).collect()
    }

    /// Draw a kan replacement tile and backfill the dead wall from the
    /// live tail.
    pub fn draw_replacement(&mut self) -> Option<Tile> {
        let tile = self.replacements.pop()?;
        if let Some(tail) = self.live.pop_back() {
            self.backfill.push(tail);
        }
        Some(tile)
    }

    /// Replacement draws still possible.
    #[must_use]
    pub fn replacements_left(&self) -> usize {
        self.replacements.len()
    }

    /// Reveal the next dora indicator. Returns `false` when all five are up.
    pub fn reveal_indicator(&mut self) -> bool {
        if self.revealed >= MAX_INDICATORS {
            return false;
        }
        self.revealed += 1;
        true
    }

    #[must_use]
    pub fn dora_indicators(&self) -> &[Tile] {
        &self.indicators[..self.revealed]
    }

    /// Ura-dora indicators under the revealed dora indicators.
    #[must_use]
    pub fn ura_indicators(&self) -> &[Tile] {
        &self.ura_indicators[..self.revealed]
    }

    /// Tiles in the dead wall.
    #[must_use]
    pub fn dead_len(&self) -> usize {
        self.replacements.len()
            + self.indicators.len()
            + self.ura_indicators.len()
            + self.backfill.len()
    }

    /// Every tile the wall holds, live and dead.
    #[must_use]
    pub fn total(&self) -> usize {
        self.remaining() + self.dead_len()
    }
}
