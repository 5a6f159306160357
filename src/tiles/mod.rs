//! Tile & hand model: tile identity, hands, melds, decomposition helpers.
//!
//! Everything here is pure. Hands are plain values; decomposition, waits and
//! shanten are functions over per-kind count arrays.

mod decompose;
mod hand;
mod tile;

pub use decompose::{
    decompose, decompose_counts, is_complete, is_tenpai, shanten, waits, Decomposition, Set,
    SetKind,
};
pub use hand::{Hand, Meld, MeldKind};
pub use tile::{
    counts_of, dora_from_indicator, full_set, is_dragon, is_terminal, is_terminal_or_honor,
    is_wind, kind_number, kind_suit, parse_tiles, wind_kind, Dragon, Suit, Tile, TileCounts,
    KIND_COUNT, TERMINALS_AND_HONORS,
};
