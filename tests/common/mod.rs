//! Shared helpers for integration tests.

#![allow(dead_code)]

use mahjong_table::core::{ActionKind, ActionRequest, MahjongRule, Seat, TableId};
use mahjong_table::error::MahjongResult;
use mahjong_table::table::{
    Occupant, Table, TableEvent, TableStatus, TurnPhase, MAX_INDICATORS, REPLACEMENT_TILES,
};
use mahjong_table::tiles::{full_set, parse_tiles, Tile};

/// Dealt hands used by most scenarios.
///
/// - Seat 0 (dealer): scattered, noten.
/// - Seat 1: scattered, noten, no pin tiles next to 5p.
/// - Seat 2: holds a 5p pair.
/// - Seat 3: tenpai on 2p/5p with tanyao.
pub const HANDS: [&str; 4] = [
    "147m258p369s4567z",
    "369m19p1478s1236z",
    "55p123m789m12s234z",
    "234m34p456s678s88p",
];

/// [`HANDS`] with the tenpai hand dealt to the dealer.
pub const DEALER_TENPAI: [&str; 4] = [HANDS[3], HANDS[1], HANDS[2], HANDS[0]];

/// Fixed parts of the dead wall. Whatever is left out is filled from the
/// unused tiles.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeadWall<'a> {
    /// Kan replacement tiles in the order they are drawn.
    pub replacements: &'a str,
    /// Dora indicators in reveal order.
    pub dora: &'a str,
    /// Ura-dora indicators under them.
    pub ura: &'a str,
}

pub fn tile(notation: &str) -> Tile {
    notation.parse().expect("valid tile")
}

fn take(pool: &mut Vec<Tile>, notation: &str) -> Vec<Tile> {
    let tiles = parse_tiles(notation).expect("valid notation");
    for tile in &tiles {
        let at = pool
            .iter()
            .position(|t| t == tile)
            .unwrap_or_else(|| panic!("no {tile} left for {notation}"));
        pool.remove(at);
    }
    tiles
}

fn fill(pool: &mut Vec<Tile>, mut tiles: Vec<Tile>, len: usize) -> Vec<Tile> {
    assert!(tiles.len() <= len, "too many dead wall tiles");
    let missing = len - tiles.len();
    tiles.extend(pool.drain(..missing));
    tiles
}

/// A 136-tile wall dealing `hands` in seat order, then drawing `draws`
/// in order. The dead wall and the rest of the live wall take whatever
/// tiles are left.
pub fn stacked_wall(hands: [&str; 4], draws: &str) -> Vec<Tile> {
    stacked_wall_with(hands, draws, DeadWall::default())
}

/// Like [`stacked_wall`], with parts of the dead wall fixed.
pub fn stacked_wall_with(hands: [&str; 4], draws: &str, dead: DeadWall<'_>) -> Vec<Tile> {
    let mut pool = full_set([0, 0, 0]);
    let mut dealt: Vec<Tile> = Vec::new();
    for hand in hands {
        let tiles = take(&mut pool, hand);
        assert_eq!(tiles.len(), 13, "{hand}");
        dealt.extend(tiles);
    }
    let drawn = take(&mut pool, draws);
    let mut replacements = take(&mut pool, dead.replacements);
    let dora = take(&mut pool, dead.dora);
    let ura = take(&mut pool, dead.ura);

    // Replacement tiles come off the end of their slot.
    assert!(replacements.len() <= REPLACEMENT_TILES);
    let missing = REPLACEMENT_TILES - replacements.len();
    replacements.reverse();
    let mut wall: Vec<Tile> = pool.drain(..missing).collect();
    wall.extend(replacements);
    wall.extend(fill(&mut pool, dora, MAX_INDICATORS));
    wall.extend(fill(&mut pool, ura, MAX_INDICATORS));
    wall.extend(dealt);
    wall.extend(drawn);
    wall.extend(pool);
    assert_eq!(wall.len(), 136);
    wall
}

/// A table with four bots, started on `wall`.
pub fn started_table(rule: MahjongRule, wall: Vec<Tile>) -> Table {
    started_table_with_walls(rule, vec![wall])
}

/// A table with four bots that deals `walls` in order, started.
pub fn started_table_with_walls(rule: MahjongRule, walls: Vec<Vec<Tile>>) -> Table {
    let mut table = Table::new(TableId(1), rule, 99);
    for wall in walls {
        table = table.with_prepared_wall(wall);
    }
    for seat in Seat::all() {
        table = table.with_occupant(seat, Occupant::Bot);
    }
    act(&mut table, 0, ActionKind::Start).expect("start");
    table
}

pub fn act(table: &mut Table, seat: u8, kind: ActionKind) -> MahjongResult<Vec<TableEvent>> {
    table.submit(&ActionRequest::new(table.id(), Seat::new(seat), kind))
}

/// Draw and discard `tile` for `seat`.
pub fn draw_discard(table: &mut Table, seat: u8, tile: Tile) {
    act(table, seat, ActionKind::Draw).expect("draw");
    act(table, seat, ActionKind::Discard(tile)).expect("discard");
}

/// Take one tsumogiri step: draw, discard the drawn tile, or pass the
/// first pending call.
pub fn step_tsumogiri(table: &mut Table) {
    let phase = table.phase().cloned().expect("round in play");
    let (seat, kind) = match phase {
        TurnPhase::AwaitingDraw(seat) => (seat, ActionKind::Draw),
        TurnPhase::AwaitingDiscard {
            seat,
            drawn: Some(tile),
            ..
        } => (seat, ActionKind::Discard(tile)),
        TurnPhase::AwaitingCalls(window) => {
            let seat = window.pending()[0];
            (seat, ActionKind::Pass)
        }
        other => panic!("unexpected phase {other:?}"),
    };
    table
        .submit(&ActionRequest::new(table.id(), seat, kind))
        .expect("tsumogiri play is always legal");
}

/// Play the current round with every seat discarding what it draws and
/// passing every call, until the round ends.
pub fn play_tsumogiri(table: &mut Table) {
    for _ in 0..1000 {
        if table.status() != TableStatus::Playing {
            return;
        }
        step_tsumogiri(table);
    }
    panic!("round did not end");
}
