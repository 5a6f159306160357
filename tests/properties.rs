//! Property tests over random games and hands.

use proptest::prelude::*;

use mahjong_table::core::{
    ActionKind, ActionRequest, GameLength, MahjongRule, Seat, TableId, TableRng,
};
use mahjong_table::scheduler::{SeatPolicy, UniformBot};
use mahjong_table::table::{Occupant, Table, TableStatus};
use mahjong_table::tiles::{decompose, full_set, is_complete, Hand, Tile};

const MAX_STEPS: usize = 2500;

fn bot_table(seed: u64) -> Table {
    let rule = MahjongRule::default().with_length(GameLength::OneGame);
    let mut table = Table::new(TableId(seed), rule, seed);
    for seat in Seat::all() {
        table = table.with_occupant(seat, Occupant::Bot);
    }
    table
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    /// Every enumerated action is accepted and the invariants hold after
    /// each one, all the way to the end of the game.
    #[test]
    fn random_games_keep_invariants(seed in any::<u64>()) {
        let mut table = bot_table(seed);
        let mut rng = TableRng::new(seed ^ 0x5eed);
        let total = table.rule().starting_points * 4;

        for _ in 0..MAX_STEPS {
            if table.status() == TableStatus::GameOver {
                break;
            }
            let movers: Vec<Seat> = Seat::all()
                .filter(|seat| !table.legal_actions(*seat).is_empty())
                .collect();
            prop_assert!(!movers.is_empty(), "nobody can act in {:?}", table.phase());
            let seat = *rng.choose(&movers).unwrap();
            let kind = UniformBot.choose_action(&table, seat, &mut rng).unwrap();

            let settled = table.settlements().len();
            let result = table.submit(&ActionRequest::new(table.id(), seat, kind.clone()));
            prop_assert!(result.is_ok(), "{} {} rejected: {:?}", seat, kind, result);
            prop_assert!(table.check_invariants().is_ok());

            let points: i32 = table.points().values().sum();
            prop_assert_eq!(points + table.deposits(), total);

            if table.settlements().len() > settled {
                let settlement = table.settlements().last().unwrap();
                prop_assert_eq!(
                    settlement.deltas.values().sum::<i32>(),
                    settlement.deposits
                );
            }
        }
    }

    /// Any hand built from four triplets and a pair of distinct kinds is
    /// complete and decomposes.
    #[test]
    fn triplet_hands_decompose(kinds in proptest::sample::subsequence((0u8..34).collect::<Vec<_>>(), 5)) {
        let mut tiles: Vec<Tile> = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            let copies = if i == 0 { 2 } else { 3 };
            tiles.extend(std::iter::repeat(Tile::new(*kind)).take(copies));
        }
        let hand = Hand::new(tiles);
        prop_assert!(is_complete(&hand.counts(), hand.melds()));
        prop_assert!(!decompose(&hand).is_empty());
    }

    /// Shuffled walls always hold the full set.
    #[test]
    fn shuffled_walls_hold_every_tile(seed in any::<u64>()) {
        let mut table = bot_table(seed);
        table
            .submit(&ActionRequest::new(table.id(), Seat::new(0), ActionKind::Start))
            .unwrap();
        let round = table.round().unwrap();
        let dealt: usize = table.seats().values().map(|s| s.hand.concealed().len()).sum();
        prop_assert_eq!(round.wall.total() + dealt, full_set([1, 1, 1]).len());
    }
}
