//! The table state machine.
//!
//! A [`Table`] owns its seats, the current round and the wall. All change
//! goes through [`Table::submit`], which validates the request, applies it
//! to a copy of the table and commits the copy only when the action was
//! legal and every invariant still holds.
//!
//! ## Status
//!
//! `Waiting` → `Playing` on `Start`, `Playing` → `RoundResolving` when a
//! round ends, back to `Playing` on `Continue`, or `GameOver` once the game
//! length is reached or a seat is at or below zero. `Continue` is accepted
//! from occupied seats only. At `GameOver` the host's `Continue` returns the
//! table to `Waiting` with the same occupants.
//!
//! ## Invariants
//!
//! Checked after every accepted action:
//! - live wall + dead wall + every seat's tiles + uncalled discards = 136
//! - seat points + riichi deposits = 4 × starting points
//! - concealed + 3 × melds is 14 for the seat about to discard, else 13
//!
//! A violation ends the table as an abnormal `GameOver`.

mod calls;
mod legal;
mod play;
mod round;
mod settlement;
mod wall;

pub use calls::{Call, CallOptions, CallWindow, Resolution, WindowSource};
pub use round::{Discard, Occupant, RiichiState, Round, SeatState, TurnPhase};
pub use settlement::{
    noten_payments, AbortReason, GameResult, Placement, Settlement, SettlementKind, WinRecord,
    NOTEN_PENALTY,
};
pub use wall::{Wall, DEAD_WALL_SIZE, MAX_INDICATORS, REPLACEMENT_TILES};

use std::collections::VecDeque;

use im::Vector;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::{
    ActionKind, ActionRecord, ActionRequest, MahjongRule, Seat, SeatMap, TableId, TableRng, Wind,
    SEAT_COUNT,
};
use crate::error::{MahjongError, MahjongResult, Rejection};
use crate::scoring::ScoringPolicy;
use crate::tiles::Tile;

/// Tiles in a full set.
pub const TILE_COUNT: usize = 136;

/// Tiles dealt to each seat at the start of a round.
pub const HAND_SIZE: usize = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStatus {
    Waiting,
    Playing,
    RoundResolving,
    GameOver,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TableStatus::Waiting => "waiting",
            TableStatus::Playing => "playing",
            TableStatus::RoundResolving => "resolving a round",
            TableStatus::GameOver => "over",
        })
    }
}

/// Something observers should hear about after an accepted action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableEvent {
    ActionApplied(ActionRecord),
    RoundStarted {
        wind: Wind,
        number: u8,
        dealer: Seat,
        honba: u32,
    },
    Settled(Settlement),
    GameEnded(GameResult),
}

/// One mahjong table.
#[derive(Clone, Debug)]
pub struct Table {
    id: TableId,
    rule: MahjongRule,
    status: TableStatus,
    seats: SeatMap<SeatState>,
    round: Option<Round>,
    rng: TableRng,
    history: Vector<ActionRecord>,
    settlements: Vector<Settlement>,
    result: Option<GameResult>,
    sequence: u32,
    /// Incremented for every dealt round.
    rounds_dealt: u32,
    /// Walls to use, in draw order, before falling back to shuffling.
    prepared_walls: VecDeque<Vec<Tile>>,
}

impl Table {
    /// An empty table in `Waiting`.
    #[must_use]
    pub fn new(id: TableId, rule: MahjongRule, seed: u64) -> Self {
        let seats = SeatMap::new(|_| SeatState {
            points: rule.starting_points,
            ..SeatState::default()
        });
        Self {
            id,
            rule,
            status: TableStatus::Waiting,
            seats,
            round: None,
            rng: TableRng::new(seed),
            history: Vector::new(),
            settlements: Vector::new(),
            result: None,
            sequence: 0,
            rounds_dealt: 0,
            prepared_walls: VecDeque::new(),
        }
    }

    /// Seat an occupant while building the table.
    #[must_use]
    pub fn with_occupant(mut self, seat: Seat, occupant: Occupant) -> Self {
        self.seats[seat].occupant = occupant;
        self
    }

    /// Use `tiles` as the next dealt wall instead of shuffling. The first 14
    /// tiles form the dead wall, the rest are drawn in order.
    #[must_use]
    pub fn with_prepared_wall(mut self, tiles: Vec<Tile>) -> Self {
        self.prepared_walls.push_back(tiles);
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    #[must_use]
    pub fn rule(&self) -> &MahjongRule {
        &self.rule
    }

    #[must_use]
    pub fn status(&self) -> TableStatus {
        self.status
    }

    #[must_use]
    pub fn seat(&self, seat: Seat) -> &SeatState {
        &self.seats[seat]
    }

    #[must_use]
    pub fn seats(&self) -> &SeatMap<SeatState> {
        &self.seats
    }

    #[must_use]
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> Option<&TurnPhase> {
        self.round.as_ref().map(|r| &r.phase)
    }

    #[must_use]
    pub fn history(&self) -> &Vector<ActionRecord> {
        &self.history
    }

    #[must_use]
    pub fn settlements(&self) -> &Vector<Settlement> {
        &self.settlements
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Number of accepted actions.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    #[must_use]
    pub fn rounds_dealt(&self) -> u32 {
        self.rounds_dealt
    }

    #[must_use]
    pub fn points(&self) -> SeatMap<i32> {
        self.seats.map(|_, s| s.points)
    }

    /// Riichi deposits currently on the table.
    #[must_use]
    pub fn deposits(&self) -> i32 {
        self.round.as_ref().map_or(0, |r| r.deposits)
    }

    pub(crate) fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy::from(&self.rule)
    }

    /// The first seated participant. `None` when only bots are seated, in
    /// which case any seat may act as host.
    #[must_use]
    pub fn host(&self) -> Option<Seat> {
        self.seats
            .iter()
            .find(|(_, s)| s.occupant.is_participant())
            .map(|(seat, _)| seat)
    }

    fn is_host(&self, seat: Seat) -> bool {
        self.host().map_or(true, |host| host == seat)
    }

    fn all_seated(&self) -> bool {
        self.seats.values().all(|s| !s.occupant.is_empty())
    }

    // === Seat events ===

    /// Apply a join, leave, disconnect or reconnect.
    ///
    /// Leaving during a game hands the seat to a bot. Taking over a seat
    /// already held by another participant fails with
    /// [`MahjongError::SeatUnavailable`].
    pub fn update_seat(&mut self, seat: Seat, occupant: Occupant) -> MahjongResult<()> {
        if !seat.is_valid() {
            return Err(MahjongError::SeatUnavailable(seat));
        }
        let in_game = matches!(
            self.status,
            TableStatus::Playing | TableStatus::RoundResolving
        );
        if let (Occupant::Participant { name: held, .. }, Occupant::Participant { name, .. }) =
            (&self.seats[seat].occupant, &occupant)
        {
            if held != name {
                return Err(MahjongError::SeatUnavailable(seat));
            }
        }
        let next = match occupant {
            Occupant::Empty if in_game => Occupant::Bot,
            other => other,
        };
        info!("{} {}: {:?} -> {:?}", self.id, seat, self.seats[seat].occupant, next);
        self.seats[seat].occupant = next;
        Ok(())
    }

    // === Actions ===

    /// Validate and apply an action.
    ///
    /// Rejected actions leave the table untouched. An invariant violation
    /// ends the table and is returned as a fatal error.
    pub fn submit(&mut self, request: &ActionRequest) -> MahjongResult<Vec<TableEvent>> {
        if request.table_id != self.id {
            return Err(MahjongError::TableNotFound(request.table_id));
        }
        if self.result.as_ref().is_some_and(|r| r.abnormal) {
            return Err(MahjongError::TableClosed(self.id));
        }
        if !request.seat.is_valid() {
            warn!("{} rejected {} from unknown {}", self.id, request.kind, request.seat);
            return Err(MahjongError::SeatUnavailable(request.seat));
        }

        let turn = self.round.as_ref().map_or(0, |r| r.turn);
        let record = ActionRecord::new(request.seat, request.kind.clone(), turn, self.sequence);
        let mut next = self.clone();
        let mut events = vec![TableEvent::ActionApplied(record.clone())];
        if let Err(err) = next.apply(request.seat, &request.kind, &mut events) {
            warn!("{} {} rejected {}: {}", self.id, request.seat, request.kind, err);
            return Err(err);
        }
        next.sequence += 1;
        next.history.push_back(record);

        if let Err(violation) = next.check_invariants() {
            error!("{} invariant violated after {}: {}", self.id, request.kind, violation);
            self.status = TableStatus::GameOver;
            self.result = Some(GameResult {
                abnormal: true,
                ..GameResult::rank(&self.points(), 0)
            });
            return Err(MahjongError::InvariantViolation(violation));
        }

        debug!("{} {} {}", self.id, request.seat, request.kind);
        *self = next;
        Ok(events)
    }

    fn apply(
        &mut self,
        seat: Seat,
        kind: &ActionKind,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        match kind {
            ActionKind::Start => self.start(seat, events),
            ActionKind::ChangeRule(rule) => self.change_rule(seat, rule),
            ActionKind::Continue => self.continue_game(seat, events),
            _ if self.status != TableStatus::Playing => {
                Err(Rejection::WrongStatus(self.status.to_string()).into())
            }
            _ => self.play(seat, kind, events),
        }
    }

    fn start(&mut self, seat: Seat, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        if self.status != TableStatus::Waiting {
            return Err(Rejection::WrongStatus(self.status.to_string()).into());
        }
        if !self.all_seated() {
            return Err(Rejection::SeatsNotFilled.into());
        }
        if !self.is_host(seat) {
            return Err(Rejection::NotHost.into());
        }
        for (_, state) in self.seats.iter_mut() {
            state.points = self.rule.starting_points;
        }
        self.settlements = Vector::new();
        self.result = None;
        self.status = TableStatus::Playing;
        info!("{} game started ({:?}, {:?})", self.id, self.rule.length, self.rule.thinking_time);
        self.deal_round(Wind::East, Seat::new(0), 0, 0, events)
    }

    fn change_rule(&mut self, seat: Seat, rule: &MahjongRule) -> MahjongResult<()> {
        rule.validate()?;
        if self.status != TableStatus::Waiting {
            return Err(MahjongError::RuleInvalid(format!(
                "rules cannot change while the table is {}",
                self.status
            )));
        }
        if !self.is_host(seat) {
            return Err(Rejection::NotHost.into());
        }
        self.rule = rule.clone();
        for (_, state) in self.seats.iter_mut() {
            state.points = rule.starting_points;
        }
        info!("{} rule changed", self.id);
        Ok(())
    }

    /// Shuffle (or take the prepared wall), deal and open a round.
    fn deal_round(
        &mut self,
        wind: Wind,
        dealer: Seat,
        honba: u32,
        deposits: i32,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let mut wall = match self.prepared_walls.pop_front() {
            Some(tiles) => Wall::from_tiles(tiles).ok_or_else(|| {
                MahjongError::InvariantViolation("prepared wall is too short".into())
            })?,
            None => {
                let mut stream = self.rng.fork();
                Wall::shuffled(self.rule.red_five.red_fives(), &mut stream)
            }
        };
        for (_, state) in self.seats.iter_mut() {
            state.reset_for_round(wall.deal(HAND_SIZE));
        }
        let round = Round::new(wind, dealer, honba, deposits, wall);
        info!("{} {} dealt", self.id, round);
        events.push(TableEvent::RoundStarted {
            wind,
            number: round.number(),
            dealer,
            honba,
        });
        self.round = Some(round);
        self.rounds_dealt += 1;
        self.status = TableStatus::Playing;
        Ok(())
    }

    /// Record a finished round and move to `RoundResolving`.
    pub(crate) fn settle(&mut self, settlement: Settlement, events: &mut Vec<TableEvent>) {
        for (seat, delta) in settlement.deltas.iter() {
            self.seats[seat].points += delta;
        }
        if let Some(round) = self.round.as_mut() {
            round.deposits -= settlement.deposits;
            round.phase = TurnPhase::Finished;
            round.pending_riichi = None;
        }
        info!(
            "{} {:?} {} settled: {:?} {:?}",
            self.id,
            settlement.wind,
            settlement.number,
            settlement.kind,
            settlement.deltas.values().collect::<Vec<_>>()
        );
        self.status = TableStatus::RoundResolving;
        self.settlements.push_back(settlement.clone());
        events.push(TableEvent::Settled(settlement));
    }

    fn continue_game(&mut self, seat: Seat, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        if self.seats[seat].occupant.is_empty() {
            return Err(MahjongError::SeatUnavailable(seat));
        }
        match self.status {
            TableStatus::RoundResolving => self.next_round(events),
            TableStatus::GameOver if !self.is_host(seat) => Err(Rejection::NotHost.into()),
            TableStatus::GameOver => {
                self.status = TableStatus::Waiting;
                self.round = None;
                for (_, state) in self.seats.iter_mut() {
                    state.points = self.rule.starting_points;
                    state.reset_for_round(Vec::new());
                }
                info!("{} back to waiting", self.id);
                Ok(())
            }
            status => Err(Rejection::WrongStatus(status.to_string()).into()),
        }
    }

    fn next_round(&mut self, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        let (round, settlement) = match (self.round.as_ref(), self.settlements.last()) {
            (Some(round), Some(settlement)) => (round, settlement),
            _ => {
                return Err(MahjongError::InvariantViolation(
                    "resolving without a settled round".into(),
                ))
            }
        };
        let repeat = settlement.dealer_repeats();
        let honba = settlement.next_honba();
        let deposits = round.deposits;
        let finished = round.index();

        let (wind, dealer) = if repeat {
            (round.wind, round.dealer)
        } else if round.dealer.next() == Seat::new(0) {
            (round.wind.next(), Seat::new(0))
        } else {
            (round.wind, round.dealer.next())
        };
        let next_index = wind.index() as u8 * 4 + dealer.0;

        let length = self.rule.length;
        let target = self.rule.min_points_to_win;
        let reached = self.seats.values().any(|s| s.points >= target);
        let over = self.seats.values().any(|s| s.points <= 0)
            || (finished > length.final_round() && reached)
            || (finished == length.final_round() && !repeat && reached)
            || (!repeat && next_index > length.extension_limit())
            || (!repeat && next_index < finished);

        if over {
            self.finish_game(deposits, events);
            return Ok(());
        }
        self.deal_round(wind, dealer, honba, deposits, events)
    }

    fn finish_game(&mut self, deposits: i32, events: &mut Vec<TableEvent>) {
        let result = GameResult::rank(&self.points(), deposits);
        if let Some(first) = result.winner() {
            self.seats[first].points += deposits;
        }
        if let Some(round) = self.round.as_mut() {
            round.deposits = 0;
        }
        info!("{} game over: {:?}", self.id, result.placements);
        self.status = TableStatus::GameOver;
        self.result = Some(result.clone());
        events.push(TableEvent::GameEnded(result));
    }

    // === Invariants ===

    /// Check tile conservation, the points total and hand sizes.
    pub fn check_invariants(&self) -> Result<(), String> {
        let total: i32 = self.seats.values().map(|s| s.points).sum::<i32>() + self.deposits();
        let expected = self.rule.starting_points * SEAT_COUNT as i32;
        if total != expected {
            return Err(format!("points total {total}, expected {expected}"));
        }

        let Some(round) = self.round.as_ref() else {
            return Ok(());
        };
        let tiles = round.wall.total()
            + self
                .seats
                .values()
                .map(|s| s.hand.physical_count() + s.uncalled_discards())
                .sum::<usize>();
        if tiles != TILE_COUNT {
            return Err(format!("{tiles} tiles in play, expected {TILE_COUNT}"));
        }

        let active = match &round.phase {
            TurnPhase::AwaitingDiscard { seat, .. } => Some(*seat),
            TurnPhase::Finished => return Ok(()),
            _ => None,
        };
        for (seat, state) in self.seats.iter() {
            let expected = if Some(seat) == active { HAND_SIZE + 1 } else { HAND_SIZE };
            let held = state.hand.effective_count();
            if held != expected {
                return Err(format!("{seat} holds {held} tiles, expected {expected}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameLength, MahjongRule};

    fn bots() -> Table {
        let mut table = Table::new(TableId(1), MahjongRule::default(), 7);
        for seat in Seat::all() {
            table = table.with_occupant(seat, Occupant::Bot);
        }
        table
    }

    fn act(table: &mut Table, seat: u8, kind: ActionKind) -> MahjongResult<Vec<TableEvent>> {
        table.submit(&ActionRequest::new(table.id(), Seat::new(seat), kind))
    }

    #[test]
    fn test_start_requires_full_table() {
        let mut table = Table::new(TableId(1), MahjongRule::default(), 7)
            .with_occupant(Seat::new(0), Occupant::participant("ann"));
        let err = act(&mut table, 0, ActionKind::Start).unwrap_err();
        assert!(matches!(err, MahjongError::InvalidAction(Rejection::SeatsNotFilled)));
        assert_eq!(table.sequence(), 0);
    }

    #[test]
    fn test_only_host_starts() {
        let mut table = bots().with_occupant(Seat::new(2), Occupant::participant("ann"));
        let err = act(&mut table, 0, ActionKind::Start).unwrap_err();
        assert!(matches!(err, MahjongError::InvalidAction(Rejection::NotHost)));
        act(&mut table, 2, ActionKind::Start).unwrap();
        assert_eq!(table.status(), TableStatus::Playing);
    }

    #[test]
    fn test_start_deals_hands() {
        let mut table = bots();
        let events = act(&mut table, 0, ActionKind::Start).unwrap();
        assert!(matches!(events[0], TableEvent::ActionApplied(_)));
        assert!(matches!(events[1], TableEvent::RoundStarted { number: 1, .. }));
        for state in table.seats().values() {
            assert_eq!(state.hand.concealed().len(), HAND_SIZE);
        }
        assert_eq!(table.round().unwrap().wall.remaining(), 136 - 14 - 52);
        assert_eq!(table.phase(), Some(&TurnPhase::AwaitingDraw(Seat::new(0))));
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_rule_change_only_while_waiting() {
        let mut table = bots();
        let east = MahjongRule::default().with_length(GameLength::East);
        act(&mut table, 0, ActionKind::ChangeRule(east.clone())).unwrap();
        assert_eq!(table.rule().length, GameLength::East);

        let bad = MahjongRule::default().with_points(30000, 25000);
        let err = act(&mut table, 0, ActionKind::ChangeRule(bad.clone())).unwrap_err();
        assert!(matches!(err, MahjongError::RuleInvalid(_)));

        act(&mut table, 0, ActionKind::Start).unwrap();
        let valid = MahjongRule::default().with_points(25000, 30000);
        let err = act(&mut table, 0, ActionKind::ChangeRule(valid)).unwrap_err();
        assert!(matches!(err, MahjongError::RuleInvalid(_)));
        let err = act(&mut table, 0, ActionKind::ChangeRule(bad)).unwrap_err();
        assert!(matches!(err, MahjongError::RuleInvalid(_)));
    }

    #[test]
    fn test_rejection_is_repeatable() {
        let mut table = bots();
        act(&mut table, 0, ActionKind::Start).unwrap();
        let before = table.sequence();
        let first = act(&mut table, 1, ActionKind::Draw).unwrap_err().to_string();
        let second = act(&mut table, 1, ActionKind::Draw).unwrap_err().to_string();
        assert_eq!(first, second);
        assert_eq!(table.sequence(), before);
    }

    #[test]
    fn test_wrong_table() {
        let mut table = bots();
        let err = table
            .submit(&ActionRequest::new(TableId(9), Seat::new(0), ActionKind::Start))
            .unwrap_err();
        assert!(matches!(err, MahjongError::TableNotFound(TableId(9))));
    }

    #[test]
    fn test_seat_events() {
        let mut table = Table::new(TableId(1), MahjongRule::default(), 7);
        let seat = Seat::new(1);
        table.update_seat(seat, Occupant::participant("ann")).unwrap();
        let err = table.update_seat(seat, Occupant::participant("bo")).unwrap_err();
        assert!(matches!(err, MahjongError::SeatUnavailable(_)));

        for other in [0, 2, 3] {
            table.update_seat(Seat::new(other), Occupant::Bot).unwrap();
        }
        act(&mut table, 1, ActionKind::Start).unwrap();

        let away = Occupant::Participant {
            name: "ann".into(),
            connected: false,
        };
        table.update_seat(seat, away.clone()).unwrap();
        assert_eq!(table.seat(seat).occupant, away);
        table.update_seat(seat, Occupant::participant("ann")).unwrap();
        assert!(table.seat(seat).occupant.is_connected());

        table.update_seat(seat, Occupant::Empty).unwrap();
        assert_eq!(table.seat(seat).occupant, Occupant::Bot);
    }

    #[test]
    fn test_unknown_seat_is_refused() {
        let mut table = bots();
        let err = table.update_seat(Seat(7), Occupant::Bot).unwrap_err();
        assert!(matches!(err, MahjongError::SeatUnavailable(Seat(7))));
        let err = table
            .submit(&ActionRequest::new(table.id(), Seat(7), ActionKind::Start))
            .unwrap_err();
        assert!(matches!(err, MahjongError::SeatUnavailable(Seat(7))));
        assert!(table.legal_actions(Seat(7)).is_empty());
        assert_eq!(table.sequence(), 0);

        act(&mut table, 0, ActionKind::Start).unwrap();
        assert_eq!(table.status(), TableStatus::Playing);
    }
}
