//! Turn deadlines.
//!
//! [`TurnTimer`] watches one table and turns the passage of time into
//! [`ActionRequest`]s: defaults for seats whose deadline has passed, bot
//! choices for seats nobody is playing, and the automatic moves of a seat in
//! riichi. It never applies anything itself; whatever it returns goes through
//! [`Table::submit`] like any client request.
//!
//! ## Deadlines
//!
//! A decision starts when the table reaches a new turn, phase or round. Each
//! waiting seat has `base + bank` to answer, where `base` and the starting
//! bank come from the rule's [`ThinkingTime`](crate::core::ThinkingTime).
//! Time used beyond `base` is taken from the seat's bank, which refills at
//! the start of every round.
//!
//! ## Takeover
//!
//! Bots are driven from the start. A participant disconnected for longer
//! than the grace period is driven for the rest of the round, even if they
//! come back before it ends.

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use super::bot::SeatPolicy;
use crate::core::{ActionKind, ActionRequest, Seat, SeatMap, TableId, TableRng};
use crate::table::{Occupant, Table, TableStatus, TurnPhase};

/// Timing knobs that are not part of the rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// How long a participant may be disconnected before a bot takes over.
    pub grace: Duration,
    /// Pause before a bot acts.
    pub bot_delay: Duration,
    /// Time to look at a settlement before the next round is dealt.
    pub settle_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(15),
            bot_delay: Duration::from_secs(1),
            settle_delay: Duration::from_secs(10),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn with_bot_delay(mut self, delay: Duration) -> Self {
        self.bot_delay = delay;
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Identifies one decision. Answers inside a call window do not change it,
/// so the window keeps a single clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DecisionKey {
    round: u32,
    status: TableStatus,
    turn: u32,
    kans: u8,
    phase: u8,
}

impl DecisionKey {
    fn of(table: &Table) -> Self {
        let (turn, kans, phase) = table.round().map_or((0, 0, 0), |round| {
            let phase = match &round.phase {
                TurnPhase::AwaitingDraw(_) => 1,
                TurnPhase::AwaitingDiscard { .. } => 2,
                TurnPhase::AwaitingCalls(_) => 3,
                TurnPhase::Finished => 4,
            };
            (round.turn, round.kans, phase)
        });
        Self {
            round: table.rounds_dealt(),
            status: table.status(),
            turn,
            kans,
            phase,
        }
    }
}

#[derive(Clone, Debug)]
struct Decision {
    key: DecisionKey,
    started: Instant,
    /// Seats that still owe an answer.
    waiting: Vec<Seat>,
    /// Seats a request was already produced for.
    issued: Vec<Seat>,
}

/// Seats the table is waiting on.
fn waiting_seats(table: &Table) -> Vec<Seat> {
    if table.status() != TableStatus::Playing {
        return Vec::new();
    }
    match table.phase() {
        Some(TurnPhase::AwaitingDraw(seat)) | Some(TurnPhase::AwaitingDiscard { seat, .. }) => {
            vec![*seat]
        }
        Some(TurnPhase::AwaitingCalls(window)) => window.pending(),
        _ => Vec::new(),
    }
}

/// What a seat does when its time runs out.
fn default_action(table: &Table, seat: Seat, legal: &[ActionKind]) -> Option<ActionKind> {
    match table.phase()? {
        TurnPhase::AwaitingDraw(_) => Some(ActionKind::Draw),
        TurnPhase::AwaitingDiscard { drawn, .. } => {
            let tsumogiri = drawn.map(ActionKind::Discard);
            match tsumogiri {
                Some(action) if legal.contains(&action) => Some(action),
                _ => legal
                    .iter()
                    .find(|a| matches!(a, ActionKind::Discard(_)))
                    .cloned(),
            }
        }
        TurnPhase::AwaitingCalls(window) if window.is_pending(seat) => Some(ActionKind::Pass),
        _ => None,
    }
}

/// Per-table deadline tracker.
#[derive(Clone, Debug)]
pub struct TurnTimer {
    table_id: TableId,
    config: SchedulerConfig,
    base: Duration,
    extra: Duration,
    /// `rounds_dealt` of the round the banks belong to.
    round: Option<u32>,
    bank: SeatMap<Duration>,
    disconnected_since: SeatMap<Option<Instant>>,
    takeover: SeatMap<bool>,
    decision: Option<Decision>,
}

impl TurnTimer {
    #[must_use]
    pub fn new(table_id: TableId, config: SchedulerConfig) -> Self {
        Self {
            table_id,
            config,
            base: Duration::ZERO,
            extra: Duration::ZERO,
            round: None,
            bank: SeatMap::with_value(Duration::ZERO),
            disconnected_since: SeatMap::with_value(None),
            takeover: SeatMap::with_value(false),
            decision: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Remaining extra time for `seat` this round.
    #[must_use]
    pub fn bank(&self, seat: Seat) -> Duration {
        self.bank[seat]
    }

    /// Whether the scheduler plays for `seat`.
    #[must_use]
    pub fn is_controlled(&self, seat: Seat) -> bool {
        self.takeover[seat]
    }

    /// When `seat` gets its default action, if the table is waiting on it.
    #[must_use]
    pub fn deadline(&self, seat: Seat) -> Option<Instant> {
        let decision = self.decision.as_ref()?;
        decision
            .waiting
            .contains(&seat)
            .then(|| decision.started + self.base + self.bank[seat])
    }

    /// Bring the timer up to date with the table. Call after every accepted
    /// action so answered seats are charged promptly.
    pub fn observe(&mut self, now: Instant, table: &Table) {
        let thinking = table.rule().thinking_time;
        self.base = thinking.base();
        self.extra = thinking.extra();

        let key = DecisionKey::of(table);
        let waiting = waiting_seats(table);
        match self.decision.take() {
            Some(mut decision) if decision.key == key => {
                let elapsed = now.saturating_duration_since(decision.started);
                for seat in decision.waiting.iter().filter(|s| !waiting.contains(s)) {
                    self.charge(*seat, elapsed);
                }
                decision.waiting = waiting;
                self.decision = Some(decision);
            }
            previous => {
                if let Some(old) = previous {
                    let elapsed = now.saturating_duration_since(old.started);
                    for seat in old.waiting {
                        self.charge(seat, elapsed);
                    }
                }
                self.decision = Some(Decision {
                    key,
                    started: now,
                    waiting,
                    issued: Vec::new(),
                });
            }
        }

        self.sync_occupants(now, table);
        if self.round != Some(table.rounds_dealt()) {
            self.round = Some(table.rounds_dealt());
            self.bank = SeatMap::with_value(self.extra);
            self.takeover = SeatMap::new(|seat| self.lost(now, &table.seat(seat).occupant, seat));
        }
    }

    fn charge(&mut self, seat: Seat, elapsed: Duration) {
        let overrun = elapsed.saturating_sub(self.base);
        self.bank[seat] = self.bank[seat].saturating_sub(overrun);
    }

    /// Whether `occupant` should be driven as of `now`.
    fn lost(&self, now: Instant, occupant: &Occupant, seat: Seat) -> bool {
        match occupant {
            Occupant::Bot => true,
            Occupant::Participant { connected: false, .. } => self.disconnected_since[seat]
                .is_some_and(|since| now.saturating_duration_since(since) >= self.config.grace),
            _ => false,
        }
    }

    fn sync_occupants(&mut self, now: Instant, table: &Table) {
        for seat in Seat::all() {
            let occupant = &table.seat(seat).occupant;
            match occupant {
                Occupant::Participant { connected: false, .. } => {
                    self.disconnected_since[seat].get_or_insert(now);
                }
                _ => self.disconnected_since[seat] = None,
            }
            if !self.takeover[seat] && self.lost(now, occupant, seat) {
                debug!("{} {} taken over by the scheduler", self.table_id, seat);
                self.takeover[seat] = true;
            }
        }
    }

    /// Requests due at `now`. Each seat gets at most one request per
    /// decision.
    pub fn tick(
        &mut self,
        now: Instant,
        table: &Table,
        policy: &dyn SeatPolicy,
        rng: &mut TableRng,
    ) -> Vec<ActionRequest> {
        self.observe(now, table);
        let Some(decision) = self.decision.as_ref() else {
            return Vec::new();
        };
        let started = decision.started;

        let mut due: Vec<(Seat, ActionKind)> = Vec::new();
        match table.status() {
            TableStatus::RoundResolving => {
                let seat = table.host().unwrap_or(Seat::new(0));
                if decision.issued.is_empty() && now >= started + self.config.settle_delay {
                    due.push((seat, ActionKind::Continue));
                }
            }
            TableStatus::Playing => {
                for &seat in &decision.waiting {
                    if decision.issued.contains(&seat) {
                        continue;
                    }
                    if let Some(kind) = self.decide(now, started, table, seat, policy, rng) {
                        due.push((seat, kind));
                    }
                }
            }
            TableStatus::Waiting | TableStatus::GameOver => {}
        }

        if let Some(decision) = self.decision.as_mut() {
            decision.issued.extend(due.iter().map(|(seat, _)| *seat));
        }
        due.into_iter()
            .map(|(seat, kind)| {
                debug!("{} scheduler: {} {}", self.table_id, seat, kind);
                ActionRequest::new(self.table_id, seat, kind)
            })
            .collect()
    }

    fn decide(
        &self,
        now: Instant,
        started: Instant,
        table: &Table,
        seat: Seat,
        policy: &dyn SeatPolicy,
        rng: &mut TableRng,
    ) -> Option<ActionKind> {
        if self.takeover[seat] {
            if now < started + self.config.bot_delay {
                return None;
            }
            return policy.choose_action(table, seat, rng);
        }

        let legal = table.legal_actions(seat);
        if table.seat(seat).riichi.is_declared() {
            if let [only @ (ActionKind::Draw | ActionKind::Discard(_))] = legal.as_slice() {
                return Some(only.clone());
            }
        }
        if now >= started + self.base + self.bank[seat] {
            return default_action(table, seat, &legal);
        }
        None
    }
}
