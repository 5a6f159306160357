//! Turn and call handling while a round is being played.

use smallvec::{smallvec, SmallVec};

use super::calls::{Call, CallWindow, Resolution, WindowSource};
use super::legal::{chi_forbidden, KanKind};
use super::round::{Discard, RiichiState, Round, TurnPhase};
use super::settlement::{noten_payments, AbortReason, Settlement, SettlementKind, WinRecord};
use super::{Table, TableEvent};
use crate::core::{ActionKind, Seat, SeatMap, RIICHI_STAKE};
use crate::error::{MahjongError, MahjongResult, Rejection};
use crate::scoring::win_transfers;
use crate::tiles::{is_tenpai, Meld, MeldKind, Tile};

fn in_play(round: &mut Option<Round>) -> MahjongResult<&mut Round> {
    round.as_mut().ok_or_else(no_round)
}

fn current(round: &Option<Round>) -> MahjongResult<&Round> {
    round.as_ref().ok_or_else(no_round)
}

fn no_round() -> MahjongError {
    MahjongError::InvariantViolation("playing without a round".into())
}

impl Table {
    pub(super) fn play(
        &mut self,
        seat: Seat,
        kind: &ActionKind,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let phase = in_play(&mut self.round)?.phase.clone();
        match (phase, kind) {
            (TurnPhase::AwaitingCalls(window), kind) if kind.is_call_response() => {
                self.answer_call(window, seat, kind, events)
            }
            (TurnPhase::AwaitingDraw(turn), ActionKind::Draw) if turn == seat => self.draw(seat),
            (
                TurnPhase::AwaitingDiscard {
                    seat: turn,
                    drawn,
                    rinshan,
                },
                kind,
            ) if turn == seat => match kind {
                ActionKind::Discard(tile) => self.discard(seat, *tile, drawn, false, events),
                ActionKind::Riichi(tile) => self.discard(seat, *tile, drawn, true, events),
                ActionKind::Tsumo => self.tsumo(seat, drawn, rinshan, events),
                ActionKind::Kan(tile) => self.declare_kan(seat, *tile, drawn, events),
                ActionKind::NineTerminals => {
                    self.check_nine_terminals(seat, drawn)?;
                    self.abort(AbortReason::NineTerminals, events)
                }
                _ => Err(Rejection::WrongPhase.into()),
            },
            (phase, kind) if kind.is_turn_action() && phase.active_seat() != Some(seat) => {
                Err(Rejection::NotYourTurn.into())
            }
            _ => Err(Rejection::WrongPhase.into()),
        }
    }

    fn draw(&mut self, seat: Seat) -> MahjongResult<()> {
        let round = in_play(&mut self.round)?;
        let tile = round
            .wall
            .draw()
            .ok_or_else(|| MahjongError::InvariantViolation("draw from an empty wall".into()))?;
        round.turn += 1;
        round.phase = TurnPhase::AwaitingDiscard {
            seat,
            drawn: Some(tile),
            rinshan: false,
        };
        let state = &mut self.seats[seat];
        state.hand.add(tile);
        state.temporary_furiten = false;
        Ok(())
    }

    fn discard(
        &mut self,
        seat: Seat,
        tile: Tile,
        drawn: Option<Tile>,
        riichi: bool,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        if riichi {
            self.check_riichi(seat, tile, drawn)?;
        } else {
            self.check_discard(seat, tile, drawn)?;
        }

        let round = in_play(&mut self.round)?;
        let state = &mut self.seats[seat];
        state.hand.remove(tile);
        state.discards.push_back(Discard {
            tile,
            called: false,
            riichi,
            tsumogiri: drawn == Some(tile),
        });
        state.forbidden.clear();
        if riichi {
            state.riichi = if state.first_turn && round.uninterrupted {
                RiichiState::DoubleRiichi
            } else {
                RiichiState::Riichi
            };
            round.pending_riichi = Some(seat);
        } else {
            state.ippatsu = false;
        }
        state.first_turn = false;

        self.open_window(tile, seat, WindowSource::Discard, events)
    }

    fn tsumo(
        &mut self,
        seat: Seat,
        drawn: Option<Tile>,
        rinshan: bool,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let score = self.check_tsumo(seat, drawn, rinshan)?;
        let round = current(&self.round)?;
        let deltas = win_transfers(
            score.payment,
            seat,
            round.dealer,
            None,
            round.honba,
            round.deposits,
        );
        let settlement = settlement_for(
            round,
            SettlementKind::Tsumo,
            vec![WinRecord {
                seat,
                hand: self.seats[seat].hand.clone(),
                score,
            }],
            deltas,
            round.deposits,
        );
        self.settle(settlement, events);
        Ok(())
    }

    fn declare_kan(
        &mut self,
        seat: Seat,
        tile: Tile,
        drawn: Option<Tile>,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let kan = self.check_kan(seat, tile, drawn)?;
        let kind = tile.kind();
        let round = in_play(&mut self.round)?;
        round.kans += 1;
        round.uninterrupted = false;
        let state = &mut self.seats[seat];
        state.forbidden.clear();

        match kan {
            KanKind::Closed => {
                let tiles = state
                    .hand
                    .take_kind(kind, 4)
                    .ok_or(Rejection::CallNotAvailable)?;
                state
                    .hand
                    .push_meld(Meld::new(MeldKind::ClosedKan, &tiles, None, None));
                for (_, other) in self.seats.iter_mut() {
                    other.ippatsu = false;
                }
                self.replacement_draw(seat)
            }
            KanKind::Added => {
                let added = if state.hand.contains(tile) {
                    tile
                } else {
                    state
                        .hand
                        .concealed()
                        .iter()
                        .copied()
                        .find(|t| t.kind() == kind)
                        .ok_or(Rejection::TileNotInHand(tile.to_string()))?
                };
                state.hand.remove(added);
                if !state.hand.upgrade_pon(kind, added) {
                    return Err(Rejection::CallNotAvailable.into());
                }
                // Others may still rob the kan.
                self.open_window(added, seat, WindowSource::AddedKan, events)
            }
        }
    }

    /// Reveal a dora indicator and hand `seat` a replacement tile.
    fn replacement_draw(&mut self, seat: Seat) -> MahjongResult<()> {
        let round = in_play(&mut self.round)?;
        round.wall.reveal_indicator();
        let tile = round.wall.draw_replacement().ok_or_else(|| {
            MahjongError::InvariantViolation("no replacement tile left".into())
        })?;
        round.turn += 1;
        round.phase = TurnPhase::AwaitingDiscard {
            seat,
            drawn: Some(tile),
            rinshan: true,
        };
        self.seats[seat].hand.add(tile);
        Ok(())
    }

    // === Call windows ===

    fn open_window(
        &mut self,
        tile: Tile,
        from: Seat,
        source: WindowSource,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let options: Vec<_> = from
            .others_in_turn_order()
            .map(|seat| (seat, self.call_options(seat, tile, from, source)))
            .collect();
        let window = CallWindow::new(tile, from, source, options);
        if window.is_empty() {
            return self.close_window(window, events);
        }
        in_play(&mut self.round)?.phase = TurnPhase::AwaitingCalls(window);
        Ok(())
    }

    fn answer_call(
        &mut self,
        mut window: CallWindow,
        seat: Seat,
        kind: &ActionKind,
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let call = match kind {
            ActionKind::Pass => None,
            ActionKind::Ron => {
                if seat != window.discarder && !window.options(seat).is_some_and(|o| o.ron) {
                    // Explain why the win is refused.
                    self.check_ron(seat, window.tile, window.source)?;
                }
                Some(Call::Ron)
            }
            ActionKind::Pon => Some(Call::Pon),
            ActionKind::Kan(tile) if tile.kind() == window.tile.kind() => Some(Call::Kan),
            ActionKind::Chi(pair) => Some(Call::Chi(*pair)),
            _ => return Err(Rejection::CallNotAvailable.into()),
        };
        window.respond(seat, call)?;
        if window.is_complete() {
            return self.close_window(window, events);
        }
        in_play(&mut self.round)?.phase = TurnPhase::AwaitingCalls(window);
        Ok(())
    }

    fn close_window(&mut self, window: CallWindow, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        for seat in window.missed_ron() {
            let state = &mut self.seats[seat];
            state.temporary_furiten = true;
            if state.riichi.is_declared() {
                state.riichi_furiten = true;
            }
        }

        let resolution = window.resolve();
        if let Resolution::Ron(winners) = resolution {
            return self.settle_ron(&window, &winners, events);
        }
        if window.source == WindowSource::Discard && self.confirm_riichi()? {
            return self.abort(AbortReason::FourRiichi, events);
        }
        match resolution {
            Resolution::Claim { seat, call } => self.claim(&window, seat, call),
            _ if window.source == WindowSource::AddedKan => {
                for (_, state) in self.seats.iter_mut() {
                    state.ippatsu = false;
                }
                self.replacement_draw(window.discarder)
            }
            _ => {
                let round = in_play(&mut self.round)?;
                if round.wall.is_exhausted() {
                    return self.exhaustive_draw(events);
                }
                round.phase = TurnPhase::AwaitingDraw(window.discarder.next());
                Ok(())
            }
        }
    }

    /// Take the stake of a riichi whose discard was not won on. Returns
    /// whether this was the fourth riichi of the round.
    fn confirm_riichi(&mut self) -> MahjongResult<bool> {
        let round = in_play(&mut self.round)?;
        let Some(seat) = round.pending_riichi.take() else {
            return Ok(false);
        };
        let state = &mut self.seats[seat];
        state.points -= RIICHI_STAKE;
        state.ippatsu = true;
        round.deposits += RIICHI_STAKE;
        round.riichi_declared += 1;
        Ok(round.riichi_declared >= 4)
    }

    fn claim(&mut self, window: &CallWindow, seat: Seat, call: Call) -> MahjongResult<()> {
        let tile = window.tile;
        let from = window.discarder;
        let kind = tile.kind();

        let round = in_play(&mut self.round)?;
        round.uninterrupted = false;
        round.turn += 1;
        for (_, state) in self.seats.iter_mut() {
            state.ippatsu = false;
        }
        let pile = &mut self.seats[from].discards;
        if let Some(last) = pile.len().checked_sub(1).and_then(|i| pile.get_mut(i)) {
            last.called = true;
        }

        let caller = &mut self.seats[seat];
        let (meld_kind, taken) = match call {
            Call::Pon => (MeldKind::Pon, caller.hand.take_kind(kind, 2)),
            Call::Kan => (MeldKind::OpenKan, caller.hand.take_kind(kind, 3)),
            Call::Chi([a, b]) => {
                let taken = caller.hand.remove(a) && caller.hand.remove(b);
                (MeldKind::Chi, taken.then(|| vec![a, b]))
            }
            Call::Ron => {
                return Err(MahjongError::InvariantViolation(
                    "ron resolved as a claim".into(),
                ))
            }
        };
        let Some(mut tiles) = taken else {
            return Err(Rejection::CallNotAvailable.into());
        };
        caller.forbidden = match call {
            Call::Pon => smallvec![kind],
            Call::Chi([a, b]) => chi_forbidden(kind, a.kind(), b.kind()),
            _ => SmallVec::new(),
        };
        tiles.push(tile);
        caller
            .hand
            .push_meld(Meld::new(meld_kind, &tiles, Some(tile), Some(from)));

        if meld_kind == MeldKind::OpenKan {
            round.kans += 1;
            return self.replacement_draw(seat);
        }
        round.phase = TurnPhase::AwaitingDiscard {
            seat,
            drawn: None,
            rinshan: false,
        };
        Ok(())
    }

    // === Round endings ===

    fn settle_ron(
        &mut self,
        window: &CallWindow,
        winners: &[Seat],
        events: &mut Vec<TableEvent>,
    ) -> MahjongResult<()> {
        let round = current(&self.round)?;
        let mut deltas: SeatMap<i32> = SeatMap::with_value(0);
        let mut wins = Vec::with_capacity(winners.len());
        // Honba and deposits go to the winner closest to the discarder.
        for (i, winner) in winners.iter().enumerate() {
            let (hand, score) = self.check_ron(*winner, window.tile, window.source)?;
            let (honba, deposits) = if i == 0 {
                (round.honba, round.deposits)
            } else {
                (0, 0)
            };
            let transfers = win_transfers(
                score.payment,
                *winner,
                round.dealer,
                Some(window.discarder),
                honba,
                deposits,
            );
            for (seat, delta) in transfers.iter() {
                deltas[seat] += delta;
            }
            wins.push(WinRecord {
                seat: *winner,
                hand,
                score,
            });
        }
        let settlement = settlement_for(
            round,
            SettlementKind::Ron {
                discarder: window.discarder,
            },
            wins,
            deltas,
            round.deposits,
        );

        // A riichi discard that deals in never becomes a riichi.
        if round.pending_riichi == Some(window.discarder) {
            self.seats[window.discarder].riichi = RiichiState::None;
        }
        self.settle(settlement, events);
        Ok(())
    }

    fn exhaustive_draw(&mut self, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        let tenpai: Vec<Seat> = self
            .seats
            .iter()
            .filter(|(_, s)| is_tenpai(&s.hand.counts(), s.hand.melds()))
            .map(|(seat, _)| seat)
            .collect();
        let round = current(&self.round)?;
        let settlement = settlement_for(
            round,
            SettlementKind::ExhaustiveDraw {
                tenpai: tenpai.clone(),
            },
            Vec::new(),
            noten_payments(&tenpai),
            0,
        );
        self.settle(settlement, events);
        Ok(())
    }

    fn abort(&mut self, reason: AbortReason, events: &mut Vec<TableEvent>) -> MahjongResult<()> {
        let round = current(&self.round)?;
        let settlement = settlement_for(
            round,
            SettlementKind::AbortiveDraw(reason),
            Vec::new(),
            SeatMap::with_value(0),
            0,
        );
        self.settle(settlement, events);
        Ok(())
    }
}

fn settlement_for(
    round: &Round,
    kind: SettlementKind,
    wins: Vec<WinRecord>,
    deltas: SeatMap<i32>,
    deposits: i32,
) -> Settlement {
    Settlement {
        wind: round.wind,
        number: round.number(),
        dealer: round.dealer,
        honba: round.honba,
        kind,
        wins,
        deltas,
        deposits,
    }
}
