//! Legality checks and legal-action enumeration.
//!
//! The same checks back both [`Table::legal_actions`] and the action
//! handlers, so every enumerated action is accepted when submitted.

use smallvec::{smallvec, SmallVec};

use super::calls::{CallOptions, WindowSource};
use super::round::{RiichiState, Round, SeatState};
use super::{Table, TableStatus, TurnPhase};
use crate::core::{ActionKind, Seat, RIICHI_STAKE};
use crate::error::{MahjongResult, Rejection};
use crate::scoring::{score_hand, HandScore, WinContext};
use crate::tiles::{
    is_complete, is_tenpai, kind_number, waits, Hand, Meld, MeldKind, Tile, TERMINALS_AND_HONORS,
};

/// Live tiles required to declare riichi.
const RIICHI_MIN_WALL: usize = 4;

/// Kans allowed in one round.
const MAX_KANS: u8 = 4;

/// Distinct terminal and honor kinds needed to abort with nine terminals.
const NINE_TERMINALS: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KanKind {
    Closed,
    Added,
}

impl Table {
    /// Every action `seat` may submit right now.
    ///
    /// `ChangeRule` is never listed since it carries a whole rule document.
    #[must_use]
    pub fn legal_actions(&self, seat: Seat) -> Vec<ActionKind> {
        if !seat.is_valid() {
            return Vec::new();
        }
        let seated = !self.seats[seat].occupant.is_empty();
        match self.status {
            TableStatus::Waiting => {
                if self.all_seated() && self.is_host(seat) {
                    vec![ActionKind::Start]
                } else {
                    Vec::new()
                }
            }
            TableStatus::RoundResolving if seated => vec![ActionKind::Continue],
            TableStatus::GameOver
                if seated
                    && self.is_host(seat)
                    && !self.result.as_ref().is_some_and(|r| r.abnormal) =>
            {
                vec![ActionKind::Continue]
            }
            TableStatus::RoundResolving | TableStatus::GameOver => Vec::new(),
            TableStatus::Playing => self.legal_in_play(seat),
        }
    }

    fn legal_in_play(&self, seat: Seat) -> Vec<ActionKind> {
        let Some(round) = self.round.as_ref() else {
            return Vec::new();
        };
        match &round.phase {
            TurnPhase::AwaitingDraw(turn) if *turn == seat => vec![ActionKind::Draw],
            TurnPhase::AwaitingDiscard {
                seat: turn,
                drawn,
                rinshan,
            } if *turn == seat => self.legal_on_turn(seat, *drawn, *rinshan),
            TurnPhase::AwaitingCalls(window) if window.is_pending(seat) => {
                let mut actions = vec![ActionKind::Pass];
                if let Some(options) = window.options(seat) {
                    if options.ron {
                        actions.push(ActionKind::Ron);
                    }
                    if options.pon {
                        actions.push(ActionKind::Pon);
                    }
                    if options.kan {
                        actions.push(ActionKind::Kan(window.tile));
                    }
                    actions.extend(options.chi.iter().map(|pair| ActionKind::Chi(*pair)));
                }
                actions
            }
            _ => Vec::new(),
        }
    }

    fn legal_on_turn(&self, seat: Seat, drawn: Option<Tile>, rinshan: bool) -> Vec<ActionKind> {
        let mut tiles = self.seats[seat].hand.concealed().to_vec();
        tiles.dedup();

        let mut actions: Vec<ActionKind> = tiles
            .iter()
            .filter(|t| self.check_discard(seat, **t, drawn).is_ok())
            .map(|t| ActionKind::Discard(*t))
            .collect();
        actions.extend(
            tiles
                .iter()
                .filter(|t| self.check_riichi(seat, **t, drawn).is_ok())
                .map(|t| ActionKind::Riichi(*t)),
        );
        if self.check_tsumo(seat, drawn, rinshan).is_ok() {
            actions.push(ActionKind::Tsumo);
        }
        let mut kan_kinds: SmallVec<[u8; 4]> = SmallVec::new();
        for tile in &tiles {
            if kan_kinds.contains(&tile.kind()) {
                continue;
            }
            if self.check_kan(seat, *tile, drawn).is_ok() {
                kan_kinds.push(tile.kind());
                actions.push(ActionKind::Kan(*tile));
            }
        }
        if self.check_nine_terminals(seat, drawn).is_ok() {
            actions.push(ActionKind::NineTerminals);
        }
        actions
    }

    // === Checks ===

    pub(crate) fn check_discard(
        &self,
        seat: Seat,
        tile: Tile,
        drawn: Option<Tile>,
    ) -> Result<(), Rejection> {
        let state = &self.seats[seat];
        if !state.hand.contains(tile) {
            return Err(Rejection::TileNotInHand(tile.to_string()));
        }
        if state.forbidden.contains(&tile.kind()) {
            return Err(Rejection::SwapCallForbidden(tile.to_string()));
        }
        if state.riichi.is_declared() && drawn != Some(tile) {
            return Err(Rejection::RiichiLocked);
        }
        Ok(())
    }

    pub(crate) fn check_riichi(
        &self,
        seat: Seat,
        tile: Tile,
        drawn: Option<Tile>,
    ) -> Result<(), Rejection> {
        let round = self.playing_round()?;
        let state = &self.seats[seat];
        if state.riichi.is_declared() {
            return Err(Rejection::AlreadyRiichi);
        }
        if !state.hand.is_closed() {
            return Err(Rejection::HandNotClosed);
        }
        if state.points < RIICHI_STAKE {
            return Err(Rejection::InsufficientPoints {
                needed: RIICHI_STAKE,
                available: state.points,
            });
        }
        if round.wall.remaining() < RIICHI_MIN_WALL {
            return Err(Rejection::WallTooShort);
        }
        self.check_discard(seat, tile, drawn)?;

        let mut counts = state.hand.counts();
        counts[tile.index()] -= 1;
        if !is_tenpai(&counts, state.hand.melds()) {
            return Err(Rejection::NotTenpai);
        }
        Ok(())
    }

    pub(crate) fn check_kan(
        &self,
        seat: Seat,
        tile: Tile,
        drawn: Option<Tile>,
    ) -> Result<KanKind, Rejection> {
        let round = self.playing_round()?;
        let state = &self.seats[seat];
        let Some(drawn) = drawn else {
            return Err(Rejection::WrongPhase);
        };
        if round.kans >= MAX_KANS || round.wall.replacements_left() == 0 {
            return Err(Rejection::KanLimit);
        }
        if round.wall.is_exhausted() {
            return Err(Rejection::WallTooShort);
        }

        let kind = tile.kind();
        let held = state.hand.count_kind(kind);
        if held == 0 {
            return Err(Rejection::TileNotInHand(tile.to_string()));
        }
        if held == 4 {
            if state.riichi.is_declared() && !kan_keeps_waits(&state.hand, kind, drawn) {
                return Err(Rejection::CallNotAvailable);
            }
            return Ok(KanKind::Closed);
        }
        let has_pon = state
            .hand
            .melds()
            .iter()
            .any(|m| m.kind == MeldKind::Pon && m.first_kind() == kind);
        if has_pon && !state.riichi.is_declared() {
            return Ok(KanKind::Added);
        }
        Err(Rejection::CallNotAvailable)
    }

    pub(crate) fn check_nine_terminals(
        &self,
        seat: Seat,
        drawn: Option<Tile>,
    ) -> Result<(), Rejection> {
        let round = self.playing_round()?;
        let state = &self.seats[seat];
        let counts = state.hand.counts();
        let distinct = TERMINALS_AND_HONORS
            .iter()
            .filter(|k| counts[**k as usize] > 0)
            .count();
        if drawn.is_none() || !state.first_turn || !round.uninterrupted || distinct < NINE_TERMINALS
        {
            return Err(Rejection::NotNineTerminals);
        }
        Ok(())
    }

    /// Score a self-drawn win, failing if the hand cannot win.
    pub(crate) fn check_tsumo(
        &self,
        seat: Seat,
        drawn: Option<Tile>,
        rinshan: bool,
    ) -> MahjongResult<HandScore> {
        let round = self.playing_round()?;
        let state = &self.seats[seat];
        let Some(tile) = drawn else {
            return Err(Rejection::WrongPhase.into());
        };
        if !is_complete(&state.hand.counts(), state.hand.melds()) {
            return Err(Rejection::HandNotComplete.into());
        }
        let ctx = WinContext::tsumo(tile, seat.wind(round.dealer), round.wind);
        let mut ctx = win_context(round, state, ctx);
        ctx.haitei = round.wall.is_exhausted() && !rinshan;
        ctx.rinshan = rinshan;
        ctx.first_turn = state.first_turn && round.uninterrupted;
        score_hand(&state.hand, &ctx, &self.scoring_policy())
    }

    /// Score a ron on `tile`, returning the completed hand.
    pub(crate) fn check_ron(
        &self,
        seat: Seat,
        tile: Tile,
        source: WindowSource,
    ) -> MahjongResult<(Hand, HandScore)> {
        let round = self.playing_round()?;
        let state = &self.seats[seat];
        let mut hand = state.hand.clone();
        hand.add(tile);
        if !is_complete(&hand.counts(), hand.melds()) {
            return Err(Rejection::HandNotComplete.into());
        }
        if state.is_furiten(&waits(&state.hand.counts(), state.hand.melds())) {
            return Err(Rejection::Furiten.into());
        }
        let ctx = WinContext::ron(tile, seat.wind(round.dealer), round.wind);
        let mut ctx = win_context(round, state, ctx);
        ctx.houtei = source == WindowSource::Discard && round.wall.is_exhausted();
        ctx.chankan = source == WindowSource::AddedKan;
        let score = score_hand(&hand, &ctx, &self.scoring_policy())?;
        Ok((hand, score))
    }

    /// What `seat` may claim on `tile` discarded (or added to a kan) by
    /// `from`.
    pub(crate) fn call_options(
        &self,
        seat: Seat,
        tile: Tile,
        from: Seat,
        source: WindowSource,
    ) -> CallOptions {
        let mut options = CallOptions {
            ron: self.check_ron(seat, tile, source).is_ok(),
            ..CallOptions::default()
        };
        let Some(round) = self.round.as_ref() else {
            return options;
        };
        let state = &self.seats[seat];
        if source == WindowSource::AddedKan
            || round.wall.is_exhausted()
            || state.riichi.is_declared()
        {
            return options;
        }

        let kind = tile.kind();
        let held = state.hand.count_kind(kind);
        // A pon must leave something other than the called kind to discard.
        options.pon = held >= 2 && state.hand.concealed().len() > held;
        options.kan =
            held >= 3 && round.kans < MAX_KANS && round.wall.replacements_left() > 0;
        if seat == from.next() && !tile.is_honor() {
            options.chi = chi_pairs(&state.hand, tile);
        }
        options
    }

    fn playing_round(&self) -> Result<&Round, Rejection> {
        self.round.as_ref().ok_or(Rejection::WrongPhase)
    }
}

/// Add dora and riichi state to a win context.
fn win_context(round: &Round, state: &SeatState, ctx: WinContext) -> WinContext {
    let ctx = ctx.with_dora(
        round.wall.dora_indicators().to_vec(),
        round.wall.ura_indicators().to_vec(),
    );
    if state.riichi.is_declared() {
        ctx.with_riichi(state.riichi == RiichiState::DoubleRiichi, state.ippatsu)
    } else {
        ctx
    }
}

/// Kinds that may not be discarded right after chi-ing `called` with
/// `a` and `b`: the called kind and the tile completing the other end.
pub(crate) fn chi_forbidden(called: u8, a: u8, b: u8) -> SmallVec<[u8; 2]> {
    let (low, high) = (a.min(b), a.max(b));
    let mut forbidden: SmallVec<[u8; 2]> = smallvec![called];
    if called + 1 == low && kind_number(high) < 9 {
        forbidden.push(high + 1);
    } else if called == high + 1 && kind_number(low) > 1 {
        forbidden.push(low - 1);
    }
    forbidden
}

/// Concealed pairs that form a sequence with `tile`, keeping only those
/// that leave a legal discard.
fn chi_pairs(hand: &Hand, tile: Tile) -> SmallVec<[[Tile; 2]; 3]> {
    let kind = tile.kind();
    let number = kind_number(kind) as i8;
    let suit_base = kind - (number as u8 - 1);
    let mut pairs: SmallVec<[[Tile; 2]; 3]> = SmallVec::new();

    for (da, db) in [(-2i8, -1i8), (-1, 1), (1, 2)] {
        let (na, nb) = (number + da, number + db);
        if na < 1 || nb > 9 {
            continue;
        }
        let ka = suit_base + (na - 1) as u8;
        let kb = suit_base + (nb - 1) as u8;
        let forbidden = chi_forbidden(kind, ka, kb);
        for a in identities(hand, ka) {
            for b in identities(hand, kb) {
                let mut rest = hand.clone();
                rest.remove(a);
                rest.remove(b);
                if rest
                    .concealed()
                    .iter()
                    .any(|t| !forbidden.contains(&t.kind()))
                {
                    pairs.push([a, b]);
                }
            }
        }
    }
    pairs
}

/// Distinct tiles of `kind` in the concealed hand.
fn identities(hand: &Hand, kind: u8) -> SmallVec<[Tile; 2]> {
    let mut found: SmallVec<[Tile; 2]> = SmallVec::new();
    for tile in hand.concealed().iter().filter(|t| t.kind() == kind) {
        if !found.contains(tile) {
            found.push(*tile);
        }
    }
    found
}

/// A riichi hand may only declare a closed kan on the drawn tile and only
/// when its waits stay the same.
fn kan_keeps_waits(hand: &Hand, kind: u8, drawn: Tile) -> bool {
    if drawn.kind() != kind {
        return false;
    }
    let mut before = hand.counts();
    before[kind as usize] -= 1;
    let mut after = hand.counts();
    after[kind as usize] = 0;

    let mut melds: Vec<Meld> = hand.melds().to_vec();
    melds.push(Meld::new(MeldKind::ClosedKan, &[Tile::new(kind); 4], None, None));

    let waits_before = waits(&before, hand.melds());
    !waits_before.is_empty() && waits_before == waits(&after, &melds)
}
