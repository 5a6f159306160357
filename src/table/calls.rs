//! Call window resolution.
//!
//! After a discard (or an added kan) every other seat that can claim the
//! tile gets one answer. Answers are buffered, never applied on arrival:
//! once the window is decided they are resolved by priority.
//!
//! ## Priority
//!
//! Ron > Pon/Kan > Chi. Several rons all win. Between pon/kan claims the
//! seat closest after the discarder wins.
//!
//! ## Early close
//!
//! The window closes as soon as no seat still to answer could beat (or, for
//! ron, join) the best answer received so far. With no claims that means
//! waiting for every eligible seat to pass.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Seat;
use crate::error::Rejection;
use crate::tiles::Tile;

/// What a seat may claim in the current window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    pub ron: bool,
    pub pon: bool,
    pub kan: bool,
    /// Concealed tile pairs that form a sequence with the tile.
    pub chi: SmallVec<[[Tile; 2]; 3]>,
}

impl CallOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.ron && !self.pon && !self.kan && self.chi.is_empty()
    }

    /// Highest priority this seat could still answer with.
    fn best_priority(&self) -> u8 {
        if self.ron {
            Call::Ron.priority()
        } else if self.pon || self.kan {
            Call::Pon.priority()
        } else if self.chi.is_empty() {
            0
        } else {
            1
        }
    }

    fn allows(&self, call: &Call) -> bool {
        match call {
            Call::Ron => self.ron,
            Call::Pon => self.pon,
            Call::Kan => self.kan,
            Call::Chi(tiles) => self.chi.iter().any(|c| c == tiles),
        }
    }
}

/// A claim on the window's tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    Ron,
    Pon,
    Kan,
    Chi([Tile; 2]),
}

impl Call {
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Call::Ron => 3,
            Call::Pon | Call::Kan => 2,
            Call::Chi(_) => 1,
        }
    }
}

/// Why the window was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSource {
    Discard,
    /// A tile added to a pon. Only ron is possible.
    AddedKan,
}

/// How a closed window resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Winning seats ordered by distance from the discarder.
    Ron(Vec<Seat>),
    Claim { seat: Seat, call: Call },
    AllPassed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    seat: Seat,
    options: CallOptions,
    /// `None` until the seat answers; `Some(None)` is a pass.
    answer: Option<Option<Call>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallWindow {
    pub tile: Tile,
    pub discarder: Seat,
    pub source: WindowSource,
    slots: Vec<Slot>,
}

impl CallWindow {
    /// Open a window. Seats with no options are left out.
    #[must_use]
    pub fn new(
        tile: Tile,
        discarder: Seat,
        source: WindowSource,
        options: impl IntoIterator<Item = (Seat, CallOptions)>,
    ) -> Self {
        let slots = options
            .into_iter()
            .filter(|(seat, opts)| *seat != discarder && !opts.is_empty())
            .map(|(seat, options)| Slot {
                seat,
                options,
                answer: None,
            })
            .collect();
        Self {
            tile,
            discarder,
            source,
            slots,
        }
    }

    /// No seat can claim the tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn options(&self, seat: Seat) -> Option<&CallOptions> {
        self.slots
            .iter()
            .find(|s| s.seat == seat)
            .map(|s| &s.options)
    }

    /// Whether `seat` still owes an answer.
    #[must_use]
    pub fn is_pending(&self, seat: Seat) -> bool {
        self.slots
            .iter()
            .any(|s| s.seat == seat && s.answer.is_none())
    }

    /// Seats that still owe an answer, in turn order.
    #[must_use]
    pub fn pending(&self) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self
            .slots
            .iter()
            .filter(|s| s.answer.is_none())
            .map(|s| s.seat)
            .collect();
        seats.sort_by_key(|s| s.distance_from(self.discarder));
        seats
    }

    /// Seats that could have won on the tile but did not declare ron.
    #[must_use]
    pub fn missed_ron(&self) -> Vec<Seat> {
        self.slots
            .iter()
            .filter(|s| s.options.ron && s.answer != Some(Some(Call::Ron)))
            .map(|s| s.seat)
            .collect()
    }

    /// Record an answer. `None` passes.
    pub fn respond(&mut self, seat: Seat, call: Option<Call>) -> Result<(), Rejection> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.seat == seat)
            .ok_or(Rejection::CallNotAvailable)?;
        if slot.answer.is_some() {
            return Err(Rejection::AlreadyResponded);
        }
        if let Some(call) = &call {
            if !slot.options.allows(call) {
                return Err(Rejection::CallNotAvailable);
            }
        }
        slot.answer = Some(call);
        Ok(())
    }

    fn best_answer(&self) -> u8 {
        self.slots
            .iter()
            .filter_map(|s| s.answer.flatten())
            .map(|c| c.priority())
            .max()
            .unwrap_or(0)
    }

    /// Whether the outcome is decided.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let best = self.best_answer();
        // A pending ron can still join a declared ron, so ties keep it open.
        self.slots
            .iter()
            .filter(|s| s.answer.is_none())
            .all(|s| best > 0 && s.options.best_priority() < best)
    }

    /// Resolve by priority. Only meaningful once complete.
    #[must_use]
    pub fn resolve(&self) -> Resolution {
        let mut answered: Vec<(Seat, Call)> = self
            .slots
            .iter()
            .filter_map(|s| s.answer.flatten().map(|c| (s.seat, c)))
            .collect();
        answered.sort_by_key(|(seat, call)| {
            (std::cmp::Reverse(call.priority()), seat.distance_from(self.discarder))
        });

        match answered.first() {
            None => Resolution::AllPassed,
            Some((_, Call::Ron)) => Resolution::Ron(
                answered
                    .iter()
                    .filter(|(_, c)| *c == Call::Ron)
                    .map(|(s, _)| *s)
                    .collect(),
            ),
            Some(&(seat, call)) => Resolution::Claim { seat, call },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ron() -> CallOptions {
        CallOptions {
            ron: true,
            ..CallOptions::default()
        }
    }

    fn pon() -> CallOptions {
        CallOptions {
            pon: true,
            ..CallOptions::default()
        }
    }

    fn chi() -> CallOptions {
        CallOptions {
            chi: smallvec::smallvec![[Tile::man(2), Tile::man(3)]],
            ..CallOptions::default()
        }
    }

    fn window(options: Vec<(u8, CallOptions)>) -> CallWindow {
        CallWindow::new(
            Tile::man(4),
            Seat::new(0),
            WindowSource::Discard,
            options.into_iter().map(|(s, o)| (Seat::new(s), o)),
        )
    }

    #[test]
    fn test_empty_options_are_dropped() {
        let w = window(vec![(1, CallOptions::default()), (0, ron())]);
        assert!(w.is_empty());
    }

    #[test]
    fn test_all_pass() {
        let mut w = window(vec![(1, chi()), (2, pon())]);
        w.respond(Seat::new(2), None).unwrap();
        assert!(!w.is_complete());
        w.respond(Seat::new(1), None).unwrap();
        assert!(w.is_complete());
        assert_eq!(w.resolve(), Resolution::AllPassed);
    }

    #[test]
    fn test_ron_beats_earlier_pon() {
        let mut w = window(vec![(1, ron()), (2, pon())]);
        w.respond(Seat::new(2), Some(Call::Pon)).unwrap();
        assert!(!w.is_complete());
        w.respond(Seat::new(1), Some(Call::Ron)).unwrap();
        assert!(w.is_complete());
        assert_eq!(w.resolve(), Resolution::Ron(vec![Seat::new(1)]));
    }

    #[test]
    fn test_ron_closes_window_early() {
        let mut w = window(vec![(1, chi()), (3, ron())]);
        w.respond(Seat::new(3), Some(Call::Ron)).unwrap();
        assert!(w.is_complete());
        assert_eq!(w.pending(), vec![Seat::new(1)]);
    }

    #[test]
    fn test_pending_ron_can_join() {
        let mut w = window(vec![(1, ron()), (3, ron())]);
        w.respond(Seat::new(3), Some(Call::Ron)).unwrap();
        assert!(!w.is_complete());
        w.respond(Seat::new(1), Some(Call::Ron)).unwrap();
        assert_eq!(
            w.resolve(),
            Resolution::Ron(vec![Seat::new(1), Seat::new(3)])
        );
        assert!(w.missed_ron().is_empty());
    }

    #[test]
    fn test_rejections() {
        let mut w = window(vec![(1, chi())]);
        assert_eq!(
            w.respond(Seat::new(2), None),
            Err(Rejection::CallNotAvailable)
        );
        assert_eq!(
            w.respond(Seat::new(1), Some(Call::Pon)),
            Err(Rejection::CallNotAvailable)
        );
        w.respond(Seat::new(1), None).unwrap();
        assert_eq!(
            w.respond(Seat::new(1), None),
            Err(Rejection::AlreadyResponded)
        );
    }

    #[test]
    fn test_missed_ron() {
        let mut w = window(vec![(2, ron())]);
        w.respond(Seat::new(2), None).unwrap();
        assert_eq!(w.missed_ron(), vec![Seat::new(2)]);
    }
}
