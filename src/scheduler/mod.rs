//! Turn scheduling and seat takeover.
//!
//! The table state machine never waits for anything. The scheduler is the
//! single place that knows about time: it maps the rule's thinking time to
//! deadlines, produces default actions when they pass and plays for seats
//! that have no one at them.

mod bot;
mod timer;

pub use bot::{SeatPolicy, SimpleBot, UniformBot};
pub use timer::{SchedulerConfig, TurnTimer};
