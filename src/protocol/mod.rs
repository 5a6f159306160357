//! Client-facing message types.
//!
//! Clients send [`ClientMessage`]s and receive [`ServerMessage`]s. Every
//! snapshot is built per viewer, so a message stream never carries another
//! seat's concealed tiles.

mod codec;
mod messages;
mod snapshot;

pub use codec::WireFormat;
pub use messages::{ClientMessage, RejectReason, SeatEvent, ServerMessage};
pub use snapshot::{PhaseView, RoundView, SeatView, TableSnapshot};
