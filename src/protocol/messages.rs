//! Messages exchanged with clients.

use serde::{Deserialize, Serialize};

use super::snapshot::TableSnapshot;
use crate::core::{ActionRequest, Seat, TableId};
use crate::error::{MahjongError, Rejection};
use crate::table::{GameResult, Occupant, Settlement};

/// A join, leave, disconnect or reconnect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatEvent {
    pub table_id: TableId,
    pub seat: Seat,
    /// `Empty` to leave, a disconnected participant for a dropped link.
    pub occupant: Occupant,
}

impl SeatEvent {
    #[must_use]
    pub fn new(table_id: TableId, seat: Seat, occupant: Occupant) -> Self {
        Self {
            table_id,
            seat,
            occupant,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    Action(ActionRequest),
    Seat(SeatEvent),
}

impl ClientMessage {
    #[must_use]
    pub fn table_id(&self) -> TableId {
        match self {
            ClientMessage::Action(request) => request.table_id,
            ClientMessage::Seat(event) => event.table_id,
        }
    }
}

/// Why a client message was refused, in a form that can go over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    Invalid(Rejection),
    RuleInvalid(String),
    TableNotFound(TableId),
    SeatUnavailable(Seat),
    TableClosed(TableId),
    Other(String),
}

impl From<&MahjongError> for RejectReason {
    fn from(err: &MahjongError) -> Self {
        match err {
            MahjongError::InvalidAction(rejection) => RejectReason::Invalid(rejection.clone()),
            MahjongError::RuleInvalid(message) => RejectReason::RuleInvalid(message.clone()),
            MahjongError::TableNotFound(id) => RejectReason::TableNotFound(*id),
            MahjongError::SeatUnavailable(seat) => RejectReason::SeatUnavailable(*seat),
            MahjongError::TableClosed(id) => RejectReason::TableClosed(*id),
            other => RejectReason::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Invalid(rejection) => write!(f, "{rejection}"),
            RejectReason::RuleInvalid(message) => write!(f, "invalid rule: {message}"),
            RejectReason::TableNotFound(id) => write!(f, "{id} not found"),
            RejectReason::SeatUnavailable(seat) => write!(f, "{seat} is unavailable"),
            RejectReason::TableClosed(id) => write!(f, "{id} is closed"),
            RejectReason::Other(message) => f.write_str(message),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    Snapshot(Box<TableSnapshot>),
    Settlement(Settlement),
    GameResult(GameResult),
    /// Sent to the originator only.
    Rejected { table_id: TableId, reason: RejectReason },
    TableClosed { table_id: TableId, reason: String },
}

impl ServerMessage {
    #[must_use]
    pub fn rejected(table_id: TableId, err: &MahjongError) -> Self {
        ServerMessage::Rejected {
            table_id,
            reason: RejectReason::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActionKind;

    #[test]
    fn test_reject_reason_from_error() {
        let err = MahjongError::InvalidAction(Rejection::Furiten);
        assert_eq!(RejectReason::from(&err), RejectReason::Invalid(Rejection::Furiten));
        assert_eq!(RejectReason::from(&err).to_string(), "seat is furiten");

        let err = MahjongError::InvariantViolation("tiles".into());
        assert!(matches!(RejectReason::from(&err), RejectReason::Other(_)));
    }

    #[test]
    fn test_client_message_json() {
        let message = ClientMessage::Action(ActionRequest::new(
            TableId(2),
            Seat::new(1),
            ActionKind::Pass,
        ));
        assert_eq!(message.table_id(), TableId(2));
        let json = serde_json::to_string(&message).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
