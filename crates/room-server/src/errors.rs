//! Room server error types.
//!
//! Every failed request is answered with `<ACTION>.FAILURE` carrying
//! [`RoomError::client_message`]. Internal details are logged server-side but
//! not exposed to clients.

use crate::rooms::sink::SinkState;
use room_protocol::CodecError;
use thiserror::Error;

/// Broad error category, used for logging level and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or unknown request; connection stays open.
    Protocol,
    /// Request was well-formed but its precondition did not hold; no state changed.
    Precondition,
    /// Server-side failure.
    Internal,
}

/// Room server error type.
#[derive(Debug, Error)]
pub enum RoomError {
    /// Action name not recognized.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Arguments missing or unparseable.
    #[error("Malformed arguments: {0}")]
    MalformedArguments(#[from] CodecError),

    /// Caller already occupies a room.
    #[error("Connection already in a room")]
    AlreadyInRoom,

    /// Caller occupies no room.
    #[error("Connection is not in a room")]
    NotInRoom,

    /// Room id unknown.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Member id unknown.
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Member exists but is not a sink.
    #[error("Member is not a sink: {0}")]
    NotASink(String),

    /// Sink is in the wrong state for the requested transition.
    #[error("Sink is {actual}, expected {expected}")]
    InvalidSinkState {
        /// State the transition requires
        expected: SinkState,
        /// State the sink is in
        actual: SinkState,
    },

    /// Signaling target is not a participant in the sender's room.
    #[error("Target not reachable in room: {0}")]
    TargetNotInRoom(String),

    /// Server is shutting down and accepts no new connections.
    #[error("Server is draining")]
    Draining,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomError {
    /// Returns the error category.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            RoomError::UnknownAction(_) | RoomError::MalformedArguments(_) => ErrorClass::Protocol,
            RoomError::AlreadyInRoom
            | RoomError::NotInRoom
            | RoomError::RoomNotFound(_)
            | RoomError::MemberNotFound(_)
            | RoomError::NotASink(_)
            | RoomError::InvalidSinkState { .. }
            | RoomError::TargetNotInRoom(_) => ErrorClass::Precondition,
            RoomError::Draining | RoomError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            RoomError::UnknownAction(_) => "Unknown action".to_string(),
            RoomError::MalformedArguments(e) => e.to_string(),
            RoomError::AlreadyInRoom => "Already in a room".to_string(),
            RoomError::NotInRoom => "Not in a room".to_string(),
            RoomError::RoomNotFound(_) => "Room not found".to_string(),
            RoomError::MemberNotFound(_) => "Member not found".to_string(),
            RoomError::NotASink(_) => "Member is not a sink".to_string(),
            RoomError::InvalidSinkState { actual, .. } => format!("Sink is {actual}"),
            RoomError::TargetNotInRoom(_) => "Target not in room".to_string(),
            RoomError::Draining => "Server is shutting down".to_string(),
            RoomError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Returns a bounded label for the `error_type` metric dimension.
    #[must_use]
    pub fn error_type_label(&self) -> &'static str {
        match self {
            RoomError::UnknownAction(_) => "unknown_action",
            RoomError::MalformedArguments(_) => "malformed_arguments",
            RoomError::AlreadyInRoom => "already_in_room",
            RoomError::NotInRoom => "not_in_room",
            RoomError::RoomNotFound(_) => "room_not_found",
            RoomError::MemberNotFound(_) => "member_not_found",
            RoomError::NotASink(_) => "not_a_sink",
            RoomError::InvalidSinkState { .. } => "invalid_sink_state",
            RoomError::TargetNotInRoom(_) => "target_not_in_room",
            RoomError::Draining => "draining",
            RoomError::Internal(_) => "internal",
        }
    }
}
