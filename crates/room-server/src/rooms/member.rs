//! Room members.

use super::sink::SinkRecorder;
use common::types::ConnectionId;
use room_protocol::payload::{MemberSnapshot, MemberType};

/// Integer position on the room grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A member seated in a room.
#[derive(Debug)]
pub enum Member {
    /// A connected client.
    Participant {
        connection: ConnectionId,
        position: Position,
    },
    /// A server-side audio recorder owned by a participant.
    Sink {
        owner: ConnectionId,
        position: Position,
        recorder: SinkRecorder,
    },
}

impl Member {
    #[must_use]
    pub fn participant(connection: ConnectionId, position: Position) -> Self {
        Member::Participant {
            connection,
            position,
        }
    }

    #[must_use]
    pub fn sink(owner: ConnectionId, position: Position, buffer_limit: usize) -> Self {
        Member::Sink {
            owner,
            position,
            recorder: SinkRecorder::new(buffer_limit),
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Member::Participant { position, .. } | Member::Sink { position, .. } => *position,
        }
    }

    pub fn set_position(&mut self, to: Position) {
        match self {
            Member::Participant { position, .. } | Member::Sink { position, .. } => *position = to,
        }
    }

    /// The connection that owns this member; a participant owns itself.
    #[must_use]
    pub fn owner(&self) -> ConnectionId {
        match self {
            Member::Participant { connection, .. } => *connection,
            Member::Sink { owner, .. } => *owner,
        }
    }

    #[must_use]
    pub fn member_type(&self) -> MemberType {
        match self {
            Member::Participant { .. } => MemberType::User,
            Member::Sink { .. } => MemberType::Sink,
        }
    }

    /// The participant's connection, or `None` for a sink.
    #[must_use]
    pub fn as_participant(&self) -> Option<ConnectionId> {
        match self {
            Member::Participant { connection, .. } => Some(*connection),
            Member::Sink { .. } => None,
        }
    }

    pub fn recorder_mut(&mut self) -> Option<&mut SinkRecorder> {
        match self {
            Member::Participant { .. } => None,
            Member::Sink { recorder, .. } => Some(recorder),
        }
    }

    /// Wire snapshot, with the owner's display name looked up by the caller.
    #[must_use]
    pub fn snapshot(&self, name: Option<String>) -> MemberSnapshot {
        let Position { x, y } = self.position();
        MemberSnapshot {
            member_type: self.member_type(),
            name,
            owner: self.owner(),
            x,
            y,
        }
    }
}
