//! Action names for requests, responses and server pushes.

use std::fmt;

/// Suffix appended to a request action on success.
pub const SUCCESS_SUFFIX: &str = ".SUCCESS";

/// Suffix appended to a request action on failure.
pub const FAILURE_SUFFIX: &str = ".FAILURE";

/// A client request action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Ask for the caller's connection id
    Me,
    /// Set the caller's display name
    NameSet,
    /// Create a room and sit in it
    RoomNew,
    /// Join an existing room
    RoomJoin,
    /// Leave the current room
    RoomLeave,
    /// List every room
    RoomList,
    /// List members of a room
    RoomListMembers,
    /// Move a member
    RoomMove,
    /// Create an audio sink in the current room
    SinkNew,
    /// Start recording into a sink
    SinkStart,
    /// Stop recording into a sink
    SinkStop,
    /// Play back a sink's recording
    SinkPlay,
    /// Relay a WebRTC offer
    ConnectionOffer,
    /// Relay a WebRTC answer
    ConnectionAnswer,
    /// Relay an ICE candidate
    ConnectionCandidate,
}

impl Action {
    /// Every request action.
    pub const ALL: [Action; 15] = [
        Action::Me,
        Action::NameSet,
        Action::RoomNew,
        Action::RoomJoin,
        Action::RoomLeave,
        Action::RoomList,
        Action::RoomListMembers,
        Action::RoomMove,
        Action::SinkNew,
        Action::SinkStart,
        Action::SinkStop,
        Action::SinkPlay,
        Action::ConnectionOffer,
        Action::ConnectionAnswer,
        Action::ConnectionCandidate,
    ];

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Me => "ME",
            Action::NameSet => "NAME.SET",
            Action::RoomNew => "ROOM.NEW",
            Action::RoomJoin => "ROOM.JOIN",
            Action::RoomLeave => "ROOM.LEAVE",
            Action::RoomList => "ROOM.LIST",
            Action::RoomListMembers => "ROOM.LISTMEMBERS",
            Action::RoomMove => "ROOM.MOVE",
            Action::SinkNew => "ROOM.SINK.NEW",
            Action::SinkStart => "ROOM.SINK.START",
            Action::SinkStop => "ROOM.SINK.STOP",
            Action::SinkPlay => "ROOM.SINK.PLAY",
            Action::ConnectionOffer => "CONNECTION.OFFER",
            Action::ConnectionAnswer => "CONNECTION.ANSWER",
            Action::ConnectionCandidate => "CONNECTION.CANDIDATE",
        }
    }

    /// Look up an action by wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }

    /// Whether this action is relayed to a peer as WebRTC signaling.
    #[must_use]
    pub const fn is_signaling(self) -> bool {
        matches!(
            self,
            Action::ConnectionOffer | Action::ConnectionAnswer | Action::ConnectionCandidate
        )
    }

    /// Response action name on success.
    #[must_use]
    pub fn success(self) -> String {
        success_name(self.as_str())
    }

    /// Response action name on failure.
    #[must_use]
    pub fn failure(self) -> String {
        failure_name(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<action>.SUCCESS` for any action name, including unknown ones.
#[must_use]
pub fn success_name(action: &str) -> String {
    format!("{action}{SUCCESS_SUFFIX}")
}

/// `<action>.FAILURE` for any action name, including unknown ones.
#[must_use]
pub fn failure_name(action: &str) -> String {
    format!("{action}{FAILURE_SUFFIX}")
}

/// A server-initiated push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Push {
    /// A member was added to the recipient's room
    NewMember,
    /// Members were removed from the recipient's room
    LeaveMembers,
    /// A member moved
    MemberMove,
    /// A room was created
    RoomCreate,
    /// A room was deleted
    RoomDelete,
}

impl Push {
    /// Wire name of the push.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Push::NewMember => "ROOM.NEWMEMBER",
            Push::LeaveMembers => "ROOM.LEAVE.MEMBERS",
            Push::MemberMove => "ROOM.MEMBER.MOVE",
            Push::RoomCreate => "ROOM.CREATE",
            Push::RoomDelete => "ROOM.DELETE",
        }
    }
}

impl fmt::Display for Push {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
