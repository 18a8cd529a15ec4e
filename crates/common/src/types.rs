//! Common data types for Spatial Rooms components.
//!
//! Connection ids are process-scoped and only ever live in the connection
//! registry. Member ids are room-scoped: a participant's member id is derived
//! from its connection id, while a sink's member id is freshly generated and
//! never names a connection. Keeping the two as separate types prevents a
//! sink id from being looked up in the registry by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Create a new random room ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a member seated in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    /// Create a fresh member ID that does not name any connection.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The connection this member id refers to, for participants.
    ///
    /// Callers must only use this for members known to be participants;
    /// for sinks the returned id is never registered.
    #[must_use]
    pub fn as_connection(&self) -> ConnectionId {
        ConnectionId(self.0)
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ConnectionId> for MemberId {
    fn from(id: ConnectionId) -> Self {
        Self(id.0)
    }
}

macro_rules! impl_uuid_display {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $ty {
                type Err = uuid::Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Uuid::parse_str(s.trim()).map(Self)
                }
            }
        )+
    };
}

impl_uuid_display!(ConnectionId, RoomId, MemberId);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
        assert_ne!(RoomId::new(), RoomId::new());
        assert_ne!(MemberId::new(), MemberId::new());
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let room = RoomId::new();
        let parsed: RoomId = room.to_string().parse().unwrap();
        assert_eq!(room, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-room".parse::<RoomId>().is_err());
        assert!("".parse::<MemberId>().is_err());
    }

    #[test]
    fn test_participant_member_id_maps_back_to_connection() {
        let conn = ConnectionId::new();
        let member = MemberId::from(conn);
        assert_eq!(member.as_connection(), conn);
    }

    #[test]
    fn test_serializes_as_plain_uuid_string() {
        let id = ConnectionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
