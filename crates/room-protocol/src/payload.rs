//! JSON payloads carried as the data field of control frames.

use common::types::{ConnectionId, MemberId, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of room member as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberType {
    /// A connected participant
    User,
    /// A server-side audio sink
    Sink,
}

/// One member as listed in a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    /// Member kind
    #[serde(rename = "type")]
    pub member_type: MemberType,
    /// Display name of the participant, or of a sink's owner
    pub name: Option<String>,
    /// Owning connection; a participant owns itself
    pub owner: ConnectionId,
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

/// `ROOM.NEWMEMBER` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAnnouncement {
    /// New member id
    pub id: MemberId,
    /// Member details
    #[serde(flatten)]
    pub member: MemberSnapshot,
}

/// `ROOM.CREATE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCreated {
    /// Room id
    pub id: RoomId,
    /// Room name
    pub name: String,
}

/// `ROOM.MEMBER.MOVE` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMoved {
    /// Member that moved
    pub id: MemberId,
    /// New horizontal position
    pub x: i32,
    /// New vertical position
    pub y: i32,
}

/// `ROOM.LISTMEMBERS.SUCCESS` payload, keyed by member id.
pub type MemberList = BTreeMap<String, MemberSnapshot>;

/// `ROOM.LIST.SUCCESS` payload, room id to room name.
pub type RoomList = BTreeMap<String, String>;

/// `ROOM.LEAVE.MEMBERS` payload, leaver first.
pub type LeftMembers = Vec<MemberId>;
