//! Room directory.
//!
//! Owns every room and a seat index from connection to room. The seat index
//! is what enforces one room per connection: a connection has a seat exactly
//! when it is seated as a participant somewhere.

use super::member::{Member, Position};
use super::sink::SinkRecorder;
use crate::errors::RoomError;
use common::types::{ConnectionId, MemberId, RoomId};
use room_protocol::payload::RoomList;
use std::collections::HashMap;
use tracing::warn;

/// A room and its members.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    members: HashMap<MemberId, Member>,
}

impl Room {
    fn new(id: RoomId, name: String) -> Self {
        Self {
            id,
            name,
            members: HashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn members(&self) -> impl Iterator<Item = (MemberId, &Member)> {
        self.members.iter().map(|(id, member)| (*id, member))
    }

    /// Connections of every participant in the room.
    pub fn participants(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.members.values().filter_map(Member::as_participant)
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = (MemberId, &mut Member)> {
        self.members.iter_mut().map(|(id, member)| (*id, member))
    }

    /// Recorder of a sink member.
    ///
    /// # Errors
    ///
    /// [`RoomError::MemberNotFound`] if absent, [`RoomError::NotASink`] if the
    /// member is a participant.
    pub fn recorder_mut(&mut self, id: MemberId) -> Result<&mut SinkRecorder, RoomError> {
        self.members
            .get_mut(&id)
            .ok_or_else(|| RoomError::MemberNotFound(id.to_string()))?
            .recorder_mut()
            .ok_or_else(|| RoomError::NotASink(id.to_string()))
    }
}

/// What a participant's removal took with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Room the participant left
    pub room_id: RoomId,
    /// The participant followed by every sink it owned
    pub removed: Vec<MemberId>,
    /// Participants still in the room
    pub remaining_participants: Vec<ConnectionId>,
    /// Whether the room was emptied and deleted
    pub room_deleted: bool,
}

/// Directory of rooms.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Room>,
    seats: HashMap<ConnectionId, RoomId>,
}

impl RoomDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with `creator` as its only participant.
    ///
    /// # Errors
    ///
    /// [`RoomError::AlreadyInRoom`] if the creator is already seated.
    pub fn create_room(
        &mut self,
        name: impl Into<String>,
        creator: ConnectionId,
        position: Position,
    ) -> Result<RoomId, RoomError> {
        if self.seats.contains_key(&creator) {
            return Err(RoomError::AlreadyInRoom);
        }

        let id = RoomId::new();
        let mut room = Room::new(id, name.into());
        room.members
            .insert(creator.into(), Member::participant(creator, position));
        self.rooms.insert(id, room);
        self.seats.insert(creator, id);
        Ok(id)
    }

    /// Seat `connection` in an existing room.
    ///
    /// # Errors
    ///
    /// [`RoomError::AlreadyInRoom`] if already seated, [`RoomError::RoomNotFound`]
    /// if the room does not exist.
    pub fn join(
        &mut self,
        room_id: RoomId,
        connection: ConnectionId,
        position: Position,
    ) -> Result<(), RoomError> {
        if self.seats.contains_key(&connection) {
            return Err(RoomError::AlreadyInRoom);
        }
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        room.members
            .insert(connection.into(), Member::participant(connection, position));
        self.seats.insert(connection, room_id);
        Ok(())
    }

    /// Add a sink owned by `owner` to the owner's room.
    ///
    /// # Errors
    ///
    /// [`RoomError::NotInRoom`] if the owner is not seated.
    pub fn add_sink(
        &mut self,
        owner: ConnectionId,
        position: Position,
        buffer_limit: usize,
    ) -> Result<(RoomId, MemberId), RoomError> {
        let room = self.room_of_mut(owner).ok_or(RoomError::NotInRoom)?;
        let sink_id = MemberId::new();
        room.members
            .insert(sink_id, Member::sink(owner, position, buffer_limit));
        Ok((room.id, sink_id))
    }

    /// Remove a participant and cascade its sinks.
    ///
    /// Returns `None` when the connection was not seated. Members already
    /// missing from the room are treated as removed. An emptied room is
    /// deleted.
    pub fn remove_participant(&mut self, connection: ConnectionId) -> Option<Departure> {
        let room_id = self.seats.remove(&connection)?;
        let Some(room) = self.rooms.get_mut(&room_id) else {
            warn!(
                target: "rooms.coordinator",
                connection_id = %connection,
                room_id = %room_id,
                "Seat pointed at a missing room"
            );
            return None;
        };

        let leaver = MemberId::from(connection);
        room.members.remove(&leaver);

        let owned_sinks: Vec<MemberId> = room
            .members
            .iter()
            .filter(|(_, member)| {
                matches!(member, Member::Sink { owner, .. } if *owner == connection)
            })
            .map(|(id, _)| *id)
            .collect();
        for sink_id in &owned_sinks {
            room.members.remove(sink_id);
        }

        let mut removed = Vec::with_capacity(owned_sinks.len() + 1);
        removed.push(leaver);
        removed.extend(owned_sinks);

        let remaining_participants: Vec<ConnectionId> = room.participants().collect();
        let room_deleted = room.is_empty();
        if room_deleted {
            self.rooms.remove(&room_id);
        }

        Some(Departure {
            room_id,
            removed,
            remaining_participants,
            room_deleted,
        })
    }

    /// Room the connection is seated in.
    #[must_use]
    pub fn seat_of(&self, connection: ConnectionId) -> Option<RoomId> {
        self.seats.get(&connection).copied()
    }

    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    #[must_use]
    pub fn room_of(&self, connection: ConnectionId) -> Option<&Room> {
        self.seat_of(connection).and_then(|id| self.rooms.get(&id))
    }

    pub fn room_of_mut(&mut self, connection: ConnectionId) -> Option<&mut Room> {
        let id = self.seat_of(connection)?;
        self.rooms.get_mut(&id)
    }

    /// Find which room holds a member.
    fn locate_member(&self, member: MemberId) -> Option<RoomId> {
        self.rooms
            .values()
            .find(|room| room.members.contains_key(&member))
            .map(Room::id)
    }

    /// Move a member wherever it is seated.
    ///
    /// # Errors
    ///
    /// [`RoomError::MemberNotFound`] if no room holds the member.
    pub fn move_member(&mut self, member: MemberId, to: Position) -> Result<RoomId, RoomError> {
        let room_id = self
            .locate_member(member)
            .ok_or_else(|| RoomError::MemberNotFound(member.to_string()))?;
        if let Some(target) = self
            .rooms
            .get_mut(&room_id)
            .and_then(|room| room.members.get_mut(&member))
        {
            target.set_position(to);
        }
        Ok(room_id)
    }

    /// Directory listing, room id to name.
    #[must_use]
    pub fn list(&self) -> RoomList {
        self.rooms
            .values()
            .map(|room| (room.id.to_string(), room.name.clone()))
            .collect()
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Members across every room.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.rooms.values().map(Room::len).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const LIMIT: usize = 1 << 16;

    #[test]
    fn test_create_seats_creator() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();

        let room_id = dir.create_room("Lobby", a, Position::new(1, 2)).unwrap();
        assert_eq!(dir.seat_of(a), Some(room_id));

        let room = dir.room(room_id).unwrap();
        assert_eq!(room.name(), "Lobby");
        assert_eq!(room.len(), 1);
        assert_eq!(room.participants().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_one_room_per_connection() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let first = dir.create_room("one", a, Position::default()).unwrap();
        assert!(matches!(
            dir.create_room("two", a, Position::default()),
            Err(RoomError::AlreadyInRoom)
        ));

        let second = dir.create_room("two", b, Position::default()).unwrap();
        assert!(matches!(
            dir.join(second, a, Position::default()),
            Err(RoomError::AlreadyInRoom)
        ));
        assert_eq!(dir.seat_of(a), Some(first));
        assert_eq!(dir.room(second).unwrap().len(), 1);
    }

    #[test]
    fn test_join_missing_room() {
        let mut dir = RoomDirectory::new();
        let result = dir.join(RoomId::new(), ConnectionId::new(), Position::default());
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
    }

    #[test]
    fn test_add_sink_requires_seat() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        assert!(matches!(
            dir.add_sink(a, Position::default(), LIMIT),
            Err(RoomError::NotInRoom)
        ));

        let room_id = dir.create_room("r", a, Position::default()).unwrap();
        let (sink_room, sink_id) = dir.add_sink(a, Position::new(9, 9), LIMIT).unwrap();
        assert_eq!(sink_room, room_id);
        assert_ne!(sink_id, MemberId::from(a));

        let sink = dir.room(room_id).unwrap().member(sink_id).unwrap();
        assert_eq!(sink.owner(), a);
        assert_eq!(sink.as_participant(), None);
    }

    #[test]
    fn test_remove_cascades_owned_sinks_only() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let room_id = dir.create_room("r", a, Position::default()).unwrap();
        dir.join(room_id, b, Position::default()).unwrap();

        let (_, a_sink_1) = dir.add_sink(a, Position::default(), LIMIT).unwrap();
        let (_, a_sink_2) = dir.add_sink(a, Position::default(), LIMIT).unwrap();
        let (_, b_sink) = dir.add_sink(b, Position::default(), LIMIT).unwrap();

        let departure = dir.remove_participant(a).unwrap();
        assert_eq!(departure.room_id, room_id);
        assert_eq!(departure.removed[0], MemberId::from(a));
        assert_eq!(departure.removed.len(), 3);
        assert!(departure.removed.contains(&a_sink_1));
        assert!(departure.removed.contains(&a_sink_2));
        assert_eq!(departure.remaining_participants, vec![b]);
        assert!(!departure.room_deleted);

        let room = dir.room(room_id).unwrap();
        assert_eq!(room.len(), 2);
        assert!(room.member(b_sink).is_some());
        assert_eq!(dir.seat_of(a), None);
    }

    #[test]
    fn test_last_participant_deletes_room() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let room_id = dir.create_room("r", a, Position::default()).unwrap();
        dir.add_sink(a, Position::default(), LIMIT).unwrap();

        let departure = dir.remove_participant(a).unwrap();
        assert!(departure.room_deleted);
        assert!(departure.remaining_participants.is_empty());
        assert!(dir.room(room_id).is_none());
        assert!(dir.list().is_empty());
    }

    #[test]
    fn test_remove_unseated_is_none() {
        let mut dir = RoomDirectory::new();
        assert_eq!(dir.remove_participant(ConnectionId::new()), None);
    }

    #[test]
    fn test_move_member_any_room() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let room_id = dir.create_room("r", a, Position::default()).unwrap();
        let (_, sink) = dir.add_sink(a, Position::default(), LIMIT).unwrap();

        assert_eq!(dir.move_member(sink, Position::new(40, 41)).unwrap(), room_id);
        assert_eq!(
            dir.room(room_id).unwrap().member(sink).unwrap().position(),
            Position::new(40, 41)
        );
        assert_eq!(dir.locate_member(sink), Some(room_id));

        assert!(matches!(
            dir.move_member(MemberId::new(), Position::default()),
            Err(RoomError::MemberNotFound(_))
        ));
    }

    #[test]
    fn test_list_and_counts() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let r1 = dir.create_room("one", a, Position::default()).unwrap();
        let r2 = dir.create_room("two", b, Position::default()).unwrap();
        dir.add_sink(b, Position::default(), LIMIT).unwrap();

        let list = dir.list();
        assert_eq!(list.get(&r1.to_string()).map(String::as_str), Some("one"));
        assert_eq!(list.get(&r2.to_string()).map(String::as_str), Some("two"));
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.member_count(), 3);
    }
}
