//! Shared helpers for coordinator-level integration tests.

#![allow(dead_code)]

use common::types::{ConnectionId, MemberId, RoomId};
use room_protocol::ControlMessage;
use room_server::coordinator::{Coordinator, CoordinatorSettings};
use room_test_utils::{outbound_queue, outbound_queue_with_capacity, OutboundQueue};

/// A registered connection and its outbound queue.
pub struct Client {
    pub id: ConnectionId,
    pub queue: OutboundQueue,
}

impl Client {
    pub fn member_id(&self) -> MemberId {
        self.id.into()
    }

    /// Send a request and return everything queued for this client since.
    pub fn request(&mut self, coord: &mut Coordinator, text: &str) -> Vec<ControlMessage> {
        coord.handle_text(self.id, text);
        self.queue.drain_controls()
    }

    /// Send a request that must succeed and return its reply data.
    pub fn expect_success(&mut self, coord: &mut Coordinator, text: &str) -> String {
        let messages = self.request(coord, text);
        let reply = messages.first().expect("no reply queued");
        assert!(
            reply.action.ends_with(".SUCCESS"),
            "{text} failed: {} {}",
            reply.action,
            reply.data
        );
        reply.data.clone()
    }

    /// Send a request that must fail and return the failure message.
    pub fn expect_failure(&mut self, coord: &mut Coordinator, text: &str) -> String {
        let messages = self.request(coord, text);
        assert_eq!(messages.len(), 1, "failure must queue exactly one reply");
        let reply = &messages[0];
        assert!(
            reply.action.ends_with(".FAILURE"),
            "{text} unexpectedly succeeded: {}",
            reply.action
        );
        reply.data.clone()
    }
}

pub fn coordinator() -> Coordinator {
    Coordinator::with_seed(CoordinatorSettings::default(), 42)
}

pub fn connect(coord: &mut Coordinator) -> Client {
    let (tx, queue) = outbound_queue();
    Client {
        id: coord.connect(tx),
        queue,
    }
}

/// Connect a client whose queue holds at most `capacity` unread frames.
pub fn connect_with_capacity(coord: &mut Coordinator, capacity: usize) -> Client {
    let (tx, queue) = outbound_queue_with_capacity(capacity);
    Client {
        id: coord.connect(tx),
        queue,
    }
}

/// Tick sink playback until nothing is left to play; returns chunks played.
pub fn play_out(coord: &mut Coordinator) -> usize {
    let mut played = 0;
    while coord.has_pending_playback() {
        played += coord.advance_playback();
    }
    played
}

/// Create a room as `owner` and return its id.
pub fn create_room(coord: &mut Coordinator, owner: &mut Client, name: &str) -> RoomId {
    let room = owner.expect_success(coord, &format!("ROOM.NEW$/${name}"));
    room.parse().expect("room id")
}

/// Join `room` as `client`.
pub fn join(coord: &mut Coordinator, client: &mut Client, room: RoomId) {
    client.expect_success(coord, &format!("ROOM.JOIN$/${room}"));
}
