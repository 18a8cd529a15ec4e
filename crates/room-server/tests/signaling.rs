//! WebRTC signaling relay through the coordinator.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod support;

use common::types::MemberId;
use support::{connect, coordinator, create_room, join};

const SDP: &str = "v=0\r\no=- 46117317 2 IN IP4 127.0.0.1\r\ns=-";

#[test]
fn test_signaling_forwards_payload_verbatim() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    let mut bob = connect(&mut coord);
    let room = create_room(&mut coord, &mut alice, "Lobby");
    join(&mut coord, &mut bob, room);
    alice.queue.drain();

    for action in ["CONNECTION.OFFER", "CONNECTION.ANSWER", "CONNECTION.CANDIDATE"] {
        let reply = alice.request(
            &mut coord,
            &format!("{action}$/${}$/${SDP}", bob.member_id()),
        );
        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].action, format!("{action}.SUCCESS"));
        assert_eq!(reply[0].data, bob.member_id().to_string());

        let forwarded = bob.queue.drain_controls();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].action, action);
        assert_eq!(forwarded[0].data, format!("{}$/${SDP}", alice.id));
    }
}

#[test]
fn test_payload_may_contain_separator() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    let mut bob = connect(&mut coord);
    let room = create_room(&mut coord, &mut alice, "Lobby");
    join(&mut coord, &mut bob, room);

    alice.expect_success(
        &mut coord,
        &format!("CONNECTION.CANDIDATE$/${}$/$a$/$b", bob.member_id()),
    );

    let forwarded = bob.queue.drain_controls();
    let candidate = forwarded
        .iter()
        .find(|m| m.action == "CONNECTION.CANDIDATE")
        .unwrap();
    assert_eq!(candidate.data, format!("{}$/$a$/$b", alice.id));
}

#[test]
fn test_sink_is_not_a_signaling_target() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    create_room(&mut coord, &mut alice, "Lobby");
    let sink = alice.expect_success(&mut coord, "ROOM.SINK.NEW");

    assert_eq!(
        alice.expect_failure(&mut coord, &format!("CONNECTION.OFFER$/${sink}$/${SDP}")),
        "Target not in room"
    );
}

#[test]
fn test_sender_cannot_target_itself() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    let mut bob = connect(&mut coord);
    let room = create_room(&mut coord, &mut alice, "Lobby");
    join(&mut coord, &mut bob, room);
    alice.queue.drain();

    assert_eq!(
        alice.expect_failure(
            &mut coord,
            &format!("CONNECTION.OFFER$/${}$/${SDP}", alice.member_id())
        ),
        "Target not in room"
    );
    assert!(alice.queue.drain().is_empty());
    assert!(bob.queue.drain().is_empty());
}

#[test]
fn test_target_must_share_the_room() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    let mut carol = connect(&mut coord);
    create_room(&mut coord, &mut alice, "Lobby");
    create_room(&mut coord, &mut carol, "Studio");
    carol.queue.drain();

    assert_eq!(
        alice.expect_failure(
            &mut coord,
            &format!("CONNECTION.OFFER$/${}$/${SDP}", carol.member_id())
        ),
        "Target not in room"
    );
    assert_eq!(
        alice.expect_failure(
            &mut coord,
            &format!("CONNECTION.OFFER$/${}$/${SDP}", MemberId::new())
        ),
        "Target not in room"
    );
    assert!(carol.queue.drain().is_empty());
}

#[test]
fn test_signaling_requires_a_room() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    let mut bob = connect(&mut coord);
    create_room(&mut coord, &mut bob, "Lobby");
    bob.queue.drain();

    assert_eq!(
        alice.expect_failure(
            &mut coord,
            &format!("CONNECTION.ANSWER$/${}$/${SDP}", bob.member_id())
        ),
        "Not in a room"
    );
    assert!(bob.queue.drain().is_empty());
}

#[test]
fn test_signaling_requires_target_and_payload() {
    let mut coord = coordinator();
    let mut alice = connect(&mut coord);
    create_room(&mut coord, &mut alice, "Lobby");

    let failure = alice.expect_failure(&mut coord, "CONNECTION.OFFER");
    assert!(failure.contains("arguments"));
}
