//! Audio and signaling relay.
//!
//! Audio is dispatched per member type: participants get the frame verbatim
//! through the registry, sinks offer it to their recorder. The origin member
//! never receives its own frame. Signaling is forwarded only to participants
//! of the sender's room, with the payload untouched.
//!
//! Sink playback is paced: a [`Playback`] hands out one wire-sized chunk per
//! [`PLAYBACK_CHUNK_INTERVAL`], the duration of audio a chunk carries.

use crate::errors::RoomError;
use crate::observability::metrics::{
    record_audio_frames, AUDIO_DROPPED, AUDIO_FORWARDED, AUDIO_OVERFLOW, AUDIO_RECORDED,
};
use crate::registry::{ConnectionRegistry, Delivery};
use crate::rooms::{AppendOutcome, Member, Room};
use bytes::Bytes;
use common::types::{ConnectionId, MemberId, RoomId};
use room_protocol::frame::chunk_audio;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Playing time of one chunk: 2048 mono samples at 48 kHz.
pub const PLAYBACK_CHUNK_INTERVAL: Duration = Duration::from_micros(42_667);

/// Per-disposition counts for one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Frames queued to participants
    pub forwarded: u64,
    /// Frames shed for participants whose queue is behind
    pub dropped: u64,
    /// Frames appended to recording sinks
    pub recorded: u64,
    /// Frames a full sink refused
    pub overflow: u64,
}

impl FanOut {
    /// Emit the counts as `rooms_audio_frames_total`.
    pub fn record(&self) {
        record_audio_frames(AUDIO_FORWARDED, self.forwarded);
        record_audio_frames(AUDIO_DROPPED, self.dropped);
        record_audio_frames(AUDIO_RECORDED, self.recorded);
        record_audio_frames(AUDIO_OVERFLOW, self.overflow);
    }
}

/// Fan one audio frame out to every member of `room` except `origin`.
pub fn fan_out_audio(
    registry: &ConnectionRegistry,
    room: &mut Room,
    origin: MemberId,
    frame: &Bytes,
) -> FanOut {
    let mut counts = FanOut::default();

    for (id, member) in room.members_mut() {
        if id == origin {
            continue;
        }
        match member {
            Member::Participant { connection, .. } => {
                match registry.send_audio(*connection, frame) {
                    Delivery::Queued => counts.forwarded += 1,
                    Delivery::Dropped => counts.dropped += 1,
                    Delivery::Evicted | Delivery::Unreachable => {}
                }
            }
            Member::Sink { recorder, .. } => match recorder.append(frame) {
                AppendOutcome::Recorded => counts.recorded += 1,
                AppendOutcome::Overflow => {
                    trace!(target: "rooms.relay", sink_id = %id, "Sink buffer full, frame dropped");
                    counts.overflow += 1;
                }
                AppendOutcome::Ignored => {}
            },
        }
    }

    counts
}

/// A sink recording queued for paced playback into its room.
#[derive(Debug)]
pub struct Playback {
    room_id: RoomId,
    sink_id: MemberId,
    chunks: VecDeque<Bytes>,
}

impl Playback {
    /// Re-segment `recording` into wire-sized chunks, the last zero-padded.
    #[must_use]
    pub fn new(room_id: RoomId, sink_id: MemberId, recording: &[u8]) -> Self {
        Self {
            room_id,
            sink_id,
            chunks: chunk_audio(recording).into(),
        }
    }

    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    #[must_use]
    pub fn sink_id(&self) -> MemberId {
        self.sink_id
    }

    /// Chunks not yet played.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    /// Take the next chunk to play.
    pub fn next_chunk(&mut self) -> Option<Bytes> {
        self.chunks.pop_front()
    }
}

/// Resolve a signaling target to the participant connection it names.
///
/// # Errors
///
/// [`RoomError::TargetNotInRoom`] when the target is absent from `room`, is
/// a sink, or is the sender itself.
pub fn signal_target(
    room: &Room,
    from: ConnectionId,
    target: MemberId,
) -> Result<ConnectionId, RoomError> {
    room.member(target)
        .and_then(Member::as_participant)
        .filter(|conn| *conn != from)
        .ok_or_else(|| RoomError::TargetNotInRoom(target.to_string()))
}
