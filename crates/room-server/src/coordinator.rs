//! Room coordinator.
//!
//! The coordinator owns the connection registry and the room directory and
//! applies one inbound event at a time. Each request runs to completion
//! before the next is looked at; the controller actor guarantees that by
//! owning the coordinator outright.
//!
//! Every request produces exactly one response to its sender, queued before
//! any pushes the request caused. Leaving a room and disconnecting share one
//! removal routine, so both announce the same cascade.
//!
//! `ROOM.SINK.PLAY` only queues the recording; the owner of the coordinator
//! drives [`Coordinator::advance_playback`] at the chunk rate.

use crate::config::Config;
use crate::errors::{ErrorClass, RoomError};
use crate::observability::metrics::{
    self as room_metrics, record_audio_frames, AUDIO_PLAYBACK, AUDIO_UNSEATED,
};
use crate::registry::{ConnectionRegistry, ConnectionSender};
use crate::relay::{self, Playback};
use crate::rooms::{Departure, Position, RoomDirectory, SinkRecorder, SinkState};
use bytes::Bytes;
use common::types::{ConnectionId, MemberId, RoomId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use room_protocol::action::{failure_name, success_name};
use room_protocol::codec::{decode_control, parse_int_arg};
use room_protocol::payload::{MemberAnnouncement, MemberList, MemberMoved, RoomCreated};
use room_protocol::{Action, ControlMessage, Push, WireFrame};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Label used for requests whose action is not recognized.
const UNKNOWN_ACTION_LABEL: &str = "unknown";

/// Tunables the coordinator needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Inclusive spawn bound on x.
    pub grid_width: i32,
    /// Inclusive spawn bound on y.
    pub grid_height: i32,
    /// Per-sink recording cap.
    pub sink_buffer_limit_bytes: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            grid_width: i32::try_from(config.grid_width).unwrap_or(i32::MAX),
            grid_height: i32::try_from(config.grid_height).unwrap_or(i32::MAX),
            sink_buffer_limit_bytes: config.sink_buffer_limit_bytes,
        }
    }
}

/// Point-in-time counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorStatus {
    /// Registered connections
    pub connections: usize,
    /// Rooms in the directory
    pub rooms: usize,
    /// Members across all rooms, sinks included
    pub members: usize,
}

/// A frame queued as a side effect of a request.
#[derive(Debug)]
enum Outbound {
    To(ConnectionId, WireFrame),
    Everyone(WireFrame),
}

/// Successful request outcome: response arguments plus pushes.
#[derive(Debug, Default)]
struct Reply {
    args: Vec<String>,
    pushes: Vec<Outbound>,
}

impl Reply {
    fn empty() -> Self {
        Self::default()
    }

    fn with_arg(arg: impl Into<String>) -> Self {
        Self {
            args: vec![arg.into()],
            pushes: Vec::new(),
        }
    }

    fn push(mut self, outbound: Outbound) -> Self {
        self.pushes.push(outbound);
        self
    }

    fn extend(mut self, outbound: impl IntoIterator<Item = Outbound>) -> Self {
        self.pushes.extend(outbound);
        self
    }
}

/// Registry, directory and request dispatch.
#[derive(Debug)]
pub struct Coordinator {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    settings: CoordinatorSettings,
    rng: StdRng,
    playbacks: Vec<Playback>,
}

impl Coordinator {
    /// Create a coordinator with entropy-seeded spawn placement.
    #[must_use]
    pub fn new(settings: CoordinatorSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Create a coordinator with deterministic spawn placement.
    #[must_use]
    pub fn with_seed(settings: CoordinatorSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: CoordinatorSettings, rng: StdRng) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::new(),
            settings,
            rng,
            playbacks: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    #[must_use]
    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            connections: self.registry.len(),
            rooms: self.directory.len(),
            members: self.directory.member_count(),
        }
    }

    /// Register a new connection.
    pub fn connect(&mut self, sender: ConnectionSender) -> ConnectionId {
        let id = self.registry.register(sender);
        room_metrics::set_connections_active(self.registry.len());
        debug!(
            target: "rooms.coordinator",
            connection_id = %id,
            connections = self.registry.len(),
            "Connection registered"
        );
        id
    }

    /// Remove a connection, cascading it out of its room.
    ///
    /// Never fails; an unknown connection is already gone.
    pub fn disconnect(&mut self, id: ConnectionId) {
        let pushes = self.remove_from_room(id);
        let was_registered = self.registry.unregister(id).is_some();
        self.deliver(pushes);

        if was_registered {
            room_metrics::set_connections_active(self.registry.len());
            debug!(
                target: "rooms.coordinator",
                connection_id = %id,
                connections = self.registry.len(),
                "Connection unregistered"
            );
        }
    }

    /// Handle a raw text frame.
    pub fn handle_text(&mut self, from: ConnectionId, text: &str) {
        self.handle_control(from, decode_control(text));
    }

    /// Handle a decoded control request, replying exactly once.
    pub fn handle_control(&mut self, from: ConnectionId, message: ControlMessage) {
        let started = Instant::now();
        let action = Action::parse(&message.action);
        let label = action.map_or(UNKNOWN_ACTION_LABEL, Action::as_str);

        let result = match action {
            Some(action) => self.dispatch(from, action, &message),
            None => Err(RoomError::UnknownAction(message.action.clone())),
        };

        match result {
            Ok(reply) => {
                let response = Outbound::To(
                    from,
                    WireFrame::control(&success_name(&message.action), &reply.args),
                );
                self.deliver(std::iter::once(response).chain(reply.pushes));
            }
            Err(err) => {
                match err.class() {
                    ErrorClass::Internal => warn!(
                        target: "rooms.coordinator",
                        connection_id = %from,
                        action = label,
                        error = %err,
                        "Request failed"
                    ),
                    ErrorClass::Protocol | ErrorClass::Precondition => debug!(
                        target: "rooms.coordinator",
                        connection_id = %from,
                        action = label,
                        error = %err,
                        "Request rejected"
                    ),
                }
                room_metrics::record_error(label, err.error_type_label());
                self.deliver([Outbound::To(
                    from,
                    WireFrame::control(&failure_name(&message.action), [err.client_message()]),
                )]);
            }
        }

        room_metrics::record_message_latency(label, started.elapsed());
    }

    /// Relay an audio frame from a seated connection.
    ///
    /// Audio from a connection in no room is dropped without a response.
    pub fn handle_audio(&mut self, from: ConnectionId, frame: &Bytes) {
        let Some(room) = self.directory.room_of_mut(from) else {
            debug!(
                target: "rooms.relay",
                connection_id = %from,
                bytes = frame.len(),
                "Audio from connection outside any room dropped"
            );
            record_audio_frames(AUDIO_UNSEATED, 1);
            return;
        };

        relay::fan_out_audio(&self.registry, room, from.into(), frame).record();
    }

    fn dispatch(
        &mut self,
        from: ConnectionId,
        action: Action,
        message: &ControlMessage,
    ) -> Result<Reply, RoomError> {
        match action {
            Action::Me => Ok(Reply::with_arg(from.to_string())),
            Action::NameSet => {
                self.registry.set_name(from, message.data.as_str());
                Ok(Reply::empty())
            }
            Action::RoomNew => self.create_room(from, &message.data),
            Action::RoomJoin => self.join_room(from, &message.data),
            Action::RoomLeave => self.leave_room(from),
            Action::RoomList => Ok(Reply::with_arg(to_json(&self.directory.list())?)),
            Action::RoomListMembers => self.list_members(from, &message.data),
            Action::RoomMove => self.move_member(message),
            Action::SinkNew => self.create_sink(from),
            Action::SinkStart => self.start_sink(from, &message.data),
            Action::SinkStop => self.stop_sink(from, &message.data),
            Action::SinkPlay => self.play_sink(from, &message.data),
            Action::ConnectionOffer | Action::ConnectionAnswer | Action::ConnectionCandidate => {
                let result = self.relay_signal(from, action, message);
                room_metrics::record_signaling(if result.is_ok() { "relayed" } else { "rejected" });
                result
            }
        }
    }

    fn create_room(&mut self, from: ConnectionId, name: &str) -> Result<Reply, RoomError> {
        let position = self.spawn_position();
        let room_id = self.directory.create_room(name, from, position)?;
        room_metrics::set_rooms_active(self.directory.len());

        info!(
            target: "rooms.coordinator",
            connection_id = %from,
            room_id = %room_id,
            rooms = self.directory.len(),
            "Room created"
        );

        let created = to_json(&RoomCreated {
            id: room_id,
            name: name.to_string(),
        })?;
        Ok(Reply::with_arg(room_id.to_string())
            .push(Outbound::Everyone(WireFrame::control(
                Push::RoomCreate.as_str(),
                [created],
            ))))
    }

    fn join_room(&mut self, from: ConnectionId, data: &str) -> Result<Reply, RoomError> {
        if self.directory.seat_of(from).is_some() {
            return Err(RoomError::AlreadyInRoom);
        }
        let room_id: RoomId = data
            .parse()
            .map_err(|_| RoomError::RoomNotFound(data.to_string()))?;

        let position = self.spawn_position();
        self.directory.join(room_id, from, position)?;

        debug!(
            target: "rooms.coordinator",
            connection_id = %from,
            room_id = %room_id,
            "Joined room"
        );

        let announcement = self.announce(room_id, from.into(), Some(from))?;
        Ok(Reply::with_arg(room_id.to_string()).extend(announcement))
    }

    fn leave_room(&mut self, from: ConnectionId) -> Result<Reply, RoomError> {
        if self.directory.seat_of(from).is_none() {
            return Err(RoomError::NotInRoom);
        }
        Ok(Reply::empty().extend(self.remove_from_room(from)))
    }

    fn list_members(&self, from: ConnectionId, data: &str) -> Result<Reply, RoomError> {
        let room = if data.trim().is_empty() {
            self.directory.room_of(from)
        } else {
            data.parse::<RoomId>()
                .ok()
                .and_then(|id| self.directory.room(id))
        };

        let members: MemberList = room
            .map(|room| {
                room.members()
                    .map(|(id, member)| {
                        let name = self.registry.name(member.owner()).map(str::to_string);
                        (id.to_string(), member.snapshot(name))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Reply::with_arg(to_json(&members)?))
    }

    fn move_member(&mut self, message: &ControlMessage) -> Result<Reply, RoomError> {
        let args = message.split_args(3)?;
        let [member, x, y] = args.as_slice() else {
            return Err(RoomError::Internal("argument split mismatch".to_string()));
        };
        let x = parse_int_arg("x", x)?;
        let y = parse_int_arg("y", y)?;
        let member_id: MemberId = member
            .parse()
            .map_err(|_| RoomError::MemberNotFound((*member).to_string()))?;

        let room_id = self.directory.move_member(member_id, Position::new(x, y))?;

        let moved = to_json(&MemberMoved {
            id: member_id,
            x,
            y,
        })?;
        let frame = WireFrame::control(Push::MemberMove.as_str(), [moved]);
        let pushes: Vec<Outbound> = self
            .directory
            .room(room_id)
            .into_iter()
            .flat_map(|room| room.participants())
            .map(|conn| Outbound::To(conn, frame.clone()))
            .collect();

        Ok(Reply::with_arg(member_id.to_string()).extend(pushes))
    }

    fn create_sink(&mut self, from: ConnectionId) -> Result<Reply, RoomError> {
        let position = self.spawn_position();
        let (room_id, sink_id) =
            self.directory
                .add_sink(from, position, self.settings.sink_buffer_limit_bytes)?;

        debug!(
            target: "rooms.coordinator",
            connection_id = %from,
            room_id = %room_id,
            sink_id = %sink_id,
            "Sink created"
        );

        let announcement = self.announce(room_id, sink_id, None)?;
        Ok(Reply::with_arg(sink_id.to_string()).extend(announcement))
    }

    fn start_sink(&mut self, from: ConnectionId, data: &str) -> Result<Reply, RoomError> {
        let (room_id, sink_id) = self.locate_sink(from, data)?;
        self.sink_recorder(room_id, sink_id)?
            .start()
            .map_err(|actual| RoomError::InvalidSinkState {
                expected: SinkState::Empty,
                actual,
            })?;
        Ok(Reply::with_arg(sink_id.to_string()))
    }

    fn stop_sink(&mut self, from: ConnectionId, data: &str) -> Result<Reply, RoomError> {
        let (room_id, sink_id) = self.locate_sink(from, data)?;
        let recorder = self.sink_recorder(room_id, sink_id)?;
        recorder
            .stop()
            .map_err(|actual| RoomError::InvalidSinkState {
                expected: SinkState::Recording,
                actual,
            })?;
        debug!(
            target: "rooms.relay",
            sink_id = %sink_id,
            bytes = recorder.len(),
            "Sink recording stopped"
        );
        Ok(Reply::with_arg(sink_id.to_string()))
    }

    fn play_sink(&mut self, from: ConnectionId, data: &str) -> Result<Reply, RoomError> {
        let (room_id, sink_id) = self.locate_sink(from, data)?;
        let recording = self
            .sink_recorder(room_id, sink_id)?
            .take_recording()
            .map_err(|actual| RoomError::InvalidSinkState {
                expected: SinkState::Recorded,
                actual,
            })?;

        let playback = Playback::new(room_id, sink_id, &recording);
        debug!(
            target: "rooms.relay",
            sink_id = %sink_id,
            chunks = playback.remaining(),
            "Sink playback queued"
        );
        if playback.remaining() > 0 {
            self.playbacks.push(playback);
        }
        Ok(Reply::with_arg(sink_id.to_string()))
    }

    /// Whether any sink playback still has chunks to play.
    #[must_use]
    pub fn has_pending_playback(&self) -> bool {
        !self.playbacks.is_empty()
    }

    /// Play the next chunk of every queued playback into its room.
    ///
    /// A playback whose sink has left the room is abandoned. Returns the
    /// number of chunks played.
    pub fn advance_playback(&mut self) -> usize {
        let registry = &self.registry;
        let directory = &mut self.directory;
        let mut played = 0;

        self.playbacks.retain_mut(|playback| {
            let Some(room) = directory.room_mut(playback.room_id()) else {
                return false;
            };
            if room.member(playback.sink_id()).is_none() {
                return false;
            }
            let Some(chunk) = playback.next_chunk() else {
                return false;
            };
            relay::fan_out_audio(registry, room, playback.sink_id(), &chunk).record();
            played += 1;
            playback.remaining() > 0
        });

        record_audio_frames(AUDIO_PLAYBACK, u64::try_from(played).unwrap_or(u64::MAX));
        played
    }

    fn relay_signal(
        &self,
        from: ConnectionId,
        action: Action,
        message: &ControlMessage,
    ) -> Result<Reply, RoomError> {
        let args = message.split_args(2)?;
        let [target, payload] = args.as_slice() else {
            return Err(RoomError::Internal("argument split mismatch".to_string()));
        };
        let room = self.directory.room_of(from).ok_or(RoomError::NotInRoom)?;
        let target_id: MemberId = target
            .parse()
            .map_err(|_| RoomError::TargetNotInRoom((*target).to_string()))?;
        let target_conn = relay::signal_target(room, from, target_id)?;

        debug!(
            target: "rooms.relay",
            action = action.as_str(),
            from = %from,
            to = %target_conn,
            "Relaying signaling message"
        );

        let forward = WireFrame::control(action.as_str(), [from.to_string().as_str(), *payload]);
        Ok(Reply::with_arg(target_id.to_string()).push(Outbound::To(target_conn, forward)))
    }

    /// Shared removal routine for `ROOM.LEAVE` and disconnect.
    fn remove_from_room(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        let Some(departure) = self.directory.remove_participant(connection) else {
            return Vec::new();
        };
        let Departure {
            room_id,
            removed,
            remaining_participants,
            room_deleted,
        } = departure;

        info!(
            target: "rooms.coordinator",
            connection_id = %connection,
            room_id = %room_id,
            removed = removed.len(),
            room_deleted,
            "Left room"
        );

        let mut pushes = Vec::new();
        match to_json(&removed) {
            Ok(left) => {
                let frame = WireFrame::control(Push::LeaveMembers.as_str(), [left]);
                pushes.extend(
                    remaining_participants
                        .into_iter()
                        .map(|conn| Outbound::To(conn, frame.clone())),
                );
            }
            Err(e) => warn!(
                target: "rooms.coordinator",
                room_id = %room_id,
                error = %e,
                "Failed to encode departure"
            ),
        }

        if room_deleted {
            room_metrics::set_rooms_active(self.directory.len());
            pushes.push(Outbound::Everyone(WireFrame::control(
                Push::RoomDelete.as_str(),
                [room_id.to_string()],
            )));
        }
        pushes
    }

    /// `ROOM.NEWMEMBER` for every participant of the room except `skip`.
    fn announce(
        &self,
        room_id: RoomId,
        member_id: MemberId,
        skip: Option<ConnectionId>,
    ) -> Result<Vec<Outbound>, RoomError> {
        let room = self
            .directory
            .room(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        let member = room
            .member(member_id)
            .ok_or_else(|| RoomError::MemberNotFound(member_id.to_string()))?;

        let name = self.registry.name(member.owner()).map(str::to_string);
        let payload = to_json(&MemberAnnouncement {
            id: member_id,
            member: member.snapshot(name),
        })?;
        let frame = WireFrame::control(Push::NewMember.as_str(), [payload]);

        Ok(room
            .participants()
            .filter(|conn| Some(*conn) != skip)
            .map(|conn| Outbound::To(conn, frame.clone()))
            .collect())
    }

    /// Resolve a sink id within the caller's room.
    fn locate_sink(&self, from: ConnectionId, data: &str) -> Result<(RoomId, MemberId), RoomError> {
        let room_id = self.directory.seat_of(from).ok_or(RoomError::NotInRoom)?;
        let sink_id: MemberId = data
            .parse()
            .map_err(|_| RoomError::MemberNotFound(data.to_string()))?;
        Ok((room_id, sink_id))
    }

    fn sink_recorder(
        &mut self,
        room_id: RoomId,
        sink_id: MemberId,
    ) -> Result<&mut SinkRecorder, RoomError> {
        self.directory
            .room_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?
            .recorder_mut(sink_id)
    }

    fn spawn_position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0..=self.settings.grid_width),
            self.rng.gen_range(0..=self.settings.grid_height),
        )
    }

    fn deliver(&mut self, outbound: impl IntoIterator<Item = Outbound>) {
        let before = self.registry.len();
        for item in outbound {
            match item {
                Outbound::To(conn, frame) => {
                    self.registry.send(conn, frame);
                }
                Outbound::Everyone(frame) => {
                    self.registry.broadcast(&frame);
                }
            }
        }
        if self.registry.len() != before {
            room_metrics::set_connections_active(self.registry.len());
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, RoomError> {
    serde_json::to_string(value).map_err(|e| RoomError::Internal(format!("encode failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::registry::OUTBOUND_QUEUE_CAPACITY;
    use tokio::sync::mpsc;

    fn coordinator() -> Coordinator {
        Coordinator::with_seed(CoordinatorSettings::default(), 7)
    }

    fn texts(rx: &mut mpsc::Receiver<WireFrame>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let WireFrame::Text(text) = frame {
                out.push(text);
            }
        }
        out
    }

    #[test]
    fn test_me_returns_connection_id() {
        let mut coord = coordinator();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let id = coord.connect(tx);

        coord.handle_text(id, "ME");
        assert_eq!(texts(&mut rx), vec![format!("ME.SUCCESS$/${id}")]);
    }

    #[test]
    fn test_unknown_action_fails_and_keeps_connection() {
        let mut coord = coordinator();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let id = coord.connect(tx);

        coord.handle_text(id, "ROOM.EXPLODE$/$now");
        assert_eq!(
            texts(&mut rx),
            vec!["ROOM.EXPLODE.FAILURE$/$Unknown action".to_string()]
        );
        assert!(coord.registry().is_open(id));
    }

    #[test]
    fn test_spawn_within_bounds() {
        let mut coord = Coordinator::with_seed(
            CoordinatorSettings {
                grid_width: 3,
                grid_height: 2,
                sink_buffer_limit_bytes: 4096,
            },
            1,
        );
        for _ in 0..200 {
            let p = coord.spawn_position();
            assert!((0..=3).contains(&p.x));
            assert!((0..=2).contains(&p.y));
        }
    }

    #[test]
    fn test_status_counts() {
        let mut coord = coordinator();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let a = coord.connect(tx.clone());
        coord.connect(tx);
        coord.handle_text(a, "ROOM.NEW$/$Lobby");
        coord.handle_text(a, "ROOM.SINK.NEW");

        assert_eq!(
            coord.status(),
            CoordinatorStatus {
                connections: 2,
                rooms: 1,
                members: 2
            }
        );

        coord.disconnect(a);
        assert_eq!(
            coord.status(),
            CoordinatorStatus {
                connections: 1,
                rooms: 0,
                members: 0
            }
        );
    }

    #[test]
    fn test_reply_to_full_queue_closes_connection() {
        let mut coord = coordinator();
        let (tx, mut rx) = mpsc::channel(1);
        let id = coord.connect(tx);

        coord.handle_text(id, "ME");
        coord.handle_text(id, "ME");

        assert!(coord.registry().lookup(id).is_none());
        assert_eq!(coord.status().connections, 0);
        assert_eq!(texts(&mut rx), vec![format!("ME.SUCCESS$/${id}")]);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_playback_abandoned_when_sink_leaves() {
        let mut coord = coordinator();
        let (tx_a, mut rx_a) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (tx_b, _rx_b) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let a = coord.connect(tx_a);
        let b = coord.connect(tx_b);

        coord.handle_text(a, "ROOM.NEW$/$Lobby");
        let room = texts(&mut rx_a)
            .into_iter()
            .find_map(|t| t.strip_prefix("ROOM.NEW.SUCCESS$/$").map(str::to_string))
            .unwrap();
        coord.handle_text(b, &format!("ROOM.JOIN$/${room}"));
        coord.handle_text(a, "ROOM.SINK.NEW");
        let sink = texts(&mut rx_a)
            .into_iter()
            .find_map(|t| t.strip_prefix("ROOM.SINK.NEW.SUCCESS$/$").map(str::to_string))
            .unwrap();

        coord.handle_text(a, &format!("ROOM.SINK.START$/${sink}"));
        for _ in 0..3 {
            coord.handle_audio(b, &Bytes::from(vec![1u8; 4096]));
        }
        coord.handle_text(a, &format!("ROOM.SINK.STOP$/${sink}"));
        coord.handle_text(b, &format!("ROOM.SINK.PLAY$/${sink}"));
        assert!(coord.has_pending_playback());
        assert_eq!(coord.advance_playback(), 1);

        // Owner leaving takes the sink and its playback with it
        coord.handle_text(a, "ROOM.LEAVE");
        assert_eq!(coord.advance_playback(), 0);
        assert!(!coord.has_pending_playback());
    }

    #[test]
    fn test_disconnect_unknown_is_noop() {
        let mut coord = coordinator();
        coord.disconnect(ConnectionId::new());
        assert_eq!(coord.status(), CoordinatorStatus::default());
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            grid_width: 640,
            grid_height: 480,
            sink_buffer_limit_bytes: 8192,
            ..Config::default()
        };
        let settings = CoordinatorSettings::from(&config);
        assert_eq!(settings.grid_width, 640);
        assert_eq!(settings.grid_height, 480);
        assert_eq!(settings.sink_buffer_limit_bytes, 8192);
    }
}
