//! `RoomControllerActor` - singleton owner of all room state.
//!
//! Every control request, audio frame and disconnect passes through one
//! mailbox and is applied to the [`Coordinator`] one at a time, so no request
//! observes another half-applied. The controller also:
//!
//! - Owns the root `CancellationToken` (connection actors run on child tokens)
//! - Refuses new connections once shutdown has begun
//! - Paces sink playback at one chunk per [`PLAYBACK_CHUNK_INTERVAL`]
//! - Reports status for logs and gauges
//!
//! # Graceful Shutdown
//!
//! [`RoomControllerHandle::shutdown`] stops accepting connections and
//! disconnects every open one, which cascades each out of its room and drops
//! its outbound queue. Cancelling the root token does the same before the
//! actor exits.

use super::expiry;
use super::messages::{ControllerMessage, ControllerStatus};
use super::metrics::{ActorType, MailboxMonitor};
use crate::coordinator::{Coordinator, CoordinatorSettings};
use crate::errors::RoomError;
use crate::observability::metrics as room_metrics;
use crate::registry::ConnectionSender;
use crate::relay::PLAYBACK_CHUNK_INTERVAL;
use bytes::Bytes;
use common::types::ConnectionId;
use room_protocol::ControlMessage;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

/// Channel buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 4096;

/// Handle to the `RoomControllerActor`.
///
/// Cheap to clone; every connection actor holds one.
#[derive(Clone, Debug)]
pub struct RoomControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
    mailbox: Arc<MailboxMonitor>,
}

impl RoomControllerHandle {
    /// Spawn a controller with entropy-seeded spawn placement.
    #[must_use]
    pub fn new(server_id: String, settings: CoordinatorSettings) -> Self {
        Self::with_coordinator(server_id, Coordinator::new(settings))
    }

    /// Spawn a controller around an existing coordinator.
    #[must_use]
    pub fn with_coordinator(server_id: String, coordinator: Coordinator) -> Self {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();
        let mailbox = Arc::new(MailboxMonitor::new(ActorType::Controller, &server_id));

        let actor = RoomControllerActor {
            server_id,
            receiver,
            cancel_token: cancel_token.clone(),
            coordinator,
            mailbox: Arc::clone(&mailbox),
            accepting_new: true,
            next_playback: Instant::now(),
        };
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
            mailbox,
        }
    }

    /// Register a connection's outbound queue and obtain its id.
    ///
    /// # Errors
    ///
    /// [`RoomError::Draining`] once shutdown has begun, or
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn connect(&self, sender: ConnectionSender) -> Result<ConnectionId, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::Connect {
            sender,
            respond_to: tx,
        })
        .await?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))?
    }

    /// Forward a decoded control request. The reply arrives on the
    /// connection's outbound queue.
    ///
    /// # Errors
    ///
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn control(
        &self,
        from: ConnectionId,
        message: ControlMessage,
    ) -> Result<(), RoomError> {
        self.send(ControllerMessage::Control { from, message }).await
    }

    /// Forward an audio frame.
    ///
    /// # Errors
    ///
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn audio(&self, from: ConnectionId, frame: Bytes) -> Result<(), RoomError> {
        self.send(ControllerMessage::Audio { from, frame }).await
    }

    /// Report a closed connection.
    ///
    /// # Errors
    ///
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), RoomError> {
        self.send(ControllerMessage::Disconnect { id }).await
    }

    /// Get the current controller status.
    ///
    /// # Errors
    ///
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn get_status(&self) -> Result<ControllerStatus, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::GetStatus { respond_to: tx })
            .await?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop accepting connections and close all open ones.
    ///
    /// Returns the number of connections closed.
    ///
    /// # Errors
    ///
    /// [`RoomError::Internal`] if the controller is gone.
    pub async fn shutdown(&self) -> Result<usize, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::Shutdown { respond_to: tx })
            .await?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for a connection actor.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    async fn send(&self, message: ControllerMessage) -> Result<(), RoomError> {
        self.mailbox.record_enqueue();
        self.sender.send(message).await.map_err(|e| {
            self.mailbox.record_drop();
            RoomError::Internal(format!("channel send failed: {e}"))
        })
    }
}

/// The `RoomControllerActor` implementation.
pub struct RoomControllerActor {
    server_id: String,
    receiver: mpsc::Receiver<ControllerMessage>,
    cancel_token: CancellationToken,
    coordinator: Coordinator,
    mailbox: Arc<MailboxMonitor>,
    accepting_new: bool,
    next_playback: Instant,
}

impl RoomControllerActor {
    #[instrument(skip_all, name = "rooms.actor.controller", fields(server_id = %self.server_id))]
    async fn run(mut self) {
        info!(
            target: "rooms.actor.controller",
            server_id = %self.server_id,
            "RoomControllerActor started"
        );

        loop {
            let playback_due = self
                .coordinator
                .has_pending_playback()
                .then_some(self.next_playback);

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "rooms.actor.controller",
                        server_id = %self.server_id,
                        "RoomControllerActor received cancellation signal"
                    );
                    self.close_all();
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.mailbox.record_dequeue();
                            room_metrics::set_actor_mailbox_depth(
                                ActorType::Controller.as_str(),
                                self.mailbox.current_depth(),
                            );
                        }
                        None => {
                            info!(
                                target: "rooms.actor.controller",
                                server_id = %self.server_id,
                                "RoomControllerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }

                () = expiry(playback_due) => {
                    self.coordinator.advance_playback();
                    self.next_playback = Instant::now() + PLAYBACK_CHUNK_INTERVAL;
                }
            }
        }

        let status = self.coordinator.status();
        info!(
            target: "rooms.actor.controller",
            server_id = %self.server_id,
            connections_remaining = status.connections,
            rooms_remaining = status.rooms,
            messages_processed = self.mailbox.messages_processed(),
            "RoomControllerActor stopped"
        );
    }

    fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Connect { sender, respond_to } => {
                let result = if self.accepting_new {
                    Ok(self.coordinator.connect(sender))
                } else {
                    Err(RoomError::Draining)
                };
                let _ = respond_to.send(result);
            }

            ControllerMessage::Control { from, message } => {
                if self.is_registered(from) {
                    self.coordinator.handle_control(from, message);
                } else {
                    trace!(
                        target: "rooms.actor.controller",
                        connection_id = %from,
                        "Request from closed connection dropped"
                    );
                }
            }

            ControllerMessage::Audio { from, frame } => {
                if self.is_registered(from) {
                    self.coordinator.handle_audio(from, &frame);
                }
            }

            ControllerMessage::Disconnect { id } => {
                self.coordinator.disconnect(id);
            }

            ControllerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }

            ControllerMessage::Shutdown { respond_to } => {
                self.accepting_new = false;
                let closed = self.close_all();
                let _ = respond_to.send(closed);
            }
        }
    }

    fn is_registered(&self, id: ConnectionId) -> bool {
        self.coordinator.registry().lookup(id).is_some()
    }

    fn status(&self) -> ControllerStatus {
        let status = self.coordinator.status();
        ControllerStatus {
            connections: status.connections,
            rooms: status.rooms,
            members: status.members,
            mailbox_depth: self.mailbox.current_depth(),
            accepting_new: self.accepting_new,
        }
    }

    /// Disconnect every registered connection.
    fn close_all(&mut self) -> usize {
        let ids: Vec<ConnectionId> = self.coordinator.registry().ids().collect();
        for id in &ids {
            self.coordinator.disconnect(*id);
        }

        debug!(
            target: "rooms.actor.controller",
            server_id = %self.server_id,
            closed = ids.len(),
            "Closed all connections"
        );
        ids.len()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::registry::OUTBOUND_QUEUE_CAPACITY;
    use room_protocol::codec::decode_control;
    use room_protocol::WireFrame;
    use std::time::Duration;

    fn controller() -> RoomControllerHandle {
        RoomControllerHandle::with_coordinator(
            "rooms-test".to_string(),
            Coordinator::with_seed(CoordinatorSettings::default(), 3),
        )
    }

    fn expect_text(frame: Option<WireFrame>) -> String {
        match frame {
            Some(WireFrame::Text(text)) => text,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_and_status() {
        let handle = controller();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

        handle.connect(tx).await.unwrap();

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.connections, 1);
        assert_eq!(status.rooms, 0);
        assert!(status.accepting_new);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_control_reply_arrives_on_outbound_queue() {
        let handle = controller();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let id = handle.connect(tx).await.unwrap();

        handle
            .control(id, decode_control("ROOM.NEW$/$Lobby"))
            .await
            .unwrap();

        let reply = expect_text(rx.recv().await);
        assert!(reply.starts_with("ROOM.NEW.SUCCESS$/$"));
        let push = expect_text(rx.recv().await);
        assert!(push.starts_with("ROOM.CREATE$/$"));

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.rooms, 1);
        assert_eq!(status.members, 1);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_disconnect_cascades_room() {
        let handle = controller();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let id = handle.connect(tx).await.unwrap();
        handle
            .control(id, decode_control("ROOM.NEW$/$Lobby"))
            .await
            .unwrap();

        handle.disconnect(id).await.unwrap();

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.connections, 0);
        assert_eq!(status.rooms, 0);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_shutdown_closes_connections_and_refuses_new() {
        let handle = controller();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        handle.connect(tx).await.unwrap();

        assert_eq!(handle.shutdown().await.unwrap(), 1);

        // Outbound queue closes once the registry drops its sender
        assert!(rx.recv().await.is_none());

        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        assert!(matches!(
            handle.connect(tx).await,
            Err(RoomError::Draining)
        ));
        assert!(!handle.get_status().await.unwrap().accepting_new);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_requests_from_unregistered_connection_are_dropped() {
        let handle = controller();
        let stranger = ConnectionId::new();

        handle
            .control(stranger, decode_control("ROOM.NEW$/$Ghost"))
            .await
            .unwrap();

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.rooms, 0);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_playback_is_paced() {
        let handle = controller();
        let (tx_a, mut rx_a) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (tx_b, _rx_b) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let a = handle.connect(tx_a).await.unwrap();
        let b = handle.connect(tx_b).await.unwrap();

        handle.control(a, decode_control("ROOM.NEW$/$Lobby")).await.unwrap();
        let room = expect_text(rx_a.recv().await)
            .strip_prefix("ROOM.NEW.SUCCESS$/$")
            .unwrap()
            .to_string();
        handle
            .control(b, decode_control(&format!("ROOM.JOIN$/${room}")))
            .await
            .unwrap();
        handle.control(a, decode_control("ROOM.SINK.NEW")).await.unwrap();
        let sink = loop {
            let text = expect_text(rx_a.recv().await);
            if let Some(id) = text.strip_prefix("ROOM.SINK.NEW.SUCCESS$/$") {
                break id.to_string();
            }
        };

        handle
            .control(a, decode_control(&format!("ROOM.SINK.START$/${sink}")))
            .await
            .unwrap();
        for fill in 1..=3u8 {
            handle
                .audio(b, Bytes::from(vec![fill; 4096]))
                .await
                .unwrap();
        }
        handle
            .control(a, decode_control(&format!("ROOM.SINK.STOP$/${sink}")))
            .await
            .unwrap();
        handle.get_status().await.unwrap();
        while rx_a.try_recv().is_ok() {}

        let started = Instant::now();
        handle
            .control(a, decode_control(&format!("ROOM.SINK.PLAY$/${sink}")))
            .await
            .unwrap();

        let mut played = Vec::new();
        while played.len() < 3 {
            if let Some(WireFrame::Binary(chunk)) = rx_a.recv().await {
                played.push(chunk);
            }
        }
        assert!(started.elapsed() >= PLAYBACK_CHUNK_INTERVAL * 2);
        assert_eq!(played[0].as_ref(), &[1u8; 4096][..]);
        assert_eq!(played[2].as_ref(), &[3u8; 4096][..]);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_cancellation_stops_actor() {
        let handle = controller();
        assert!(!handle.is_cancelled());

        let child = handle.child_token();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(child.is_cancelled());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.get_status().await.is_err());
    }
}
