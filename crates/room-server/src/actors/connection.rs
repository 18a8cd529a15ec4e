//! `ConnectionActor` - one task per client connection.
//!
//! Each `ConnectionActor`:
//! - Registers with the controller and owns the connection's outbound queue
//! - Classifies inbound frames and forwards control and audio to the controller
//! - Writes outbound frames to the transport in queue order
//! - Drives the keepalive probe/ack exchange and evicts silent peers
//!
//! # Lifecycle
//!
//! 1. Spawned when the transport is accepted
//! 2. Runs until the peer closes, the transport fails, the keepalive times
//!    out, the controller drops the outbound queue, or the token is cancelled
//! 3. Always reports the disconnect to the controller before closing

use super::controller::RoomControllerHandle;
use super::expiry;
use super::metrics::{ActorType, MailboxMonitor};
use crate::errors::RoomError;
use crate::liveness::{KeepaliveAction, KeepaliveMonitor, KeepaliveSettings};
use crate::observability::metrics as room_metrics;
use crate::registry::OUTBOUND_QUEUE_CAPACITY;
use common::types::ConnectionId;
use room_protocol::{Frame, Transport, WireFrame};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the transport.
    PeerClosed,
    /// Reading or writing the transport failed.
    TransportError,
    /// The probe went unacknowledged.
    KeepaliveTimeout,
    /// The controller dropped the outbound queue.
    ServerClosed,
    /// The cancellation token fired.
    Cancelled,
    /// The controller refused the connection during shutdown.
    Refused,
    /// The controller is unreachable.
    ControllerGone,
}

impl CloseReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::TransportError => "transport_error",
            CloseReason::KeepaliveTimeout => "keepalive_timeout",
            CloseReason::ServerClosed => "server_closed",
            CloseReason::Cancelled => "cancelled",
            CloseReason::Refused => "refused",
            CloseReason::ControllerGone => "controller_gone",
        }
    }
}

/// The `ConnectionActor` implementation.
pub struct ConnectionActor<T> {
    transport: T,
    controller: RoomControllerHandle,
    cancel_token: CancellationToken,
    keepalive: KeepaliveMonitor,
}

impl<T: Transport> ConnectionActor<T> {
    /// Create an actor on a child of the controller's token.
    #[must_use]
    pub fn new(
        transport: T,
        controller: RoomControllerHandle,
        keepalive: KeepaliveSettings,
    ) -> Self {
        let cancel_token = controller.child_token();
        Self {
            transport,
            controller,
            cancel_token,
            keepalive: keepalive.monitor(),
        }
    }

    /// Spawn the actor and return its task handle.
    pub fn spawn(
        transport: T,
        controller: RoomControllerHandle,
        keepalive: KeepaliveSettings,
    ) -> JoinHandle<CloseReason> {
        tokio::spawn(Self::new(transport, controller, keepalive).run())
    }

    /// Run the connection to completion.
    pub async fn run(mut self) -> CloseReason {
        let (sender, mut outbound) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

        let id = match self.controller.connect(sender).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    target: "rooms.actor.connection",
                    error = %e,
                    "Connection refused"
                );
                self.transport.close().await;
                return match e {
                    RoomError::Draining => CloseReason::Refused,
                    _ => CloseReason::ControllerGone,
                };
            }
        };

        let reason = self.serve(id, &mut outbound).await;

        if reason == CloseReason::KeepaliveTimeout {
            room_metrics::record_keepalive_timeout();
        }
        if let Err(e) = self.controller.disconnect(id).await {
            debug!(
                target: "rooms.actor.connection",
                connection_id = %id,
                error = %e,
                "Disconnect not delivered"
            );
        }
        self.transport.close().await;

        info!(
            target: "rooms.actor.connection",
            connection_id = %id,
            reason = reason.as_str(),
            "ConnectionActor stopped"
        );
        reason
    }

    #[instrument(skip_all, name = "rooms.actor.connection", fields(connection_id = %id))]
    async fn serve(
        &mut self,
        id: ConnectionId,
        outbound: &mut mpsc::Receiver<WireFrame>,
    ) -> CloseReason {
        debug!(
            target: "rooms.actor.connection",
            connection_id = %id,
            "ConnectionActor started"
        );

        let mailbox = MailboxMonitor::new(ActorType::Connection, id.to_string());
        let interval = self.keepalive.interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.keepalive.deadline();

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    return CloseReason::Cancelled;
                }

                inbound = self.transport.recv() => {
                    match inbound {
                        Some(Ok(frame)) => {
                            if let Err(reason) = self.on_frame(id, frame).await {
                                return reason;
                            }
                        }
                        Some(Err(e)) => {
                            debug!(
                                target: "rooms.actor.connection",
                                connection_id = %id,
                                error = %e,
                                "Transport receive failed"
                            );
                            return CloseReason::TransportError;
                        }
                        None => return CloseReason::PeerClosed,
                    }
                }

                frame = outbound.recv() => {
                    let Some(frame) = frame else {
                        return CloseReason::ServerClosed;
                    };
                    mailbox.observe_depth(outbound.len());
                    if let Err(e) = self.transport.send(frame).await {
                        debug!(
                            target: "rooms.actor.connection",
                            connection_id = %id,
                            error = %e,
                            "Transport send failed"
                        );
                        return CloseReason::TransportError;
                    }
                }

                _ = ticker.tick() => {
                    match self.keepalive.on_tick(Instant::now()) {
                        KeepaliveAction::SendProbe => {
                            if self.transport.send(WireFrame::probe()).await.is_err() {
                                return CloseReason::TransportError;
                            }
                        }
                        KeepaliveAction::Evict => return Self::evict(id),
                        KeepaliveAction::Wait => {}
                    }
                }

                () = expiry(deadline) => {
                    if self.keepalive.is_expired(Instant::now()) {
                        return Self::evict(id);
                    }
                }
            }
        }
    }

    async fn on_frame(&mut self, id: ConnectionId, frame: WireFrame) -> Result<(), CloseReason> {
        let forwarded = match Frame::classify(frame) {
            Frame::Control(message) => self.controller.control(id, message).await,
            Frame::Audio(data) => self.controller.audio(id, data).await,
            Frame::KeepaliveAck => {
                self.keepalive.on_ack();
                Ok(())
            }
            Frame::KeepaliveProbe => {
                return self
                    .transport
                    .send(WireFrame::ack())
                    .await
                    .map_err(|_| CloseReason::TransportError);
            }
        };

        forwarded.map_err(|e| {
            warn!(
                target: "rooms.actor.connection",
                connection_id = %id,
                error = %e,
                "Controller unreachable"
            );
            CloseReason::ControllerGone
        })
    }

    fn evict(id: ConnectionId) -> CloseReason {
        info!(
            target: "rooms.liveness",
            connection_id = %id,
            "Keepalive ack not received, evicting connection"
        );
        CloseReason::KeepaliveTimeout
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coordinator::{Coordinator, CoordinatorSettings};
    use room_protocol::frame::KEEPALIVE_ACK;
    use room_test_utils::transport::channel_pair;
    use std::time::Duration;

    fn controller() -> RoomControllerHandle {
        RoomControllerHandle::with_coordinator(
            "rooms-test".to_string(),
            Coordinator::with_seed(CoordinatorSettings::default(), 11),
        )
    }

    fn settings() -> KeepaliveSettings {
        KeepaliveSettings {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_reply_through_transport() {
        let handle = controller();
        let (transport, mut peer) = channel_pair();
        let task = ConnectionActor::spawn(transport, handle.clone(), settings());

        peer.send_text("ME");
        let reply = peer.recv_control().await;
        assert_eq!(reply.action, "ME.SUCCESS");
        assert!(!reply.data.is_empty());

        peer.close();
        assert_eq!(task.await.unwrap(), CloseReason::PeerClosed);
        assert_eq!(handle.get_status().await.unwrap().connections, 0);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_probe_is_acknowledged() {
        let handle = controller();
        let (transport, mut peer) = channel_pair();
        let _task = ConnectionActor::spawn(transport, handle.clone(), settings());

        peer.send_probe();
        assert_eq!(peer.recv_binary().await.as_ref(), &[KEEPALIVE_ACK]);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledged_probes_keep_connection_open() {
        let handle = controller();
        let (transport, mut peer) = channel_pair();
        let _task = ConnectionActor::spawn(transport, handle.clone(), settings());

        for _ in 0..3 {
            assert!(peer.recv_probe().await);
            peer.send_ack();
        }
        assert_eq!(handle.get_status().await.unwrap().connections, 1);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ack_evicts_connection() {
        let handle = controller();
        let (transport, mut peer) = channel_pair();
        let started = Instant::now();
        let task = ConnectionActor::spawn(transport, handle.clone(), settings());

        assert!(peer.recv_probe().await);
        assert_eq!(task.await.unwrap(), CloseReason::KeepaliveTimeout);
        assert!(started.elapsed() >= Duration::from_secs(25));
        assert!(started.elapsed() < Duration::from_secs(30));

        assert!(peer.recv().await.is_none());
        assert_eq!(handle.get_status().await.unwrap().connections, 0);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_closes_connection() {
        let handle = controller();
        let (transport, mut peer) = channel_pair();
        let task = ConnectionActor::spawn(transport, handle.clone(), settings());

        peer.send_text("ME");
        peer.recv_control().await;

        handle.cancel();
        let reason = task.await.unwrap();
        assert!(matches!(
            reason,
            CloseReason::Cancelled | CloseReason::ServerClosed
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_refuses_new_connections() {
        let handle = controller();
        handle.shutdown().await.unwrap();

        let (transport, mut peer) = channel_pair();
        let task = ConnectionActor::spawn(transport, handle.clone(), settings());

        assert_eq!(task.await.unwrap(), CloseReason::Refused);
        assert!(peer.recv().await.is_none());
        handle.cancel();
    }
}
