//! Message types for actor communication.
//!
//! Connection actors talk to the controller over a bounded `mpsc` mailbox.
//! Request/reply uses `oneshot`; frame forwarding is fire-and-forget.

use crate::errors::RoomError;
use crate::registry::ConnectionSender;
use bytes::Bytes;
use common::types::ConnectionId;
use room_protocol::ControlMessage;
use tokio::sync::oneshot;

/// Messages sent to `RoomControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Register a new connection and its outbound queue.
    Connect {
        sender: ConnectionSender,
        /// Response channel for the assigned id, or `Draining`.
        respond_to: oneshot::Sender<Result<ConnectionId, RoomError>>,
    },

    /// A decoded control request from a connection.
    Control {
        from: ConnectionId,
        message: ControlMessage,
    },

    /// An audio frame from a connection.
    Audio { from: ConnectionId, frame: Bytes },

    /// A connection closed or was evicted.
    Disconnect { id: ConnectionId },

    /// Current counts, for logs and health.
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },

    /// Stop accepting connections and close every open one.
    Shutdown {
        /// Response channel carrying the number of connections closed.
        respond_to: oneshot::Sender<usize>,
    },
}

/// Controller status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerStatus {
    /// Registered connections.
    pub connections: usize,
    /// Live rooms.
    pub rooms: usize,
    /// Members across all rooms, sinks included.
    pub members: usize,
    /// Messages waiting in the controller mailbox.
    pub mailbox_depth: usize,
    /// Whether new connections are accepted.
    pub accepting_new: bool,
}
