//! Connection registry.
//!
//! Tracks every live connection by its generated id together with its
//! outbound channel and optional display name. The registry is the only owner
//! of outbound senders: everything else addresses connections by id, and a
//! missing id simply means the target is no longer reachable.
//!
//! Outbound queues are bounded. Audio is best-effort and is shed first;
//! a connection that cannot take a control frame is closed.

use crate::observability::metrics::record_outbound_eviction;
use bytes::Bytes;
use common::types::ConnectionId;
use room_protocol::WireFrame;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{trace, warn};

/// Frames a connection's outbound queue holds.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Slots kept free for control frames; audio is dropped once only these remain.
pub const CONTROL_RESERVE: usize = 32;

/// Outbound half of a connection, drained by its connection actor.
pub type ConnectionSender = mpsc::Sender<WireFrame>;

/// Result of queueing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Frame queued.
    Queued,
    /// Audio frame dropped because the reader is behind.
    Dropped,
    /// Control frame did not fit; the connection was removed.
    Evicted,
    /// Unknown or closed connection.
    Unreachable,
}

impl Delivery {
    #[must_use]
    pub fn is_queued(self) -> bool {
        self == Delivery::Queued
    }
}

/// A registered connection.
#[derive(Debug)]
pub struct ConnectionEntry {
    sender: ConnectionSender,
    name: Option<String>,
}

impl ConnectionEntry {
    /// Display name, if one has been set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the receiving side is still alive.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn try_send(&self, frame: WireFrame) -> Delivery {
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Evicted,
            Err(TrySendError::Closed(_)) => Delivery::Unreachable,
        }
    }
}

/// Registry of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return its fresh id.
    pub fn register(&mut self, sender: ConnectionSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections
            .insert(id, ConnectionEntry { sender, name: None });
        id
    }

    /// Look up a connection.
    #[must_use]
    pub fn lookup(&self, id: ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(&id)
    }

    /// Whether the connection is registered and its receiver alive.
    #[must_use]
    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.connections.get(&id).is_some_and(ConnectionEntry::is_open)
    }

    /// Remove a connection. Returns the entry if it was registered.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<ConnectionEntry> {
        self.connections.remove(&id)
    }

    /// Set a connection's display name. Returns false if unknown.
    pub fn set_name(&mut self, id: ConnectionId, name: impl Into<String>) -> bool {
        match self.connections.get_mut(&id) {
            Some(entry) => {
                entry.name = Some(name.into());
                true
            }
            None => false,
        }
    }

    /// Current display name of a connection.
    #[must_use]
    pub fn name(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).and_then(ConnectionEntry::name)
    }

    /// Queue a control frame for one connection.
    ///
    /// A connection whose queue is full is removed: dropping its sender ends
    /// the connection actor once it has written what is already queued.
    pub fn send(&mut self, id: ConnectionId, frame: WireFrame) -> Delivery {
        let Some(entry) = self.connections.get(&id) else {
            trace!(target: "rooms.registry", connection_id = %id, "Dropping frame for unknown connection");
            return Delivery::Unreachable;
        };
        let delivery = entry.try_send(frame);
        match delivery {
            Delivery::Evicted => self.evict(id),
            Delivery::Unreachable => {
                trace!(target: "rooms.registry", connection_id = %id, "Dropping frame for closed connection");
            }
            Delivery::Queued | Delivery::Dropped => {}
        }
        delivery
    }

    /// Queue an audio frame for one connection.
    ///
    /// Audio never takes the last [`CONTROL_RESERVE`] slots; a reader that
    /// far behind loses the frame instead.
    pub fn send_audio(&self, id: ConnectionId, frame: &Bytes) -> Delivery {
        let Some(entry) = self.connections.get(&id) else {
            return Delivery::Unreachable;
        };
        if entry.sender.is_closed() {
            return Delivery::Unreachable;
        }
        if entry.sender.capacity() <= CONTROL_RESERVE {
            trace!(target: "rooms.registry", connection_id = %id, "Outbound queue behind, audio frame dropped");
            return Delivery::Dropped;
        }
        match entry.try_send(WireFrame::Binary(frame.clone())) {
            Delivery::Evicted => Delivery::Dropped,
            other => other,
        }
    }

    /// Queue a control frame for every registered connection. Returns the
    /// delivery count.
    pub fn broadcast(&mut self, frame: &WireFrame) -> usize {
        let mut delivered = 0;
        let mut full = Vec::new();
        for (id, entry) in &self.connections {
            match entry.try_send(frame.clone()) {
                Delivery::Queued => delivered += 1,
                Delivery::Evicted => full.push(*id),
                Delivery::Dropped | Delivery::Unreachable => {}
            }
        }
        for id in full {
            self.evict(id);
        }
        delivered
    }

    /// Ids of every registered connection.
    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.keys().copied()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn evict(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
        record_outbound_eviction();
        warn!(
            target: "rooms.registry",
            connection_id = %id,
            capacity = OUTBOUND_QUEUE_CAPACITY,
            "Outbound queue full, closing connection"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn queue() -> (ConnectionSender, mpsc::Receiver<WireFrame>) {
        mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
    }

    fn control(n: usize) -> WireFrame {
        WireFrame::control("ROOM.LIST.SUCCESS", [n.to_string()])
    }

    #[test]
    fn test_register_lookup_unregister() {
        let mut registry = ConnectionRegistry::new();
        let (tx, _rx) = queue();

        let id = registry.register(tx);
        assert!(registry.lookup(id).is_some());
        assert!(registry.is_open(id));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id).is_some());
        assert!(registry.lookup(id).is_none());
        assert!(!registry.is_open(id));
        assert!(registry.unregister(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = ConnectionRegistry::new();
        let (tx, _rx) = queue();
        let a = registry.register(tx.clone());
        let b = registry.register(tx);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_name() {
        let mut registry = ConnectionRegistry::new();
        let (tx, _rx) = queue();
        let id = registry.register(tx);

        assert_eq!(registry.name(id), None);
        assert!(registry.set_name(id, "alice"));
        assert_eq!(registry.name(id), Some("alice"));
        assert!(registry.set_name(id, "bob"));
        assert_eq!(registry.name(id), Some("bob"));
        assert!(!registry.set_name(ConnectionId::new(), "ghost"));
    }

    #[test]
    fn test_send_to_missing_or_closed_is_dropped() {
        let mut registry = ConnectionRegistry::new();
        assert_eq!(
            registry.send(ConnectionId::new(), control(0)),
            Delivery::Unreachable
        );

        let (tx, rx) = queue();
        let id = registry.register(tx);
        drop(rx);
        assert!(!registry.is_open(id));
        assert_eq!(registry.send(id, control(0)), Delivery::Unreachable);
        assert_eq!(
            registry.send_audio(id, &Bytes::from_static(&[1, 2])),
            Delivery::Unreachable
        );
    }

    #[test]
    fn test_send_and_broadcast_deliver() {
        let mut registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = queue();
        let (tx_b, mut rx_b) = queue();
        let (tx_c, rx_c) = queue();
        let a = registry.register(tx_a);
        registry.register(tx_b);
        registry.register(tx_c);
        drop(rx_c);

        assert!(registry.send(a, control(1)).is_queued());
        assert_eq!(rx_a.try_recv().unwrap(), control(1));

        let delivered = registry.broadcast(&control(2));
        assert_eq!(delivered, 2);
        assert_eq!(rx_a.try_recv().unwrap(), control(2));
        assert_eq!(rx_b.try_recv().unwrap(), control(2));
    }

    #[test]
    fn test_audio_dropped_for_slow_reader_control_still_queued() {
        let mut registry = ConnectionRegistry::new();
        let (tx, mut rx) = queue();
        let id = registry.register(tx);
        let frame = Bytes::from(vec![0u8; 4096]);

        let outcomes: Vec<Delivery> = (0..OUTBOUND_QUEUE_CAPACITY * 4)
            .map(|_| registry.send_audio(id, &frame))
            .collect();
        let queued = outcomes.iter().filter(|d| d.is_queued()).count();
        assert_eq!(queued, OUTBOUND_QUEUE_CAPACITY - CONTROL_RESERVE);
        assert!(outcomes
            .iter()
            .all(|d| matches!(d, Delivery::Queued | Delivery::Dropped)));

        // The reserve still takes control frames
        for n in 0..CONTROL_RESERVE {
            assert!(registry.send(id, control(n)).is_queued());
        }
        assert!(registry.is_open(id));

        let mut audio = 0;
        let mut controls = 0;
        while let Ok(frame) = rx.try_recv() {
            match frame {
                WireFrame::Binary(_) => audio += 1,
                WireFrame::Text(_) => controls += 1,
            }
        }
        assert_eq!(audio, OUTBOUND_QUEUE_CAPACITY - CONTROL_RESERVE);
        assert_eq!(controls, CONTROL_RESERVE);
    }

    #[test]
    fn test_full_control_queue_evicts_connection() {
        let mut registry = ConnectionRegistry::new();
        let (tx, mut rx) = queue();
        let (tx_other, _rx_other) = queue();
        let id = registry.register(tx);
        registry.register(tx_other);

        for n in 0..OUTBOUND_QUEUE_CAPACITY {
            assert!(registry.send(id, control(n)).is_queued());
        }
        assert_eq!(registry.broadcast(&control(0)), 1);
        assert!(registry.lookup(id).is_none());
        assert_eq!(registry.len(), 1);

        // Queued frames are still readable, then the queue reports closed
        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, OUTBOUND_QUEUE_CAPACITY);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
