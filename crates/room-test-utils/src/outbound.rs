//! Outbound queue inspection.

use bytes::Bytes;
use room_protocol::codec::decode_control;
use room_protocol::{ControlMessage, WireFrame};
use tokio::sync::mpsc;

/// Capacity of [`outbound_queue`]; roomy enough that ordinary tests never
/// fill it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Receiving side of a connection's outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<WireFrame>,
}

/// Create a sender to register with the server and the queue to inspect.
#[must_use]
pub fn outbound_queue() -> (mpsc::Sender<WireFrame>, OutboundQueue) {
    outbound_queue_with_capacity(DEFAULT_QUEUE_CAPACITY)
}

/// Like [`outbound_queue`], holding at most `capacity` unread frames.
#[must_use]
pub fn outbound_queue_with_capacity(capacity: usize) -> (mpsc::Sender<WireFrame>, OutboundQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, OutboundQueue { rx })
}

impl OutboundQueue {
    /// Every frame queued so far, in order.
    pub fn drain(&mut self) -> Vec<WireFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Queued text frames decoded as control messages; binary frames are discarded.
    pub fn drain_controls(&mut self) -> Vec<ControlMessage> {
        self.drain()
            .into_iter()
            .filter_map(|frame| match frame {
                WireFrame::Text(text) => Some(decode_control(&text)),
                WireFrame::Binary(_) => None,
            })
            .collect()
    }

    /// Queued binary frames; text frames are discarded.
    pub fn drain_audio(&mut self) -> Vec<Bytes> {
        self.drain()
            .into_iter()
            .filter_map(|frame| match frame {
                WireFrame::Binary(data) => Some(data),
                WireFrame::Text(_) => None,
            })
            .collect()
    }

    /// Whether the server has dropped the sending side and nothing is left.
    pub fn is_closed(&mut self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}

/// First message with the given action.
#[must_use]
pub fn find_action<'a>(messages: &'a [ControlMessage], action: &str) -> Option<&'a ControlMessage> {
    messages.iter().find(|m| m.action == action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_splits_by_kind() {
        let (tx, mut queue) = outbound_queue();
        tx.try_send(WireFrame::control("ME.SUCCESS", ["abc"])).unwrap();
        tx.try_send(WireFrame::probe()).unwrap();

        let controls = queue.drain_controls();
        assert_eq!(controls.len(), 1);
        assert_eq!(find_action(&controls, "ME.SUCCESS").unwrap().data, "abc");
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_closed_after_sender_dropped() {
        let (tx, mut queue) = outbound_queue();
        assert!(!queue.is_closed());
        drop(tx);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_capacity_limits_unread_frames() {
        let (tx, mut queue) = outbound_queue_with_capacity(2);
        tx.try_send(WireFrame::probe()).unwrap();
        tx.try_send(WireFrame::probe()).unwrap();
        assert!(tx.try_send(WireFrame::probe()).is_err());

        assert_eq!(queue.drain().len(), 2);
        assert!(tx.try_send(WireFrame::probe()).is_ok());
    }
}
