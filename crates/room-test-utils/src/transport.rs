//! In-memory transport.
//!
//! [`channel_pair`] returns the server side, handed to a connection actor,
//! and the [`PeerEnd`] the test drives as the client.

use bytes::Bytes;
use room_protocol::codec::decode_control;
use room_protocol::frame::KEEPALIVE_PROBE;
use room_protocol::{ControlMessage, Transport, TransportError, WireFrame};
use tokio::sync::mpsc;

/// Server side of an in-memory connection.
#[derive(Debug)]
pub struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<WireFrame>,
    outbound: mpsc::UnboundedSender<WireFrame>,
}

/// Client side of an in-memory connection.
#[derive(Debug)]
pub struct PeerEnd {
    to_server: Option<mpsc::UnboundedSender<WireFrame>>,
    from_server: mpsc::UnboundedReceiver<WireFrame>,
}

/// Create a connected transport/peer pair.
#[must_use]
pub fn channel_pair() -> (ChannelTransport, PeerEnd) {
    let (to_server, inbound) = mpsc::unbounded_channel();
    let (outbound, from_server) = mpsc::unbounded_channel();
    (
        ChannelTransport { inbound, outbound },
        PeerEnd {
            to_server: Some(to_server),
            from_server,
        },
    )
}

impl Transport for ChannelTransport {
    async fn recv(&mut self) -> Option<Result<WireFrame, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn send(&mut self, frame: WireFrame) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

impl PeerEnd {
    /// Send a raw frame. Panics if the peer has closed.
    pub fn send(&self, frame: WireFrame) {
        self.to_server
            .as_ref()
            .expect("peer already closed")
            .send(frame)
            .expect("server side dropped");
    }

    /// Send a text frame verbatim.
    pub fn send_text(&self, text: &str) {
        self.send(WireFrame::Text(text.to_string()));
    }

    /// Send a control request built from an action and arguments.
    pub fn send_control(&self, action: &str, args: &[&str]) {
        self.send(WireFrame::control(action, args));
    }

    /// Send a binary audio frame.
    pub fn send_audio(&self, data: Bytes) {
        self.send(WireFrame::Binary(data));
    }

    /// Send a keepalive probe.
    pub fn send_probe(&self) {
        self.send(WireFrame::probe());
    }

    /// Acknowledge a keepalive probe.
    pub fn send_ack(&self) {
        self.send(WireFrame::ack());
    }

    /// Close the client side; the server sees end of stream.
    pub fn close(&mut self) {
        self.to_server = None;
    }

    /// Next frame from the server, or `None` once the server dropped the transport.
    pub async fn recv(&mut self) -> Option<WireFrame> {
        self.from_server.recv().await
    }

    /// Next frame, which must be a text control frame.
    pub async fn recv_control(&mut self) -> ControlMessage {
        match self.recv().await {
            Some(WireFrame::Text(text)) => decode_control(&text),
            other => panic!("expected control frame, got {other:?}"),
        }
    }

    /// Next frame, which must be binary.
    pub async fn recv_binary(&mut self) -> Bytes {
        match self.recv().await {
            Some(WireFrame::Binary(data)) => data,
            other => panic!("expected binary frame, got {other:?}"),
        }
    }

    /// Whether the next frame is a keepalive probe.
    pub async fn recv_probe(&mut self) -> bool {
        matches!(
            self.recv().await,
            Some(WireFrame::Binary(data)) if data.as_ref() == [KEEPALIVE_PROBE]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_cross_in_both_directions() {
        let (mut transport, mut peer) = channel_pair();

        peer.send_text("ME");
        assert_eq!(
            transport.recv().await,
            Some(Ok(WireFrame::Text("ME".to_string())))
        );

        transport.send(WireFrame::probe()).await.unwrap();
        assert!(peer.recv_probe().await);
    }

    #[tokio::test]
    async fn test_peer_close_ends_stream() {
        let (mut transport, mut peer) = channel_pair();
        peer.close();
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_transport_fails_peer_recv() {
        let (transport, mut peer) = channel_pair();
        drop(transport);
        assert!(peer.recv().await.is_none());
    }
}
