//! Transport abstraction.
//!
//! A transport moves [`WireFrame`]s to and from one peer. The server drives a
//! WebSocket implementation; tests drive an in-memory one.

use crate::frame::WireFrame;
use std::future::Future;
use thiserror::Error;

/// Transport failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Reading from the peer failed.
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Writing to the peer failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// The peer is gone.
    #[error("Transport closed")]
    Closed,
}

/// A bidirectional frame stream to one peer.
pub trait Transport: Send + 'static {
    /// Next frame from the peer; `None` once the peer has closed.
    fn recv(&mut self) -> impl Future<Output = Option<Result<WireFrame, TransportError>>> + Send;

    /// Write one frame to the peer.
    fn send(&mut self, frame: WireFrame) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the transport. Errors are ignored; the peer may already be gone.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
