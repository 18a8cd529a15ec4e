//! # Room Test Utilities
//!
//! Shared test utilities for the room server.
//!
//! ## Modules
//!
//! - `transport` - in-memory [`Transport`](room_protocol::Transport) and the
//!   peer end a test drives
//! - `outbound` - inspection of a connection's outbound frame queue
//! - `fixtures` - PCM audio data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_test_utils::outbound::outbound_queue;
//!
//! let (tx, mut queue) = outbound_queue();
//! let id = coordinator.connect(tx);
//! coordinator.handle_text(id, "ME");
//! assert_eq!(queue.drain_controls()[0].action, "ME.SUCCESS");
//! ```

pub mod fixtures;
pub mod outbound;
pub mod transport;

pub use fixtures::*;
pub use outbound::{
    find_action, outbound_queue, outbound_queue_with_capacity, OutboundQueue,
    DEFAULT_QUEUE_CAPACITY,
};
pub use transport::{channel_pair, ChannelTransport, PeerEnd};
