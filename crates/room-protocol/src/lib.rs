//! Wire protocol for Spatial Rooms.
//!
//! One persistent connection per client multiplexes two frame kinds:
//!
//! - **Text control frames**: `ACTION$/$arg1$/$arg2...`, answered with exactly
//!   one `ACTION.SUCCESS` or `ACTION.FAILURE`, plus server-initiated pushes.
//! - **Binary frames**: fixed-size PCM audio chunks, except for two reserved
//!   single-byte values used as keepalive probe and acknowledgment.

#![warn(clippy::pedantic)]

pub mod action;
pub mod codec;
pub mod frame;
pub mod payload;
pub mod transport;

pub use action::{Action, Push};
pub use codec::{CodecError, ControlMessage, SEPARATOR};
pub use frame::{Frame, WireFrame};
pub use transport::{Transport, TransportError};
