//! Room Server Library
//!
//! Core of the Spatial Rooms server: clients hold one persistent connection,
//! create or join rooms on a 2D grid, exchange WebRTC signaling through the
//! server, and stream PCM audio that is fanned out to the other members of
//! their room. Sinks are server-side members that record room audio and play
//! it back on request.
//!
//! # Architecture
//!
//! ```text
//! RoomControllerActor (singleton)
//! └── Coordinator
//!     ├── ConnectionRegistry  (connection id → outbound queue, display name)
//!     └── RoomDirectory       (rooms, members, connection → room seats)
//!
//! ConnectionActor (one per WebSocket)
//! ├── forwards control/audio frames to the controller
//! ├── writes queued outbound frames to the socket
//! └── runs the keepalive probe/ack exchange
//! ```
//!
//! # Modules
//!
//! - [`actors`] - controller and connection actors
//! - [`config`] - service configuration from environment
//! - [`coordinator`] - request dispatch over registry and directory
//! - [`errors`] - error types with client-safe messages
//! - [`liveness`] - keepalive bookkeeping
//! - [`observability`] - health endpoints and metrics
//! - [`registry`] - live connections
//! - [`relay`] - audio fan-out, sink playback and signaling targets
//! - [`rooms`] - rooms, members and sink recorders
//! - [`transport`] - WebSocket transport and router

#![warn(clippy::pedantic)]

pub mod actors;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod liveness;
pub mod observability;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod transport;
