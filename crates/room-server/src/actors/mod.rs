//! Actor hierarchy for the room server.
//!
//! ```text
//! RoomControllerActor (singleton, owns the Coordinator)
//! └── N ConnectionActors (one per client transport, child cancel tokens)
//! ```
//!
//! Connection actors never touch room state; they forward frames to the
//! controller and write whatever the controller queues for them.

pub mod connection;
pub mod controller;
pub mod messages;
pub mod metrics;

pub use connection::{CloseReason, ConnectionActor};
pub use controller::RoomControllerHandle;
pub use messages::ControllerStatus;
pub use metrics::{ActorType, MailboxLevel, MailboxMonitor};

use tokio::time::Instant;

/// Resolves at `deadline`, or never when there is none.
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
