//! Room state: directory, members and sink recorders.

pub mod directory;
pub mod member;
pub mod sink;

pub use directory::{Departure, Room, RoomDirectory};
pub use member::{Member, Position};
pub use sink::{AppendOutcome, SinkRecorder, SinkState};
