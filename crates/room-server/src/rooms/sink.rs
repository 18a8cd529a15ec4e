//! Audio sink recording buffer.
//!
//! A sink records room audio between `START` and `STOP` and replays it once
//! on `PLAY`:
//!
//! ```text
//! EMPTY --start--> RECORDING --stop--> RECORDED --play--> EMPTY
//! ```
//!
//! Frames are accumulated only while recording. Frames that would grow the
//! buffer past its cap are dropped whole; the sink keeps recording.

use bytes::{Bytes, BytesMut};
use std::fmt;

/// Sink recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Nothing recorded
    Empty,
    /// Accumulating audio
    Recording,
    /// Holding a recording, ready to play
    Recorded,
}

impl SinkState {
    /// Wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SinkState::Empty => "EMPTY",
            SinkState::Recording => "RECORDING",
            SinkState::Recorded => "RECORDED",
        }
    }
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of offering a frame to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Frame appended
    Recorded,
    /// Sink is not recording; frame ignored
    Ignored,
    /// Frame would exceed the cap; dropped
    Overflow,
}

/// Recording buffer and state machine for one sink.
#[derive(Debug)]
pub struct SinkRecorder {
    state: SinkState,
    buffer: BytesMut,
    limit: usize,
}

impl SinkRecorder {
    /// Create an empty recorder capped at `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            state: SinkState::Empty,
            buffer: BytesMut::new(),
            limit,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Bytes recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// `EMPTY -> RECORDING`.
    ///
    /// # Errors
    ///
    /// Returns the current state when it is not `EMPTY`.
    pub fn start(&mut self) -> Result<(), SinkState> {
        self.transition(SinkState::Empty, SinkState::Recording)
    }

    /// `RECORDING -> RECORDED`.
    ///
    /// # Errors
    ///
    /// Returns the current state when it is not `RECORDING`.
    pub fn stop(&mut self) -> Result<(), SinkState> {
        self.transition(SinkState::Recording, SinkState::Recorded)
    }

    /// `RECORDED -> EMPTY`, handing back the recording.
    ///
    /// # Errors
    ///
    /// Returns the current state when it is not `RECORDED`.
    pub fn take_recording(&mut self) -> Result<Bytes, SinkState> {
        self.transition(SinkState::Recorded, SinkState::Empty)?;
        Ok(self.buffer.split().freeze())
    }

    /// Offer an audio frame.
    pub fn append(&mut self, frame: &[u8]) -> AppendOutcome {
        if self.state != SinkState::Recording {
            return AppendOutcome::Ignored;
        }
        if self.buffer.len().saturating_add(frame.len()) > self.limit {
            return AppendOutcome::Overflow;
        }
        self.buffer.extend_from_slice(frame);
        AppendOutcome::Recorded
    }

    fn transition(&mut self, from: SinkState, to: SinkState) -> Result<(), SinkState> {
        if self.state != from {
            return Err(self.state);
        }
        self.state = to;
        Ok(())
    }
}
