//! Mailbox depth monitoring.
//!
//! | Actor Type | Normal | Warning   | Critical |
//! |------------|--------|-----------|----------|
//! | Controller | < 500  | 500-2000  | > 2000   |
//! | Connection | < 64   | 64-192    | > 192    |
//!
//! The controller mailbox carries every control and audio frame on the
//! server, so its thresholds are higher. A connection's mailbox is its
//! outbound frame queue, bounded at 256 frames.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Mailbox depth thresholds for the controller actor.
pub const CONTROLLER_MAILBOX_NORMAL: usize = 500;
pub const CONTROLLER_MAILBOX_WARNING: usize = 2000;

/// Mailbox depth thresholds for connection actors.
pub const CONNECTION_MAILBOX_NORMAL: usize = 64;
pub const CONNECTION_MAILBOX_WARNING: usize = 192;

/// Actor type for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorType {
    /// `RoomControllerActor` (singleton).
    Controller,
    /// `ConnectionActor` (one per client connection).
    Connection,
}

impl ActorType {
    /// Returns the actor type as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorType::Controller => "controller",
            ActorType::Connection => "connection",
        }
    }

    #[must_use]
    pub const fn warning_threshold(&self) -> usize {
        match self {
            ActorType::Controller => CONTROLLER_MAILBOX_WARNING,
            ActorType::Connection => CONNECTION_MAILBOX_WARNING,
        }
    }

    #[must_use]
    pub const fn normal_threshold(&self) -> usize {
        match self {
            ActorType::Controller => CONTROLLER_MAILBOX_NORMAL,
            ActorType::Connection => CONNECTION_MAILBOX_NORMAL,
        }
    }
}

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Tracks queue depth for one actor mailbox.
///
/// Senders call [`record_enqueue`](Self::record_enqueue) before sending and
/// [`record_drop`](Self::record_drop) if the send fails; the actor calls
/// [`record_dequeue`](Self::record_dequeue). Queues whose length can be read
/// directly report it through [`observe_depth`](Self::observe_depth).
#[derive(Debug)]
pub struct MailboxMonitor {
    actor_type: ActorType,
    actor_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
    messages_dropped: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    /// Record a message being added to the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.after_depth_change(new_depth);
    }

    /// Record a message being taken from the mailbox and processed.
    pub fn record_dequeue(&self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a counted message that never reached the mailbox.
    pub fn record_drop(&self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            target: "rooms.actor.mailbox",
            actor_type = self.actor_type.as_str(),
            actor_id = %self.actor_id,
            dropped = self.messages_dropped.load(Ordering::Relaxed),
            "Message dropped, mailbox closed"
        );
    }

    /// Record a sampled queue length.
    pub fn observe_depth(&self, depth: usize) {
        self.depth.store(depth, Ordering::Relaxed);
        self.after_depth_change(depth);
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        self.level_for_depth(self.current_depth())
    }

    fn after_depth_change(&self, new_depth: usize) {
        let previous_peak = self.peak_depth.fetch_max(new_depth, Ordering::Relaxed);

        match self.level_for_depth(new_depth) {
            MailboxLevel::Critical => warn!(
                target: "rooms.actor.mailbox",
                actor_type = self.actor_type.as_str(),
                actor_id = %self.actor_id,
                depth = new_depth,
                threshold = self.actor_type.warning_threshold(),
                "Mailbox depth critical"
            ),
            // Log once per new high-water mark in the warning band
            MailboxLevel::Warning if new_depth > previous_peak => debug!(
                target: "rooms.actor.mailbox",
                actor_type = self.actor_type.as_str(),
                actor_id = %self.actor_id,
                depth = new_depth,
                "Mailbox depth elevated"
            ),
            MailboxLevel::Warning | MailboxLevel::Normal => {}
        }
    }

    fn level_for_depth(&self, depth: usize) -> MailboxLevel {
        if depth > self.actor_type.warning_threshold() {
            MailboxLevel::Critical
        } else if depth >= self.actor_type.normal_threshold() {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}
