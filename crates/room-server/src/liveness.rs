//! Keepalive state for one connection.
//!
//! The server probes every `interval`; each probe must be acknowledged within
//! `timeout` or the connection is evicted. Only one probe is outstanding at a
//! time: ticks that land while waiting for an ack do nothing.

use crate::config::Config;
use std::time::Duration;
use tokio::time::Instant;

/// Probe period and ack deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&Config> for KeepaliveSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.keepalive_interval(),
            timeout: config.keepalive_timeout(),
        }
    }
}

impl KeepaliveSettings {
    /// A fresh monitor with these settings.
    #[must_use]
    pub fn monitor(&self) -> KeepaliveMonitor {
        KeepaliveMonitor::new(self.interval, self.timeout)
    }
}

/// What the connection should do after a keepalive event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveAction {
    /// Send a probe now
    SendProbe,
    /// Nothing to do
    Wait,
    /// The outstanding probe timed out
    Evict,
}

/// Probe/ack bookkeeping.
#[derive(Debug, Clone)]
pub struct KeepaliveMonitor {
    interval: Duration,
    timeout: Duration,
    probe_sent_at: Option<Instant>,
}

impl KeepaliveMonitor {
    #[must_use]
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            probe_sent_at: None,
        }
    }

    /// Probe period.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Called on each interval tick.
    pub fn on_tick(&mut self, now: Instant) -> KeepaliveAction {
        match self.probe_sent_at {
            Some(_) if self.is_expired(now) => KeepaliveAction::Evict,
            Some(_) => KeepaliveAction::Wait,
            None => {
                self.probe_sent_at = Some(now);
                KeepaliveAction::SendProbe
            }
        }
    }

    /// Called when the peer acknowledges a probe.
    pub fn on_ack(&mut self) {
        self.probe_sent_at = None;
    }

    /// When the outstanding probe expires, if one is outstanding.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.probe_sent_at.map(|sent| sent + self.timeout)
    }

    /// Whether the outstanding probe has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Whether a probe is awaiting its ack.
    #[must_use]
    pub fn is_awaiting_ack(&self) -> bool {
        self.probe_sent_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> KeepaliveMonitor {
        KeepaliveMonitor::new(Duration::from_secs(15), Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_then_ack_resets() {
        let mut m = monitor();
        let t0 = Instant::now();

        assert_eq!(m.on_tick(t0), KeepaliveAction::SendProbe);
        assert!(m.is_awaiting_ack());
        assert_eq!(m.deadline(), Some(t0 + Duration::from_secs(10)));

        m.on_ack();
        assert!(!m.is_awaiting_ack());
        assert_eq!(m.deadline(), None);
        assert_eq!(
            m.on_tick(t0 + Duration::from_secs(15)),
            KeepaliveAction::SendProbe
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_outstanding_probe() {
        let mut m = KeepaliveMonitor::new(Duration::from_secs(1), Duration::from_secs(10));
        let t0 = Instant::now();

        assert_eq!(m.on_tick(t0), KeepaliveAction::SendProbe);
        assert_eq!(
            m.on_tick(t0 + Duration::from_secs(1)),
            KeepaliveAction::Wait
        );
        assert_eq!(m.deadline(), Some(t0 + Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ack_evicts() {
        let mut m = monitor();
        let t0 = Instant::now();

        m.on_tick(t0);
        assert!(!m.is_expired(t0 + Duration::from_secs(9)));
        assert!(m.is_expired(t0 + Duration::from_secs(10)));
        assert_eq!(
            m.on_tick(t0 + Duration::from_secs(15)),
            KeepaliveAction::Evict
        );
    }

    #[test]
    fn test_settings_from_config() {
        let settings = KeepaliveSettings::from(&Config::default());
        assert_eq!(settings.interval, Duration::from_secs(15));
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert!(!settings.monitor().is_awaiting_ack());
    }

    #[test]
    fn test_ack_without_probe_is_harmless() {
        let mut m = monitor();
        m.on_ack();
        assert!(!m.is_awaiting_ack());
        assert_eq!(m.interval(), Duration::from_secs(15));
    }
}
