//! Metrics definitions for the room server.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rooms_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `actor_type`: 2 values (controller, connection)
//! - `action`: bounded by the request action set plus `unknown`
//! - `outcome`: bounded audio dispositions
//! - `status`: relayed, rejected
//! - `error_type`: bounded by `RoomError::error_type_label`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Audio frame forwarded to a participant.
pub const AUDIO_FORWARDED: &str = "forwarded";
/// Audio frame appended to a recording sink.
pub const AUDIO_RECORDED: &str = "recorded";
/// Audio frame dropped because a sink was full.
pub const AUDIO_OVERFLOW: &str = "overflow";
/// Audio frame from a connection in no room.
pub const AUDIO_UNSEATED: &str = "unseated";
/// Audio chunk emitted by sink playback.
pub const AUDIO_PLAYBACK: &str = "playback";
/// Audio frame shed because the receiving connection is behind.
pub const AUDIO_DROPPED: &str = "dropped";

/// Initialize the Prometheus recorder and return the handle used to render
/// `/metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("rooms_message".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250,
            ],
        )
        .map_err(|e| format!("Failed to set message latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Set the number of registered connections.
///
/// Metric: `rooms_connections_active`
pub fn set_connections_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rooms_connections_active").set(count as f64);
}

/// Set the number of rooms.
///
/// Metric: `rooms_active`
pub fn set_rooms_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rooms_active").set(count as f64);
}

/// Set the mailbox depth for an actor type.
///
/// Metric: `rooms_actor_mailbox_depth`
/// Labels: `actor_type`
pub fn set_actor_mailbox_depth(actor_type: &str, depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rooms_actor_mailbox_depth", "actor_type" => actor_type.to_string())
        .set(depth as f64);
}

/// Record control request handling latency inside the controller.
///
/// Metric: `rooms_message_latency_seconds`
/// Labels: `action`
pub fn record_message_latency(action: &str, duration: Duration) {
    histogram!("rooms_message_latency_seconds", "action" => action.to_string())
        .record(duration.as_secs_f64());
}

/// Count audio frames by disposition.
///
/// Metric: `rooms_audio_frames_total`
/// Labels: `outcome`
pub fn record_audio_frames(outcome: &'static str, count: u64) {
    if count > 0 {
        counter!("rooms_audio_frames_total", "outcome" => outcome).increment(count);
    }
}

/// Count signaling relay attempts.
///
/// Metric: `rooms_signaling_relayed_total`
/// Labels: `status` (relayed, rejected)
pub fn record_signaling(status: &'static str) {
    counter!("rooms_signaling_relayed_total", "status" => status).increment(1);
}

/// Count connections evicted for a missed keepalive.
///
/// Metric: `rooms_keepalive_timeouts_total`
pub fn record_keepalive_timeout() {
    counter!("rooms_keepalive_timeouts_total").increment(1);
}

/// Count connections closed because a control frame did not fit their queue.
///
/// Metric: `rooms_outbound_evictions_total`
pub fn record_outbound_eviction() {
    counter!("rooms_outbound_evictions_total").increment(1);
}

/// Count failed requests.
///
/// Metric: `rooms_errors_total`
/// Labels: `action`, `error_type`
pub fn record_error(action: &str, error_type: &'static str) {
    counter!("rooms_errors_total",
        "action" => action.to_string(),
        "error_type" => error_type
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_recording_functions_without_recorder() {
        set_connections_active(0);
        set_rooms_active(3);
        set_actor_mailbox_depth("controller", 12);
        record_message_latency("ROOM.NEW", Duration::from_micros(80));
        record_audio_frames(AUDIO_FORWARDED, 2);
        record_signaling("relayed");
        record_keepalive_timeout();
        record_error("ROOM.JOIN", "room_not_found");
    }

    #[test]
    fn test_metric_names_and_values() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            set_connections_active(4);
            set_rooms_active(2);
            record_audio_frames(AUDIO_RECORDED, 3);
            record_audio_frames(AUDIO_OVERFLOW, 0);
            record_keepalive_timeout();
            record_error("ROOM.MOVE", "member_not_found");
        });

        let metrics = snapshotter.snapshot().into_vec();
        let find = |name: &str| {
            metrics
                .iter()
                .find(|(key, _, _, _)| key.key().name() == name)
                .map(|(_, _, _, value)| value.clone())
        };

        assert_eq!(
            find("rooms_connections_active"),
            Some(&DebugValue::Gauge(4.0.into()))
        );
        assert_eq!(find("rooms_active"), Some(&DebugValue::Gauge(2.0.into())));
        assert_eq!(
            find("rooms_audio_frames_total"),
            Some(&DebugValue::Counter(3))
        );
        assert_eq!(
            find("rooms_keepalive_timeouts_total"),
            Some(&DebugValue::Counter(1))
        );
        assert_eq!(find("rooms_errors_total"), Some(&DebugValue::Counter(1)));
    }
}
