//! Observability for the room server.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields.
//! Connection ids are logged; display names and signaling payloads are not.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `rooms_connections_active` | Gauge | none |
//! | `rooms_active` | Gauge | none |
//! | `rooms_message_latency_seconds` | Histogram | `action` |
//! | `rooms_actor_mailbox_depth` | Gauge | `actor_type` |
//! | `rooms_audio_frames_total` | Counter | `outcome` |
//! | `rooms_signaling_relayed_total` | Counter | `status` |
//! | `rooms_keepalive_timeouts_total` | Counter | none |
//! | `rooms_outbound_evictions_total` | Counter | none |
//! | `rooms_errors_total` | Counter | `action`, `error_type` |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::init_metrics_recorder;
