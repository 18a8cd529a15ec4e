//! Common configuration types for Spatial Rooms components.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "room_server=debug,tower_http=debug";

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Log filter directive (`RUST_LOG` syntax)
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_FILTER.to_string(),
            json_logs: false,
        }
    }
}

impl ObservabilityConfig {
    /// Load observability settings from a variable map.
    ///
    /// Reads `RUST_LOG` for the filter and `ROOMS_LOG_JSON` (`true`/`1`) for
    /// structured output. Unrecognized values fall back to defaults.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_level = vars
            .get("RUST_LOG")
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let json_logs = vars
            .get("ROOMS_LOG_JSON")
            .is_some_and(|s| matches!(s.trim(), "true" | "1" | "TRUE" | "True"));

        Self {
            log_level,
            json_logs,
        }
    }
}
