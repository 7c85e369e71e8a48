//! Common configuration types for Reserva components.

use serde::{Deserialize, Serialize};

/// Default `tracing` filter directive when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "reserva=info,common=info";

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive (e.g. `reserva=debug`)
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
    /// Build from an optional filter directive, falling back to the default.
    #[must_use]
    pub fn new(log_level: Option<String>, json_logs: bool) -> Self {
        Self {
            log_level: log_level
                .filter(|level| !level.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            json_logs,
        }
    }
}
