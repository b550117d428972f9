//! Waits and settle delays between portal interactions

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded waits used by the pipeline.
///
/// Element readiness is awaited with `wait_for_visible`. The settle delays
/// only cover server-side effects the page gives no signal for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub wait_timeout_ms: u64,
    pub dropdown_timeout_ms: u64,
    pub after_login_ms: u64,
    pub after_upload_ms: u64,
    pub after_save_ms: u64,
    /// Vertical mouse-wheel distance used when scrolling the dialog
    pub scroll_delta: i32,
}

impl PacingConfig {
    /// No settle delays and short waits, for fixtures and tests.
    pub fn immediate() -> Self {
        Self {
            wait_timeout_ms: 50,
            dropdown_timeout_ms: 50,
            after_login_ms: 0,
            after_upload_ms: 0,
            after_save_ms: 0,
            ..Self::default()
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn after_login(&self) -> Duration {
        Duration::from_millis(self.after_login_ms)
    }

    pub fn after_upload(&self) -> Duration {
        Duration::from_millis(self.after_upload_ms)
    }

    pub fn after_save(&self) -> Duration {
        Duration::from_millis(self.after_save_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 15_000,
            dropdown_timeout_ms: 3_000,
            after_login_ms: 10_000,
            after_upload_ms: 5_000,
            after_save_ms: 10_000,
            scroll_delta: 500,
        }
    }
}
