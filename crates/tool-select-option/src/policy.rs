use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectPolicyView {
    /// Pick the first visible option when nothing matches the label.
    pub fallback_to_first_visible: bool,
    pub timeouts: SelectTimeouts,
}

impl Default for SelectPolicyView {
    fn default() -> Self {
        Self {
            fallback_to_first_visible: true,
            timeouts: SelectTimeouts::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectTimeouts {
    pub trigger_ms: u64,
    /// Grace period for the option list to render after the trigger click.
    pub options_ms: u64,
}

impl SelectTimeouts {
    pub fn trigger(&self) -> Duration {
        Duration::from_millis(self.trigger_ms)
    }

    pub fn options(&self) -> Duration {
        Duration::from_millis(self.options_ms)
    }
}

impl Default for SelectTimeouts {
    fn default() -> Self {
        Self {
            trigger_ms: 10_000,
            options_ms: 3_000,
        }
    }
}
