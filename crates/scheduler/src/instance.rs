//! Runtime half of a task: its request, browser session and cancel signal.

use std::sync::Arc;
use std::time::Duration;

use autofill_core_types::{AutomationRequest, TaskId};
use autofill_driver::BrowserDriver;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::channel::CancelSignal;

/// Holder of the browser session a task runs against.
///
/// Attach and release both go through the same async mutex; release only ever
/// runs after the pipeline future has returned.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<Mutex<Option<Arc<dyn BrowserDriver>>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn attach(&self, driver: Arc<dyn BrowserDriver>) {
        let previous = self.inner.lock().await.replace(driver);
        if previous.is_some() {
            warn!("session slot already held a driver, replacing it");
        }
    }

    /// Closes and drops the session. Returns false when nothing was attached.
    pub async fn release(&self, timeout: Duration) -> bool {
        let mut slot = self.inner.lock().await;
        let Some(driver) = slot.take() else {
            return false;
        };
        match tokio::time::timeout(timeout, driver.close()).await {
            Ok(Ok(())) => debug!("browser session released"),
            Ok(Err(err)) => warn!(error = %err, "closing browser session failed"),
            Err(_) => warn!(timeout_ms = timeout.as_millis() as u64, "closing browser session timed out"),
        }
        true
    }
}

pub struct TaskInstance {
    pub id: TaskId,
    pub request: Arc<AutomationRequest>,
    pub session: SessionSlot,
    pub cancel: CancelSignal,
}

impl TaskInstance {
    pub fn new(id: TaskId, request: AutomationRequest) -> Self {
        Self {
            id,
            request: Arc::new(request),
            session: SessionSlot::new(),
            cancel: CancelSignal::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use autofill_driver::scripted::ScriptedDriver;

    use super::*;

    #[tokio::test]
    async fn release_closes_once() {
        let driver = Arc::new(ScriptedDriver::lenient());
        let slot = SessionSlot::new();
        slot.attach(driver.clone()).await;

        assert!(slot.release(Duration::from_secs(1)).await);
        assert!(!slot.release(Duration::from_secs(1)).await);
        assert!(driver.is_closed());
    }
}
