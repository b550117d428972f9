//! In-memory driver that plays back a scripted page.
//!
//! Elements are keyed by the rendered [`Locator`]. A locator ending in
//! `nth=i` or `last` that has no entry of its own is resolved against its
//! base entry, so a fixture only needs to describe lists once. In lenient mode
//! any unknown locator behaves like a single visible element.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{BrowserDriver, DriverError, DriverLauncher, Locator, Selector};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementState {
    pub count: usize,
    pub visible: bool,
    pub text: Option<String>,
    /// Actions on this element fail with the given reason
    pub failure: Option<String>,
}

impl ElementState {
    pub fn visible() -> Self {
        Self {
            count: 1,
            visible: true,
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            count: 1,
            visible: false,
            ..Self::default()
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedAction {
    Navigate(String),
    Click(String),
    Fill { locator: String, text: String },
    Upload { locator: String, files: Vec<PathBuf> },
    Scroll { dx: f64, dy: f64 },
    Close,
}

#[derive(Default)]
struct ScriptState {
    elements: HashMap<String, ElementState>,
    grow_on_click: HashMap<String, Vec<String>>,
    actions: Vec<RecordedAction>,
    navigation_failure: Option<String>,
    closed: bool,
}

#[derive(Default)]
pub struct ScriptedDriver {
    state: Mutex<ScriptState>,
    lenient: bool,
    latency: Duration,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown locators resolve to one visible element.
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }

    /// Every driver call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set(&self, locator: &Locator, element: ElementState) -> &Self {
        self.state.lock().elements.insert(locator.to_string(), element);
        self
    }

    /// Clicking `trigger` adds one element to `target`.
    pub fn on_click_grow(&self, trigger: &Locator, target: &Locator) -> &Self {
        self.state
            .lock()
            .grow_on_click
            .entry(trigger.to_string())
            .or_default()
            .push(target.to_string());
        self
    }

    pub fn fail_navigation(&self, reason: impl Into<String>) -> &Self {
        self.state.lock().navigation_failure = Some(reason.into());
        self
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.state.lock().actions.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                RecordedAction::Click(locator) => Some(locator.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                RecordedAction::Fill { locator, text } => Some((locator.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn resolve(&self, state: &ScriptState, locator: &Locator) -> ElementState {
        if let Some(element) = state.elements.get(&locator.to_string()) {
            return element.clone();
        }
        let selectors = locator.selectors();
        if let Some((tail, head)) = selectors.split_last() {
            if !head.is_empty() {
                let base = Locator::from_selectors(head.to_vec());
                match tail {
                    Selector::Nth(index) => {
                        let base = self.resolve(state, &base);
                        return narrow(base, *index);
                    }
                    Selector::Last => {
                        let base = self.resolve(state, &base);
                        let last = base.count.saturating_sub(1);
                        return narrow(base, last);
                    }
                    _ => {}
                }
            }
        }
        if self.lenient {
            ElementState::visible()
        } else {
            ElementState::absent()
        }
    }

    async fn pace(&self) -> Result<(), DriverError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.state.lock().closed {
            return Err(DriverError::SessionClosed);
        }
        Ok(())
    }

    fn actionable(
        &self,
        state: &ScriptState,
        action: &'static str,
        locator: &Locator,
    ) -> Result<(), DriverError> {
        let element = self.resolve(state, locator);
        let rendered = locator.to_string();
        if element.count == 0 {
            return Err(DriverError::NotFound(rendered));
        }
        if !element.visible {
            return Err(DriverError::NotVisible(rendered));
        }
        if let Some(reason) = element.failure {
            return Err(DriverError::action(action, rendered, reason));
        }
        Ok(())
    }
}

fn narrow(base: ElementState, index: usize) -> ElementState {
    if index < base.count {
        ElementState {
            count: 1,
            ..base
        }
    } else {
        ElementState::absent()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.pace().await?;
        let mut state = self.state.lock();
        if let Some(reason) = state.navigation_failure.clone() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason,
            });
        }
        state.actions.push(RecordedAction::Navigate(url.to_string()));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        self.pace().await?;
        let mut state = self.state.lock();
        self.actionable(&state, "click", locator)?;
        let rendered = locator.to_string();
        if let Some(targets) = state.grow_on_click.get(&rendered).cloned() {
            for target in targets {
                let element = state
                    .elements
                    .entry(target)
                    .or_insert_with(|| ElementState::visible().with_count(0));
                element.count += 1;
                element.visible = true;
            }
        }
        debug!(locator = %rendered, "scripted click");
        state.actions.push(RecordedAction::Click(rendered));
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        self.pace().await?;
        let mut state = self.state.lock();
        self.actionable(&state, "fill", locator)?;
        state.actions.push(RecordedAction::Fill {
            locator: locator.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
        self.pace().await?;
        let state = self.state.lock();
        Ok(self.resolve(&state, locator).count)
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, DriverError> {
        self.pace().await?;
        let state = self.state.lock();
        let element = self.resolve(&state, locator);
        Ok(element.count > 0 && element.visible)
    }

    async fn text_content(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
        self.pace().await?;
        let state = self.state.lock();
        let element = self.resolve(&state, locator);
        if element.count == 0 {
            return Err(DriverError::NotFound(locator.to_string()));
        }
        Ok(element.text)
    }

    async fn wait_for_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.pace().await?;
        let state = self.state.lock();
        let element = self.resolve(&state, locator);
        if element.count > 0 && element.visible {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                locator: locator.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn set_input_files(
        &self,
        locator: &Locator,
        files: &[PathBuf],
    ) -> Result<(), DriverError> {
        self.pace().await?;
        let mut state = self.state.lock();
        let element = self.resolve(&state, locator);
        if element.count == 0 {
            return Err(DriverError::NotFound(locator.to_string()));
        }
        if let Some(reason) = element.failure {
            return Err(DriverError::action("upload", locator.to_string(), reason));
        }
        state.actions.push(RecordedAction::Upload {
            locator: locator.to_string(),
            files: files.to_vec(),
        });
        Ok(())
    }

    async fn scroll(&self, dx: f64, dy: f64) -> Result<(), DriverError> {
        self.pace().await?;
        self.state.lock().actions.push(RecordedAction::Scroll { dx, dy });
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.actions.push(RecordedAction::Close);
        Ok(())
    }
}

type Factory = dyn Fn() -> Result<Arc<ScriptedDriver>, DriverError> + Send + Sync;

/// Hands out scripted sessions built by a factory closure.
pub struct ScriptedLauncher {
    factory: Box<Factory>,
    opened: AtomicUsize,
}

impl ScriptedLauncher {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<ScriptedDriver>, DriverError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            opened: AtomicUsize::new(0),
        }
    }

    /// Every session is the same shared driver, handy for inspecting actions.
    pub fn shared(driver: Arc<ScriptedDriver>) -> Self {
        Self::new(move || Ok(Arc::clone(&driver)))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(move || Err(DriverError::Launch(reason.clone())))
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverLauncher for ScriptedLauncher {
    async fn new_session(&self) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        let driver = (self.factory)()?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(driver)
    }
}
