//! Browser automation driver seam.
//!
//! The engine never renders pages itself. It talks to a browser through the
//! capability set in [`BrowserDriver`]: navigation, lazily-evaluated
//! [`Locator`]s, element actions and a few session-level calls. Concrete
//! drivers (Playwright bridges, WebDriver clients) live outside this workspace;
//! [`scripted::ScriptedDriver`] models a page in memory for fixtures and tests.

pub mod error;
pub mod locator;
pub mod scripted;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use error::DriverError;
pub use locator::{Locator, Selector};

/// One browser page owned by a single task.
///
/// Calls are not preemptible: once issued they run until the browser answers
/// or the driver's own timeout fires.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn click(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    /// Number of elements the locator currently matches.
    async fn count(&self, locator: &Locator) -> Result<usize, DriverError>;

    async fn is_visible(&self, locator: &Locator) -> Result<bool, DriverError>;

    async fn text_content(&self, locator: &Locator) -> Result<Option<String>, DriverError>;

    async fn wait_for_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn set_input_files(&self, locator: &Locator, files: &[PathBuf])
        -> Result<(), DriverError>;

    /// Mouse-wheel scroll of the page.
    async fn scroll(&self, dx: f64, dy: f64) -> Result<(), DriverError>;

    /// Release the page and everything behind it.
    async fn close(&self) -> Result<(), DriverError>;
}

/// Opens fresh browser sessions, one per task.
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn new_session(&self) -> Result<Arc<dyn BrowserDriver>, DriverError>;
}
