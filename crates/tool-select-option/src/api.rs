use async_trait::async_trait;
use autofill_core_types::ProgressSink;
use autofill_driver::BrowserDriver;

use crate::errors::SelectError;
use crate::model::{SelectOutcome, SelectParams};
use crate::policy::SelectPolicyView;
use crate::runner::{execute, RuntimeDeps};

#[async_trait]
pub trait SelectTool: Send + Sync {
    /// Opens the dropdown (if a trigger is given) and clicks the best option.
    ///
    /// An empty or fully hidden option list is not an error: the skip is
    /// reported through `progress` and [`SelectOutcome::Skipped`] is returned.
    async fn select(
        &self,
        driver: &dyn BrowserDriver,
        params: &SelectParams,
        progress: &dyn ProgressSink,
    ) -> Result<SelectOutcome, SelectError>;
}

pub struct SelectToolBuilder {
    policy: SelectPolicyView,
}

impl SelectToolBuilder {
    pub fn new(policy: SelectPolicyView) -> Self {
        Self { policy }
    }

    pub fn build(self) -> DropdownSelect {
        DropdownSelect {
            policy: self.policy,
        }
    }
}

impl Default for SelectToolBuilder {
    fn default() -> Self {
        Self::new(SelectPolicyView::default())
    }
}

pub struct DropdownSelect {
    policy: SelectPolicyView,
}

#[async_trait]
impl SelectTool for DropdownSelect {
    async fn select(
        &self,
        driver: &dyn BrowserDriver,
        params: &SelectParams,
        progress: &dyn ProgressSink,
    ) -> Result<SelectOutcome, SelectError> {
        execute(
            params,
            RuntimeDeps {
                driver,
                progress,
                policy: &self.policy,
            },
        )
        .await
    }
}
