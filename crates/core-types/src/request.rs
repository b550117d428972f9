use std::fmt;
use std::path::PathBuf;

/// Immutable input of one task.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutomationRequest {
    pub credentials: Credentials,
    pub basic: BasicInfo,
    pub payment: PaymentInfo,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub cost_items: Vec<CostItem>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub files: Vec<PathBuf>,
}

/// Portal login. The password never appears in `Debug` output.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicInfo {
    /// Reimbursement category, e.g. daily expenses.
    pub category: String,
    pub urgency: String,
    pub comment: String,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentInfo {
    pub business_dept: String,
    pub budget_dept: String,
    pub project_type: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub project: Option<String>,
    pub pay_company: String,
}

/// One cost-detail line item, filled into one table row.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostItem {
    pub category: String,
    pub name: String,
    pub comment: String,
    pub amount: String,
    pub bill_count: String,
}
