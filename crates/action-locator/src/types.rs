//! Table layout and logical columns

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical columns of the cost-detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostColumn {
    Category,
    Name,
    Comment,
    Amount,
    BillCount,
}

impl CostColumn {
    pub const ALL: [CostColumn; 5] = [
        CostColumn::Category,
        CostColumn::Name,
        CostColumn::Comment,
        CostColumn::Amount,
        CostColumn::BillCount,
    ];

    /// Physical cell offset inside a body row. Offset 0 is the row selector.
    pub fn offset(self) -> usize {
        match self {
            CostColumn::Category => 1,
            CostColumn::Name => 2,
            CostColumn::Comment => 3,
            CostColumn::Amount => 4,
            CostColumn::BillCount => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CostColumn::Category => "category",
            CostColumn::Name => "name",
            CostColumn::Comment => "comment",
            CostColumn::Amount => "amount",
            CostColumn::BillCount => "bill count",
        }
    }

    /// Dropdown columns are filled by click-then-pick, the rest by typing.
    pub fn is_dropdown(self) -> bool {
        matches!(self, CostColumn::Category | CostColumn::Name)
    }
}

impl fmt::Display for CostColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectors describing how the portal renders its data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub header_css: String,
    pub header_marker: String,
    pub body_css: String,
    pub row_css: String,
    pub cell_css: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_css: "div.el-table__header-wrapper".to_string(),
            header_marker: "费用名称".to_string(),
            body_css: "div".to_string(),
            row_css: "tr".to_string(),
            cell_css: "td".to_string(),
        }
    }
}
