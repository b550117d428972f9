//! Cell resolution against a live table

use autofill_driver::{BrowserDriver, DriverError, Locator};
use tracing::debug;

use crate::errors::LocatorError;
use crate::types::{CostColumn, TableLayout};

/// Resolves table cells through the driver; holds no page state itself.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    layout: TableLayout,
}

impl TableResolver {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    pub fn header(&self) -> Locator {
        Locator::css(&self.layout.header_css).has_text(&self.layout.header_marker)
    }

    /// Body rows of the table paired with the marked header.
    pub fn rows(&self) -> Locator {
        self.header()
            .first()
            .next_sibling(&self.layout.body_css)
            .find(&self.layout.row_css)
    }

    /// All cells of a 1-based row, without any range check.
    pub fn cells(&self, row: usize) -> Locator {
        self.rows()
            .nth(row.saturating_sub(1))
            .find(&self.layout.cell_css)
    }

    /// Locator of the cell at `row` (1-based) and `column`.
    ///
    /// Fails instead of falling back to another cell when the header, the row
    /// or the cell is missing.
    pub async fn resolve_cell(
        &self,
        driver: &dyn BrowserDriver,
        row: usize,
        column: CostColumn,
    ) -> Result<Locator, LocatorError> {
        let probe = |err: DriverError| LocatorError::Driver {
            row,
            column,
            reason: err.to_string(),
        };

        let headers = driver.count(&self.header()).await.map_err(probe)?;
        if headers == 0 {
            return Err(LocatorError::HeaderNotFound {
                marker: self.layout.header_marker.clone(),
                row,
                column,
            });
        }

        let available = driver.count(&self.rows()).await.map_err(probe)?;
        if row == 0 || row > available {
            return Err(LocatorError::RowOutOfRange {
                row,
                column,
                available,
            });
        }

        let cells = self.cells(row);
        let cell_count = driver.count(&cells).await.map_err(probe)?;
        if cell_count <= column.offset() {
            return Err(LocatorError::CellOutOfRange {
                row,
                column,
                available: cell_count,
            });
        }

        let cell = cells.nth(column.offset());
        debug!(row, column = %column, locator = %cell, "table cell resolved");
        Ok(cell)
    }
}
