use action_locator::CostColumn;
use autofill_core_types::{AutofillError, CostItem};

use crate::context::FlowContext;
use crate::types::{FlowReport, StepKind};

/// Adds one table row per cost item, then fills the rows in request order.
///
/// Rows are created up front so row `n` (1-based) always belongs to item `n`.
pub async fn fill(ctx: &FlowContext, report: &mut FlowReport) -> Result<(), AutofillError> {
    let items = &ctx.request.cost_items;
    ctx.emit("## Cost details");
    if items.is_empty() {
        ctx.emit("- No cost details to fill");
        return Ok(());
    }

    for row in 1..=items.len() {
        ctx.emit(format!("- Adding detail row {row}"));
        ctx.attempt(
            report,
            StepKind::AddRow,
            &format!("add detail row {row}"),
            ctx.click(&ctx.portal.add_row_button()),
        )
        .await?;
    }

    for (index, item) in items.iter().enumerate() {
        let row = index + 1;
        ctx.emit(format!("##### Detail row {row}"));
        let filled = ctx
            .attempt(
                report,
                StepKind::DetailRow,
                &format!("detail row {row}"),
                fill_row(ctx, row, item),
            )
            .await?;
        if filled.is_some() {
            report.rows_filled += 1;
            ctx.emit(format!("- Detail row {row} done"));
        }
    }
    Ok(())
}

async fn fill_row(ctx: &FlowContext, row: usize, item: &CostItem) -> Result<(), AutofillError> {
    for column in CostColumn::ALL {
        let value = cell_value(item, column);
        ctx.emit(format!("- Setting cost {column}: {value}"));
        let cell = ctx.resolve_cell(row, column).await?;
        let input = ctx.portal.cell_input(&cell);
        if !column.is_dropdown() {
            ctx.fill(&input, value).await?;
            continue;
        }
        let options = match column {
            // Category suggestions are plain text nodes, not select items.
            CostColumn::Category => ctx.portal.text_options(value, false),
            _ => ctx.portal.options(),
        };
        ctx.select(column.as_str(), input, options, value).await?;
    }
    Ok(())
}

fn cell_value(item: &CostItem, column: CostColumn) -> &str {
    match column {
        CostColumn::Category => &item.category,
        CostColumn::Name => &item.name,
        CostColumn::Comment => &item.comment,
        CostColumn::Amount => &item.amount,
        CostColumn::BillCount => &item.bill_count,
    }
}
