//! Scripted stand-in for the reimbursement portal.

use action_locator::TableResolver;
use autofill_core_types::AutomationRequest;
use autofill_driver::scripted::{ElementState, ScriptedDriver};

use crate::portal::PortalLayout;

/// Physical cells per detail row: the selector column plus five data columns.
const CELLS_PER_ROW: usize = 6;

/// Builds a lenient scripted page that accepts every step of `request`.
///
/// The cost-detail table starts empty and gains a row per "add row" click;
/// every dropdown offers the values the request asks for.
pub fn simulated_portal(portal: &PortalLayout, request: &AutomationRequest) -> ScriptedDriver {
    let driver = ScriptedDriver::lenient();
    let table = TableResolver::new(portal.table.clone());

    driver.set(&table.header(), ElementState::visible());
    driver.set(&table.rows(), ElementState::visible().with_count(0));
    driver.on_click_grow(&portal.add_row_button(), &table.rows());
    for row in 1..=request.cost_items.len() {
        driver.set(
            &table.cells(row),
            ElementState::visible().with_count(CELLS_PER_ROW),
        );
    }

    let mut choices = vec![
        request.basic.category.clone(),
        request.payment.business_dept.clone(),
        request.payment.budget_dept.clone(),
        request.payment.project_type.clone(),
        request.payment.pay_company.clone(),
    ];
    choices.extend(request.payment.project.iter().cloned());
    choices.extend(request.cost_items.iter().map(|item| item.name.clone()));

    let options = portal.options();
    driver.set(&options, ElementState::visible().with_count(choices.len()));
    for (index, choice) in choices.iter().enumerate() {
        driver.set(&options.nth(index), ElementState::visible().with_text(choice));
    }

    let urgency = portal.text_options(&request.basic.urgency, true);
    driver.set(&urgency.first(), ElementState::visible().with_text(&request.basic.urgency));
    for item in &request.cost_items {
        let category = portal.text_options(&item.category, false);
        driver.set(&category.first(), ElementState::visible().with_text(&item.category));
    }

    driver
}
