use autofill_core_types::ProgressSink;
use autofill_driver::BrowserDriver;
use tracing::{debug, info, instrument};

use crate::errors::SelectError;
use crate::model::{choose_option, OptionView, SelectOutcome, SelectParams, SkipReason};
use crate::policy::SelectPolicyView;

pub struct RuntimeDeps<'a> {
    pub driver: &'a dyn BrowserDriver,
    pub progress: &'a dyn ProgressSink,
    pub policy: &'a SelectPolicyView,
}

#[instrument(skip_all, fields(field = %params.field, target = %params.target))]
pub async fn execute(
    params: &SelectParams,
    deps: RuntimeDeps<'_>,
) -> Result<SelectOutcome, SelectError> {
    if let Some(trigger) = &params.trigger {
        let opened = async {
            deps.driver
                .wait_for_visible(trigger, deps.policy.timeouts.trigger())
                .await?;
            deps.driver.click(trigger).await
        };
        opened.await.map_err(|source| SelectError::Trigger {
            field: params.field.clone(),
            source,
        })?;
        // The list may legitimately stay empty; the scan reports that as a skip.
        if let Err(err) = deps
            .driver
            .wait_for_visible(&params.options.first(), deps.policy.timeouts.options())
            .await
        {
            debug!(error = %err, "dropdown options did not appear");
        }
    }

    let options = scan(params, deps.driver).await?;
    match choose_option(&options, &params.target, deps.policy.fallback_to_first_visible) {
        Ok((kind, position)) => {
            let option = &options[position];
            let locator = params.options.nth(option.index);
            deps.driver
                .click(&locator)
                .await
                .map_err(|source| SelectError::OptionClick {
                    field: params.field.clone(),
                    text: option.text.clone(),
                    source,
                })?;
            info!(kind = kind.label(), option = %option.text, "dropdown option selected");
            Ok(SelectOutcome::Selected {
                kind,
                index: option.index,
                text: option.text.trim().to_string(),
            })
        }
        Err(reason) => {
            let line = format!(
                "{}: no selectable option for \"{}\" ({}), skipped",
                params.field,
                params.target,
                skip_label(reason)
            );
            info!("{line}");
            deps.progress.emit(&line);
            Ok(SelectOutcome::Skipped(reason))
        }
    }
}

async fn scan(
    params: &SelectParams,
    driver: &dyn BrowserDriver,
) -> Result<Vec<OptionView>, SelectError> {
    let scan_error = |source| SelectError::Scan {
        field: params.field.clone(),
        source,
    };
    let count = driver.count(&params.options).await.map_err(scan_error)?;
    let mut options = Vec::with_capacity(count);
    for index in 0..count {
        let option = params.options.nth(index);
        let visible = driver.is_visible(&option).await.map_err(scan_error)?;
        if !visible {
            options.push(OptionView::new(index, false, ""));
            continue;
        }
        let text = driver
            .text_content(&option)
            .await
            .map_err(scan_error)?
            .unwrap_or_default();
        let exact = text.trim() == params.target;
        options.push(OptionView::new(index, true, text));
        if exact {
            break;
        }
    }
    Ok(options)
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoOptions => "dropdown is empty",
        SkipReason::NoneVisible => "no visible options",
        SkipReason::NoMatch => "no matching option",
    }
}
