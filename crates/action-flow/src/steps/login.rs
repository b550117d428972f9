use autofill_core_types::AutofillError;

use crate::context::FlowContext;

pub async fn navigate(ctx: &FlowContext) -> Result<(), AutofillError> {
    ctx.emit(format!("> Opening portal {}", ctx.portal.base_url));
    ctx.driver.navigate(&ctx.portal.base_url).await?;
    Ok(())
}

/// Signs in, then moves on to the reimbursement landing page.
pub async fn login(ctx: &FlowContext) -> Result<(), AutofillError> {
    let credentials = &ctx.request.credentials;
    ctx.emit(format!("> Logging in as {}", credentials.username));

    ctx.fill(&ctx.portal.username(), &credentials.username).await?;
    ctx.fill(&ctx.portal.password(), &credentials.password).await?;
    ctx.click(&ctx.portal.login_button()).await?;
    ctx.settle(ctx.pacing.after_login()).await;

    ctx.emit("> Opening reimbursement page");
    ctx.driver.navigate(&ctx.portal.landing_url()).await?;
    ctx.emit("- Logged in");
    Ok(())
}
