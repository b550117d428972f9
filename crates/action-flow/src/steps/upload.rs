use std::path::Path;

use autofill_core_types::AutofillError;

use crate::context::FlowContext;
use crate::types::{FlowReport, StepKind};

pub async fn attach(ctx: &FlowContext, report: &mut FlowReport) -> Result<(), AutofillError> {
    let files = &ctx.request.files;
    if files.is_empty() {
        return Ok(());
    }
    ctx.emit("## Uploading invoices");
    ctx.scroll(ctx.pacing.scroll_delta).await;

    for file in files {
        let name = display_name(file);
        ctx.emit(format!("- Uploading {name}"));
        let uploaded = ctx
            .attempt(
                report,
                StepKind::Upload,
                &format!("upload {name}"),
                upload_one(ctx, file),
            )
            .await?;
        if uploaded.is_some() {
            report.files_uploaded += 1;
            ctx.emit(format!("- Uploaded {name}"));
        }
    }
    Ok(())
}

async fn upload_one(ctx: &FlowContext, file: &Path) -> Result<(), AutofillError> {
    ctx.driver
        .set_input_files(&ctx.portal.upload_input(), &[file.to_path_buf()])
        .await?;
    ctx.settle(ctx.pacing.after_upload()).await;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
