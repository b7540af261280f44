use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rig approve`.
pub async fn approve(
    id: &str,
    comment: Option<String>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let approval = ctx
        .service
        .approve_checklist(ctx.actor()?, id, comment)
        .await?;
    output(&approval, flags.format)
}

/// Handle `rig reject`.
pub async fn reject(
    id: &str,
    reason: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let rejection = ctx.service.reject_checklist(ctx.actor()?, id, reason).await?;
    output(&rejection, flags.format)
}
