use anyhow::bail;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rig erase`.
pub async fn handle(id: &str, yes: bool, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    if !yes {
        bail!("erasing {id} deletes its answers, photos and review history. Pass --yes to confirm.");
    }
    ctx.service.erase_checklist(ctx.actor()?, id).await?;
    output(&json!({ "id": id, "erased": true }), flags.format)
}
