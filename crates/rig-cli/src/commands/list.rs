use rig_core::enums::ChecklistStatus;
use rig_db::repos::checklist::RecordFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ListArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::{parse_enum, parse_timestamp};
use crate::context::AppContext;
use crate::output::output;

/// Handle `rig list`.
pub async fn handle(args: &ListArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let filter = build_filter(args, effective_limit(flags.limit, ctx.config.general.default_limit))?;
    let records = ctx.service.list_checklists(actor, &filter).await?;
    output(&records, flags.format)
}

fn build_filter(args: &ListArgs, limit: u32) -> anyhow::Result<RecordFilter> {
    Ok(RecordFilter {
        status: args
            .status
            .as_deref()
            .map(|raw| parse_enum::<ChecklistStatus>(raw, "status"))
            .transpose()?,
        category: args.category.clone(),
        equipment_id: args.equipment.clone(),
        operator_badge: args.operator.clone(),
        since: args
            .since
            .as_deref()
            .map(|raw| parse_timestamp(raw, "since"))
            .transpose()?,
        until: args
            .until
            .as_deref()
            .map(|raw| parse_timestamp(raw, "until"))
            .transpose()?,
        limit: Some(limit),
    })
}
