mod add;
mod refresh;
mod set_status;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EquipmentCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rig equipment`.
pub async fn handle(
    action: &EquipmentCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EquipmentCommands::Add {
            code,
            model,
            category,
            location,
        } => add::run(code, model, category, location.as_deref(), ctx, flags).await,
        EquipmentCommands::List => output(&ctx.service.list_equipment().await?, flags.format),
        EquipmentCommands::Get { id } => output(&ctx.service.get_equipment(id).await?, flags.format),
        EquipmentCommands::SetStatus { id, status, note } => {
            set_status::run(id, status, note.clone(), ctx, flags).await
        }
        EquipmentCommands::Refresh { id, not_started } => {
            refresh::run(id, *not_started, ctx, flags).await
        }
    }
}
