use rig_core::enums::EquipmentStatus;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    status: &str,
    note: Option<String>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let status = parse_enum::<EquipmentStatus>(status, "status")?;
    let equipment = ctx
        .service
        .set_equipment_status(ctx.actor()?, id, status, note)
        .await?;
    output(&equipment, flags.format)
}
