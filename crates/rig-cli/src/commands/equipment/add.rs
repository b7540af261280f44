use rig_core::entities::NewEquipment;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    code: &str,
    model: &str,
    category: &str,
    location: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let equipment = ctx
        .service
        .register_equipment(
            ctx.actor()?,
            NewEquipment {
                code: code.to_string(),
                model: model.to_string(),
                category: category.to_string(),
                location: location.map(str::to_string),
            },
        )
        .await?;
    output(&equipment, flags.format)
}
