use rig_core::projection::OperatingSession;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    not_started: bool,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let session = if not_started {
        OperatingSession::NotStarted
    } else {
        OperatingSession::Started
    };
    let equipment = ctx.service.refresh_projection(id, session).await?;
    output(&equipment, flags.format)
}
