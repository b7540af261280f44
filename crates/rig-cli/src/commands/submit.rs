use std::io::Read;
use std::path::Path;

use anyhow::Context;
use rig_core::entities::{Answer, NewChecklist, OperatorRef};
use rig_core::identity::Actor;
use serde::Deserialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SubmitArgs;
use crate::context::AppContext;
use crate::output::output;

/// Submission file layout. `operator` defaults to the current user.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubmissionFile {
    category: String,
    #[serde(default)]
    equipment_id: Option<String>,
    #[serde(default)]
    operator: Option<OperatorRef>,
    #[serde(default)]
    signature: Option<String>,
    answers: Vec<Answer>,
}

impl SubmissionFile {
    fn into_submission(self, actor: &Actor) -> NewChecklist {
        NewChecklist {
            category: self.category,
            equipment_id: self.equipment_id,
            operator: self.operator.unwrap_or_else(|| actor.operator_ref()),
            signature: self.signature,
            answers: self.answers,
        }
    }
}

/// Handle `rig submit`.
pub async fn handle(args: &SubmitArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let raw = read_source(&args.file)?;
    let file: SubmissionFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid submission in {}", args.file.display()))?;

    let outcome = ctx
        .service
        .submit_checklist(actor, file.into_submission(actor))
        .await?;
    output(&outcome, flags.format)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read submission from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
