use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use rig_config::{PROJECT_CONFIG_PATH, RigConfig};
use rig_core::enums::Role;
use rig_db::service::RigService;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::load_catalog;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResult {
    config_path: PathBuf,
    config_written: bool,
    store_path: String,
    user_name: Option<String>,
    user_badge: Option<String>,
    role: Role,
}

/// Handle `rig init`.
pub async fn handle(args: &InitArgs, config: RigConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config_path = PathBuf::from(PROJECT_CONFIG_PATH);
    let project = project_config(args, config, flags)?;
    let config_written = write_config(&config_path, &project, args.force)?;

    if !project.store.is_in_memory()
        && let Some(parent) = Path::new(&project.store.path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let catalog = load_catalog(&project.general)?;
    RigService::new_local(&project.store.path, project.store.change_buffer, catalog)
        .await
        .with_context(|| format!("failed to initialize store at {}", project.store.path))?;
    tracing::info!(store = %project.store.path, config_written, "rigcheck project initialized");

    let general = &project.general;
    output(
        &InitResult {
            config_path,
            config_written,
            store_path: project.store.path.clone(),
            user_name: Some(general.user_name.clone()).filter(|n| !n.is_empty()),
            user_badge: Some(general.user_badge.clone()).filter(|b| !b.is_empty()),
            role: general.role,
        },
        flags.format,
    )
}

/// The loaded configuration with command-line overrides applied.
fn project_config(
    args: &InitArgs,
    mut config: RigConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<RigConfig> {
    if let Some(store) = &flags.store {
        config.store.path.clone_from(store);
    }
    if let Some(name) = &args.name {
        config.general.user_name = name.trim().to_string();
    }
    if let Some(badge) = &args.badge {
        config.general.user_badge = badge.trim().to_string();
    }
    if let Some(role) = &args.role {
        config.general.role = parse_enum(role, "role")?;
    }
    Ok(config)
}

/// Write `config` as TOML unless the file exists. Returns whether it was written.
fn write_config(path: &Path, config: &RigConfig, force: bool) -> anyhow::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    if rendered.trim().is_empty() {
        bail!("refusing to write an empty configuration");
    }
    std::fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
