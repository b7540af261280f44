use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use rig_config::{GeneralConfig, RigConfig, StoreConfig};
use rig_core::catalog::Catalog;
use rig_core::identity::Actor;
use rig_db::service::RigService;

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: Arc<RigService>,
    pub config: RigConfig,
    actor: Option<Actor>,
}

impl AppContext {
    /// Open the configured store with the configured catalog.
    pub async fn init(mut config: RigConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        if let Some(store) = &flags.store {
            config.store.path.clone_from(store);
        }
        ensure_store_dir(&config.store)?;

        let catalog = load_catalog(&config.general)?;
        let service = RigService::new_local(&config.store.path, config.store.change_buffer, catalog)
            .await
            .with_context(|| format!("failed to open store at {}", config.store.path))?;

        let actor = current_actor(&config.general);
        if actor.is_none() {
            tracing::debug!("no current user configured");
        }

        Ok(Self {
            service: Arc::new(service),
            config,
            actor,
        })
    }

    /// The configured current user, required by every store operation that
    /// is permission-checked.
    pub fn actor(&self) -> anyhow::Result<&Actor> {
        self.actor.as_ref().context(
            "no current user configured. Set general.user_name and general.user_badge \
             (or run 'rig init --name <NAME> --badge <BADGE>')",
        )
    }
}

/// The built-in catalog, or the file named by `general.catalog_path`.
pub fn load_catalog(general: &GeneralConfig) -> anyhow::Result<Catalog> {
    if general.has_custom_catalog() {
        return Catalog::from_path(Path::new(&general.catalog_path))
            .with_context(|| format!("failed to load catalog {}", general.catalog_path));
    }
    Catalog::builtin().context("failed to load built-in catalog")
}

fn current_actor(general: &GeneralConfig) -> Option<Actor> {
    general
        .has_identity()
        .then(|| Actor::new(&general.user_name, &general.user_badge, general.role))
}

fn ensure_store_dir(store: &StoreConfig) -> anyhow::Result<()> {
    if store.is_in_memory() {
        return Ok(());
    }
    let Some(parent) = Path::new(&store.path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    bail!(
        "store directory {} does not exist. Run 'rig init' first.",
        parent.display()
    )
}

#[cfg(test)]
mod tests {
    use rig_core::enums::Role;

    use super::*;

    #[test]
    fn actor_requires_name_and_badge() {
        let mut general = GeneralConfig::default();
        assert!(current_actor(&general).is_none());

        general.user_name = "Bruno Reis".into();
        general.user_badge = "S-0007".into();
        general.role = Role::Supervisor;
        assert_eq!(
            current_actor(&general),
            Some(Actor::new("Bruno Reis", "S-0007", Role::Supervisor))
        );
    }

    #[test]
    fn missing_store_dir_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_at = |path: String| StoreConfig {
            path,
            ..StoreConfig::default()
        };

        let missing = dir.path().join("absent").join("rigcheck.db");
        let err = ensure_store_dir(&store_at(missing.to_string_lossy().into_owned()))
            .expect_err("should fail");
        assert!(err.to_string().contains("rig init"));

        let present = dir.path().join("rigcheck.db");
        assert!(ensure_store_dir(&store_at(present.to_string_lossy().into_owned())).is_ok());
        assert!(ensure_store_dir(&store_at(":memory:".into())).is_ok());
    }

    #[test]
    fn custom_catalog_path_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[category]]
id = "crane"
name = "Crane"
class = "equipment"
critical = ["cr-01"]

[[category.items]]
id = "cr-01"
description = "Hook latch"
"#,
        )
        .expect("write catalog");

        let general = GeneralConfig {
            catalog_path: path.to_string_lossy().into_owned(),
            ..GeneralConfig::default()
        };
        let catalog = load_catalog(&general).expect("catalog should load");
        assert!(catalog.category("crane").is_some());
        assert!(catalog.category("forklift").is_none());
    }
}
