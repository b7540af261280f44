use anyhow::Context;
use rig_config::RigConfig;
use rig_core::enums::CategoryClass;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CatalogArgs;
use crate::context::load_catalog;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CategoryRow<'a> {
    id: &'a str,
    name: &'a str,
    class: CategoryClass,
    items: usize,
    critical: usize,
}

/// Handle `rig catalog`.
pub fn handle(args: &CatalogArgs, config: &RigConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let catalog = load_catalog(&config.general)?;

    if let Some(id) = &args.category {
        let category = catalog
            .require(id)
            .with_context(|| format!("unknown category '{id}'"))?;
        return output(&category.items, flags.format);
    }

    let rows = catalog
        .categories()
        .map(|category| CategoryRow {
            id: &category.id,
            name: &category.name,
            class: category.class,
            items: category.items.len(),
            critical: category.critical_item_ids().len(),
        })
        .collect::<Vec<_>>();
    output(&rows, flags.format)
}
