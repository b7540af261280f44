//! Static checklist catalog.
//!
//! Categories and their items are loaded once at startup (either the embedded
//! built-in catalog or a TOML file named in configuration) and never mutated.
//! Equipment categories carry an explicit critical-item set; accessory
//! categories treat every item as critical.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::CategoryClass;
use crate::errors::CoreError;

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.toml");

const fn default_required() -> bool {
    true
}

/// Immutable catalog entry for one checklist item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub category: String,
    pub description: String,
    pub required: bool,
    pub critical: bool,
}

/// A checklist category with its ordered items.
#[derive(Debug, Clone, Serialize, JsonSchema, PartialEq, Eq)]
pub struct CategoryDef {
    pub id: String,
    pub name: String,
    pub class: CategoryClass,
    pub items: Vec<ChecklistItem>,
    #[serde(skip)]
    critical: BTreeSet<String>,
}

impl CategoryDef {
    /// Ids of the items whose failure is safety-critical for this category.
    #[must_use]
    pub const fn critical_item_ids(&self) -> &BTreeSet<String> {
        &self.critical
    }

    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Items the operator must answer.
    pub fn required_items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|item| item.required)
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    category: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    name: String,
    class: CategoryClass,
    #[serde(default)]
    critical: Vec<String>,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    description: String,
    #[serde(default = "default_required")]
    required: bool,
}

/// The set of checklist categories known to this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: BTreeMap<String, CategoryDef>,
}

impl Catalog {
    /// Parse the catalog embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Catalog` if the embedded TOML is malformed.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Catalog` if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Catalog(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Catalog` on syntax errors, duplicate ids, empty
    /// categories, or critical ids that name no item.
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let parsed: RawCatalog =
            toml::from_str(raw).map_err(|e| CoreError::Catalog(e.to_string()))?;

        let mut categories = BTreeMap::new();
        for raw_category in parsed.category {
            let category = build_category(raw_category)?;
            if categories.contains_key(&category.id) {
                return Err(CoreError::Catalog(format!(
                    "duplicate category '{}'",
                    category.id
                )));
            }
            categories.insert(category.id.clone(), category);
        }
        Ok(Self { categories })
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&CategoryDef> {
        self.categories.get(id)
    }

    /// Look up a category, failing with `NotFound` when unknown.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no category has this id.
    pub fn require(&self, id: &str) -> Result<&CategoryDef, CoreError> {
        self.category(id).ok_or_else(|| CoreError::NotFound {
            entity_type: "category".into(),
            id: id.to_string(),
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryDef> {
        self.categories.values()
    }
}

fn build_category(raw: RawCategory) -> Result<CategoryDef, CoreError> {
    if raw.items.is_empty() {
        return Err(CoreError::Catalog(format!(
            "category '{}' has no items",
            raw.id
        )));
    }

    let mut seen = BTreeSet::new();
    for item in &raw.items {
        if !seen.insert(item.id.clone()) {
            return Err(CoreError::Catalog(format!(
                "duplicate item '{}' in category '{}'",
                item.id, raw.id
            )));
        }
    }

    let critical: BTreeSet<String> = match raw.class {
        CategoryClass::Accessory => seen.clone(),
        CategoryClass::Equipment => {
            let declared: BTreeSet<String> = raw.critical.into_iter().collect();
            if let Some(unknown) = declared.iter().find(|id| !seen.contains(*id)) {
                return Err(CoreError::Catalog(format!(
                    "critical item '{unknown}' is not defined in category '{}'",
                    raw.id
                )));
            }
            declared
        }
    };

    let items = raw
        .items
        .into_iter()
        .map(|item| ChecklistItem {
            critical: critical.contains(&item.id),
            category: raw.id.clone(),
            id: item.id,
            description: item.description,
            required: item.required,
        })
        .collect();

    Ok(CategoryDef {
        id: raw.id,
        name: raw.name,
        class: raw.class,
        items,
        critical,
    })
}
