//! Item and projectile catalog loader.

use std::collections::BTreeMap;
use std::path::Path;

use action_core::{ItemDefinition, ProjectileDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
///
/// Projectiles are keyed by name; weapons refer to them from gameplay code
/// rather than from the item definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemDefinition>,
    #[serde(default)]
    pub projectiles: BTreeMap<String, ProjectileDefinition>,
}

/// Loader for the item catalog from RON files.
pub struct ItemLoader;

impl ItemLoader {
    pub fn load(path: &Path) -> LoadResult<ItemCatalog> {
        let content = read_file(path)?;
        let catalog: ItemCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        Ok(catalog)
    }
}
