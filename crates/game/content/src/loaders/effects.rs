//! Effect catalog loader.

use std::path::Path;

use action_core::EffectDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Effect catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectCatalog {
    pub effects: Vec<EffectDefinition>,
}

/// Loader for effect definitions from RON files.
pub struct EffectLoader;

impl EffectLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<EffectDefinition>> {
        let content = read_file(path)?;
        let catalog: EffectCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog RON: {}", e))?;

        Ok(catalog.effects)
    }
}
