//! Character archetype loader.

use std::path::Path;

use action_core::CharacterDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Character catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterCatalog {
    pub characters: Vec<CharacterDefinition>,
}

/// Loader for character definitions from RON files.
pub struct CharacterLoader;

impl CharacterLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<CharacterDefinition>> {
        let content = read_file(path)?;
        let catalog: CharacterCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character catalog RON: {}", e))?;

        Ok(catalog.characters)
    }
}
