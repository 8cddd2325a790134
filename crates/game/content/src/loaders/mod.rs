//! Content loaders for reading definition data from files.
//!
//! Each loader reads one RON/TOML file into action-core definition types;
//! [`ContentFactory`] ties them together into a [`action_core::DefinitionCatalog`].

pub mod abilities;
pub mod characters;
pub mod config;
pub mod effects;
pub mod factory;
pub mod items;

pub use abilities::{AbilityCatalog, AbilityLoader};
pub use characters::{CharacterCatalog, CharacterLoader};
pub use config::ConfigLoader;
pub use effects::{EffectCatalog, EffectLoader};
pub use factory::ContentFactory;
pub use items::{ItemCatalog, ItemLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
