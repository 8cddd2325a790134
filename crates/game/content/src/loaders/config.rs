//! Core configuration loader.

use std::path::Path;

use action_core::CoreConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`CoreConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> LoadResult<CoreConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CoreConfig> {
        let config: CoreConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        assert_eq!(ConfigLoader::parse("").unwrap(), CoreConfig::default());
        assert!(
            ConfigLoader::parse("debug_radial_damage = true")
                .unwrap()
                .debug_radial_damage
        );
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = ConfigLoader::parse("debug_radial_damage = \"yes\"").unwrap_err();
        assert!(err.to_string().contains("config TOML"));
    }
}
