//! Sandbox configuration read from the environment.
use std::env;
use std::path::PathBuf;

use action_core::CoreConfig;

/// Data shipped with the content crate.
const DEFAULT_CONTENT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../game/content/data");

#[derive(Clone, Debug)]
pub struct SandboxConfig {
    pub content_dir: PathBuf,
    /// Overrides `debug_radial_damage` from `config.toml` when set.
    pub show_debug_radial_damage: Option<bool>,
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        let content_dir = env::var("ACTION_CONTENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONTENT_DIR));

        Self {
            content_dir,
            show_debug_radial_damage: read_env::<bool>("SHOW_DEBUG_RADIAL_DAMAGE"),
        }
    }

    /// Applies environment overrides on top of the loaded core config.
    pub fn apply(&self, mut core: CoreConfig) -> CoreConfig {
        if let Some(show) = self.show_debug_radial_damage {
            core.debug_radial_damage = show;
        }
        core
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
