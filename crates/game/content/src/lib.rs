//! Data-driven definitions and loaders.
//!
//! This crate reads static gameplay content from data files:
//! - Effect, ability, item and character definitions (RON)
//! - Projectile data for the radial damage path (RON)
//! - Core configuration (TOML)
//!
//! Content fills an [`action_core::DefinitionCatalog`] once at startup and is
//! only ever read through oracles afterwards; it never appears in replicated
//! state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityLoader, CharacterLoader, ConfigLoader, ContentFactory, EffectLoader, ItemCatalog,
    ItemLoader, LoadResult,
};
