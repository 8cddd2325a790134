//! Traits describing read-only definition data.
//!
//! Oracles expose effect, ability and item definitions. The [`Env`] aggregate
//! bundles them so the ability system, inventory and router can resolve
//! definitions without hard coupling to concrete content storage.
mod abilities;
mod catalog;
mod character;
mod effects;
mod error;
mod ids;
mod items;

use std::sync::Arc;

pub use abilities::{AbilityBehavior, AbilityDefinition, AbilityOracle};
pub use catalog::DefinitionCatalog;
pub use character::{AnimationProfileRef, CharacterData, CharacterDefinition};
pub use effects::{
    DurationPolicy, EffectDefinition, EffectOracle, Magnitude, ModifierSpec, StackingPolicy,
};
pub use error::OracleError;
pub use ids::{AbilityId, EffectId, ItemDefId};
pub use items::{
    ItemCapabilities, ItemDefinition, ItemKind, ItemOracle, MeshKind, ProjectileDefinition,
    WeaponData,
};

/// Aggregates read-only oracles required by the core subsystems.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    effects: Option<&'a dyn EffectOracle>,
    abilities: Option<&'a dyn AbilityOracle>,
    items: Option<&'a dyn ItemOracle>,
}

impl<'a> Env<'a> {
    pub fn new(
        effects: Option<&'a dyn EffectOracle>,
        abilities: Option<&'a dyn AbilityOracle>,
        items: Option<&'a dyn ItemOracle>,
    ) -> Self {
        Self {
            effects,
            abilities,
            items,
        }
    }

    pub fn with_all(
        effects: &'a dyn EffectOracle,
        abilities: &'a dyn AbilityOracle,
        items: &'a dyn ItemOracle,
    ) -> Self {
        Self::new(Some(effects), Some(abilities), Some(items))
    }

    /// Builds an environment whose oracles are all backed by one catalog.
    pub fn from_catalog(catalog: &'a DefinitionCatalog) -> Self {
        Self::with_all(catalog, catalog, catalog)
    }

    pub fn empty() -> Self {
        Self {
            effects: None,
            abilities: None,
            items: None,
        }
    }

    /// Returns the EffectOracle, or an error if not available.
    pub fn effects(&self) -> Result<&'a dyn EffectOracle, OracleError> {
        self.effects.ok_or(OracleError::EffectsNotAvailable)
    }

    /// Returns the AbilityOracle, or an error if not available.
    pub fn abilities(&self) -> Result<&'a dyn AbilityOracle, OracleError> {
        self.abilities.ok_or(OracleError::AbilitiesNotAvailable)
    }

    /// Returns the ItemOracle, or an error if not available.
    pub fn items(&self) -> Result<&'a dyn ItemOracle, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }

    /// Resolves an effect definition by id.
    pub fn effect(&self, id: &EffectId) -> Result<Arc<EffectDefinition>, OracleError> {
        self.effects()?
            .effect(id)
            .ok_or_else(|| OracleError::EffectNotFound(id.clone()))
    }

    /// Resolves an ability definition by id.
    pub fn ability(&self, id: &AbilityId) -> Result<Arc<AbilityDefinition>, OracleError> {
        self.abilities()?
            .ability(id)
            .ok_or_else(|| OracleError::AbilityNotFound(id.clone()))
    }

    /// Resolves an item definition by id.
    pub fn item(&self, id: &ItemDefId) -> Result<Arc<ItemDefinition>, OracleError> {
        self.items()?
            .item(id)
            .ok_or_else(|| OracleError::ItemNotFound(id.clone()))
    }
}
