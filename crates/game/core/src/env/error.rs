//! Oracle access errors.
//!
//! Errors related to oracle availability and definition lookup. All of them
//! fall into the `MissingDefinition` category: the caller logs and turns the
//! operation into a no-op.

use crate::env::{AbilityId, EffectId, ItemDefId};
use crate::error::{ErrorCategory, GameError};

/// Errors that occur when resolving definition data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// EffectOracle is not available in the environment.
    #[error("EffectOracle not available")]
    EffectsNotAvailable,

    /// AbilityOracle is not available in the environment.
    #[error("AbilityOracle not available")]
    AbilitiesNotAvailable,

    /// ItemOracle is not available in the environment.
    #[error("ItemOracle not available")]
    ItemsNotAvailable,

    /// Effect definition was not found by id.
    #[error("effect definition '{0}' not found")]
    EffectNotFound(EffectId),

    /// Ability definition was not found by id.
    #[error("ability definition '{0}' not found")]
    AbilityNotFound(AbilityId),

    /// Item definition was not found by id.
    #[error("item definition '{0}' not found")]
    ItemNotFound(ItemDefId),
}

impl GameError for OracleError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::MissingDefinition
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            EffectsNotAvailable => "ORACLE_EFFECTS_NOT_AVAILABLE",
            AbilitiesNotAvailable => "ORACLE_ABILITIES_NOT_AVAILABLE",
            ItemsNotAvailable => "ORACLE_ITEMS_NOT_AVAILABLE",
            EffectNotFound(_) => "ORACLE_EFFECT_NOT_FOUND",
            AbilityNotFound(_) => "ORACLE_ABILITY_NOT_FOUND",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
        }
    }
}
