//! Inventory transition errors.

use crate::env::EffectId;
use crate::error::{ErrorCategory, GameError};
use crate::item::{ItemInstance, ItemInstanceId};

/// Reasons an inventory transition was a no-op.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InventoryError {
    #[error("inventory mutation attempted on an observer")]
    NotAuthoritative,

    #[error("{0} is not owned by this inventory")]
    NotOwned(ItemInstanceId),

    #[error("{0} is already equipped")]
    AlreadyEquipped(ItemInstanceId),

    #[error("nothing is equipped")]
    NothingEquipped,

    #[error("{0} is not equipped")]
    NotEquipped(ItemInstanceId),

    #[error("{0} cannot be equipped")]
    NotEquippable(ItemInstanceId),

    #[error("{0} cannot be dropped")]
    NotDroppable(ItemInstanceId),

    /// Instant effects would change base values on every equip with nothing
    /// for unequip to revert.
    #[error("{0} lists instant effect {1} as an ongoing effect")]
    InstantOngoingEffect(ItemInstanceId, EffectId),

    #[error("inventory is full")]
    Full,

    #[error("inventory holds no equippable item")]
    NoCandidate,

    /// The world collaborator refused to spawn the item actor.
    #[error("failed to spawn world actor for {0}")]
    SpawnFailed(ItemInstanceId),

    #[error("failed to place pickup for {0}")]
    PlacementFailed(ItemInstanceId),
}

impl GameError for InventoryError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }

    fn error_code(&self) -> &'static str {
        use InventoryError::*;
        match self {
            NotAuthoritative => "INVENTORY_NOT_AUTHORITATIVE",
            NotOwned(_) => "INVENTORY_NOT_OWNED",
            AlreadyEquipped(_) => "INVENTORY_ALREADY_EQUIPPED",
            NothingEquipped => "INVENTORY_NOTHING_EQUIPPED",
            NotEquipped(_) => "INVENTORY_NOT_EQUIPPED",
            NotEquippable(_) => "INVENTORY_NOT_EQUIPPABLE",
            NotDroppable(_) => "INVENTORY_NOT_DROPPABLE",
            InstantOngoingEffect(..) => "INVENTORY_INSTANT_ONGOING_EFFECT",
            Full => "INVENTORY_FULL",
            NoCandidate => "INVENTORY_NO_CANDIDATE",
            SpawnFailed(_) => "INVENTORY_SPAWN_FAILED",
            PlacementFailed(_) => "INVENTORY_PLACEMENT_FAILED",
        }
    }
}

/// An item the inventory refused to take, handed back to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RejectedItem {
    pub error: InventoryError,
    pub item: ItemInstance,
}
