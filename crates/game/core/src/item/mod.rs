//! Logical item instances and their world representation.
//!
//! An [`ItemInstance`] is the replicated record of a possessed item. Its
//! [`ItemActor`] is the physical representation, spawned through the
//! [`WorldPort`] collaborator while the item is equipped (attached to the
//! owner) or dropped (a world pickup).

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::ability::AbilityHandle;
use crate::effect::EffectHandle;
use crate::env::{ItemDefId, ItemDefinition, MeshKind};
use crate::state::{EntityId, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInstanceId(pub u32);

impl fmt::Display for ItemInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemActorId(pub u32);

impl fmt::Display for ItemActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Replicated item state.
///
/// `None -> Equipped -> None` and `None -> Dropped`. Dropping an equipped
/// item always passes through `None` (unequip) first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemState {
    #[default]
    None,
    Equipped,
    Dropped,
}

#[derive(Clone, Debug)]
pub struct ItemInstance {
    pub id: ItemInstanceId,
    pub definition: Arc<ItemDefinition>,
    pub equipped: bool,
    pub state: ItemState,
    /// Weak back-reference to the owning entity; `None` while in the world.
    pub owner: Option<EntityId>,
    /// Present only while equipped or dropped.
    pub world_actor: Option<ItemActorId>,
    /// Grants made to the owner while equipped.
    pub granted_abilities: Vec<AbilityHandle>,
    pub applied_effects: Vec<EffectHandle>,
}

impl ItemInstance {
    pub fn new(id: ItemInstanceId, definition: Arc<ItemDefinition>) -> Self {
        Self {
            id,
            definition,
            equipped: false,
            state: ItemState::None,
            owner: None,
            world_actor: None,
            granted_abilities: Vec::new(),
            applied_effects: Vec::new(),
        }
    }

    #[inline]
    pub fn definition_id(&self) -> &ItemDefId {
        &self.definition.id
    }

    /// Compact replicated form.
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id,
            definition: self.definition.id.clone(),
            equipped: self.equipped,
            state: self.state,
        }
    }
}

/// Replicated view of an item: identity, definition reference and state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemSummary {
    pub id: ItemInstanceId,
    pub definition: ItemDefId,
    pub equipped: bool,
    pub state: ItemState,
}

/// How an item actor exists in the world.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemActorMode {
    /// Attached to its owner at a socket.
    Attached {
        owner: EntityId,
        socket: Option<SmolStr>,
    },
    /// Lying in the world; owns the dropped instance until picked up.
    Pickup { location: Position },
}

/// Physical representation of an item.
#[derive(Clone, Debug)]
pub struct ItemActor {
    pub id: ItemActorId,
    pub item: ItemInstanceId,
    pub definition: Arc<ItemDefinition>,
    pub mode: ItemActorMode,
    /// Dropped instance held by a pickup actor.
    pub payload: Option<ItemInstance>,
}

impl ItemActor {
    pub fn mesh(&self) -> &MeshKind {
        self.definition.mesh()
    }

    pub fn is_pickup(&self) -> bool {
        matches!(self.mode, ItemActorMode::Pickup { .. })
    }
}

/// World collaborator that spawns and destroys item actors.
///
/// Spawning is authority-only; an implementation returns `None` when the
/// actor cannot be created, which makes the calling transition a no-op.
pub trait WorldPort {
    fn spawn_item_actor(&mut self, item: &ItemInstance, owner: EntityId) -> Option<ItemActorId>;

    fn destroy_item_actor(&mut self, actor: ItemActorId);

    /// Leaves `item` in the world as a pickup. On failure the instance is
    /// handed back untouched.
    fn place_pickup(
        &mut self,
        item: ItemInstance,
        location: Position,
    ) -> Result<ItemActorId, ItemInstance>;
}
