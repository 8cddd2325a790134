//! Authoritative-to-observer replication contract.
//!
//! The core never talks to a transport. Authoritative mutations queue
//! [`ReplicatedChange`]s in a [`ReplicationOutbox`]; a [`ReplicationBoundary`]
//! implementation publishes them, and on the observer side each change is
//! delivered to a [`ReplicationObserver`] handler.
//!
//! Delivery is ordered per field but not atomic across fields, so observers
//! must tolerate e.g. an equipped-item change arriving before the matching
//! inventory change.

mod mirror;

pub use mirror::{EntityPresentation, ObserverMirror};

use crate::env::{CharacterData, ItemDefId};
use crate::item::{ItemInstanceId, ItemState, ItemSummary};
use crate::state::EntityId;

bitflags::bitflags! {
    /// Replicated fields, used to track which ones a batch touched.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ReplicatedFields: u8 {
        const CHARACTER_DATA = 1 << 0;
        const INVENTORY = 1 << 1;
        const ITEM_EQUIPPED = 1 << 2;
        const ITEM_STATE = 1 << 3;
    }
}

/// One authoritative field change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplicatedChange {
    CharacterData {
        entity: EntityId,
        data: CharacterData,
    },
    /// Full ordered snapshot of the inventory list.
    Inventory {
        entity: EntityId,
        items: Vec<ItemSummary>,
    },
    ItemEquipped {
        entity: EntityId,
        item: ItemInstanceId,
        definition: ItemDefId,
        equipped: bool,
    },
    ItemState {
        entity: EntityId,
        item: ItemInstanceId,
        definition: ItemDefId,
        state: ItemState,
    },
}

impl ReplicatedChange {
    pub fn entity(&self) -> EntityId {
        match self {
            Self::CharacterData { entity, .. }
            | Self::Inventory { entity, .. }
            | Self::ItemEquipped { entity, .. }
            | Self::ItemState { entity, .. } => *entity,
        }
    }

    pub fn field(&self) -> ReplicatedFields {
        match self {
            Self::CharacterData { .. } => ReplicatedFields::CHARACTER_DATA,
            Self::Inventory { .. } => ReplicatedFields::INVENTORY,
            Self::ItemEquipped { .. } => ReplicatedFields::ITEM_EQUIPPED,
            Self::ItemState { .. } => ReplicatedFields::ITEM_STATE,
        }
    }

    /// Hands the change to the matching observer handler.
    pub fn deliver_to(&self, observer: &mut dyn ReplicationObserver) {
        match self {
            Self::CharacterData { entity, data } => {
                observer.on_character_data_changed(*entity, data)
            }
            Self::Inventory { entity, items } => observer.on_inventory_changed(*entity, items),
            Self::ItemEquipped {
                entity,
                item,
                definition,
                equipped,
            } => observer.on_item_equipped_changed(*entity, *item, definition, *equipped),
            Self::ItemState {
                entity,
                item,
                definition,
                state,
            } => observer.on_item_state_changed(*entity, *item, definition, *state),
        }
    }
}

/// Changes produced on the authority, waiting to be published.
#[derive(Clone, Debug, Default)]
pub struct ReplicationOutbox {
    changes: Vec<ReplicatedChange>,
    dirty: ReplicatedFields,
}

impl ReplicationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: ReplicatedChange) {
        self.dirty |= change.field();
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplicatedChange> {
        self.changes.iter()
    }

    /// Fields touched since the last drain.
    pub fn dirty(&self) -> ReplicatedFields {
        self.dirty
    }

    pub fn drain(&mut self) -> Vec<ReplicatedChange> {
        self.dirty = ReplicatedFields::empty();
        std::mem::take(&mut self.changes)
    }

    /// Publishes every queued change through `boundary`, in order.
    pub fn flush(&mut self, boundary: &mut dyn ReplicationBoundary) -> usize {
        let changes = self.drain();
        for change in &changes {
            boundary.publish(change);
        }
        changes.len()
    }
}

/// Transport-side contract: reliable, ordered per field, authority to
/// observers.
pub trait ReplicationBoundary {
    fn publish(&mut self, change: &ReplicatedChange);
}

/// Observer-side on-change handlers. Implementations re-derive presentation
/// state and must be idempotent and independent of cross-field arrival order.
pub trait ReplicationObserver {
    fn on_character_data_changed(&mut self, entity: EntityId, data: &CharacterData);

    fn on_item_equipped_changed(
        &mut self,
        entity: EntityId,
        item: ItemInstanceId,
        definition: &ItemDefId,
        equipped: bool,
    );

    fn on_item_state_changed(
        &mut self,
        entity: EntityId,
        item: ItemInstanceId,
        definition: &ItemDefId,
        state: ItemState,
    );

    fn on_inventory_changed(&mut self, entity: EntityId, items: &[ItemSummary]);
}

/// In-process boundary delivering straight to an observer.
#[derive(Debug, Default)]
pub struct LoopbackBoundary<O> {
    observer: O,
    delivered: usize,
}

impl<O: ReplicationObserver> LoopbackBoundary<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            delivered: 0,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn into_inner(self) -> O {
        self.observer
    }
}

impl<O: ReplicationObserver> ReplicationBoundary for LoopbackBoundary<O> {
    fn publish(&mut self, change: &ReplicatedChange) {
        change.deliver_to(&mut self.observer);
        self.delivered += 1;
    }
}

/// Records changes without delivering them; useful to inspect what a sequence
/// of operations replicated.
#[derive(Clone, Debug, Default)]
pub struct RecordingBoundary {
    pub published: Vec<ReplicatedChange>,
}

impl ReplicationBoundary for RecordingBoundary {
    fn publish(&mut self, change: &ReplicatedChange) {
        self.published.push(change.clone());
    }
}
