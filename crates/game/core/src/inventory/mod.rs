//! Per-entity inventory and the equip/unequip/drop state machine.
//!
//! The controller owns its [`ItemInstance`]s in pickup order and enforces the
//! single-equipped-slot rule: at most one item has `equipped == true`, and
//! that item is the only one with an attached world actor. Every mutating
//! operation is authority-only and publishes its replicated fields to the
//! outbox in the context.

mod error;

use arrayvec::ArrayVec;
use tracing::{debug, warn};

pub use error::{InventoryError, RejectedItem};

use crate::ability::GrantSource;
use crate::config::CoreConfig;
use crate::effect::EffectContext;
use crate::env::Env;
use crate::error::GameError;
use crate::item::{ItemInstance, ItemInstanceId, ItemState, ItemSummary, WorldPort};
use crate::replication::{ReplicatedChange, ReplicationOutbox};
use crate::state::{EntityId, GameplayTag, Position};
use crate::system::AbilitySystem;

type ItemSlots = ArrayVec<ItemInstance, { CoreConfig::MAX_INVENTORY_SLOTS }>;

/// Gameplay event tags the inventory listens for.
pub mod events {
    pub const DROP_ITEM: &str = "Event.Inventory.DropItem";
    pub const EQUIP_NEXT: &str = "Event.Inventory.EquipNext";
    pub const UNEQUIP: &str = "Event.Inventory.Unequip";
}

/// Collaborators an inventory transition needs besides the inventory itself.
pub struct InventoryContext<'a, 'e> {
    /// Ability system of the owning entity; item grants land here.
    pub abilities: &'a mut AbilitySystem,
    pub env: Env<'e>,
    pub world: &'a mut dyn WorldPort,
    pub outbox: &'a mut ReplicationOutbox,
    /// Owner location, used for dropped pickups.
    pub location: Position,
}

#[derive(Clone, Debug)]
pub struct InventoryController {
    owner: EntityId,
    items: ItemSlots,
}

impl InventoryController {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            items: ArrayVec::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub fn items(&self) -> &[ItemInstance] {
        &self.items
    }

    pub fn get(&self, id: ItemInstanceId) -> Option<&ItemInstance> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn equipped(&self) -> Option<&ItemInstance> {
        self.items.iter().find(|item| item.equipped)
    }

    pub fn summaries(&self) -> Vec<ItemSummary> {
        self.items.iter().map(ItemInstance::summary).collect()
    }

    fn position(&self, id: ItemInstanceId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn publish_inventory(&self, outbox: &mut ReplicationOutbox) {
        outbox.push(ReplicatedChange::Inventory {
            entity: self.owner,
            items: self.summaries(),
        });
    }

    fn publish_item(&self, index: usize, outbox: &mut ReplicationOutbox) {
        let item = &self.items[index];
        outbox.push(ReplicatedChange::ItemEquipped {
            entity: self.owner,
            item: item.id,
            definition: item.definition.id.clone(),
            equipped: item.equipped,
        });
        outbox.push(ReplicatedChange::ItemState {
            entity: self.owner,
            item: item.id,
            definition: item.definition.id.clone(),
            state: item.state,
        });
    }

    // ========================================================================
    // Possession
    // ========================================================================

    /// Takes ownership of a picked-up or granted item, appending it to the
    /// pickup order.
    pub fn add_item(
        &mut self,
        mut item: ItemInstance,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<ItemInstanceId, RejectedItem> {
        if !ctx.abilities.role().is_authority() {
            return Err(RejectedItem {
                error: InventoryError::NotAuthoritative,
                item,
            });
        }

        item.owner = Some(self.owner);
        item.equipped = false;
        item.state = ItemState::None;
        item.world_actor = None;
        let id = item.id;

        if let Err(full) = self.items.try_push(item) {
            return Err(RejectedItem {
                error: InventoryError::Full,
                item: full.element(),
            });
        }

        self.publish_inventory(ctx.outbox);
        debug!(target: "action::inventory", owner = %self.owner, item = %id, "item added");
        Ok(id)
    }

    /// Removes an item from the inventory (consumption, trade). Equipped items
    /// are unequipped first.
    pub fn remove_item(
        &mut self,
        id: ItemInstanceId,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<ItemInstance, InventoryError> {
        ensure_authority(ctx)?;
        let index = self.position(id).ok_or(InventoryError::NotOwned(id))?;
        if self.items[index].equipped {
            self.unequip(id, ctx)?;
        }

        let mut item = self.items.remove(index);
        item.owner = None;
        self.publish_inventory(ctx.outbox);
        Ok(item)
    }

    // ========================================================================
    // Equipment
    // ========================================================================

    /// Equips `id`, unequipping the current item first.
    ///
    /// The new world actor is spawned before anything else changes, so a
    /// failed spawn leaves the inventory exactly as it was.
    pub fn equip(
        &mut self,
        id: ItemInstanceId,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<(), InventoryError> {
        ensure_authority(ctx)?;
        let index = self.position(id).ok_or(InventoryError::NotOwned(id))?;
        let item = &self.items[index];
        if item.equipped {
            return Err(InventoryError::AlreadyEquipped(id));
        }
        if !item.definition.can_be_equipped() {
            return Err(InventoryError::NotEquippable(id));
        }
        if let Some(effect) = item
            .definition
            .ongoing_effects
            .iter()
            .find(|effect| ctx.env.effect(effect).is_ok_and(|def| def.is_instant()))
        {
            return Err(InventoryError::InstantOngoingEffect(id, effect.clone()));
        }

        let actor = ctx
            .world
            .spawn_item_actor(item, self.owner)
            .ok_or(InventoryError::SpawnFailed(id))?;

        if let Some(current) = self.equipped().map(|item| item.id)
            && let Err(error) = self.unequip(current, ctx)
        {
            ctx.world.destroy_item_actor(actor);
            return Err(error);
        }

        let definition = std::sync::Arc::clone(&self.items[index].definition);
        let source = GrantSource::Item(id);
        let granted: Vec<_> = definition
            .granted_abilities
            .iter()
            .filter_map(|ability| ctx.abilities.give_ability_by_id(&ctx.env, ability, source))
            .collect();

        let context = EffectContext::from_instigator(self.owner);
        let mut applied = Vec::new();
        for effect in &definition.ongoing_effects {
            match ctx.abilities.apply_effect_by_id(&ctx.env, effect, &context) {
                Ok(handle) if ctx.abilities.effects().contains(handle) => applied.push(handle),
                Ok(_) => {}
                Err(failure) => debug!(
                    target: "action::inventory",
                    item = %id,
                    effect = %effect,
                    code = failure.error_code(),
                    "ongoing effect not applied"
                ),
            }
        }

        let item = &mut self.items[index];
        item.world_actor = Some(actor);
        item.granted_abilities = granted;
        item.applied_effects = applied;
        item.equipped = true;
        item.state = ItemState::Equipped;
        self.publish_item(index, ctx.outbox);

        debug!(target: "action::inventory", owner = %self.owner, item = %id, "item equipped");
        Ok(())
    }

    /// Reverses [`Self::equip`]: revokes item grants, destroys the world actor
    /// and clears the equipped flag.
    pub fn unequip(
        &mut self,
        id: ItemInstanceId,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<(), InventoryError> {
        ensure_authority(ctx)?;
        let index = self.position(id).ok_or(InventoryError::NotOwned(id))?;
        let item = &mut self.items[index];
        if !item.equipped {
            return Err(InventoryError::NotEquipped(id));
        }

        for handle in std::mem::take(&mut item.granted_abilities) {
            ctx.abilities.clear_ability(handle);
        }
        for handle in std::mem::take(&mut item.applied_effects) {
            ctx.abilities.remove_effect(handle);
        }
        if let Some(actor) = item.world_actor.take() {
            ctx.world.destroy_item_actor(actor);
        }
        item.equipped = false;
        item.state = ItemState::None;
        self.publish_item(index, ctx.outbox);

        debug!(target: "action::inventory", owner = %self.owner, item = %id, "item unequipped");
        Ok(())
    }

    /// Drops `id` at the owner's location. The instance leaves the inventory
    /// and is owned by the world pickup from then on.
    pub fn drop_item(
        &mut self,
        id: ItemInstanceId,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<(), InventoryError> {
        ensure_authority(ctx)?;
        let index = self.position(id).ok_or(InventoryError::NotOwned(id))?;
        if !self.items[index].definition.can_be_dropped() {
            return Err(InventoryError::NotDroppable(id));
        }
        if self.items[index].equipped {
            self.unequip(id, ctx)?;
        }

        let mut item = self.items.remove(index);
        let definition = item.definition.id.clone();
        item.owner = None;
        item.state = ItemState::Dropped;

        match ctx.world.place_pickup(item, ctx.location) {
            Ok(_) => {
                ctx.outbox.push(ReplicatedChange::ItemState {
                    entity: self.owner,
                    item: id,
                    definition,
                    state: ItemState::Dropped,
                });
                self.publish_inventory(ctx.outbox);
                debug!(target: "action::inventory", owner = %self.owner, item = %id, "item dropped");
                Ok(())
            }
            Err(mut item) => {
                item.owner = Some(self.owner);
                item.state = ItemState::None;
                self.items.insert(index, item);
                Err(InventoryError::PlacementFailed(id))
            }
        }
    }

    // ========================================================================
    // Router conveniences
    // ========================================================================

    /// Equips the next equippable item after the current one, wrapping at the
    /// end of the pickup order. With nothing equipped, starts at the first
    /// item.
    pub fn equip_next(
        &mut self,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<ItemInstanceId, InventoryError> {
        ensure_authority(ctx)?;
        let count = self.items.len();
        let current = self.items.iter().position(|item| item.equipped);
        let start = current.map_or(0, |index| index + 1);

        let next = (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&index| Some(index) != current && self.items[index].definition.can_be_equipped())
            .ok_or(InventoryError::NoCandidate)?;

        let id = self.items[next].id;
        self.equip(id, ctx)?;
        Ok(id)
    }

    /// Drops the equipped item.
    pub fn request_drop(&mut self, ctx: &mut InventoryContext<'_, '_>) -> Result<(), InventoryError> {
        let id = self.equipped().map(|item| item.id).ok_or(InventoryError::NothingEquipped)?;
        self.drop_item(id, ctx)
    }

    /// Unequips the equipped item.
    pub fn request_unequip(
        &mut self,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> Result<(), InventoryError> {
        let id = self.equipped().map(|item| item.id).ok_or(InventoryError::NothingEquipped)?;
        self.unequip(id, ctx)
    }

    /// Routes an inventory gameplay event. Returns false if the event is not
    /// an inventory event or the transition was a no-op.
    pub fn handle_gameplay_event(
        &mut self,
        event: &GameplayTag,
        ctx: &mut InventoryContext<'_, '_>,
    ) -> bool {
        let result = match event.as_str() {
            events::EQUIP_NEXT => self.equip_next(ctx).map(|_| ()),
            events::DROP_ITEM => self.request_drop(ctx),
            events::UNEQUIP => self.request_unequip(ctx),
            _ => return false,
        };

        match result {
            Ok(()) => true,
            Err(error) => {
                debug!(
                    target: "action::inventory",
                    owner = %self.owner,
                    event = %event,
                    code = error.error_code(),
                    "inventory event ignored"
                );
                false
            }
        }
    }

    /// Unequips whatever is equipped and hands every instance back; used when
    /// the owner is destroyed.
    pub fn clear(&mut self, ctx: &mut InventoryContext<'_, '_>) -> Vec<ItemInstance> {
        if let Some(id) = self.equipped().map(|item| item.id)
            && let Err(error) = self.unequip(id, ctx)
        {
            warn!(
                target: "action::inventory",
                owner = %self.owner,
                item = %id,
                code = error.error_code(),
                "failed to unequip while clearing inventory"
            );
        }
        let items: Vec<_> = self.items.drain(..).collect();
        if !items.is_empty() {
            self.publish_inventory(ctx.outbox);
        }
        items
    }
}

fn ensure_authority(ctx: &InventoryContext<'_, '_>) -> Result<(), InventoryError> {
    if ctx.abilities.role().is_authority() {
        Ok(())
    } else {
        Err(InventoryError::NotAuthoritative)
    }
}
