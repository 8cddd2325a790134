//! Playable character: ability system, inventory and movement-state hooks.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::ability::GrantSource;
use crate::attribute::{AttributeKind, AttributeStore};
use crate::effect::{EffectContext, EffectHandle};
use crate::env::{CharacterData, CharacterDefinition, Env};
use crate::error::GameError;
use crate::inventory::{InventoryContext, InventoryController};
use crate::item::{ItemInstance, WorldPort};
use crate::replication::{ReplicatedChange, ReplicationOutbox};
use crate::state::{EntityId, NetRole, Position};
use crate::system::AbilitySystem;

#[derive(Clone, Debug)]
pub struct Character {
    id: EntityId,
    definition: Arc<CharacterDefinition>,
    data: CharacterData,
    pub abilities: AbilitySystem,
    pub inventory: InventoryController,
    location: Position,
    crouching: bool,
    in_air: bool,
    data_effects: Vec<EffectHandle>,
}

impl Character {
    pub fn new(
        id: EntityId,
        role: NetRole,
        definition: Arc<CharacterDefinition>,
        attributes: AttributeStore,
    ) -> Self {
        Self {
            id,
            data: definition.data.clone(),
            definition,
            abilities: AbilitySystem::new(id, role, attributes),
            inventory: InventoryController::new(id),
            location: Position::ZERO,
            crouching: false,
            in_air: false,
            data_effects: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &SmolStr {
        &self.definition.name
    }

    pub fn role(&self) -> NetRole {
        self.abilities.role()
    }

    pub fn data(&self) -> &CharacterData {
        &self.data
    }

    pub fn definition(&self) -> &CharacterDefinition {
        &self.definition
    }

    pub fn location(&self) -> Position {
        self.location
    }

    pub fn set_location(&mut self, location: Position) {
        self.location = location;
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    pub fn is_in_air(&self) -> bool {
        self.in_air
    }

    /// Current max movement speed for the movement collaborator.
    pub fn movement_speed(&self) -> f32 {
        self.abilities
            .attributes()
            .current(AttributeKind::MaxMovementSpeed)
            .unwrap_or(0.0)
    }

    /// Authority-side possession: grants data abilities and startup effects
    /// and replicates the character data.
    pub fn possessed_by(&mut self, env: &Env<'_>, outbox: &mut ReplicationOutbox) {
        if !self.role().is_authority() {
            return;
        }
        self.apply_character_data(env);
        self.publish_data(outbox);
    }

    /// Replaces the character data. Grants and effects from the previous data
    /// are withdrawn before the new set is applied.
    pub fn set_character_data(
        &mut self,
        data: CharacterData,
        env: &Env<'_>,
        outbox: &mut ReplicationOutbox,
    ) -> bool {
        if !self.role().is_authority() {
            debug!(target: "action::character", entity = %self.id, "character data change rejected");
            return false;
        }

        self.withdraw_character_data();
        self.data = data;
        self.apply_character_data(env);
        self.publish_data(outbox);
        true
    }

    /// Observer-side handler for a replicated data change. Observers store the
    /// data for presentation and never grant.
    pub fn apply_replicated_character_data(&mut self, data: &CharacterData) {
        if self.role().is_authority() {
            return;
        }
        self.data = data.clone();
    }

    fn apply_character_data(&mut self, env: &Env<'_>) {
        for ability in &self.data.granted_abilities {
            self.abilities
                .give_ability_by_id(env, ability, GrantSource::CharacterData);
        }

        let context = EffectContext::from_instigator(self.id);
        for effect in &self.data.startup_effects {
            match self.abilities.apply_effect_by_id(env, effect, &context) {
                Ok(handle) => {
                    if self.abilities.effects().contains(handle) {
                        self.data_effects.push(handle);
                    }
                }
                Err(failure) => warn!(
                    target: "action::character",
                    entity = %self.id,
                    effect = %effect,
                    code = failure.error_code(),
                    "startup effect not applied"
                ),
            }
        }
    }

    fn withdraw_character_data(&mut self) {
        self.abilities.clear_abilities_from(GrantSource::CharacterData);
        for handle in std::mem::take(&mut self.data_effects) {
            self.abilities.remove_effect(handle);
        }
    }

    fn publish_data(&self, outbox: &mut ReplicationOutbox) {
        outbox.push(ReplicatedChange::CharacterData {
            entity: self.id,
            data: self.data.clone(),
        });
    }

    // ========================================================================
    // Movement state hooks
    // ========================================================================

    /// Applies the crouch state effect, if the definition has one.
    pub fn on_start_crouch(&mut self, env: &Env<'_>) {
        self.crouching = true;
        let Some(effect) = self.definition.crouch_state_effect.as_ref() else {
            return;
        };
        if let Err(failure) =
            self.abilities
                .apply_effect_by_id(env, effect, &EffectContext::from_instigator(self.id))
        {
            debug!(
                target: "action::character",
                entity = %self.id,
                code = failure.error_code(),
                "failed to apply crouch effect"
            );
        }
    }

    /// Removes the crouch state effect by source, whether or not its handle is
    /// still known.
    pub fn on_end_crouch(&mut self) {
        self.crouching = false;
        if let Some(effect) = self.definition.crouch_state_effect.as_ref() {
            self.abilities.remove_effects_by_source(effect);
        }
    }

    pub fn on_jumped(&mut self) {
        self.in_air = true;
    }

    /// Strips every effect carrying one of the definition's in-air tags.
    pub fn landed(&mut self) -> usize {
        self.in_air = false;
        self.abilities
            .remove_effects_with_tags(&self.definition.in_air_tags)
    }

    // ========================================================================
    // Inventory access
    // ========================================================================

    /// Runs an inventory operation with this character's ability system and
    /// location wired into the context.
    pub fn with_inventory<T>(
        &mut self,
        env: Env<'_>,
        world: &mut dyn WorldPort,
        outbox: &mut ReplicationOutbox,
        op: impl FnOnce(&mut InventoryController, &mut InventoryContext<'_, '_>) -> T,
    ) -> T {
        let mut ctx = InventoryContext {
            abilities: &mut self.abilities,
            env,
            world,
            outbox,
            location: self.location,
        };
        op(&mut self.inventory, &mut ctx)
    }

    /// Tears the character down: unequips, ends every ability, clears every
    /// effect. Returns the inventory contents for the caller to dispose of.
    pub fn destroy(
        &mut self,
        env: Env<'_>,
        world: &mut dyn WorldPort,
        outbox: &mut ReplicationOutbox,
    ) -> Vec<ItemInstance> {
        let items = self.with_inventory(env, world, outbox, |inventory, ctx| inventory.clear(ctx));
        self.data_effects.clear();
        self.abilities.teardown();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{AbilityDefinition, DefinitionCatalog, EffectDefinition};
    use crate::state::TagSet;

    fn catalog() -> DefinitionCatalog {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert_effect(
            EffectDefinition::infinite("GE_Crouch")
                .with_modifier(AttributeKind::MaxMovementSpeed, -200.0),
        );
        catalog.insert_effect(
            EffectDefinition::infinite("GE_Jump")
                .with_modifier(AttributeKind::MaxMovementSpeed, -100.0)
                .with_tag("State.InAir.Jump"),
        );
        catalog.insert_effect(
            EffectDefinition::infinite("GE_Vigor").with_modifier(AttributeKind::MaxHealth, 25.0),
        );
        catalog.insert_ability(AbilityDefinition::new("GA_Jump").with_tag("Ability.Jump"));
        catalog.insert_ability(AbilityDefinition::new("GA_Roll").with_tag("Ability.Roll"));
        catalog
    }

    fn hero(role: NetRole) -> Character {
        let definition = CharacterDefinition {
            name: "Hero".into(),
            data: CharacterData::new()
                .granting("GA_Jump")
                .with_startup_effect("GE_Vigor"),
            crouch_state_effect: Some("GE_Crouch".into()),
            in_air_tags: TagSet::single("State.InAir"),
        };
        Character::new(
            EntityId::new(0, 0),
            role,
            Arc::new(definition),
            AttributeStore::new()
                .with_base(AttributeKind::MaxHealth, 100.0)
                .with_base(AttributeKind::MaxMovementSpeed, 500.0),
        )
    }

    #[test]
    fn crouch_effect_applies_and_reverts() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut hero = hero(NetRole::Authority);

        hero.on_start_crouch(&env);
        assert_eq!(hero.movement_speed(), 300.0);
        hero.on_end_crouch();
        assert_eq!(hero.movement_speed(), 500.0);
    }

    #[test]
    fn landing_strips_in_air_effects_only() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut hero = hero(NetRole::Authority);

        hero.on_jumped();
        hero.abilities
            .apply_effect_by_id(&env, &"GE_Jump".into(), &EffectContext::new())
            .unwrap();
        hero.on_start_crouch(&env);
        assert_eq!(hero.movement_speed(), 200.0);

        assert_eq!(hero.landed(), 1);
        assert!(!hero.is_in_air());
        assert_eq!(hero.movement_speed(), 300.0);
    }

    #[test]
    fn possession_grants_data_and_replicates() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut hero = hero(NetRole::Authority);
        let mut outbox = ReplicationOutbox::new();

        hero.possessed_by(&env, &mut outbox);
        assert_eq!(hero.abilities.abilities().len(), 1);
        assert_eq!(
            hero.abilities.attributes().current(AttributeKind::MaxHealth),
            Some(125.0)
        );
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn reinitialization_withdraws_previous_grants() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut hero = hero(NetRole::Authority);
        let mut outbox = ReplicationOutbox::new();
        hero.possessed_by(&env, &mut outbox);

        let data = CharacterData::new().granting("GA_Roll");
        assert!(hero.set_character_data(data.clone(), &env, &mut outbox));

        let granted: Vec<_> = hero
            .abilities
            .abilities()
            .iter()
            .map(|spec| spec.id().as_str().to_owned())
            .collect();
        assert_eq!(granted, ["GA_Roll"]);
        assert_eq!(
            hero.abilities.attributes().current(AttributeKind::MaxHealth),
            Some(100.0)
        );
        assert_eq!(hero.data(), &data);
    }

    #[test]
    fn observer_only_stores_replicated_data() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut observer = hero(NetRole::Observer);
        let mut outbox = ReplicationOutbox::new();

        assert!(!observer.set_character_data(CharacterData::new(), &env, &mut outbox));
        observer.possessed_by(&env, &mut outbox);
        assert!(outbox.is_empty());

        let data = CharacterData::new().granting("GA_Roll");
        observer.apply_replicated_character_data(&data);
        assert_eq!(observer.data(), &data);
        assert!(observer.abilities.abilities().is_empty());
    }
}
