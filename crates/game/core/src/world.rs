//! Authoritative session state.
//!
//! [`World`] owns every character, the item actors standing in the world and
//! the replication outbox. It is the engine-glue layer: each method resolves
//! the entity, wires the collaborators together and hands off to the router,
//! character or inventory.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::attribute::{AttributeChange, AttributeStore};
use crate::character::Character;
use crate::config::CoreConfig;
use crate::env::{CharacterDefinition, Env, ItemDefId, OracleError, ProjectileDefinition};
use crate::error::{ErrorCategory, GameError};
use crate::inventory::InventoryError;
use crate::item::{
    ItemActor, ItemActorId, ItemActorMode, ItemInstance, ItemInstanceId, ItemState, WorldPort,
};
use crate::replication::{ReplicatedChange, ReplicationBoundary, ReplicationOutbox};
use crate::router::{
    DamageReceivers, DebugDraw, DispatchContext, DispatchOutcome, EventRouter, InputEvent,
    RadialDamage, RadialDamageReport, Route, SpatialQuery, WorldStimulus,
};
use crate::state::{EntityArena, EntityId, NetRole, Position};
use crate::system::{AbilitySystem, RemoteRequest};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("{0} is not a pickup")]
    NotAPickup(ItemActorId),

    #[error(transparent)]
    Definition(#[from] OracleError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl GameError for WorldError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownEntity(_) | Self::NotAPickup(_) => ErrorCategory::Validation,
            Self::Definition(error) => error.category(),
            Self::Inventory(error) => error.category(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "WORLD_UNKNOWN_ENTITY",
            Self::NotAPickup(_) => "WORLD_NOT_A_PICKUP",
            Self::Definition(error) => error.error_code(),
            Self::Inventory(error) => error.error_code(),
        }
    }
}

/// Everything one simulation step drained from the characters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Effects that expired during the step.
    pub expired: usize,
    /// Attribute change notifications raised since the previous tick, in the
    /// order each character raised them.
    pub attribute_changes: Vec<(EntityId, AttributeChange)>,
    /// Requests raised on observer characters, to be forwarded to the
    /// authority.
    pub remote_requests: Vec<(EntityId, RemoteRequest)>,
}

/// Item actors currently in the world, attached or lying as pickups.
#[derive(Clone, Debug, Default)]
pub struct ActorRegistry {
    actors: BTreeMap<ItemActorId, ItemActor>,
    next_actor: u32,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ItemActorId) -> Option<&ItemActor> {
        self.actors.get(&id)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemActor> {
        self.actors.values()
    }

    pub fn pickups(&self) -> impl Iterator<Item = &ItemActor> {
        self.actors.values().filter(|actor| actor.is_pickup())
    }

    /// Actor attached to `owner`, if any.
    pub fn attached_to(&self, owner: EntityId) -> Option<&ItemActor> {
        self.actors.values().find(|actor| {
            matches!(actor.mode, ItemActorMode::Attached { owner: o, .. } if o == owner)
        })
    }

    /// Leaves `item` in the world as a pickup and returns the new actor.
    pub fn insert_pickup(&mut self, mut item: ItemInstance, location: Position) -> ItemActorId {
        let id = self.allocate();
        item.world_actor = Some(id);
        self.actors.insert(
            id,
            ItemActor {
                id,
                item: item.id,
                definition: Arc::clone(&item.definition),
                mode: ItemActorMode::Pickup { location },
                payload: Some(item),
            },
        );
        id
    }

    /// Removes a pickup actor and hands back the instance it held along with
    /// where it was lying.
    pub fn take_pickup(&mut self, id: ItemActorId) -> Option<(ItemInstance, Position)> {
        let ItemActorMode::Pickup { location } = self.actors.get(&id)?.mode else {
            return None;
        };
        let mut item = self.actors.remove(&id)?.payload?;
        item.world_actor = None;
        Some((item, location))
    }

    fn allocate(&mut self) -> ItemActorId {
        self.next_actor += 1;
        ItemActorId(self.next_actor)
    }
}

impl WorldPort for ActorRegistry {
    fn spawn_item_actor(&mut self, item: &ItemInstance, owner: EntityId) -> Option<ItemActorId> {
        let id = self.allocate();
        self.actors.insert(
            id,
            ItemActor {
                id,
                item: item.id,
                definition: Arc::clone(&item.definition),
                mode: ItemActorMode::Attached {
                    owner,
                    socket: item.definition.attachment_socket.clone(),
                },
                payload: None,
            },
        );
        Some(id)
    }

    fn destroy_item_actor(&mut self, actor: ItemActorId) {
        self.actors.remove(&actor);
    }

    fn place_pickup(
        &mut self,
        item: ItemInstance,
        location: Position,
    ) -> Result<ItemActorId, ItemInstance> {
        Ok(self.insert_pickup(item, location))
    }
}

impl DamageReceivers for EntityArena<Character> {
    fn receiver(&mut self, entity: EntityId) -> Option<&mut AbilitySystem> {
        self.get_mut(entity).map(|character| &mut character.abilities)
    }
}

pub struct World {
    characters: EntityArena<Character>,
    actors: ActorRegistry,
    router: EventRouter,
    outbox: ReplicationOutbox,
    next_item: u32,
}

impl World {
    pub fn new(config: CoreConfig) -> Self {
        Self::with_router(EventRouter::new(config))
    }

    pub fn with_router(router: EventRouter) -> Self {
        Self {
            characters: EntityArena::new(),
            actors: ActorRegistry::new(),
            router,
            outbox: ReplicationOutbox::new(),
            next_item: 0,
        }
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn outbox(&self) -> &ReplicationOutbox {
        &self.outbox
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = (EntityId, &Character)> {
        self.characters.iter()
    }

    /// Spawns a character at `location`. Authority characters are possessed
    /// immediately, which grants their character data.
    pub fn spawn_character(
        &mut self,
        role: NetRole,
        definition: Arc<CharacterDefinition>,
        attributes: AttributeStore,
        location: Position,
        env: &Env<'_>,
    ) -> EntityId {
        let id = self.characters.insert_with(|id| {
            let mut character = Character::new(id, role, definition, attributes);
            character.set_location(location);
            character
        });
        if let Some(character) = self.characters.get_mut(id) {
            character.possessed_by(env, &mut self.outbox);
            info!(target: "action::world", entity = %id, name = %character.name(), "character spawned");
        }
        id
    }

    /// Creates an instance of `definition` in the inventory of `entity`.
    pub fn grant_item(
        &mut self,
        entity: EntityId,
        definition: &ItemDefId,
        env: Env<'_>,
    ) -> Result<ItemInstanceId, WorldError> {
        let definition = env.item(definition)?;
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;

        self.next_item += 1;
        let item = ItemInstance::new(ItemInstanceId(self.next_item), definition);
        character
            .with_inventory(env, &mut self.actors, &mut self.outbox, |inventory, ctx| {
                inventory.add_item(item, ctx)
            })
            .map_err(|rejected| WorldError::Inventory(rejected.error))
    }

    /// Moves a world pickup into the inventory of `entity`. A refused pickup
    /// stays where it was.
    pub fn pick_up(
        &mut self,
        entity: EntityId,
        actor: ItemActorId,
        env: Env<'_>,
    ) -> Result<ItemInstanceId, WorldError> {
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let (item, location) = self
            .actors
            .take_pickup(actor)
            .ok_or(WorldError::NotAPickup(actor))?;
        let definition = item.definition_id().clone();

        match character.with_inventory(env, &mut self.actors, &mut self.outbox, |inventory, ctx| {
            inventory.add_item(item, ctx)
        }) {
            Ok(id) => {
                self.outbox.push(ReplicatedChange::ItemState {
                    entity,
                    item: id,
                    definition,
                    state: ItemState::None,
                });
                debug!(target: "action::world", entity = %entity, item = %id, "item picked up");
                Ok(id)
            }
            Err(rejected) => {
                self.actors.insert_pickup(rejected.item, location);
                Err(WorldError::Inventory(rejected.error))
            }
        }
    }

    /// Takes `item` out of the inventory of `entity` for consumption or trade,
    /// unequipping it first.
    pub fn remove_item(
        &mut self,
        entity: EntityId,
        item: ItemInstanceId,
        env: Env<'_>,
    ) -> Result<ItemInstance, WorldError> {
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let removed = character
            .with_inventory(env, &mut self.actors, &mut self.outbox, |inventory, ctx| {
                inventory.remove_item(item, ctx)
            })?;
        debug!(target: "action::world", entity = %entity, item = %item, "item removed");
        Ok(removed)
    }

    /// Routes one input edge for `entity`.
    pub fn dispatch_input(
        &mut self,
        entity: EntityId,
        input: &InputEvent,
        env: Env<'_>,
    ) -> Result<DispatchOutcome, WorldError> {
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let mut ctx = DispatchContext {
            env,
            world: &mut self.actors,
            outbox: &mut self.outbox,
        };
        Ok(self.router.dispatch(input, character, &mut ctx))
    }

    pub fn dispatch_world(
        &mut self,
        entity: EntityId,
        stimulus: WorldStimulus,
        env: &Env<'_>,
    ) -> Result<(), WorldError> {
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        self.router.dispatch_world(stimulus, character, env);
        Ok(())
    }

    /// Executes requests an observer queued for `entity`, validating each on
    /// this side. Returns how many produced an effect.
    pub fn apply_remote_requests(
        &mut self,
        entity: EntityId,
        requests: Vec<RemoteRequest>,
        env: Env<'_>,
    ) -> Result<usize, WorldError> {
        let character = self
            .characters
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let mut ctx = DispatchContext {
            env,
            world: &mut self.actors,
            outbox: &mut self.outbox,
        };

        let mut handled = 0;
        for request in requests {
            let outcome = self.router.route(&Route::from(request), character, &mut ctx);
            if outcome.activated
                || outcome.cancelled > 0
                || outcome.triggered > 0
                || outcome.inventory_handled
            {
                handled += 1;
            }
        }
        Ok(handled)
    }

    pub fn apply_radial_damage(
        &mut self,
        request: &RadialDamage,
        env: &Env<'_>,
        query: &dyn SpatialQuery,
        debug_draw: &mut dyn DebugDraw,
    ) -> RadialDamageReport {
        self.router
            .apply_radial_damage(request, env, query, &mut self.characters, debug_draw)
    }

    /// Resolves a projectile impact at `origin` as radial damage.
    pub fn projectile_impact(
        &mut self,
        projectile: &ProjectileDefinition,
        causer: Option<EntityId>,
        origin: Position,
        env: &Env<'_>,
        query: &dyn SpatialQuery,
        debug_draw: &mut dyn DebugDraw,
    ) -> RadialDamageReport {
        let request = RadialDamage::from_projectile(projectile, causer, origin);
        self.apply_radial_damage(&request, env, query, debug_draw)
    }

    /// Advances every character one simulation step and drains their change
    /// and remote-request queues.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        for (id, character) in self.characters.iter_mut() {
            report.expired += character.abilities.tick().len();
            report.attribute_changes.extend(
                character
                    .abilities
                    .attributes_mut()
                    .drain_changes()
                    .into_iter()
                    .map(|change| (id, change)),
            );
            report.remote_requests.extend(
                character
                    .abilities
                    .take_remote_requests()
                    .into_iter()
                    .map(|request| (id, request)),
            );
        }
        if report.expired > 0 {
            debug!(target: "action::world", expired = report.expired, "effects expired");
        }
        report
    }

    /// Tears `entity` down and removes it. The inventory contents are handed
    /// back to the caller.
    pub fn destroy_character(&mut self, entity: EntityId, env: Env<'_>) -> Option<Vec<ItemInstance>> {
        let mut character = self.characters.remove(entity)?;
        let items = character.destroy(env, &mut self.actors, &mut self.outbox);
        info!(target: "action::world", entity = %entity, items = items.len(), "character destroyed");
        Some(items)
    }

    /// Flushes queued replicated changes through `boundary`.
    pub fn publish(&mut self, boundary: &mut dyn ReplicationBoundary) -> usize {
        self.outbox.flush(boundary)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;
    use crate::effect::EffectContext;
    use crate::env::{CharacterData, DefinitionCatalog, EffectDefinition, ItemDefinition};
    use crate::replication::{LoopbackBoundary, ObserverMirror};
    use crate::router::radial::testing::{FlatWorld, RecordingDraw};
    use crate::router::{InputAction, DAMAGE_MAGNITUDE_TAG};
    use crate::state::{GameplayTag, TagSet};

    fn catalog() -> DefinitionCatalog {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert_effect(EffectDefinition::instant("GE_Damage").with_set_by_caller(
            AttributeKind::Health,
            GameplayTag::new(DAMAGE_MAGNITUDE_TAG),
        ));
        catalog.insert_item(ItemDefinition::equippable("Sword").with_socket("hand_r"));
        catalog.insert_item(ItemDefinition::equippable("Bow"));
        catalog.insert_projectile(
            "Arrow",
            ProjectileDefinition {
                base_damage: 30.0,
                damage_radius: 200.0,
                effects: vec!["GE_Damage".into()],
            },
        );
        catalog
    }

    fn spawn(world: &mut World, env: &Env<'_>, at: Position) -> EntityId {
        let definition = CharacterDefinition {
            name: "Hero".into(),
            data: CharacterData::new(),
            ..CharacterDefinition::default()
        };
        world.spawn_character(
            NetRole::Authority,
            Arc::new(definition),
            AttributeStore::new()
                .with_base(AttributeKind::MaxHealth, 100.0)
                .with_base(AttributeKind::Health, 100.0),
            at,
            env,
        )
    }

    fn health(world: &World, id: EntityId) -> Option<f32> {
        world
            .character(id)?
            .abilities
            .attributes()
            .current(AttributeKind::Health)
    }

    #[test]
    fn equip_input_spawns_attached_actor() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);
        world.grant_item(hero, &"Sword".into(), env).unwrap();

        world
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .unwrap();
        let actor = world.actors().attached_to(hero).unwrap();
        assert_eq!(
            actor.mode,
            ItemActorMode::Attached {
                owner: hero,
                socket: Some("hand_r".into()),
            }
        );
    }

    #[test]
    fn dropped_item_can_be_picked_up_by_another_character() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::new(10.0, 0.0, 0.0));
        let other = spawn(&mut world, &env, Position::ZERO);
        world.grant_item(hero, &"Bow".into(), env).unwrap();

        world
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .unwrap();
        world
            .dispatch_input(hero, &InputEvent::started(InputAction::DropItem), env)
            .unwrap();

        assert!(world.character(hero).unwrap().inventory.is_empty());
        let pickup = world.actors().pickups().next().unwrap();
        assert_eq!(
            pickup.mode,
            ItemActorMode::Pickup {
                location: Position::new(10.0, 0.0, 0.0)
            }
        );
        let pickup = pickup.id;
        assert_eq!(world.actors().len(), 1);

        let id = world.pick_up(other, pickup, env).unwrap();
        assert!(world.actors().is_empty());
        let item = world.character(other).unwrap().inventory.get(id).unwrap();
        assert_eq!(item.state, ItemState::None);
        assert_eq!(item.owner, Some(other));

        assert_eq!(
            world.pick_up(other, pickup, env),
            Err(WorldError::NotAPickup(pickup))
        );
    }

    #[test]
    fn projectile_impact_damages_unoccluded_characters() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let shooter = spawn(&mut world, &env, Position::ZERO);
        let near = spawn(&mut world, &env, Position::new(100.0, 0.0, 0.0));
        let hidden = spawn(&mut world, &env, Position::new(-150.0, 0.0, 0.0));

        let geometry = FlatWorld {
            entities: world
                .characters()
                .map(|(id, character)| (id, character.location()))
                .collect(),
            walls: vec![-50.0],
        };
        let projectile = catalog.projectile("Arrow").unwrap().clone();
        let mut draw = RecordingDraw::default();
        let report = world.projectile_impact(
            &projectile,
            Some(shooter),
            Position::ZERO,
            &env,
            &geometry,
            &mut draw,
        );

        assert_eq!(report.damaged, vec![near]);
        assert_eq!(report.occluded, vec![hidden]);
        assert_eq!(health(&world, near), Some(70.0));
        assert_eq!(health(&world, hidden), Some(100.0));
        assert_eq!(health(&world, shooter), Some(100.0));
        assert_eq!(draw.spheres, 0);
    }

    #[test]
    fn destroy_removes_character_and_attached_actor() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);
        world.grant_item(hero, &"Sword".into(), env).unwrap();
        world
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .unwrap();

        let items = world.destroy_character(hero, env).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].equipped);
        assert!(world.actors().is_empty());
        assert!(world.character(hero).is_none());
        assert_eq!(
            world.dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env),
            Err(WorldError::UnknownEntity(hero))
        );
    }

    #[test]
    fn published_changes_reach_observer_mirror() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);
        world.grant_item(hero, &"Sword".into(), env).unwrap();
        world
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .unwrap();

        let mut boundary = LoopbackBoundary::new(ObserverMirror::new(None));
        assert!(world.publish(&mut boundary) > 0);
        assert!(world.outbox().is_empty());
        assert_eq!(
            boundary.observer().equipped_visual(hero),
            Some(&ItemDefId::new("Sword"))
        );
    }

    #[test]
    fn unknown_item_definition_is_reported() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);

        let error = world.grant_item(hero, &"Shield".into(), env).unwrap_err();
        assert_eq!(error.category(), ErrorCategory::MissingDefinition);
    }

    #[test]
    fn tick_drains_attribute_changes_and_remote_requests() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);
        let remote = world.spawn_character(
            NetRole::Observer,
            Arc::new(CharacterDefinition::default()),
            AttributeStore::new(),
            Position::ZERO,
            &env,
        );
        world.tick();

        let damage = EffectContext::new().with_set_by_caller(DAMAGE_MAGNITUDE_TAG, -25.0);
        world
            .character_mut(hero)
            .unwrap()
            .abilities
            .apply_effect_by_id(&env, &"GE_Damage".into(), &damage)
            .unwrap();
        let aim = TagSet::single("Ability.Aim");
        world.character_mut(remote).unwrap().abilities.cancel_by_tag(&aim);

        let report = world.tick();
        assert_eq!(
            report.attribute_changes,
            vec![(
                hero,
                AttributeChange {
                    attribute: AttributeKind::Health,
                    old_value: 100.0,
                    new_value: 75.0,
                }
            )]
        );
        assert_eq!(
            report.remote_requests,
            vec![(remote, RemoteRequest::CancelByTag(aim))]
        );
        assert_eq!(world.tick(), TickReport::default());
    }

    #[test]
    fn removed_item_leaves_inventory_and_world() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = World::default();
        let hero = spawn(&mut world, &env, Position::ZERO);
        let sword = world.grant_item(hero, &"Sword".into(), env).unwrap();
        world
            .dispatch_input(hero, &InputEvent::started(InputAction::EquipNext), env)
            .unwrap();

        let item = world.remove_item(hero, sword, env).unwrap();
        assert_eq!(item.id, sword);
        assert!(!item.equipped);
        assert!(world.actors().is_empty());
        assert!(world.character(hero).unwrap().inventory.is_empty());
        assert_eq!(
            world.remove_item(hero, sword, env).map(|item| item.id),
            Err(WorldError::Inventory(InventoryError::NotOwned(sword)))
        );
    }
}
