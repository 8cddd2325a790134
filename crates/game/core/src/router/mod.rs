//! Stimulus routing.
//!
//! [`EventRouter`] maps input edges and world stimuli onto ability activation,
//! cancellation, gameplay events and direct effect application. The binding
//! table is fixed after construction; the router keeps no per-dispatch state.

pub mod radial;

use std::collections::BTreeMap;

use tracing::{debug, trace};

pub use radial::{
    resolve_radial_damage, DamageReceivers, DebugColor, DebugDraw, QueryFilter, RadialDamage,
    RadialDamageReport, SpatialQuery, TraceHit, DAMAGE_MAGNITUDE_TAG,
};

use crate::character::Character;
use crate::config::CoreConfig;
use crate::effect::{EffectContext, EffectHandle};
use crate::env::{EffectId, Env};
use crate::error::GameError;
use crate::inventory::events;
use crate::item::WorldPort;
use crate::replication::ReplicationOutbox;
use crate::state::{GameplayTag, TagSet};
use crate::system::RemoteRequest;

/// Gameplay tags used by the default bindings.
pub mod tags {
    pub const CROUCH: &str = "Ability.Movement.Crouch";
    pub const SPRINT: &str = "Ability.Movement.Sprint";
    pub const ATTACK_STARTED: &str = "Event.Attack.Started";
    pub const ATTACK_STOPPED: &str = "Event.Attack.Stopped";
    pub const AIM_STARTED: &str = "Event.Aim.Started";
    pub const AIM_STOPPED: &str = "Event.Aim.Stopped";
    pub const TRAVERSAL: &str = "Event.Movement.Traversal";
}

/// Stable input action identifiers, independent of physical binding.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputAction {
    MoveForward,
    MoveSide,
    Turn,
    LookUp,
    Jump,
    Crouch,
    Sprint,
    Attack,
    Aim,
    DropItem,
    EquipNext,
    Unequip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputEdge {
    Started,
    Completed,
    /// Continuous-magnitude update between edges.
    Ongoing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputEvent {
    pub action: InputAction,
    pub edge: InputEdge,
    pub magnitude: f32,
}

impl InputEvent {
    pub fn started(action: InputAction) -> Self {
        Self {
            action,
            edge: InputEdge::Started,
            magnitude: 1.0,
        }
    }

    pub fn completed(action: InputAction) -> Self {
        Self {
            action,
            edge: InputEdge::Completed,
            magnitude: 0.0,
        }
    }

    pub fn axis(action: InputAction, magnitude: f32) -> Self {
        Self {
            action,
            edge: InputEdge::Ongoing,
            magnitude,
        }
    }
}

/// What a stimulus resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Route {
    Activate(TagSet),
    Cancel(TagSet),
    /// Activates listening abilities, cancels abilities that list the tag as
    /// a cancel tag, then reaches the inventory.
    Event(GameplayTag),
    ApplyEffect(EffectId),
}

impl From<RemoteRequest> for Route {
    fn from(request: RemoteRequest) -> Self {
        match request {
            RemoteRequest::ActivateByTag(tags) => Route::Activate(tags),
            RemoteRequest::CancelByTag(tags) => Route::Cancel(tags),
            RemoteRequest::GameplayEvent(event) => Route::Event(event),
        }
    }
}

/// Movement-state notifications raised by the world collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorldStimulus {
    CrouchStarted,
    CrouchEnded,
    Jumped,
    Landed,
}

/// Result of routing one stimulus.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchOutcome {
    pub route: Option<Route>,
    /// At least one ability activated.
    pub activated: bool,
    pub cancelled: usize,
    /// Abilities activated by a gameplay event.
    pub triggered: usize,
    pub inventory_handled: bool,
    pub effect: Option<EffectHandle>,
}

/// Collaborators a dispatch may touch besides the character itself.
pub struct DispatchContext<'a, 'e> {
    pub env: Env<'e>,
    pub world: &'a mut dyn WorldPort,
    pub outbox: &'a mut ReplicationOutbox,
}

#[derive(Clone, Debug)]
pub struct EventRouter {
    config: CoreConfig,
    bindings: BTreeMap<(InputAction, InputEdge), Route>,
}

impl EventRouter {
    /// Router with the default bindings.
    pub fn new(config: CoreConfig) -> Self {
        let mut router = Self::unbound(config);
        router.bind_pair(InputAction::Crouch, TagSet::single(tags::CROUCH));
        router.bind_pair(InputAction::Sprint, TagSet::single(tags::SPRINT));
        router.bind_events(InputAction::Attack, tags::ATTACK_STARTED, tags::ATTACK_STOPPED);
        router.bind_events(InputAction::Aim, tags::AIM_STARTED, tags::AIM_STOPPED);
        router.bind(
            InputAction::Jump,
            InputEdge::Started,
            Route::Event(GameplayTag::new(tags::TRAVERSAL)),
        );
        router.bind(
            InputAction::DropItem,
            InputEdge::Started,
            Route::Event(GameplayTag::new(events::DROP_ITEM)),
        );
        router.bind(
            InputAction::EquipNext,
            InputEdge::Started,
            Route::Event(GameplayTag::new(events::EQUIP_NEXT)),
        );
        router.bind(
            InputAction::Unequip,
            InputEdge::Started,
            Route::Event(GameplayTag::new(events::UNEQUIP)),
        );
        router
    }

    /// Router with no bindings.
    pub fn unbound(config: CoreConfig) -> Self {
        Self {
            config,
            bindings: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Binds one edge of an action, replacing any previous route.
    pub fn bind(&mut self, action: InputAction, edge: InputEdge, route: Route) {
        self.bindings.insert((action, edge), route);
    }

    /// Press activates the tagged ability group, release cancels it.
    pub fn bind_pair(&mut self, action: InputAction, group: TagSet) {
        self.bind(action, InputEdge::Started, Route::Activate(group.clone()));
        self.bind(action, InputEdge::Completed, Route::Cancel(group));
    }

    /// Press and release each send a gameplay event.
    pub fn bind_events(&mut self, action: InputAction, started: &str, stopped: &str) {
        self.bind(action, InputEdge::Started, Route::Event(GameplayTag::new(started)));
        self.bind(action, InputEdge::Completed, Route::Event(GameplayTag::new(stopped)));
    }

    pub fn resolve(&self, input: &InputEvent) -> Option<&Route> {
        self.bindings.get(&(input.action, input.edge))
    }

    /// Routes one input edge for `character`. Unbound inputs are a no-op.
    pub fn dispatch(
        &self,
        input: &InputEvent,
        character: &mut Character,
        ctx: &mut DispatchContext<'_, '_>,
    ) -> DispatchOutcome {
        let Some(route) = self.resolve(input) else {
            trace!(target: "action::router", action = %input.action, "unbound input");
            return DispatchOutcome::default();
        };
        self.route(route, character, ctx)
    }

    /// Executes a resolved route. Abilities see the stimulus before the
    /// inventory does.
    pub fn route(
        &self,
        route: &Route,
        character: &mut Character,
        ctx: &mut DispatchContext<'_, '_>,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            route: Some(route.clone()),
            ..DispatchOutcome::default()
        };

        match route {
            Route::Activate(group) => {
                outcome.activated = character.abilities.try_activate_by_tag(group, true, &ctx.env);
            }
            Route::Cancel(group) => {
                outcome.cancelled = character.abilities.cancel_by_tag(group);
            }
            Route::Event(event) => {
                // Stop events end abilities that list them as cancel tags. The
                // cancel runs first so an ability triggered and cancelled by
                // the same event stays active.
                if character.role().is_authority() {
                    outcome.cancelled = character
                        .abilities
                        .cancel_by_tag(&TagSet::single(event.clone()));
                }
                outcome.triggered = character.abilities.handle_gameplay_event(event, &ctx.env);
                if character.role().is_authority() {
                    outcome.inventory_handled =
                        character.with_inventory(ctx.env, ctx.world, ctx.outbox, |inventory, inv| {
                            inventory.handle_gameplay_event(event, inv)
                        });
                }
            }
            Route::ApplyEffect(effect) => {
                let context = EffectContext::from_instigator(character.id());
                match character.abilities.apply_effect_by_id(&ctx.env, effect, &context) {
                    Ok(handle) => outcome.effect = Some(handle),
                    Err(failure) => debug!(
                        target: "action::router",
                        entity = %character.id(),
                        effect = %effect,
                        code = failure.error_code(),
                        "routed effect not applied"
                    ),
                }
            }
        }
        outcome
    }

    /// Applies a movement-state notification to `character`.
    pub fn dispatch_world(&self, stimulus: WorldStimulus, character: &mut Character, env: &Env<'_>) {
        match stimulus {
            WorldStimulus::CrouchStarted => character.on_start_crouch(env),
            WorldStimulus::CrouchEnded => character.on_end_crouch(),
            WorldStimulus::Jumped => character.on_jumped(),
            WorldStimulus::Landed => {
                let removed = character.landed();
                trace!(target: "action::router", entity = %character.id(), removed, "landed");
            }
        }
    }

    /// Radial damage pass. Diagnostic shapes are drawn only when the debug
    /// toggle is set.
    pub fn apply_radial_damage(
        &self,
        request: &RadialDamage,
        env: &Env<'_>,
        query: &dyn SpatialQuery,
        receivers: &mut dyn DamageReceivers,
        debug_draw: &mut dyn DebugDraw,
    ) -> RadialDamageReport {
        let draw = self.config.debug_radial_damage.then_some(debug_draw);
        resolve_radial_damage(request, env, query, receivers, draw)
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strum::IntoEnumIterator;

    use super::radial::testing::RecordingDraw;
    use super::*;
    use crate::attribute::{AttributeKind, AttributeStore};
    use crate::env::{
        AbilityDefinition, CharacterData, CharacterDefinition, DefinitionCatalog, EffectDefinition,
        ItemDefinition, ItemOracle,
    };
    use crate::item::{ItemActorId, ItemInstance, ItemInstanceId};
    use crate::state::{EntityId, NetRole, Position};

    #[derive(Default)]
    struct StubWorld {
        next: u32,
    }

    impl WorldPort for StubWorld {
        fn spawn_item_actor(&mut self, _item: &ItemInstance, _owner: EntityId) -> Option<ItemActorId> {
            self.next += 1;
            Some(ItemActorId(self.next))
        }

        fn destroy_item_actor(&mut self, _actor: ItemActorId) {}

        fn place_pickup(
            &mut self,
            _item: ItemInstance,
            _location: Position,
        ) -> Result<ItemActorId, ItemInstance> {
            self.next += 1;
            Ok(ItemActorId(self.next))
        }
    }

    fn catalog() -> DefinitionCatalog {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert_effect(
            EffectDefinition::infinite("GE_Sprint")
                .with_modifier(AttributeKind::MaxMovementSpeed, 300.0),
        );
        catalog.insert_effect(
            EffectDefinition::instant("GE_Heal").with_modifier(AttributeKind::Health, 10.0),
        );
        catalog.insert_ability(
            AbilityDefinition::new("GA_Sprint")
                .with_tag(tags::SPRINT)
                .with_cancel_tag(tags::SPRINT)
                .applying_on_start("GE_Sprint"),
        );
        catalog.insert_ability(
            AbilityDefinition::new("GA_Fire").with_event_trigger(tags::ATTACK_STARTED),
        );
        catalog.insert_ability(
            AbilityDefinition::new("GA_Aim")
                .with_event_trigger(tags::AIM_STARTED)
                .with_cancel_tag(tags::AIM_STOPPED)
                .applying_on_start("GE_Sprint"),
        );
        catalog.insert_ability(
            AbilityDefinition::new("GA_Toggle")
                .with_event_trigger("Event.Toggle")
                .with_cancel_tag("Event.Toggle")
                .applying_on_start("GE_Sprint"),
        );
        catalog.insert_item(ItemDefinition::equippable("Sword"));
        catalog
    }

    fn hero(role: NetRole, catalog: &DefinitionCatalog) -> Character {
        let definition = CharacterDefinition {
            name: "Hero".into(),
            data: CharacterData::new()
                .granting("GA_Sprint")
                .granting("GA_Fire")
                .granting("GA_Aim")
                .granting("GA_Toggle"),
            ..CharacterDefinition::default()
        };
        let mut hero = Character::new(
            EntityId::new(0, 0),
            role,
            Arc::new(definition),
            AttributeStore::new()
                .with_base(AttributeKind::MaxHealth, 100.0)
                .with_base(AttributeKind::Health, 50.0)
                .with_base(AttributeKind::MaxMovementSpeed, 500.0),
        );
        let env = Env::from_catalog(catalog);
        hero.possessed_by(&env, &mut ReplicationOutbox::new());
        hero
    }

    #[test]
    fn default_bindings_leave_axes_unrouted() {
        let router = EventRouter::default();
        for action in InputAction::iter() {
            let routed = router.resolve(&InputEvent::started(action)).is_some();
            let axis = matches!(
                action,
                InputAction::MoveForward | InputAction::MoveSide | InputAction::Turn | InputAction::LookUp
            );
            assert_eq!(routed, !axis, "{action}");
        }
        assert!(router.resolve(&InputEvent::axis(InputAction::Sprint, 0.5)).is_none());
    }

    #[test]
    fn sprint_press_and_release() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut hero = hero(NetRole::Authority, &catalog);
        let router = EventRouter::default();

        let pressed = router.dispatch(&InputEvent::started(InputAction::Sprint), &mut hero, &mut ctx);
        assert!(pressed.activated);
        assert_eq!(hero.movement_speed(), 800.0);

        let released =
            router.dispatch(&InputEvent::completed(InputAction::Sprint), &mut hero, &mut ctx);
        assert_eq!(released.cancelled, 1);
        assert_eq!(hero.movement_speed(), 500.0);
    }

    #[test]
    fn attack_event_reaches_listening_ability() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut hero = hero(NetRole::Authority, &catalog);

        let outcome = EventRouter::default().dispatch(
            &InputEvent::started(InputAction::Attack),
            &mut hero,
            &mut ctx,
        );
        assert_eq!(outcome.triggered, 1);
        assert!(!outcome.inventory_handled);
    }

    #[test]
    fn stop_event_cancels_ability_started_by_event() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut hero = hero(NetRole::Authority, &catalog);
        let router = EventRouter::default();

        let started = router.dispatch(&InputEvent::started(InputAction::Aim), &mut hero, &mut ctx);
        assert_eq!((started.triggered, started.cancelled), (1, 0));
        assert_eq!(hero.movement_speed(), 800.0);

        let stopped = router.dispatch(&InputEvent::completed(InputAction::Aim), &mut hero, &mut ctx);
        assert_eq!((stopped.triggered, stopped.cancelled), (0, 1));
        assert_eq!(hero.movement_speed(), 500.0);
    }

    #[test]
    fn event_that_both_triggers_and_cancels_leaves_ability_active() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut hero = hero(NetRole::Authority, &catalog);
        let mut router = EventRouter::unbound(CoreConfig::new());
        router.bind(
            InputAction::Aim,
            InputEdge::Started,
            Route::Event(GameplayTag::new("Event.Toggle")),
        );

        let outcome = router.dispatch(&InputEvent::started(InputAction::Aim), &mut hero, &mut ctx);
        assert_eq!((outcome.triggered, outcome.cancelled), (1, 0));
        assert_eq!(hero.movement_speed(), 800.0);
    }

    #[test]
    fn inventory_event_equips_next_item() {
        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut hero = hero(NetRole::Authority, &catalog);
        let sword = catalog.item(&"Sword".into()).unwrap();
        hero.with_inventory(env, &mut world, &mut outbox, |inventory, ctx| {
            inventory.add_item(ItemInstance::new(ItemInstanceId(1), sword), ctx)
        })
        .unwrap();

        let mut ctx = DispatchContext {
            env,
            world: &mut world,
            outbox: &mut outbox,
        };
        let outcome = EventRouter::default().dispatch(
            &InputEvent::started(InputAction::EquipNext),
            &mut hero,
            &mut ctx,
        );
        assert!(outcome.inventory_handled);
        assert_eq!(hero.inventory.equipped().map(|item| item.id), Some(ItemInstanceId(1)));
    }

    #[test]
    fn observer_queues_requests_instead_of_acting() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut observer = hero(NetRole::Observer, &catalog);
        let router = EventRouter::default();

        router.dispatch(&InputEvent::started(InputAction::Sprint), &mut observer, &mut ctx);
        router.dispatch(&InputEvent::started(InputAction::EquipNext), &mut observer, &mut ctx);

        let requests: Vec<Route> = observer
            .abilities
            .take_remote_requests()
            .into_iter()
            .map(Route::from)
            .collect();
        assert_eq!(
            requests,
            vec![
                Route::Activate(TagSet::single(tags::SPRINT)),
                Route::Event(GameplayTag::new(events::EQUIP_NEXT)),
            ]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn custom_binding_applies_effect_directly() {
        let catalog = catalog();
        let mut world = StubWorld::default();
        let mut outbox = ReplicationOutbox::new();
        let mut ctx = DispatchContext {
            env: Env::from_catalog(&catalog),
            world: &mut world,
            outbox: &mut outbox,
        };
        let mut hero = hero(NetRole::Authority, &catalog);
        let mut router = EventRouter::unbound(CoreConfig::new());
        router.bind(
            InputAction::Aim,
            InputEdge::Started,
            Route::ApplyEffect("GE_Heal".into()),
        );

        let outcome = router.dispatch(&InputEvent::started(InputAction::Aim), &mut hero, &mut ctx);
        assert!(outcome.effect.is_some());
        assert_eq!(
            hero.abilities.attributes().current(AttributeKind::Health),
            Some(60.0)
        );
    }

    #[test]
    fn debug_toggle_gates_drawing() {
        struct Empty;
        impl SpatialQuery for Empty {
            fn overlap_sphere(&self, _: Position, _: f32, _: &QueryFilter) -> Vec<EntityId> {
                Vec::new()
            }
            fn location(&self, _: EntityId) -> Option<Position> {
                None
            }
            fn line_trace(&self, _: Position, _: Position, _: &QueryFilter) -> Option<TraceHit> {
                None
            }
        }
        struct NoReceivers;
        impl DamageReceivers for NoReceivers {
            fn receiver(&mut self, _: EntityId) -> Option<&mut crate::system::AbilitySystem> {
                None
            }
        }

        let catalog = catalog();
        let env = Env::from_catalog(&catalog);
        let request = RadialDamage::new(Position::ZERO, 100.0, 10.0);

        let mut draw = RecordingDraw::default();
        EventRouter::new(CoreConfig::new()).apply_radial_damage(
            &request,
            &env,
            &Empty,
            &mut NoReceivers,
            &mut draw,
        );
        assert_eq!(draw.spheres, 0);

        EventRouter::new(CoreConfig::with_debug_radial_damage(true)).apply_radial_damage(
            &request,
            &env,
            &Empty,
            &mut NoReceivers,
            &mut draw,
        );
        assert_eq!(draw.spheres, 1);
    }
}
