//! Network-replicated gameplay entity core.
//!
//! `action-core` holds the authoritative rules for attributes, effects,
//! abilities and inventories, and the contracts for everything outside them
//! (world actors, area queries, debug drawing, replication transport). Only
//! the authority mutates state; observers re-derive presentation from
//! [`replication::ReplicatedChange`]s delivered through a
//! [`replication::ReplicationBoundary`].
//!
//! Stimuli enter through [`router::EventRouter`], which resolves them to
//! ability activation on a [`system::AbilitySystem`], direct effect
//! application, or an [`inventory::InventoryController`] transition.
pub mod ability;
pub mod attribute;
pub mod character;
pub mod config;
pub mod effect;
pub mod env;
pub mod error;
pub mod inventory;
pub mod item;
pub mod replication;
pub mod router;
pub mod state;
pub mod system;
pub mod world;

pub use ability::{
    AbilityHandle, AbilityRegistry, AbilitySpec, AbilityState, ActivationFailure, EndOutcome,
    GrantSource,
};
pub use attribute::{Attribute, AttributeChange, AttributeKind, AttributeStore};
pub use character::Character;
pub use config::CoreConfig;
pub use effect::{
    ActiveEffect, ActiveEffects, ApplyFailure, EffectContext, EffectEngine, EffectHandle,
};
pub use env::{
    AbilityBehavior, AbilityDefinition, AbilityId, AbilityOracle, AnimationProfileRef,
    CharacterData, CharacterDefinition, DefinitionCatalog, DurationPolicy, EffectDefinition,
    EffectId, EffectOracle, Env, ItemCapabilities, ItemDefId, ItemDefinition, ItemKind,
    ItemOracle, Magnitude, MeshKind, ModifierSpec, OracleError, ProjectileDefinition,
    StackingPolicy, WeaponData,
};
pub use error::{ErrorCategory, GameError};
pub use inventory::{InventoryContext, InventoryController, InventoryError, RejectedItem};
pub use item::{
    ItemActor, ItemActorId, ItemActorMode, ItemInstance, ItemInstanceId, ItemState, ItemSummary,
    WorldPort,
};
pub use replication::{
    EntityPresentation, LoopbackBoundary, ObserverMirror, RecordingBoundary, ReplicatedChange,
    ReplicatedFields, ReplicationBoundary, ReplicationObserver, ReplicationOutbox,
};
pub use router::{
    DamageReceivers, DebugColor, DebugDraw, DispatchContext, DispatchOutcome, EventRouter,
    InputAction, InputEdge, InputEvent, QueryFilter, RadialDamage, RadialDamageReport, Route,
    SpatialQuery, TraceHit, WorldStimulus,
};
pub use state::{EntityArena, EntityId, GameplayTag, NetRole, Position, TagSet, Tick};
pub use system::{AbilitySystem, RemoteRequest};
pub use world::{ActorRegistry, TickReport, World, WorldError};
