//! Identifiers, arena storage and tag primitives shared by every subsystem.
//!
//! Entities are addressed through generational [`EntityId`]s handed out by an
//! [`EntityArena`]; effects, abilities and items only ever hold those ids as
//! back-references, so destroying an entity can never leave dangling state.
pub mod arena;
pub mod common;
pub mod tags;

pub use arena::EntityArena;
pub use common::{EntityId, NetRole, Position, Tick};
pub use tags::{GameplayTag, TagSet};
