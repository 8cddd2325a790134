//! Active effect bookkeeping.
//!
//! [`ActiveEffects`] stores live applications in registration order;
//! [`EffectEngine`] is the only code path that creates or removes them and the
//! only writer of the owner's [`crate::attribute::AttributeStore`].

mod engine;
mod error;

use std::collections::BTreeMap;
use std::fmt;

pub use engine::EffectEngine;
pub use error::ApplyFailure;

use crate::attribute::AttributeKind;
use crate::env::{DurationPolicy, EffectId};
use crate::state::{EntityId, GameplayTag, TagSet};

/// Identifies one application of an effect on one owner.
///
/// Two independent applications of the same definition always receive
/// distinct handles. A refresh-duration application hands back the handle of
/// the live entry it refreshed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle {
    pub owner: EntityId,
    pub serial: u32,
}

impl fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/fx{}", self.owner, self.serial)
    }
}

/// A modifier with its magnitude resolved at application time.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedModifier {
    pub attribute: AttributeKind,
    pub magnitude: f32,
}

/// A live Duration or Infinite application.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffect {
    pub handle: EffectHandle,
    /// Definition the application was created from.
    pub source: EffectId,
    pub modifiers: Vec<AppliedModifier>,
    pub duration: DurationPolicy,
    /// Ticks left; `None` for infinite effects.
    pub remaining: Option<u64>,
    /// Back-reference to the instigating entity, never ownership.
    pub applied_by: Option<EntityId>,
    pub tags: TagSet,
    pub granted_tags: TagSet,
    /// Callers sharing this application through duration refresh. The entry
    /// stays live until each of them has removed its handle or it expires.
    pub holders: u32,
}

/// Per-application inputs supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectContext {
    pub instigator: Option<EntityId>,
    set_by_caller: BTreeMap<GameplayTag, f32>,
}

impl EffectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instigator(instigator: EntityId) -> Self {
        Self {
            instigator: Some(instigator),
            ..Self::default()
        }
    }

    /// Supplies the magnitude for modifiers declared as set-by-caller under
    /// `tag`.
    pub fn with_set_by_caller(mut self, tag: impl Into<GameplayTag>, magnitude: f32) -> Self {
        self.set_by_caller.insert(tag.into(), magnitude);
        self
    }

    pub fn set_by_caller(&self, tag: &GameplayTag) -> Option<f32> {
        self.set_by_caller.get(tag).copied()
    }
}

/// Live effects of one owner, in registration order.
#[derive(Clone, Debug, Default)]
pub struct ActiveEffects {
    entries: Vec<ActiveEffect>,
    next_serial: u32,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.entries.iter()
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&ActiveEffect> {
        self.entries.iter().find(|effect| effect.handle == handle)
    }

    pub fn contains(&self, handle: EffectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Union of the tags granted by every live effect.
    pub fn granted_tags(&self) -> TagSet {
        let mut tags = TagSet::new();
        for effect in &self.entries {
            tags.extend(&effect.granted_tags);
        }
        tags
    }

    fn allocate(&mut self, owner: EntityId) -> EffectHandle {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        EffectHandle { owner, serial }
    }

    fn modifier_sum(&self, attribute: AttributeKind) -> f32 {
        self.entries
            .iter()
            .flat_map(|effect| effect.modifiers.iter())
            .filter(|modifier| modifier.attribute == attribute)
            .map(|modifier| modifier.magnitude)
            .sum()
    }
}
