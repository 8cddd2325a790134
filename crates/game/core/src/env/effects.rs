use std::sync::Arc;

use crate::attribute::AttributeKind;
use crate::env::EffectId;
use crate::state::{GameplayTag, TagSet};

pub trait EffectOracle: Send + Sync {
    fn effect(&self, id: &EffectId) -> Option<Arc<EffectDefinition>>;
}

/// How long an application of an effect lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DurationPolicy {
    /// Applied once to the base value and discarded.
    Instant,
    /// Lives for a fixed number of simulation ticks.
    Duration { ticks: u64 },
    /// Lives until removed explicitly.
    Infinite,
}

/// Where a modifier's magnitude comes from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Magnitude {
    Scalar(f32),
    /// Supplied by the caller at application time under the given tag
    /// (e.g. a damage amount).
    SetByCaller(GameplayTag),
}

/// One additive modification of one attribute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSpec {
    pub attribute: AttributeKind,
    pub magnitude: Magnitude,
}

/// What happens when a source is applied again while an application from the
/// same source is still live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackingPolicy {
    /// Every application is tracked separately.
    #[default]
    Independent,
    /// The live application has its remaining duration reset instead.
    RefreshDuration,
}

/// Effect definition loaded from content.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    pub id: EffectId,
    pub duration: DurationPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierSpec>,
    /// Tags describing the effect itself; used by removal-with-tags.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagSet,
    /// Tags granted to the owner while the effect is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub granted_tags: TagSet,
    /// Application fails with `Blocked` if the target owns any of these.
    #[cfg_attr(feature = "serde", serde(default))]
    pub application_blocked_by: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking: StackingPolicy,
}

impl EffectDefinition {
    pub fn new(id: impl Into<EffectId>, duration: DurationPolicy) -> Self {
        Self {
            id: id.into(),
            duration,
            modifiers: Vec::new(),
            tags: TagSet::new(),
            granted_tags: TagSet::new(),
            application_blocked_by: TagSet::new(),
            stacking: StackingPolicy::Independent,
        }
    }

    pub fn instant(id: impl Into<EffectId>) -> Self {
        Self::new(id, DurationPolicy::Instant)
    }

    pub fn infinite(id: impl Into<EffectId>) -> Self {
        Self::new(id, DurationPolicy::Infinite)
    }

    pub fn timed(id: impl Into<EffectId>, ticks: u64) -> Self {
        Self::new(id, DurationPolicy::Duration { ticks })
    }

    pub fn with_modifier(mut self, attribute: AttributeKind, magnitude: f32) -> Self {
        self.modifiers.push(ModifierSpec {
            attribute,
            magnitude: Magnitude::Scalar(magnitude),
        });
        self
    }

    pub fn with_set_by_caller(mut self, attribute: AttributeKind, tag: GameplayTag) -> Self {
        self.modifiers.push(ModifierSpec {
            attribute,
            magnitude: Magnitude::SetByCaller(tag),
        });
        self
    }

    pub fn with_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_granted_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.granted_tags.insert(tag.into());
        self
    }

    pub fn blocked_by(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.application_blocked_by.insert(tag.into());
        self
    }

    pub fn with_stacking(mut self, stacking: StackingPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    #[inline]
    pub fn is_instant(&self) -> bool {
        matches!(self.duration, DurationPolicy::Instant)
    }
}
