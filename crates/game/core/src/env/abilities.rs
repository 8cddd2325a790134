use std::sync::Arc;

use crate::env::{AbilityId, EffectId};
use crate::state::{GameplayTag, TagSet};

pub trait AbilityOracle: Send + Sync {
    fn ability(&self, id: &AbilityId) -> Option<Arc<AbilityDefinition>>;
}

/// How an activated ability finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityBehavior {
    /// Ends itself synchronously during activation.
    Instant,
    /// Stays active until ended or cancelled (sprint, crouch, aim).
    #[default]
    Channeled,
    /// Ends on its own after a number of ticks.
    Timed { ticks: u64 },
}

/// Ability definition loaded from content.
///
/// Tag fields follow one convention: an empty set never matches, so an
/// ability without `cancel_tags` can only be ended explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityDefinition {
    pub id: AbilityId,
    /// Activation tags: `try_activate_by_tag` finds the ability through these.
    pub tags: TagSet,
    /// `cancel_by_tag` ends the ability when these intersect the query.
    pub cancel_tags: TagSet,
    /// Gameplay events that activate the ability.
    pub event_triggers: TagSet,
    /// Granted to the owner while the ability is active.
    pub activation_owned_tags: TagSet,
    /// Activation fails while the owner has any of these.
    pub activation_blocked_tags: TagSet,
    /// While active, other abilities whose tags match these cannot activate.
    pub block_abilities_with_tags: TagSet,
    pub cooldown_ticks: u64,
    /// Allows a second activation while already active.
    pub concurrent: bool,
    pub behavior: AbilityBehavior,
    /// Applied to the owner on activation, removed by handle on end.
    pub effects_to_apply_on_start: Vec<EffectId>,
    /// Removed from the owner by source on end.
    pub effects_to_remove_on_end: Vec<EffectId>,
}

impl AbilityDefinition {
    pub fn new(id: impl Into<AbilityId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_cancel_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.cancel_tags.insert(tag.into());
        self
    }

    pub fn with_event_trigger(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.event_triggers.insert(tag.into());
        self
    }

    pub fn with_owned_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.activation_owned_tags.insert(tag.into());
        self
    }

    pub fn blocked_by(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.activation_blocked_tags.insert(tag.into());
        self
    }

    pub fn blocking(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.block_abilities_with_tags.insert(tag.into());
        self
    }

    pub fn with_cooldown(mut self, ticks: u64) -> Self {
        self.cooldown_ticks = ticks;
        self
    }

    pub fn with_behavior(mut self, behavior: AbilityBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }

    pub fn applying_on_start(mut self, effect: impl Into<EffectId>) -> Self {
        self.effects_to_apply_on_start.push(effect.into());
        self
    }

    pub fn removing_on_end(mut self, effect: impl Into<EffectId>) -> Self {
        self.effects_to_remove_on_end.push(effect.into());
        self
    }
}
