use smol_str::SmolStr;

use crate::env::{AbilityId, EffectId};
use crate::state::TagSet;

/// Reference to an animation profile owned by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AnimationProfileRef(pub SmolStr);

impl AnimationProfileRef {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }
}

/// Immutable-at-runtime bundle applied at possession and on reinitialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharacterData {
    pub granted_abilities: Vec<AbilityId>,
    pub startup_effects: Vec<EffectId>,
    pub animation_profile: Option<AnimationProfileRef>,
}

impl CharacterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granting(mut self, ability: impl Into<AbilityId>) -> Self {
        self.granted_abilities.push(ability.into());
        self
    }

    pub fn with_startup_effect(mut self, effect: impl Into<EffectId>) -> Self {
        self.startup_effects.push(effect.into());
        self
    }

    pub fn with_animation_profile(mut self, profile: AnimationProfileRef) -> Self {
        self.animation_profile = Some(profile);
        self
    }
}

/// Character archetype: initial data plus the movement-state hooks the
/// character reacts to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharacterDefinition {
    pub name: SmolStr,
    pub data: CharacterData,
    /// Applied on crouch start, removed by source on crouch end.
    pub crouch_state_effect: Option<EffectId>,
    /// Effects carrying any of these tags are stripped on landing.
    pub in_air_tags: TagSet,
}
