use std::sync::Arc;

use smol_str::SmolStr;

use crate::env::{AbilityId, AnimationProfileRef, EffectId, ItemDefId};

pub trait ItemOracle: Send + Sync {
    fn item(&self, id: &ItemDefId) -> Option<Arc<ItemDefinition>>;
}

bitflags::bitflags! {
    /// Capabilities an item definition opts into explicitly.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ItemCapabilities: u8 {
        const EQUIPPABLE = 1 << 0;
        const DROPPABLE = 1 << 1;
    }
}

/// Item definition with common fields and kind-specific data.
///
/// # Design: Base + Kind Pattern
///
/// - Base struct holds what every item has (name, grants, attachment)
/// - `kind` is a small closed set carrying kind-specific data
/// - `capabilities` gate the inventory transitions explicitly
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: ItemDefId,
    pub name: SmolStr,
    pub kind: ItemKind,
    pub capabilities: ItemCapabilities,
    /// Socket on the owner the equipped representation attaches to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attachment_socket: Option<SmolStr>,
    /// Granted to the owner while equipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub granted_abilities: Vec<AbilityId>,
    /// Applied to the owner while equipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ongoing_effects: Vec<EffectId>,
    /// Animation profile the owner switches to while the item is equipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub animation_profile: Option<AnimationProfileRef>,
}

impl ItemDefinition {
    pub fn new(id: impl Into<ItemDefId>, kind: ItemKind, capabilities: ItemCapabilities) -> Self {
        let id = id.into();
        Self {
            name: id.0.clone(),
            id,
            kind,
            capabilities,
            attachment_socket: None,
            granted_abilities: Vec::new(),
            ongoing_effects: Vec::new(),
            animation_profile: None,
        }
    }

    /// An equippable, droppable item with no kind-specific data.
    pub fn equippable(id: impl Into<ItemDefId>) -> Self {
        Self::new(
            id,
            ItemKind::Generic,
            ItemCapabilities::EQUIPPABLE | ItemCapabilities::DROPPABLE,
        )
    }

    pub fn with_socket(mut self, socket: impl AsRef<str>) -> Self {
        self.attachment_socket = Some(SmolStr::new(socket.as_ref()));
        self
    }

    pub fn granting_ability(mut self, ability: impl Into<AbilityId>) -> Self {
        self.granted_abilities.push(ability.into());
        self
    }

    pub fn with_ongoing_effect(mut self, effect: impl Into<EffectId>) -> Self {
        self.ongoing_effects.push(effect.into());
        self
    }

    #[inline]
    pub fn can_be_equipped(&self) -> bool {
        self.capabilities.contains(ItemCapabilities::EQUIPPABLE)
    }

    #[inline]
    pub fn can_be_dropped(&self) -> bool {
        self.capabilities.contains(ItemCapabilities::DROPPABLE)
    }

    /// Mesh used by the world representation.
    pub fn mesh(&self) -> &MeshKind {
        match &self.kind {
            ItemKind::Weapon(weapon) => &weapon.mesh,
            ItemKind::Generic => &MeshKind::None,
        }
    }
}

/// Closed set of item kinds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Generic,
    Weapon(WeaponData),
}

/// Weapon-specific data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponData {
    pub damage_effect: Option<EffectId>,
    pub base_damage: f32,
    /// Attacks per second.
    pub fire_rate: f32,
    pub mesh: MeshKind,
}

/// Mesh representation of an item in the world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeshKind {
    #[default]
    None,
    Static(SmolStr),
    Skeletal(SmolStr),
}

/// Projectile data consumed by the radial damage path on impact.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectileDefinition {
    pub base_damage: f32,
    pub damage_radius: f32,
    /// Instant effects applied to every unobstructed target in radius.
    pub effects: Vec<EffectId>,
}
