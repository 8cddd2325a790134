//! Numeric gameplay attributes.
//!
//! Each attribute keeps a base value and a current value. The current value is
//! always `base + Σ(active modifiers)`; the sum is owned by the effect engine,
//! which is the only writer of this store.

use std::collections::BTreeMap;

/// Closed set of attributes the core knows about.
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
pub enum AttributeKind {
    Health,
    MaxHealth,
    Stamina,
    MaxStamina,
    MaxMovementSpeed,
}

impl AttributeKind {
    /// The attribute that caps this one's base value, if any.
    pub const fn clamped_by(self) -> Option<AttributeKind> {
        match self {
            Self::Health => Some(Self::MaxHealth),
            Self::Stamina => Some(Self::MaxStamina),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub kind: AttributeKind,
    pub base: f32,
    pub current: f32,
}

/// Change notification raised whenever an attribute's current value moves.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeChange {
    pub attribute: AttributeKind,
    pub old_value: f32,
    pub new_value: f32,
}

/// Per-entity attribute storage.
#[derive(Clone, Debug, Default)]
pub struct AttributeStore {
    attributes: BTreeMap<AttributeKind, Attribute>,
    modifier_sums: BTreeMap<AttributeKind, f32>,
    changes: Vec<AttributeChange>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by character setup and tests.
    pub fn with_base(mut self, kind: AttributeKind, base: f32) -> Self {
        self.define(kind, base);
        self
    }

    /// Defines (or redefines) an attribute's base value. Does not raise a
    /// change notification.
    pub fn define(&mut self, kind: AttributeKind, base: f32) {
        let sum = self.modifier_sums.get(&kind).copied().unwrap_or(0.0);
        self.attributes.insert(
            kind,
            Attribute {
                kind,
                base,
                current: base + sum,
            },
        );
    }

    pub fn contains(&self, kind: AttributeKind) -> bool {
        self.attributes.contains_key(&kind)
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.get(&kind)
    }

    pub fn base(&self, kind: AttributeKind) -> Option<f32> {
        self.get(kind).map(|attribute| attribute.base)
    }

    pub fn current(&self, kind: AttributeKind) -> Option<f32> {
        self.get(kind).map(|attribute| attribute.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Adds `delta` to the base value. Health and stamina are clamped into
    /// `[0, max]` when their max attribute is defined.
    ///
    /// Returns false if the attribute is undefined.
    pub(crate) fn add_to_base(&mut self, kind: AttributeKind, delta: f32) -> bool {
        let Some(base) = self.base(kind) else {
            return false;
        };
        self.set_base(kind, base + delta)
    }

    pub(crate) fn set_base(&mut self, kind: AttributeKind, value: f32) -> bool {
        let cap = kind.clamped_by().and_then(|max| self.current(max));
        let value = match cap {
            Some(max) => value.clamp(0.0, max.max(0.0)),
            None => value,
        };

        let Some(attribute) = self.attributes.get_mut(&kind) else {
            return false;
        };
        attribute.base = value;
        self.refresh(kind);
        true
    }

    /// Stores the aggregated modifier sum for `kind` and recomputes its current
    /// value.
    pub(crate) fn set_modifier_sum(&mut self, kind: AttributeKind, sum: f32) {
        if sum == 0.0 {
            self.modifier_sums.remove(&kind);
        } else {
            self.modifier_sums.insert(kind, sum);
        }
        self.refresh(kind);
    }

    pub fn modifier_sum(&self, kind: AttributeKind) -> f32 {
        self.modifier_sums.get(&kind).copied().unwrap_or(0.0)
    }

    /// Takes every queued change notification in the order raised.
    pub fn drain_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.changes)
    }

    fn refresh(&mut self, kind: AttributeKind) {
        let sum = self.modifier_sum(kind);
        let Some(attribute) = self.attributes.get_mut(&kind) else {
            return;
        };

        let old_value = attribute.current;
        attribute.current = attribute.base + sum;
        if attribute.current != old_value {
            self.changes.push(AttributeChange {
                attribute: kind,
                old_value,
                new_value: attribute.current,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn store() -> AttributeStore {
        AttributeStore::new()
            .with_base(AttributeKind::MaxHealth, 100.0)
            .with_base(AttributeKind::Health, 100.0)
            .with_base(AttributeKind::MaxMovementSpeed, 500.0)
    }

    #[test]
    fn current_tracks_base_plus_modifiers() {
        let mut store = store();
        store.set_modifier_sum(AttributeKind::MaxMovementSpeed, -200.0);
        assert_eq!(store.current(AttributeKind::MaxMovementSpeed), Some(300.0));
        assert_eq!(store.base(AttributeKind::MaxMovementSpeed), Some(500.0));

        store.set_modifier_sum(AttributeKind::MaxMovementSpeed, 0.0);
        assert_eq!(store.current(AttributeKind::MaxMovementSpeed), Some(500.0));
    }

    #[test]
    fn health_is_clamped_to_max() {
        let mut store = store();
        assert!(store.add_to_base(AttributeKind::Health, 50.0));
        assert_eq!(store.base(AttributeKind::Health), Some(100.0));

        assert!(store.add_to_base(AttributeKind::Health, -250.0));
        assert_eq!(store.base(AttributeKind::Health), Some(0.0));
    }

    #[test]
    fn undefined_attribute_is_not_written() {
        let mut store = store();
        assert!(!store.add_to_base(AttributeKind::Stamina, 10.0));
        assert_eq!(store.current(AttributeKind::Stamina), None);
    }

    #[test]
    fn changes_are_queued_in_order() {
        let mut store = store();
        store.add_to_base(AttributeKind::Health, -30.0);
        store.set_modifier_sum(AttributeKind::MaxMovementSpeed, -200.0);

        let changes = store.drain_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].attribute, AttributeKind::Health);
        assert_eq!(changes[0].new_value, 70.0);
        assert_eq!(changes[1].old_value, 500.0);
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(AttributeKind::MaxMovementSpeed.to_string(), "max_movement_speed");
        assert_eq!(
            AttributeKind::from_str("max_health").ok(),
            Some(AttributeKind::MaxHealth)
        );
    }
}
