//! Granted abilities and their activation state machine.
//!
//! ```text
//! Granted -> Activating -> Active -> Ending -> Granted
//! Granted -> Revoked
//! ```
//!
//! The registry only tracks state. Effects applied on activation are owned by
//! the effect engine; [`crate::system::AbilitySystem`] drives both.

mod error;

use std::fmt;
use std::sync::Arc;

pub use error::ActivationFailure;

use crate::effect::EffectHandle;
use crate::env::{AbilityBehavior, AbilityDefinition, AbilityId};
use crate::item::ItemInstanceId;
use crate::state::{EntityId, GameplayTag, TagSet, Tick};

/// Identifies one grant of an ability on one owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityHandle {
    pub owner: EntityId,
    pub serial: u32,
}

impl fmt::Display for AbilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/ga{}", self.owner, self.serial)
    }
}

/// What granted an ability; used to revoke everything from one source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GrantSource {
    Innate,
    CharacterData,
    Item(ItemInstanceId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityState {
    Granted,
    Activating,
    Active,
    Ending,
    Revoked,
}

/// How the most recent activation finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndOutcome {
    Completed,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct AbilitySpec {
    pub handle: AbilityHandle,
    pub definition: Arc<AbilityDefinition>,
    pub granted_by: GrantSource,
    pub state: AbilityState,
    /// First tick at which the ability may activate again.
    pub cooldown_until: Tick,
    /// Live effects applied on start; removed by handle on end.
    pub applied_effects: Vec<EffectHandle>,
    /// Ticks left for timed abilities.
    pub remaining: Option<u64>,
    /// Concurrent activations currently running.
    pub activations: u32,
    pub last_end: Option<EndOutcome>,
}

impl AbilitySpec {
    #[inline]
    pub fn id(&self) -> &AbilityId {
        &self.definition.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, AbilityState::Active | AbilityState::Activating)
    }

    pub fn is_on_cooldown(&self, now: Tick) -> bool {
        now < self.cooldown_until
    }
}

/// Per-entity set of granted abilities.
#[derive(Clone, Debug)]
pub struct AbilityRegistry {
    owner: EntityId,
    specs: Vec<AbilitySpec>,
    next_serial: u32,
}

impl AbilityRegistry {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            specs: Vec::new(),
            next_serial: 0,
        }
    }

    pub fn grant(&mut self, definition: Arc<AbilityDefinition>, source: GrantSource) -> AbilityHandle {
        let handle = AbilityHandle {
            owner: self.owner,
            serial: self.next_serial,
        };
        self.next_serial = self.next_serial.wrapping_add(1);
        self.specs.push(AbilitySpec {
            handle,
            definition,
            granted_by: source,
            state: AbilityState::Granted,
            cooldown_until: Tick::ZERO,
            applied_effects: Vec::new(),
            remaining: None,
            activations: 0,
            last_end: None,
        });
        handle
    }

    /// Removes the spec and returns it in the `Revoked` state. Callers end an
    /// active ability first.
    pub fn revoke(&mut self, handle: AbilityHandle) -> Option<AbilitySpec> {
        let index = self.specs.iter().position(|spec| spec.handle == handle)?;
        let mut spec = self.specs.remove(index);
        spec.state = AbilityState::Revoked;
        Some(spec)
    }

    pub fn get(&self, handle: AbilityHandle) -> Option<&AbilitySpec> {
        self.specs.iter().find(|spec| spec.handle == handle)
    }

    pub fn get_mut(&mut self, handle: AbilityHandle) -> Option<&mut AbilitySpec> {
        self.specs.iter_mut().find(|spec| spec.handle == handle)
    }

    pub fn find(&self, id: &AbilityId) -> Option<&AbilitySpec> {
        self.specs.iter().find(|spec| spec.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilitySpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Abilities whose activation tags intersect `tags`, in grant order.
    pub fn matching(&self, tags: &TagSet) -> Vec<AbilityHandle> {
        self.handles_where(|spec| spec.definition.tags.has_any(tags))
    }

    /// Abilities listening for the gameplay event `event`.
    pub fn triggered_by(&self, event: &GameplayTag) -> Vec<AbilityHandle> {
        self.handles_where(|spec| {
            spec.definition
                .event_triggers
                .iter()
                .any(|trigger| event.matches(trigger))
        })
    }

    /// Active abilities whose cancel tags intersect `tags`.
    pub fn cancellable_by(&self, tags: &TagSet) -> Vec<AbilityHandle> {
        self.handles_where(|spec| spec.is_active() && spec.definition.cancel_tags.has_any(tags))
    }

    pub fn active(&self) -> Vec<AbilityHandle> {
        self.handles_where(AbilitySpec::is_active)
    }

    pub fn granted_by(&self, source: GrantSource) -> Vec<AbilityHandle> {
        self.handles_where(|spec| spec.granted_by == source)
    }

    /// Union of tags granted to the owner by active abilities.
    pub fn active_owned_tags(&self) -> TagSet {
        let mut tags = TagSet::new();
        for spec in self.specs.iter().filter(|spec| spec.is_active()) {
            tags.extend(&spec.definition.activation_owned_tags);
        }
        tags
    }

    /// Checks every activation gate without mutating anything.
    pub fn can_activate(
        &self,
        handle: AbilityHandle,
        owned_tags: &TagSet,
        now: Tick,
    ) -> Result<(), ActivationFailure> {
        let spec = self.get(handle).ok_or(ActivationFailure::NotGranted)?;
        let definition = &spec.definition;

        if spec.is_active() && !definition.concurrent {
            return Err(ActivationFailure::AlreadyActive);
        }
        if spec.is_on_cooldown(now) {
            return Err(ActivationFailure::OnCooldown {
                until: spec.cooldown_until,
            });
        }
        if owned_tags.has_any(&definition.activation_blocked_tags) {
            return Err(ActivationFailure::BlockedByTag);
        }

        let blocker = self.specs.iter().find(|other| {
            other.handle != handle
                && other.is_active()
                && definition
                    .tags
                    .has_any(&other.definition.block_abilities_with_tags)
        });
        if let Some(blocker) = blocker {
            return Err(ActivationFailure::BlockedByAbility(blocker.id().clone()));
        }

        Ok(())
    }

    /// Moves a validated ability into `Activating` and commits its cooldown.
    pub(crate) fn begin_activation(&mut self, handle: AbilityHandle, now: Tick) -> bool {
        let Some(spec) = self.get_mut(handle) else {
            return false;
        };
        spec.state = AbilityState::Activating;
        spec.cooldown_until = now + spec.definition.cooldown_ticks;
        spec.activations = spec.activations.saturating_add(1);
        true
    }

    /// Completes activation: records the effects applied on start and arms the
    /// timer for timed abilities.
    pub(crate) fn finish_activation(&mut self, handle: AbilityHandle, applied: Vec<EffectHandle>) {
        if let Some(spec) = self.get_mut(handle) {
            spec.applied_effects.extend(applied);
            spec.state = AbilityState::Active;
            spec.remaining = match spec.definition.behavior {
                AbilityBehavior::Timed { ticks } => Some(ticks),
                AbilityBehavior::Instant | AbilityBehavior::Channeled => None,
            };
        }
    }

    /// Moves an active ability into `Ending` and hands back the effects it
    /// owns. Returns `None` if the ability is not active, which makes ending
    /// idempotent.
    pub(crate) fn begin_end(&mut self, handle: AbilityHandle) -> Option<Vec<EffectHandle>> {
        let spec = self.get_mut(handle)?;
        if !spec.is_active() {
            return None;
        }
        spec.state = AbilityState::Ending;
        spec.remaining = None;
        spec.activations = 0;
        Some(std::mem::take(&mut spec.applied_effects))
    }

    pub(crate) fn finish_end(&mut self, handle: AbilityHandle, outcome: EndOutcome) {
        if let Some(spec) = self.get_mut(handle) {
            spec.state = AbilityState::Granted;
            spec.last_end = Some(outcome);
        }
    }

    /// Advances timed abilities one step; returns those whose timer ran out.
    pub(crate) fn tick_timers(&mut self) -> Vec<AbilityHandle> {
        let mut finished = Vec::new();
        for spec in &mut self.specs {
            if let Some(remaining) = spec.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    finished.push(spec.handle);
                }
            }
        }
        finished
    }

    fn handles_where(&self, mut predicate: impl FnMut(&AbilitySpec) -> bool) -> Vec<AbilityHandle> {
        self.specs
            .iter()
            .filter(|spec| predicate(spec))
            .map(|spec| spec.handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: EntityId = EntityId::new(1, 0);

    fn sprint() -> Arc<AbilityDefinition> {
        Arc::new(
            AbilityDefinition::new("GA_Sprint")
                .with_tag("Ability.Movement.Sprint")
                .with_cancel_tag("Ability.Movement.Sprint")
                .with_cooldown(5),
        )
    }

    fn activate(registry: &mut AbilityRegistry, handle: AbilityHandle, now: Tick) {
        assert!(registry.begin_activation(handle, now));
        registry.finish_activation(handle, Vec::new());
    }

    #[test]
    fn lifecycle_loops_back_to_granted() {
        let mut registry = AbilityRegistry::new(OWNER);
        let handle = registry.grant(sprint(), GrantSource::Innate);

        activate(&mut registry, handle, Tick::ZERO);
        assert_eq!(registry.get(handle).map(|s| s.state), Some(AbilityState::Active));

        assert!(registry.begin_end(handle).is_some());
        registry.finish_end(handle, EndOutcome::Cancelled);
        let spec = registry.get(handle).unwrap();
        assert_eq!(spec.state, AbilityState::Granted);
        assert_eq!(spec.last_end, Some(EndOutcome::Cancelled));

        assert!(registry.begin_end(handle).is_none());
    }

    #[test]
    fn gates_reject_active_cooldown_and_blocked() {
        let mut registry = AbilityRegistry::new(OWNER);
        let handle = registry.grant(sprint(), GrantSource::Innate);
        let none = TagSet::new();

        activate(&mut registry, handle, Tick::ZERO);
        assert_eq!(
            registry.can_activate(handle, &none, Tick::ZERO),
            Err(ActivationFailure::AlreadyActive)
        );

        registry.begin_end(handle);
        registry.finish_end(handle, EndOutcome::Completed);
        assert_eq!(
            registry.can_activate(handle, &none, Tick::new(3)),
            Err(ActivationFailure::OnCooldown { until: Tick::new(5) })
        );
        assert!(registry.can_activate(handle, &none, Tick::new(5)).is_ok());
    }

    #[test]
    fn active_ability_blocks_tagged_siblings() {
        let mut registry = AbilityRegistry::new(OWNER);
        let crouch = registry.grant(
            Arc::new(
                AbilityDefinition::new("GA_Crouch")
                    .with_tag("Ability.Movement.Crouch")
                    .blocking("Ability.Movement.Sprint"),
            ),
            GrantSource::Innate,
        );
        let sprint = registry.grant(sprint(), GrantSource::Innate);

        activate(&mut registry, crouch, Tick::ZERO);
        assert_eq!(
            registry.can_activate(sprint, &TagSet::new(), Tick::ZERO),
            Err(ActivationFailure::BlockedByAbility(AbilityId::new("GA_Crouch")))
        );
    }

    #[test]
    fn revoked_handles_are_not_granted() {
        let mut registry = AbilityRegistry::new(OWNER);
        let handle = registry.grant(sprint(), GrantSource::Item(ItemInstanceId(7)));

        assert_eq!(registry.granted_by(GrantSource::Item(ItemInstanceId(7))), vec![handle]);
        let revoked = registry.revoke(handle).unwrap();
        assert_eq!(revoked.state, AbilityState::Revoked);
        assert_eq!(
            registry.can_activate(handle, &TagSet::new(), Tick::ZERO),
            Err(ActivationFailure::NotGranted)
        );
    }
}
