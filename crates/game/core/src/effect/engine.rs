use std::collections::BTreeSet;

use tracing::debug;

use super::{ActiveEffect, ActiveEffects, AppliedModifier, ApplyFailure, EffectContext, EffectHandle};
use crate::attribute::{AttributeKind, AttributeStore};
use crate::env::{DurationPolicy, EffectDefinition, EffectId, Magnitude, StackingPolicy};
use crate::state::{EntityId, NetRole, TagSet};

/// Applies and removes effects on one owner.
///
/// The engine borrows the owner's attribute store and active-effect list for
/// the duration of one operation. Cross-entity effects (damage) are always
/// applied through the victim's own engine.
pub struct EffectEngine<'a> {
    owner: EntityId,
    role: NetRole,
    alive: bool,
    attributes: &'a mut AttributeStore,
    effects: &'a mut ActiveEffects,
}

impl<'a> EffectEngine<'a> {
    pub fn new(
        owner: EntityId,
        role: NetRole,
        alive: bool,
        attributes: &'a mut AttributeStore,
        effects: &'a mut ActiveEffects,
    ) -> Self {
        Self {
            owner,
            role,
            alive,
            attributes,
            effects,
        }
    }

    /// Applies `definition` to the owner.
    ///
    /// Instant effects change base values once and leave nothing behind; the
    /// returned handle then names an application that is no longer live.
    /// Duration and Infinite effects register an [`ActiveEffect`].
    pub fn apply(
        &mut self,
        definition: &EffectDefinition,
        owned_tags: &TagSet,
        context: &EffectContext,
    ) -> Result<EffectHandle, ApplyFailure> {
        if !self.alive {
            return Err(ApplyFailure::InvalidTarget);
        }
        if !self.role.is_authority() {
            return Err(ApplyFailure::NotAuthoritative);
        }
        if owned_tags.has_any(&definition.application_blocked_by) {
            debug!(
                target: "action::effect",
                owner = %self.owner,
                effect = %definition.id,
                "effect application blocked by tags"
            );
            return Err(ApplyFailure::Blocked);
        }

        let modifiers = resolve_modifiers(definition, context)?;

        let remaining = match definition.duration {
            DurationPolicy::Instant => {
                if !modifiers.is_empty()
                    && !modifiers
                        .iter()
                        .any(|modifier| self.attributes.contains(modifier.attribute))
                {
                    debug!(
                        target: "action::effect",
                        owner = %self.owner,
                        effect = %definition.id,
                        "instant effect touches no attribute of the owner"
                    );
                    return Err(ApplyFailure::InvalidTarget);
                }
                for modifier in &modifiers {
                    self.attributes
                        .add_to_base(modifier.attribute, modifier.magnitude);
                }
                return Ok(self.effects.allocate(self.owner));
            }
            DurationPolicy::Duration { ticks } => Some(ticks),
            DurationPolicy::Infinite => None,
        };

        if definition.stacking == StackingPolicy::RefreshDuration {
            let live = self
                .effects
                .entries
                .iter_mut()
                .find(|effect| effect.source == definition.id);
            if let Some(existing) = live {
                existing.remaining = remaining;
                existing.holders += 1;
                return Ok(existing.handle);
            }
        }

        let handle = self.effects.allocate(self.owner);
        let touched: BTreeSet<AttributeKind> = modifiers.iter().map(|m| m.attribute).collect();
        self.effects.entries.push(ActiveEffect {
            handle,
            source: definition.id.clone(),
            modifiers,
            duration: definition.duration,
            remaining,
            applied_by: context.instigator,
            tags: definition.tags.clone(),
            granted_tags: definition.granted_tags.clone(),
            holders: 1,
        });
        self.recompute(touched);

        debug!(
            target: "action::effect",
            owner = %self.owner,
            effect = %definition.id,
            handle = handle.serial,
            "effect registered"
        );
        Ok(handle)
    }

    /// Removes every live application created from `source`. Returns how many
    /// were removed.
    pub fn remove_by_source(&mut self, source: &EffectId) -> usize {
        self.remove_where(|effect| &effect.source == source)
    }

    /// Removes every live application whose definition carries any tag in
    /// `tags`. An empty set removes nothing.
    pub fn remove_with_tags(&mut self, tags: &TagSet) -> usize {
        self.remove_where(|effect| effect.tags.has_any(tags))
    }

    /// Removes exactly one application. Unknown or stale handles are a no-op.
    ///
    /// A refreshed application shared by several callers only releases one
    /// holder; its modifiers stay until the last holder lets go.
    pub fn remove(&mut self, handle: EffectHandle) -> bool {
        let shared = self
            .effects
            .entries
            .iter_mut()
            .find(|effect| effect.handle == handle && effect.holders > 1);
        if let Some(effect) = shared {
            effect.holders -= 1;
            return true;
        }
        self.remove_where(|effect| effect.handle == handle) > 0
    }

    /// Removes everything; used on owner destruction.
    pub fn clear(&mut self) -> usize {
        self.remove_where(|_| true)
    }

    /// Advances one simulation step. Expired Duration effects are removed in
    /// registration order and their handles returned in that order.
    pub fn tick(&mut self) -> Vec<EffectHandle> {
        let mut expired = Vec::new();
        for effect in &mut self.effects.entries {
            if let Some(remaining) = effect.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    expired.push(effect.handle);
                }
            }
        }

        if !expired.is_empty() {
            self.remove_where(|effect| expired.contains(&effect.handle));
        }
        expired
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&ActiveEffect) -> bool) -> usize {
        let mut touched = BTreeSet::new();
        let before = self.effects.entries.len();
        self.effects.entries.retain(|effect| {
            if predicate(effect) {
                touched.extend(effect.modifiers.iter().map(|m| m.attribute));
                false
            } else {
                true
            }
        });

        let removed = before - self.effects.entries.len();
        if removed > 0 {
            self.recompute(touched);
        }
        removed
    }

    fn recompute(&mut self, attributes: BTreeSet<AttributeKind>) {
        for attribute in attributes {
            let sum = self.effects.modifier_sum(attribute);
            self.attributes.set_modifier_sum(attribute, sum);
        }
    }
}

fn resolve_modifiers(
    definition: &EffectDefinition,
    context: &EffectContext,
) -> Result<Vec<AppliedModifier>, ApplyFailure> {
    definition
        .modifiers
        .iter()
        .map(|spec| {
            let magnitude = match &spec.magnitude {
                Magnitude::Scalar(value) => *value,
                Magnitude::SetByCaller(tag) => context.set_by_caller(tag).ok_or_else(|| {
                    debug!(
                        target: "action::effect",
                        effect = %definition.id,
                        tag = %tag,
                        "missing set-by-caller magnitude"
                    );
                    ApplyFailure::InvalidSource
                })?,
            };
            if !magnitude.is_finite() {
                return Err(ApplyFailure::InvalidSource);
            }
            Ok(AppliedModifier {
                attribute: spec.attribute,
                magnitude,
            })
        })
        .collect()
}
