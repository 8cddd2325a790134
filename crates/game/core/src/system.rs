//! Per-entity ability system component.
//!
//! [`AbilitySystem`] bundles an entity's attributes, active effects and granted
//! abilities and enforces the authority rule in one place. Every mutation
//! checks the owner's [`NetRole`] first; observers only ever queue
//! [`RemoteRequest`]s for the boundary to forward.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ability::{
    AbilityHandle, AbilityRegistry, AbilitySpec, ActivationFailure, EndOutcome, GrantSource,
};
use crate::attribute::AttributeStore;
use crate::effect::{ActiveEffects, ApplyFailure, EffectContext, EffectEngine, EffectHandle};
use crate::env::{AbilityBehavior, AbilityDefinition, AbilityId, EffectDefinition, EffectId, Env};
use crate::error::GameError;
use crate::state::{EntityId, GameplayTag, NetRole, TagSet, Tick};

/// Activation-side request raised on an observer, to be validated and executed
/// by the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemoteRequest {
    ActivateByTag(TagSet),
    CancelByTag(TagSet),
    GameplayEvent(GameplayTag),
}

#[derive(Clone, Debug)]
pub struct AbilitySystem {
    owner: EntityId,
    role: NetRole,
    alive: bool,
    attributes: AttributeStore,
    effects: ActiveEffects,
    abilities: AbilityRegistry,
    loose_tags: TagSet,
    clock: Tick,
    remote_requests: Vec<RemoteRequest>,
}

impl AbilitySystem {
    pub fn new(owner: EntityId, role: NetRole, attributes: AttributeStore) -> Self {
        Self {
            owner,
            role,
            alive: true,
            attributes,
            effects: ActiveEffects::new(),
            abilities: AbilityRegistry::new(owner),
            loose_tags: TagSet::new(),
            clock: Tick::ZERO,
            remote_requests: Vec::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Exposes the store for draining change notifications only; values are
    /// written through effects.
    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }

    pub fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    pub fn ability(&self, handle: AbilityHandle) -> Option<&AbilitySpec> {
        self.abilities.get(handle)
    }

    /// Every tag the owner currently carries: loose tags, tags granted by live
    /// effects and tags owned by active abilities.
    pub fn owned_tags(&self) -> TagSet {
        let mut tags = self.loose_tags.clone();
        tags.extend(&self.effects.granted_tags());
        tags.extend(&self.abilities.active_owned_tags());
        tags
    }

    pub fn add_loose_tag(&mut self, tag: impl Into<GameplayTag>) {
        self.loose_tags.insert(tag.into());
    }

    pub fn remove_loose_tag(&mut self, tag: &GameplayTag) -> bool {
        self.loose_tags.remove(tag)
    }

    fn engine(&mut self) -> EffectEngine<'_> {
        EffectEngine::new(
            self.owner,
            self.role,
            self.alive,
            &mut self.attributes,
            &mut self.effects,
        )
    }

    // ========================================================================
    // Effects
    // ========================================================================

    pub fn apply_effect_to_self(
        &mut self,
        definition: &EffectDefinition,
        context: &EffectContext,
    ) -> Result<EffectHandle, ApplyFailure> {
        let owned = self.owned_tags();
        self.engine().apply(definition, &owned, context)
    }

    /// Resolves `id` through the environment and applies it.
    pub fn apply_effect_by_id(
        &mut self,
        env: &Env<'_>,
        id: &EffectId,
        context: &EffectContext,
    ) -> Result<EffectHandle, ApplyFailure> {
        let definition = env.effect(id).map_err(|error| {
            warn!(
                target: "action::effect",
                owner = %self.owner,
                code = error.error_code(),
                "{error}"
            );
            ApplyFailure::MissingDefinition(id.clone())
        })?;
        self.apply_effect_to_self(&definition, context)
    }

    /// Removes every application from `source`. Observers cannot mutate and get
    /// zero.
    pub fn remove_effects_by_source(&mut self, source: &EffectId) -> usize {
        if !self.role.is_authority() {
            return 0;
        }
        self.engine().remove_by_source(source)
    }

    pub fn remove_effects_with_tags(&mut self, tags: &TagSet) -> usize {
        if !self.role.is_authority() {
            return 0;
        }
        self.engine().remove_with_tags(tags)
    }

    pub fn remove_effect(&mut self, handle: EffectHandle) -> bool {
        if !self.role.is_authority() {
            return false;
        }
        self.engine().remove(handle)
    }

    // ========================================================================
    // Grants
    // ========================================================================

    /// Grants an ability. Only the authority may grant; observers get `None`.
    pub fn give_ability(
        &mut self,
        definition: Arc<AbilityDefinition>,
        source: GrantSource,
    ) -> Option<AbilityHandle> {
        if !self.role.is_authority() || !self.alive {
            debug!(
                target: "action::ability",
                owner = %self.owner,
                ability = %definition.id,
                "grant rejected"
            );
            return None;
        }
        Some(self.abilities.grant(definition, source))
    }

    pub fn give_ability_by_id(
        &mut self,
        env: &Env<'_>,
        id: &AbilityId,
        source: GrantSource,
    ) -> Option<AbilityHandle> {
        match env.ability(id) {
            Ok(definition) => self.give_ability(definition, source),
            Err(error) => {
                warn!(
                    target: "action::ability",
                    owner = %self.owner,
                    code = error.error_code(),
                    "{error}"
                );
                None
            }
        }
    }

    /// Ends the ability as cancelled (running its cleanup) and revokes it.
    pub fn clear_ability(&mut self, handle: AbilityHandle) -> bool {
        if !self.role.is_authority() {
            return false;
        }
        self.end_ability(handle, true);
        self.abilities.revoke(handle).is_some()
    }

    /// Revokes every ability granted by `source`.
    pub fn clear_abilities_from(&mut self, source: GrantSource) -> usize {
        self.abilities
            .granted_by(source)
            .into_iter()
            .filter(|handle| self.clear_ability(*handle))
            .count()
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Activates one ability after checking every gate.
    pub fn try_activate(
        &mut self,
        handle: AbilityHandle,
        env: &Env<'_>,
    ) -> Result<(), ActivationFailure> {
        if !self.alive {
            return Err(ActivationFailure::OwnerDead);
        }
        if !self.role.is_authority() {
            return Err(ActivationFailure::NotAuthoritative);
        }

        let owned = self.owned_tags();
        self.abilities.can_activate(handle, &owned, self.clock)?;
        let Some(definition) = self.abilities.get(handle).map(|s| Arc::clone(&s.definition)) else {
            return Err(ActivationFailure::NotGranted);
        };

        self.abilities.begin_activation(handle, self.clock);

        let context = EffectContext::from_instigator(self.owner);
        let mut applied = Vec::new();
        for id in &definition.effects_to_apply_on_start {
            let effect = match env.effect(id) {
                Ok(effect) => effect,
                Err(error) => {
                    warn!(
                        target: "action::ability",
                        ability = %definition.id,
                        code = error.error_code(),
                        "{error}"
                    );
                    continue;
                }
            };
            let owned = self.owned_tags();
            match self.engine().apply(&effect, &owned, &context) {
                Ok(effect_handle) if !effect.is_instant() => applied.push(effect_handle),
                Ok(_) => {}
                Err(failure) => debug!(
                    target: "action::ability",
                    ability = %definition.id,
                    effect = %id,
                    code = failure.error_code(),
                    "start effect not applied"
                ),
            }
        }

        self.abilities.finish_activation(handle, applied);
        debug!(
            target: "action::ability",
            owner = %self.owner,
            ability = %definition.id,
            "ability activated"
        );

        if definition.behavior == AbilityBehavior::Instant {
            self.end_ability(handle, false);
        }
        Ok(())
    }

    /// Attempts every granted ability whose activation tags intersect `tags`.
    /// Each attempt is independent; returns true if any activated.
    ///
    /// On an observer nothing activates locally. With `allow_remote` the
    /// request is queued for the authority.
    pub fn try_activate_by_tag(&mut self, tags: &TagSet, allow_remote: bool, env: &Env<'_>) -> bool {
        if !self.role.is_authority() {
            if allow_remote {
                self.remote_requests
                    .push(RemoteRequest::ActivateByTag(tags.clone()));
            }
            return false;
        }

        let mut any = false;
        for handle in self.abilities.matching(tags) {
            match self.try_activate(handle, env) {
                Ok(()) => any = true,
                Err(failure) => debug!(
                    target: "action::ability",
                    handle = %handle,
                    code = failure.error_code(),
                    "activation rejected"
                ),
            }
        }
        any
    }

    /// Ends, as cancelled, every active ability whose cancel tags intersect
    /// `tags`. Returns how many were ended.
    pub fn cancel_by_tag(&mut self, tags: &TagSet) -> usize {
        if !self.role.is_authority() {
            self.remote_requests
                .push(RemoteRequest::CancelByTag(tags.clone()));
            return 0;
        }

        self.abilities
            .cancellable_by(tags)
            .into_iter()
            .filter(|handle| self.end_ability(*handle, true))
            .count()
    }

    /// Ends an active ability and releases the effects it applied on start.
    ///
    /// Idempotent: ending an ability that is not active returns false and
    /// changes nothing.
    pub fn end_ability(&mut self, handle: AbilityHandle, was_cancelled: bool) -> bool {
        let Some(applied) = self.abilities.begin_end(handle) else {
            return false;
        };
        let definition = self
            .abilities
            .get(handle)
            .map(|spec| Arc::clone(&spec.definition));

        let mut engine = self.engine();
        for effect in applied {
            engine.remove(effect);
        }
        if let Some(definition) = &definition {
            for source in &definition.effects_to_remove_on_end {
                engine.remove_by_source(source);
            }
        }

        let outcome = if was_cancelled {
            EndOutcome::Cancelled
        } else {
            EndOutcome::Completed
        };
        self.abilities.finish_end(handle, outcome);
        debug!(
            target: "action::ability",
            owner = %self.owner,
            handle = %handle,
            ?outcome,
            "ability ended"
        );
        true
    }

    /// Activates every granted ability listening for `event`. Returns how many
    /// activated.
    pub fn handle_gameplay_event(&mut self, event: &GameplayTag, env: &Env<'_>) -> usize {
        if !self.role.is_authority() {
            self.remote_requests
                .push(RemoteRequest::GameplayEvent(event.clone()));
            return 0;
        }

        self.abilities
            .triggered_by(event)
            .into_iter()
            .filter(|handle| self.try_activate(*handle, env).is_ok())
            .count()
    }

    /// Executes a request forwarded from an observer. Validation happens here,
    /// on the authority, exactly as for a local stimulus.
    pub fn apply_remote_request(&mut self, request: &RemoteRequest, env: &Env<'_>) -> usize {
        match request {
            RemoteRequest::ActivateByTag(tags) => {
                usize::from(self.try_activate_by_tag(tags, false, env))
            }
            RemoteRequest::CancelByTag(tags) => self.cancel_by_tag(tags),
            RemoteRequest::GameplayEvent(event) => self.handle_gameplay_event(event, env),
        }
    }

    pub fn take_remote_requests(&mut self) -> Vec<RemoteRequest> {
        std::mem::take(&mut self.remote_requests)
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advances one simulation step: expires Duration effects, then completes
    /// timed abilities whose timer ran out.
    pub fn tick(&mut self) -> Vec<EffectHandle> {
        self.clock = self.clock + 1;
        if !self.role.is_authority() || !self.alive {
            return Vec::new();
        }

        let expired = self.engine().tick();
        for handle in self.abilities.tick_timers() {
            self.end_ability(handle, false);
        }
        expired
    }

    /// Ends every active ability, revokes all grants and clears all effects.
    /// The system rejects every later mutation.
    pub fn teardown(&mut self) {
        for handle in self.abilities.active() {
            self.end_ability(handle, true);
        }
        let handles: Vec<_> = self.abilities.iter().map(|spec| spec.handle).collect();
        for handle in handles {
            self.abilities.revoke(handle);
        }
        self.engine().clear();
        self.loose_tags = TagSet::new();
        self.alive = false;
    }
}
