//! Radial damage resolution.
//!
//! An area query finds candidates around the origin; each candidate is hit
//! only if a line trace from the origin reaches it first. Every unobstructed
//! candidate receives the damage effects through its own ability system with
//! the damage passed as a set-by-caller magnitude.

use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::effect::{ApplyFailure, EffectContext};
use crate::env::{EffectId, Env, ProjectileDefinition};
use crate::error::GameError;
use crate::state::{EntityId, GameplayTag, Position};
use crate::system::AbilitySystem;

/// Set-by-caller tag carrying the (negative) health delta of a damage effect.
pub const DAMAGE_MAGNITUDE_TAG: &str = "Attribute.Health";

/// Entities excluded from area queries and traces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub ignore: Vec<EntityId>,
}

impl QueryFilter {
    pub fn ignoring(entity: Option<EntityId>) -> Self {
        Self {
            ignore: entity.into_iter().collect(),
        }
    }

    pub fn ignores(&self, entity: EntityId) -> bool {
        self.ignore.contains(&entity)
    }
}

/// First blocking hit of a line trace. `entity` is `None` for static
/// geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceHit {
    pub entity: Option<EntityId>,
    pub location: Position,
}

/// Area-query collaborator.
pub trait SpatialQuery {
    /// Entities overlapping the sphere, excluding filtered ones.
    fn overlap_sphere(&self, center: Position, radius: f32, filter: &QueryFilter) -> Vec<EntityId>;

    fn location(&self, entity: EntityId) -> Option<Position>;

    /// First blocking hit between two points, or `None` if nothing blocks.
    fn line_trace(&self, from: Position, to: Position, filter: &QueryFilter) -> Option<TraceHit>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugColor {
    Green,
    Red,
    White,
}

/// Diagnostic drawing collaborator.
pub trait DebugDraw {
    fn line(&mut self, from: Position, to: Position, color: DebugColor, seconds: f32);
    fn sphere(&mut self, center: Position, radius: f32, color: DebugColor, seconds: f32);
    fn text(&mut self, at: Position, text: &str, color: DebugColor, seconds: f32);
}

/// Resolves the ability system of a damage candidate.
pub trait DamageReceivers {
    fn receiver(&mut self, entity: EntityId) -> Option<&mut AbilitySystem>;
}

/// One radial damage request.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialDamage {
    /// Excluded from the query; recorded as instigator.
    pub causer: Option<EntityId>,
    pub origin: Position,
    pub radius: f32,
    /// Positive damage amount; applied as `-damage` to health.
    pub damage: f32,
    pub effects: Vec<EffectId>,
}

impl RadialDamage {
    pub fn new(origin: Position, radius: f32, damage: f32) -> Self {
        Self {
            causer: None,
            origin,
            radius,
            damage,
            effects: Vec::new(),
        }
    }

    pub fn caused_by(mut self, causer: EntityId) -> Self {
        self.causer = Some(causer);
        self
    }

    pub fn with_effect(mut self, effect: impl Into<EffectId>) -> Self {
        self.effects.push(effect.into());
        self
    }

    /// Damage request for a projectile impact at `origin`.
    pub fn from_projectile(
        projectile: &ProjectileDefinition,
        causer: Option<EntityId>,
        origin: Position,
    ) -> Self {
        Self {
            causer,
            origin,
            radius: projectile.damage_radius,
            damage: projectile.base_damage,
            effects: projectile.effects.clone(),
        }
    }
}

/// Outcome of one radial damage pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialDamageReport {
    pub candidates: usize,
    /// Received at least one effect.
    pub damaged: Vec<EntityId>,
    /// Blocked by something other than the candidate, or no trace hit.
    pub occluded: Vec<EntityId>,
    pub failures: Vec<(EntityId, ApplyFailure)>,
}

/// Runs one radial damage pass. Failure on one target or one effect never
/// stops the remaining ones.
pub fn resolve_radial_damage(
    request: &RadialDamage,
    env: &Env<'_>,
    query: &dyn SpatialQuery,
    receivers: &mut dyn DamageReceivers,
    mut debug_draw: Option<&mut dyn DebugDraw>,
) -> RadialDamageReport {
    let filter = QueryFilter::ignoring(request.causer);
    let candidates = query.overlap_sphere(request.origin, request.radius, &filter);
    let mut report = RadialDamageReport {
        candidates: candidates.len(),
        ..RadialDamageReport::default()
    };
    let seconds = CoreConfig::DEBUG_DRAW_SECONDS;

    let mut context = EffectContext::new()
        .with_set_by_caller(GameplayTag::new(DAMAGE_MAGNITUDE_TAG), -request.damage);
    context.instigator = request.causer;

    for candidate in candidates {
        let Some(target_location) = query.location(candidate) else {
            continue;
        };
        let Some(hit) = query.line_trace(request.origin, target_location, &filter) else {
            report.occluded.push(candidate);
            continue;
        };

        if hit.entity != Some(candidate) {
            report.occluded.push(candidate);
            if let Some(draw) = debug_draw.as_deref_mut() {
                draw.line(request.origin, target_location, DebugColor::Red, seconds);
                draw.sphere(hit.location, CoreConfig::DEBUG_HIT_MARKER_RADIUS, DebugColor::Red, seconds);
                let label = hit.entity.map(|e| e.to_string()).unwrap_or_default();
                draw.text(hit.location, &label, DebugColor::Red, seconds);
            }
            continue;
        }

        let applied = apply_damage_effects(request, env, candidate, receivers, &context, &mut report);
        if applied {
            report.damaged.push(candidate);
        }

        if let Some(draw) = debug_draw.as_deref_mut() {
            let color = if applied {
                DebugColor::Green
            } else {
                DebugColor::Red
            };
            draw.line(request.origin, target_location, color, seconds);
            draw.sphere(hit.location, CoreConfig::DEBUG_HIT_MARKER_RADIUS, color, seconds);
            draw.text(hit.location, &candidate.to_string(), DebugColor::White, seconds);
        }
    }

    if let Some(draw) = debug_draw.as_deref_mut() {
        draw.sphere(request.origin, request.radius, DebugColor::Red, seconds);
    }

    debug!(
        target: "action::router",
        candidates = report.candidates,
        damaged = report.damaged.len(),
        occluded = report.occluded.len(),
        "radial damage resolved"
    );
    report
}

fn apply_damage_effects(
    request: &RadialDamage,
    env: &Env<'_>,
    target: EntityId,
    receivers: &mut dyn DamageReceivers,
    context: &EffectContext,
    report: &mut RadialDamageReport,
) -> bool {
    let Some(system) = receivers.receiver(target) else {
        report.failures.push((target, ApplyFailure::InvalidTarget));
        return false;
    };

    let mut applied = false;
    for effect in &request.effects {
        match system.apply_effect_by_id(env, effect, context) {
            Ok(_) => applied = true,
            Err(failure) => {
                if failure.category().is_content_error() {
                    warn!(target: "action::router", effect = %effect, "damage effect unresolved");
                }
                report.failures.push((target, failure));
            }
        }
    }
    applied
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators shared by router and world tests.

    use super::*;

    /// Spheres for entities plus axis-aligned walls along the x axis.
    #[derive(Default)]
    pub struct FlatWorld {
        pub entities: Vec<(EntityId, Position)>,
        /// x coordinates of infinite walls perpendicular to the x axis.
        pub walls: Vec<f32>,
    }

    impl SpatialQuery for FlatWorld {
        fn overlap_sphere(
            &self,
            center: Position,
            radius: f32,
            filter: &QueryFilter,
        ) -> Vec<EntityId> {
            self.entities
                .iter()
                .filter(|(id, at)| !filter.ignores(*id) && at.distance(center) <= radius)
                .map(|(id, _)| *id)
                .collect()
        }

        fn location(&self, entity: EntityId) -> Option<Position> {
            self.entities
                .iter()
                .find(|(id, _)| *id == entity)
                .map(|(_, at)| *at)
        }

        fn line_trace(&self, from: Position, to: Position, filter: &QueryFilter) -> Option<TraceHit> {
            let (lo, hi) = if from.x <= to.x { (from.x, to.x) } else { (to.x, from.x) };
            if let Some(wall) = self.walls.iter().find(|x| **x > lo && **x < hi) {
                return Some(TraceHit {
                    entity: None,
                    location: Position::new(*wall, from.y, from.z),
                });
            }
            self.entities
                .iter()
                .find(|(id, at)| !filter.ignores(*id) && *at == to)
                .map(|(id, at)| TraceHit {
                    entity: Some(*id),
                    location: *at,
                })
        }
    }

    #[derive(Default)]
    pub struct RecordingDraw {
        pub lines: Vec<DebugColor>,
        pub spheres: usize,
        pub labels: Vec<String>,
    }

    impl DebugDraw for RecordingDraw {
        fn line(&mut self, _from: Position, _to: Position, color: DebugColor, _seconds: f32) {
            self.lines.push(color);
        }

        fn sphere(&mut self, _center: Position, _radius: f32, _color: DebugColor, _seconds: f32) {
            self.spheres += 1;
        }

        fn text(&mut self, _at: Position, text: &str, _color: DebugColor, _seconds: f32) {
            self.labels.push(text.to_owned());
        }
    }
}
