//! Minimal spatial and drawing collaborators for the headless session.
use action_core::{
    DebugColor, DebugDraw, EntityId, Position, QueryFilter, SpatialQuery, TraceHit, World,
};
use tracing::debug;

/// Point-sized characters and spherical blockers. No physics.
#[derive(Default)]
pub struct Scene {
    entities: Vec<(EntityId, Position)>,
    blockers: Vec<(Position, f32)>,
}

impl Scene {
    /// Snapshots character locations from `world`.
    pub fn from_world(world: &World) -> Self {
        Self {
            entities: world
                .characters()
                .map(|(id, character)| (id, character.location()))
                .collect(),
            blockers: Vec::new(),
        }
    }

    pub fn with_blocker(mut self, center: Position, radius: f32) -> Self {
        self.blockers.push((center, radius));
        self
    }

    fn first_blocker(&self, from: Position, to: Position) -> Option<Position> {
        let segment = to - from;
        let length = segment.length();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = segment / length;
        self.blockers
            .iter()
            .filter_map(|(center, radius)| {
                let along = (*center - from).dot(direction).clamp(0.0, length);
                let closest = from + direction * along;
                (closest.distance(*center) <= *radius).then_some((along, closest))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, at)| at)
    }
}

impl SpatialQuery for Scene {
    fn overlap_sphere(&self, center: Position, radius: f32, filter: &QueryFilter) -> Vec<EntityId> {
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
        if let Some(location) = self.first_blocker(from, to) {
            return Some(TraceHit {
                entity: None,
                location,
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

/// Writes debug shapes to the log instead of a viewport.
#[derive(Default)]
pub struct LogDraw {
    pub shapes: usize,
}

impl DebugDraw for LogDraw {
    fn line(&mut self, from: Position, to: Position, color: DebugColor, seconds: f32) {
        self.shapes += 1;
        debug!(target: "action::draw", %from, %to, ?color, seconds, "line");
    }

    fn sphere(&mut self, center: Position, radius: f32, color: DebugColor, seconds: f32) {
        self.shapes += 1;
        debug!(target: "action::draw", %center, radius, ?color, seconds, "sphere");
    }

    fn text(&mut self, at: Position, text: &str, color: DebugColor, seconds: f32) {
        self.shapes += 1;
        debug!(target: "action::draw", %at, text, ?color, seconds, "label");
    }
}
