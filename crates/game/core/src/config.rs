/// Core configuration constants and tunable parameters.
///
/// The only runtime-tunable flag is the radial damage debug toggle; it is
/// threaded into [`crate::router::EventRouter`] at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Draw diagnostic shapes while resolving radial damage.
    pub debug_radial_damage: bool,
}

impl CoreConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of item instances one inventory can hold.
    pub const MAX_INVENTORY_SLOTS: usize = 16;

    // ===== fixed simulation constants =====
    /// Duration of a debug shape drawn by the radial damage resolver, in seconds.
    pub const DEBUG_DRAW_SECONDS: f32 = 4.0;
    /// Radius of the impact marker sphere drawn at trace hits.
    pub const DEBUG_HIT_MARKER_RADIUS: f32 = 16.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DEBUG_RADIAL_DAMAGE: bool = false;

    pub fn new() -> Self {
        Self {
            debug_radial_damage: Self::DEFAULT_DEBUG_RADIAL_DAMAGE,
        }
    }

    pub fn with_debug_radial_damage(debug_radial_damage: bool) -> Self {
        Self {
            debug_radial_damage,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
