//! Effect application errors.

use crate::env::EffectId;
use crate::error::{ErrorCategory, GameError};

/// Reasons an effect application was rejected. The target is left unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApplyFailure {
    /// Target owns a tag listed in the effect's `application_blocked_by`.
    #[error("application blocked by target tags")]
    Blocked,

    /// Target is dead, destroyed, or does not exist.
    #[error("invalid target")]
    InvalidTarget,

    /// Magnitude could not be computed (missing set-by-caller value, non-finite
    /// magnitude).
    #[error("invalid source")]
    InvalidSource,

    /// Mutation attempted on an observer.
    #[error("not authoritative")]
    NotAuthoritative,

    #[error("effect definition '{0}' not found")]
    MissingDefinition(EffectId),
}

impl GameError for ApplyFailure {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Blocked => ErrorCategory::BlockedByTag,
            Self::MissingDefinition(_) => ErrorCategory::MissingDefinition,
            Self::InvalidTarget | Self::InvalidSource | Self::NotAuthoritative => {
                ErrorCategory::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Blocked => "EFFECT_BLOCKED",
            Self::InvalidTarget => "EFFECT_INVALID_TARGET",
            Self::InvalidSource => "EFFECT_INVALID_SOURCE",
            Self::NotAuthoritative => "EFFECT_NOT_AUTHORITATIVE",
            Self::MissingDefinition(_) => "EFFECT_MISSING_DEFINITION",
        }
    }
}
