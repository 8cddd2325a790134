//! Ability activation errors.

use crate::env::AbilityId;
use crate::error::{ErrorCategory, GameError};
use crate::state::Tick;

/// Reasons an activation attempt was rejected. Nothing was mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationFailure {
    /// Handle does not name a granted ability (revoked or never granted).
    #[error("ability not granted")]
    NotGranted,

    /// Ability is already active and not marked concurrent.
    #[error("ability already active")]
    AlreadyActive,

    #[error("ability on cooldown until tick {until}")]
    OnCooldown { until: Tick },

    /// Owner carries one of the ability's activation-blocked tags.
    #[error("activation blocked by owned tags")]
    BlockedByTag,

    /// Another active ability blocks abilities with this one's tags.
    #[error("activation blocked by active ability '{0}'")]
    BlockedByAbility(AbilityId),

    #[error("owner is not alive")]
    OwnerDead,

    /// Local activation attempted on an observer.
    #[error("not authoritative")]
    NotAuthoritative,
}

impl GameError for ActivationFailure {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::BlockedByTag | Self::BlockedByAbility(_) => ErrorCategory::BlockedByTag,
            Self::NotGranted
            | Self::AlreadyActive
            | Self::OnCooldown { .. }
            | Self::OwnerDead
            | Self::NotAuthoritative => ErrorCategory::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotGranted => "ABILITY_NOT_GRANTED",
            Self::AlreadyActive => "ABILITY_ALREADY_ACTIVE",
            Self::OnCooldown { .. } => "ABILITY_ON_COOLDOWN",
            Self::BlockedByTag => "ABILITY_BLOCKED_BY_TAG",
            Self::BlockedByAbility(_) => "ABILITY_BLOCKED_BY_ABILITY",
            Self::OwnerDead => "ABILITY_OWNER_DEAD",
            Self::NotAuthoritative => "ABILITY_NOT_AUTHORITATIVE",
        }
    }
}
