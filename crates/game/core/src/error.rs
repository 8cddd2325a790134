//! Common error infrastructure for action-core.
//!
//! This module provides shared types and traits used across all error types in
//! the crate. Domain-specific errors (e.g., `ApplyFailure`, `ActivationFailure`)
//! are defined in their respective modules alongside the operations they guard.
//!
//! # Design Principles
//!
//! - **Non-fatal**: every failure degrades to "state unchanged, caller informed"
//! - **Categorized**: each variant maps onto one [`ErrorCategory`]
//! - **Stable codes**: `error_code()` strings are safe to use in logs and tests

/// Category of a core failure, used for logging and caller-side handling.
///
/// There is no fatal category: the core never aborts on a failed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCategory {
    /// Invalid target or source, not authoritative, or already in the
    /// requested state.
    ///
    /// Recovered locally; the caller receives a boolean/enum result.
    Validation,

    /// The operation was blocked by the current tag state of the entity.
    BlockedByTag,

    /// An item, ability or effect definition could not be resolved.
    ///
    /// Logged, and the operation becomes a no-op.
    MissingDefinition,
}

impl ErrorCategory {
    /// Returns a human-readable description of this category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::BlockedByTag => "blocked_by_tag",
            Self::MissingDefinition => "missing_definition",
        }
    }

    /// Returns true if the failure indicates broken content rather than a
    /// transient gameplay condition.
    pub const fn is_content_error(&self) -> bool {
        matches!(self, Self::MissingDefinition)
    }
}

/// Common trait for all action-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify by the failure taxonomy, not by impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the category of this error.
    fn category(&self) -> ErrorCategory;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
