//! Error types for the fleet simulation.

use thiserror::Error;

use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid unit reference.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A spawn referenced a template that the catalog does not define.
    #[error("Unknown unit template: {0}")]
    UnknownTemplate(String),

    /// A unit kind string did not match any known kind.
    #[error("Unknown unit kind: {0}")]
    UnknownUnitKind(String),

    /// An attack type string did not match any known delivery.
    #[error("Unknown attack type: {0}")]
    UnknownAttackType(String),

    /// A skill kind string did not match any known skill.
    #[error("Unknown skill kind: {0}")]
    UnknownSkillKind(String),

    /// An AI kind string did not match any known controller.
    #[error("Unknown AI kind: {0}")]
    UnknownAiKind(String),

    /// A template stat is missing or outside its valid range.
    #[error("Invalid stat '{stat}' in template '{template}': {message}")]
    InvalidTemplate {
        /// Template identifier.
        template: String,
        /// Offending stat name.
        stat: String,
        /// What was wrong with it.
        message: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
