//! Error types for rock generation

use thiserror::Error;

/// Errors that can occur while generating a rock
///
/// Generation is a pure function of its configuration, so none of these are
/// worth retrying with the same input: the caller has to change parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RockError {
    /// A parameter is outside its declared domain
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A stage produced a mesh the following stages cannot work with
    #[error("degenerate mesh: {0}")]
    DegenerateMesh(String),
    /// A stage produced non-finite coordinates
    #[error("numeric instability: {0}")]
    NumericInstability(String),
}

/// Result type alias for rock generation
pub type Result<T> = std::result::Result<T, RockError>;
