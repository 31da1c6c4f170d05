//! Route construction errors.

use thiserror::Error;

use crate::routing::pattern::PatternError;
use crate::transforms::TransformError;

/// Errors that can occur while building a runtime route.
#[derive(Debug, Error)]
pub enum RouteBuildError {
    /// A required input is missing or inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The route path could not be parsed.
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    /// Transform construction failed; the collaborator's error is kept as-is.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result type for route construction.
pub type RouteBuildResult<T> = Result<T, RouteBuildError>;
