//! Typed engine errors.
//!
//! Fatal conditions surface as [`ResolveError`] values returned to the caller;
//! the engine never terminates the process itself. The CLI decides what a
//! fatal resolution means for the exit code, and library consumers (including
//! the test suite) can match on the variants.

use thiserror::Error;

/// Result alias used across the engine.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Errors that can end a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Required field, no-prompt mode, and nothing resolvable from the
    /// supplied bag, the default, or the candidate list. Guidance has already
    /// been printed when this is returned.
    #[error("missing required option '{field}'")]
    MissingRequired { field: String },

    /// A supplied token matched more than one candidate by display name in
    /// no-prompt mode. Interactive flows re-prompt instead of raising this.
    #[error("value '{token}' for '{field}' is ambiguous; use the value instead of the name")]
    AmbiguousValue {
        field: String,
        token: String,
        matches: Vec<String>,
    },

    /// The schema failed the load-time validation pass.
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// Terminal input failed (no TTY, closed stream).
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Option-source transport failure, propagated uncaught so the calling
    /// command can substitute a fallback list.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ResolveError {
    pub(crate) fn invalid_schema(reason: impl Into<String>) -> Self {
        Self::InvalidSchema { reason: reason.into() }
    }
}
