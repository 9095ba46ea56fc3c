//! Error types for the NLM library.

use thiserror::Error;

/// Errors surfaced by the NLM pipeline and quality metrics.
///
/// Parameter problems are always reported to the caller, never silently
/// corrected. Degenerate weight sums inside the estimator are not errors;
/// they recover locally to the target's own intensity (see
/// `estimator::weighted_average`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NlmError {
    /// A window size, smoothing parameter, padding width, or region mask
    /// failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl NlmError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        NlmError::InvalidParameter(msg.into())
    }
}
