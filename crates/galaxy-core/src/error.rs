//! Error taxonomy shared by generation, regeneration, and the frame loop.

/// Errors raised by the galaxy core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GalaxyError {
    /// A parameter failed validation before any buffer was allocated.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// The rendering surface or device is gone; fatal for the session.
    #[error("rendering resource unavailable: {0}")]
    ResourceUnavailable(String),
}

impl GalaxyError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}
