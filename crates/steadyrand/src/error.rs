/// A result type whose error defaults to [`Error`].
///
/// Drawing random values is infallible. Only constructing a device (and
/// registering host-owned globals) can fail.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that `steadyrand` surfaces to callers.
///
/// Everything else that can go wrong with an entropy source is absorbed by
/// the device and turned into a permanent switch to the fallback generator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The process ran out of a resource (typically memory) while opening
    /// the entropy source. This is never downgraded to the fallback path.
    #[error("resource exhausted while opening entropy source: {context}")]
    ResourceExhausted { context: String },

    /// Host-owned global instances were registered more than once.
    #[error("global instances are already registered")]
    AlreadyRegistered,
}

/// Failures reported by an [`EntropySource`] or [`OpenSource`].
///
/// [`EntropySource`]: crate::EntropySource
/// [`OpenSource`]: crate::OpenSource
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The native source could not be opened.
    #[error("entropy source unavailable: {reason}")]
    Unavailable { reason: String },

    /// The native source failed while producing a value.
    #[error("entropy source draw failed: {reason}")]
    DrawFailed { reason: String },

    /// Opening the source ran out of memory or a similar hard resource.
    #[error("resource exhausted: {context}")]
    ResourceExhausted { context: String },
}

impl SourceError {
    /// Shorthand for [`SourceError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SourceError::DrawFailed`].
    pub fn draw_failed(reason: impl Into<String>) -> Self {
        Self::DrawFailed {
            reason: reason.into(),
        }
    }
}
