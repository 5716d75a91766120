use crate::{Error, Result, SourceError};

/// A native provider of raw randomness.
///
/// This abstraction allows you to plug in the operating system's generator, a
/// hardware device, or a mocked source in tests. Raw values lie in
/// `[min(), max()]`, which need not be a power-of-two range.
///
/// # Example
/// ```
/// use steadyrand::{EntropySource, SourceError};
///
/// struct Dice(u64);
/// impl EntropySource for Dice {
///     fn entropy(&self) -> f64 {
///         6f64.log2()
///     }
///     fn min(&self) -> u64 {
///         1
///     }
///     fn max(&self) -> u64 {
///         6
///     }
///     fn draw(&mut self) -> Result<u64, SourceError> {
///         self.0 = self.0 % 6 + 1;
///         Ok(self.0)
///     }
/// }
///
/// let mut dice = Dice(0);
/// assert_eq!(dice.draw(), Ok(1));
/// ```
pub trait EntropySource {
    /// The source's own estimate of entropy per draw, in bits. Zero means the
    /// source admits it is deterministic.
    fn entropy(&self) -> f64;

    /// Smallest raw value.
    fn min(&self) -> u64;

    /// Largest raw value.
    fn max(&self) -> u64;

    /// Produces one raw value in `[min(), max()]`.
    fn draw(&mut self) -> Result<u64, SourceError>;
}

/// An [`EntropySource`] that can be opened by token.
///
/// `None` requests the platform default. The meaning of other tokens is up to
/// the implementation.
pub trait OpenSource: EntropySource + Sized {
    /// Opens the source.
    fn open(token: Option<&str>) -> Result<Self, SourceError>;
}

/// Owns an optional native source, its token, and the reliability verdict.
///
/// The verdict is made once, at construction: the source exists and reports
/// positive entropy. Afterwards it can only be revoked with
/// [`mark_unreliable`](Self::mark_unreliable), never restored.
#[derive(Debug)]
pub struct EntropyHandle<S> {
    native: Option<S>,
    token: Option<String>,
    reliable: bool,
}

impl<S: OpenSource> EntropyHandle<S> {
    /// Opens `S` with `token` and captures the outcome.
    ///
    /// # Errors
    /// Only [`Error::ResourceExhausted`]. Every other open failure yields an
    /// unreliable handle.
    pub fn open(token: Option<&str>) -> Result<Self> {
        Self::from_native(S::open(token), token)
    }
}

impl<S: EntropySource> EntropyHandle<S> {
    /// Builds a handle from the result of opening a native source.
    ///
    /// # Errors
    /// [`Error::ResourceExhausted`] if `native` is
    /// [`SourceError::ResourceExhausted`]. Every other error is absorbed and
    /// leaves the handle unreliable.
    pub fn from_native(
        native: Result<S, SourceError>,
        token: Option<&str>,
    ) -> Result<Self> {
        let native = match native {
            Ok(native) => Some(native),
            Err(SourceError::ResourceExhausted { context }) => {
                return Err(Error::ResourceExhausted { context });
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(token = ?token, "entropy source unavailable: {_e}");
                None
            }
        };
        let reliable = native.as_ref().is_some_and(|n| n.entropy() > 0.0);
        Ok(Self {
            native,
            token: token.map(str::to_owned),
            reliable,
        })
    }

    /// Whether the source is still trusted.
    pub fn reliable(&self) -> bool {
        self.reliable
    }

    /// Revokes trust in the source, permanently.
    pub fn mark_unreliable(&mut self) {
        self.reliable = false;
    }

    /// The token the handle was opened with.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The native source's raw range, if a source exists.
    pub fn range(&self) -> Option<(u64, u64)> {
        self.native.as_ref().map(|n| (n.min(), n.max()))
    }

    /// Draws one raw value from the native source.
    ///
    /// # Errors
    /// [`SourceError::Unavailable`] if there is no native source, or whatever
    /// the source itself reports.
    pub fn draw(&mut self) -> Result<u64, SourceError> {
        match self.native.as_mut() {
            Some(native) => native.draw(),
            None => Err(SourceError::unavailable("no native entropy source")),
        }
    }
}
