//! Turning raw draws from an arbitrary-range source into uniform words.
//!
//! Two shapes of source range are handled:
//!
//! - **Sane**: `[0, 2^k - 1]`. Raw draws are concatenated `k` bits at a
//!   time.
//! - **Insane**: any other range of size `s`. Draws are combined as digits
//!   of a base-`s` number and the result is scaled onto the word range with
//!   exact integer arithmetic.
//!
//! The insane path is approximately uniform: each output value has either
//! `floor(s^n / 2^W)` or `ceil(s^n / 2^W)` preimages among the `s^n` digit
//! sequences, so per-value probabilities deviate from `2^-W` by a relative
//! error of at most `2^W / s^n`. Extra draws tighten that bound (see
//! [`Extractor::with_extra_draws`]).

use crate::{SourceError, Word};
use core::marker::PhantomData;

/// How a source's raw range is turned into words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// The range is `[0, 2^chunk_bits - 1]`.
    Sane {
        /// Bits contributed by each draw.
        chunk_bits: u32,
    },
    /// The range is `[min, min + size - 1]` with `size` not a power of two.
    Insane {
        /// Lower bound of the raw range.
        min: u64,
        /// Number of distinct raw values.
        size: u128,
        /// Draws combined per word.
        iterations: u32,
        /// `size.pow(iterations)`, the number of digit sequences.
        span: u128,
    },
}

/// A per-width extraction plan for one source range.
///
/// Built once when a device is constructed; every draw then runs a loop whose
/// bound is fixed by the plan, so extraction always terminates.
///
/// # Example
/// ```
/// use steadyrand::{Extraction, Extractor, SourceError};
///
/// // A byte-wide source feeding 32-bit words takes four draws.
/// let extractor = Extractor::<u32>::new(0, 0xff).unwrap();
/// assert_eq!(extractor.plan(), Extraction::Sane { chunk_bits: 8 });
///
/// let mut bytes = [0x12u64, 0x34, 0x56, 0x78].into_iter();
/// let word = extractor
///     .extract(|| bytes.next().ok_or_else(|| SourceError::draw_failed("empty")))
///     .unwrap();
/// assert_eq!(word, 0x1234_5678);
/// ```
#[derive(Debug)]
pub struct Extractor<W> {
    plan: Extraction,
    _word: PhantomData<fn() -> W>,
}

impl<W> Clone for Extractor<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Extractor<W> {}

impl<W: Word> Extractor<W> {
    /// Plans extraction for a source producing values in `[min, max]`.
    ///
    /// Returns `None` when the range is empty or holds a single value, since
    /// such a source carries no entropy at all.
    pub fn new(min: u64, max: u64) -> Option<Self> {
        Self::with_extra_draws(min, max, 0)
    }

    /// Like [`Self::new`], but an insane source is drawn `extra` more times
    /// than the minimum needed to cover `W` bits. Each extra draw divides the
    /// bias bound by the range size.
    ///
    /// Returns `None` if the combined digit space would not fit in 128 bits.
    /// Sane sources are exact already and ignore `extra`.
    pub fn with_extra_draws(min: u64, max: u64, extra: u32) -> Option<Self> {
        if max <= min {
            return None;
        }

        if min == 0 && max & max.wrapping_add(1) == 0 {
            return Some(Self::from_plan(Extraction::Sane {
                chunk_bits: u64::BITS - max.leading_zeros(),
            }));
        }

        let size = u128::from(max - min) + 1;
        let target = 1u128 << W::BITS;
        let mut span = 1u128;
        let mut iterations = 0u32;
        // Smallest n with size^n >= 2^W. Before the last step span < 2^64 and
        // size < 2^64, so this cannot overflow.
        while span < target {
            span *= size;
            iterations += 1;
        }
        for _ in 0..extra {
            span = span.checked_mul(size)?;
            iterations += 1;
        }

        Some(Self::from_plan(Extraction::Insane {
            min,
            size,
            iterations,
            span,
        }))
    }

    fn from_plan(plan: Extraction) -> Self {
        Self {
            plan,
            _word: PhantomData,
        }
    }

    /// The extraction plan.
    pub fn plan(&self) -> Extraction {
        self.plan
    }

    /// Number of raw draws consumed per word.
    pub fn draws(&self) -> u32 {
        match self.plan {
            Extraction::Sane { chunk_bits } => W::BITS.div_ceil(chunk_bits),
            Extraction::Insane { iterations, .. } => iterations,
        }
    }

    /// Upper bound on the relative deviation of any output value's
    /// probability from `2^-W`. Zero for sane sources.
    pub fn bias_bound(&self) -> f64 {
        match self.plan {
            Extraction::Sane { .. } => 0.0,
            Extraction::Insane { span, .. } => 2f64.powi(W::BITS as i32) / span as f64,
        }
    }

    /// Produces one word, calling `draw` exactly [`Self::draws`] times unless
    /// a draw fails first.
    ///
    /// A raw value outside the planned range is reported as
    /// [`SourceError::DrawFailed`]: the source is not behaving as declared.
    pub fn extract(
        &self,
        mut draw: impl FnMut() -> Result<u64, SourceError>,
    ) -> Result<W, SourceError> {
        match self.plan {
            Extraction::Sane { chunk_bits } => {
                let max = u64::MAX >> (u64::BITS - chunk_bits);
                let mut result = 0u64;
                let mut entropy = 0;
                // When W is not a multiple of chunk_bits the last chunk
                // overlaps bits already placed; callers pick compatible widths.
                while entropy < W::BITS {
                    let raw = Self::checked(draw()?, 0, max)?;
                    result = if chunk_bits < W::BITS {
                        (result << chunk_bits) | raw
                    } else {
                        result | raw
                    };
                    entropy += chunk_bits;
                }
                Ok(W::truncate(result))
            }
            Extraction::Insane {
                min,
                size,
                iterations,
                span,
            } => {
                let max = (u128::from(min) + size - 1) as u64;
                let mut value = 0u128;
                for _ in 0..iterations {
                    let raw = Self::checked(draw()?, min, max)?;
                    value = value * size + u128::from(raw - min);
                }
                Ok(W::truncate(Self::scale(value, span)))
            }
        }
    }

    fn checked(raw: u64, min: u64, max: u64) -> Result<u64, SourceError> {
        if (min..=max).contains(&raw) {
            Ok(raw)
        } else {
            Err(SourceError::draw_failed(format!(
                "raw value {raw} outside declared range [{min}, {max}]"
            )))
        }
    }

    /// `floor(value * 2^W / span)` for `value < span`, by binary long
    /// division so nothing wider than `u128` is needed.
    fn scale(value: u128, span: u128) -> u64 {
        debug_assert!(value < span);
        let mut remainder = value;
        let mut out = 0u64;
        for _ in 0..W::BITS {
            out <<= 1;
            let gap = span - remainder;
            if remainder >= gap {
                remainder -= gap;
                out |= 1;
            } else {
                remainder += remainder;
            }
        }
        out
    }
}
