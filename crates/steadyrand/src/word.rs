use crate::{Crc16, Crc32c, Crc64Jones, WhiteningHash};
use core::fmt;
use core::hash::Hash;
use core::ops::BitXor;
use rand::RngCore;

mod sealed {
    pub trait Sealed {}
}

/// The fixed-width unsigned integer a [`RandomDevice`] produces.
///
/// Implemented for `u8`, `u16`, `u32` and `u64` only. Each width carries the
/// whitening hash used to derive its time seeds and knows how to adapt a
/// fallback engine's native output to its own width.
///
/// [`RandomDevice`]: crate::RandomDevice
pub trait Word:
    sealed::Sealed
    + Copy
    + Clone
    + Default
    + fmt::Debug
    + fmt::Display
    + Ord
    + PartialOrd
    + Eq
    + PartialEq
    + Hash
    + BitXor<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Width in bits.
    const BITS: u32;

    /// Smallest value (always zero).
    const MIN: Self;

    /// Largest value (all bits set).
    const MAX: Self;

    /// Zero, the neutral element for XOR.
    const ZERO: Self;

    /// Whitening hash used for time seeds of this width.
    type Hash: WhiteningHash;

    /// Truncates `raw` to this width, keeping the low-order bits.
    fn truncate(raw: u64) -> Self;

    /// Zero-extends this value to 64 bits.
    fn widen(self) -> u64;

    /// Draws one value of this width from `rng`'s native output.
    fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Self;
}

macro_rules! define_word {
    ($int:ty, $hash:ty, $next:ident) => {
        impl sealed::Sealed for $int {}

        impl Word for $int {
            const BITS: u32 = <$int>::BITS;
            const MIN: Self = <$int>::MIN;
            const MAX: Self = <$int>::MAX;
            const ZERO: Self = 0;

            type Hash = $hash;

            #[inline]
            fn truncate(raw: u64) -> Self {
                raw as $int
            }

            #[inline]
            fn widen(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Self {
                rng.$next() as $int
            }
        }
    };
}

define_word!(u8, Crc16, next_u32);
define_word!(u16, Crc16, next_u32);
define_word!(u32, Crc32c, next_u32);
define_word!(u64, Crc64Jones, next_u64);
