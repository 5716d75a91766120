//! Whitening hashes used to turn clock readings into seed material.
//!
//! These are checksums, not cryptographic hashes. All that is needed from them
//! is that flipping a low-order bit of a clock reading scatters across the
//! whole digest.

use crc::{CRC_16_ARC, CRC_32_ISCSI, CRC_64_REDIS, Crc, Digest};

/// An incremental hash with a fixed digest width.
///
/// A fresh instance is obtained with [`Default::default`], fed with
/// [`update`](Self::update) any number of times, and consumed by
/// [`finalize`](Self::finalize).
///
/// # Example
/// ```
/// use steadyrand::{Crc32c, WhiteningHash};
///
/// let mut hash = Crc32c::default();
/// hash.update(b"1234");
/// hash.update(b"56789");
/// assert_eq!(hash.finalize(), 0xe306_9283);
/// ```
pub trait WhiteningHash: Default {
    /// Width of the digest in bits.
    const BITS: u32;

    /// Feeds `bytes` into the running digest.
    fn update(&mut self, bytes: &[u8]);

    /// Consumes the hash and returns the digest, zero-extended to 64 bits.
    fn finalize(self) -> u64;
}

macro_rules! define_crc_hash {
    (
        $(#[$meta:meta])*
        $name:ident, $int:ty, $algorithm:expr
    ) => {
        $(#[$meta])*
        pub struct $name {
            digest: Digest<'static, $int>,
        }

        impl $name {
            fn crc() -> &'static Crc<$int> {
                static CRC: Crc<$int> = Crc::<$int>::new(&$algorithm);
                &CRC
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    digest: Self::crc().digest(),
                }
            }
        }

        impl WhiteningHash for $name {
            const BITS: u32 = <$int>::BITS;

            fn update(&mut self, bytes: &[u8]) {
                self.digest.update(bytes);
            }

            fn finalize(self) -> u64 {
                u64::from(self.digest.finalize())
            }
        }
    };
}

define_crc_hash!(
    /// CRC-16/ARC. Whitens seeds for 8- and 16-bit words.
    Crc16, u16, CRC_16_ARC
);

define_crc_hash!(
    /// CRC-32C (Castagnoli, a.k.a. CRC-32/ISCSI). Whitens seeds for 32-bit
    /// words.
    Crc32c, u32, CRC_32_ISCSI
);

define_crc_hash!(
    /// CRC-64 with the Jones polynomial (CRC-64/REDIS). Whitens seeds for
    /// 64-bit words.
    Crc64Jones, u64, CRC_64_REDIS
);
