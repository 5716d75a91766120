use crate::{MonotonicClock, TimeSource, WallClock, WhiteningHash, Word};

/// A source of whitened seed material of any [`Word`] width.
///
/// [`TimeSeeder`] is the production implementation. Tests substitute fixed
/// seeders to pin the instant a fallback generator is seeded at.
pub trait SeedSource {
    /// Returns a fresh seed of width `W`.
    fn generate_seed<W: Word>(&self) -> W;
}

impl<T: SeedSource + ?Sized> SeedSource for &T {
    fn generate_seed<W: Word>(&self) -> W {
        (**self).generate_seed()
    }
}

/// Derives seeds from two independent clock readings.
///
/// Each seed hashes the wall-clock and the monotonic reading (64-bit
/// nanosecond counts, big-endian, in that order) with a fresh instance of the
/// word's [`WhiteningHash`]. The wall clock alone is often too coarse to tell
/// two calls apart; the monotonic clock is not.
///
/// No state is kept between calls.
///
/// # Example
/// ```
/// use steadyrand::TimeSeeder;
///
/// let seeder = TimeSeeder::default();
/// let a = seeder.generate_seed64();
/// let b = seeder.generate_seed64();
/// // Different with overwhelming probability.
/// println!("{a:#x} {b:#x}");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TimeSeeder<C = WallClock, M = MonotonicClock>
where
    C: TimeSource,
    M: TimeSource,
{
    wall: C,
    monotonic: M,
}

impl Default for TimeSeeder {
    /// A seeder over the system wall clock and the process monotonic clock.
    fn default() -> Self {
        Self::new(WallClock, MonotonicClock)
    }
}

impl<C, M> TimeSeeder<C, M>
where
    C: TimeSource,
    M: TimeSource,
{
    /// Creates a seeder reading the given wall and monotonic clocks.
    pub fn new(wall: C, monotonic: M) -> Self {
        Self { wall, monotonic }
    }

    /// An 8-bit seed (whitened with CRC-16).
    pub fn generate_seed8(&self) -> u8 {
        self.generate_seed()
    }

    /// A 16-bit seed (whitened with CRC-16).
    pub fn generate_seed16(&self) -> u16 {
        self.generate_seed()
    }

    /// A 32-bit seed (whitened with CRC-32C).
    pub fn generate_seed32(&self) -> u32 {
        self.generate_seed()
    }

    /// A 64-bit seed (whitened with CRC-64/Jones).
    pub fn generate_seed64(&self) -> u64 {
        self.generate_seed()
    }
}

impl<C, M> SeedSource for TimeSeeder<C, M>
where
    C: TimeSource,
    M: TimeSource,
{
    fn generate_seed<W: Word>(&self) -> W {
        let mut hash = W::Hash::default();
        hash.update(&self.wall.current_nanos().to_be_bytes());
        hash.update(&self.monotonic.current_nanos().to_be_bytes());
        W::truncate(hash.finalize())
    }
}

/// Seed-sequence decorrelation of raw seed words.
///
/// Adjacent, low-entropy words (a split timestamp, a handful of ASCII bytes)
/// make poor generator state when used directly. `SeedSeq` mixes them into an
/// arbitrary number of well-spread 32-bit words using the same generation
/// algorithm as C++'s `std::seed_seq`, so identical inputs always yield
/// identical outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedSeq {
    words: Vec<u32>,
}

impl SeedSeq {
    const FILL: u32 = 0x8b8b_8b8b;
    const MIX_MULT: u32 = 1_664_525;
    const DIFFUSE_MULT: u32 = 1_566_083_941;

    /// Creates a sequence from raw seed words, in order.
    pub fn new(words: impl IntoIterator<Item = u32>) -> Self {
        Self {
            words: words.into_iter().collect(),
        }
    }

    /// The raw words this sequence was built from.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Fills `out` with decorrelated words.
    pub fn generate(&self, out: &mut [u32]) {
        let n = out.len();
        if n == 0 {
            return;
        }
        out.fill(Self::FILL);

        let s = self.words.len();
        let t = match n {
            623.. => 11,
            68.. => 7,
            39.. => 5,
            7.. => 3,
            _ => (n - 1) / 2,
        };
        let p = (n - t) / 2;
        let q = p + t;
        let m = (s + 1).max(n);

        let temper = |x: u32| x ^ (x >> 27);

        for k in 0..m {
            let r1 = Self::MIX_MULT
                .wrapping_mul(temper(out[k % n] ^ out[(k + p) % n] ^ out[(k + n - 1) % n]));
            let r2 = r1.wrapping_add(match k {
                0 => s as u32,
                k if k <= s => ((k % n) as u32).wrapping_add(self.words[k - 1]),
                k => (k % n) as u32,
            });
            out[(k + p) % n] = out[(k + p) % n].wrapping_add(r1);
            out[(k + q) % n] = out[(k + q) % n].wrapping_add(r2);
            out[k % n] = r2;
        }

        for k in m..m + n {
            let r3 = Self::DIFFUSE_MULT.wrapping_mul(temper(
                out[k % n]
                    .wrapping_add(out[(k + p) % n])
                    .wrapping_add(out[(k + n - 1) % n]),
            ));
            let r4 = r3.wrapping_sub((k % n) as u32);
            out[(k + p) % n] ^= r3;
            out[(k + q) % n] ^= r4;
            out[k % n] = r4;
        }
    }

    /// Fills a byte seed (e.g. [`rand::SeedableRng::Seed`]) with decorrelated
    /// words in little-endian order. A trailing partial word is truncated.
    pub fn fill_bytes(&self, dest: &mut [u8]) {
        let mut words = vec![0u32; dest.len().div_ceil(4)];
        self.generate(&mut words);
        for (chunk, word) in dest.chunks_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }
    }
}
