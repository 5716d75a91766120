use crate::{SeedSeq, SeedSource, Word};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// A deterministic generator seeded from the clock, used when the primary
/// entropy source cannot be trusted.
///
/// The seed words are the high and low halves of a 64-bit time seed followed
/// by one word per byte of the optional token, decorrelated by [`SeedSeq`]
/// before they reach the engine. Two devices seeded at the very same instant
/// still diverge as long as their tokens differ.
///
/// # Example
/// ```
/// use steadyrand::FallbackGenerator;
///
/// let mut a = FallbackGenerator::<rand::rngs::StdRng>::from_time_seed(42, Some("left"));
/// let mut b = FallbackGenerator::<rand::rngs::StdRng>::from_time_seed(42, Some("right"));
/// assert_ne!(a.draw::<u64>(), b.draw::<u64>());
/// ```
#[derive(Clone, Debug)]
pub struct FallbackGenerator<R = StdRng> {
    engine: R,
}

impl<R> FallbackGenerator<R>
where
    R: SeedableRng + RngCore,
{
    /// Seeds a new generator from `seeder`'s current 64-bit seed and `token`.
    pub fn new<T: SeedSource>(seeder: &T, token: Option<&str>) -> Self {
        Self::from_time_seed(seeder.generate_seed::<u64>(), token)
    }

    /// Seeds a new generator from an explicit 64-bit time seed and `token`.
    pub fn from_time_seed(time_seed: u64, token: Option<&str>) -> Self {
        let seq = SeedSeq::new(Self::seed_words(time_seed, token));
        let mut seed = R::Seed::default();
        seq.fill_bytes(seed.as_mut());
        Self {
            engine: R::from_seed(seed),
        }
    }

    fn seed_words(time_seed: u64, token: Option<&str>) -> Vec<u32> {
        let token = token.unwrap_or_default().as_bytes();
        let mut words = Vec::with_capacity(2 + token.len());
        words.push((time_seed >> 32) as u32);
        words.push(time_seed as u32);
        words.extend(token.iter().map(|&byte| u32::from(byte)));
        words
    }

    /// Draws one value of the engine's native 32-bit width.
    pub fn next_raw(&mut self) -> u32 {
        self.engine.next_u32()
    }

    /// Draws one value adapted to width `W`.
    pub fn draw<W: Word>(&mut self) -> W {
        W::from_rng(&mut self.engine)
    }
}
