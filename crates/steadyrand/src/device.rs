use crate::mutex::{Mutex, lock};
use crate::{
    EntropyHandle, EntropySource, Extractor, FallbackGenerator, OpenSource, OsSource, Result,
    SeedSource, SourceError, TimeSeeder, Word,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// A random device that never fails and never silently trusts a broken
/// source.
///
/// Each draw runs under a single lock:
///
/// 1. While the entropy source is trusted, one word is extracted from it
///    (bias-corrected if its range is not a power of two). Any failure
///    revokes trust for the rest of the device's lifetime.
/// 2. Once the source is untrusted (from construction, or from the failure
///    just observed), a value from a time-seeded [`FallbackGenerator`] is
///    XOR-ed into the result. The fallback is created on first need and kept.
///
/// An untrusted source is never drawn, so on the fallback path the value
/// XOR-ed into is always zero and the word comes from the fallback alone.
/// This holds for sources that report zero entropy at construction too.
///
/// ## Features
///
/// - ✅ Thread-safe (draws are serialized per device)
/// - ✅ Total: [`draw`](Self::draw) always returns a word
/// - ✅ Uniform over the full word range on every path
/// - ❌ Not a CSPRNG once the fallback is in play
///
/// ## Recommended When
///
/// - You need a seed or a random word and would rather degrade than fail
/// - The platform's entropy source may be missing or flaky
///
/// ## See Also
/// - [`SharedRng`] for a fast generator seeded from a device
/// - [`global_random_device`] for the process-wide default
///
/// [`SharedRng`]: crate::SharedRng
/// [`global_random_device`]: crate::global_random_device
pub struct RandomDevice<W, S = OsSource, T = TimeSeeder, R = StdRng>
where
    W: Word,
    S: EntropySource,
    T: SeedSource,
    R: SeedableRng + RngCore,
{
    state: Mutex<DeviceState<S, R>>,
    extractor: Option<Extractor<W>>,
    seeder: T,
}

struct DeviceState<S, R> {
    source: EntropyHandle<S>,
    fallback: Option<FallbackGenerator<R>>,
}

impl<W> RandomDevice<W>
where
    W: Word,
{
    /// Opens the platform's default entropy source.
    ///
    /// # Errors
    /// Only [`Error::ResourceExhausted`]. A missing or broken source yields a
    /// device that runs on its fallback generator.
    ///
    /// # Example
    /// ```
    /// use steadyrand::RandomDevice;
    ///
    /// let device = RandomDevice::<u32>::new().unwrap();
    /// let word: u32 = device.draw();
    /// println!("{word:#010x}");
    /// ```
    ///
    /// [`Error::ResourceExhausted`]: crate::Error::ResourceExhausted
    pub fn new() -> Result<Self> {
        Self::open(None, TimeSeeder::default())
    }

    /// Opens the entropy source selected by `token` (see [`OsSource`]).
    ///
    /// The token also seeds the fallback generator, so devices opened with
    /// different tokens diverge even on their fallback path.
    ///
    /// # Errors
    /// Only [`Error::ResourceExhausted`].
    ///
    /// [`Error::ResourceExhausted`]: crate::Error::ResourceExhausted
    pub fn with_token(token: &str) -> Result<Self> {
        Self::open(Some(token), TimeSeeder::default())
    }
}

impl<W, S, T, R> RandomDevice<W, S, T, R>
where
    W: Word,
    S: EntropySource,
    T: SeedSource,
    R: SeedableRng + RngCore,
{
    /// Opens `S` with `token` and seeds any fallback from `seeder`.
    ///
    /// # Errors
    /// Only [`Error::ResourceExhausted`].
    ///
    /// [`Error::ResourceExhausted`]: crate::Error::ResourceExhausted
    pub fn open(token: Option<&str>, seeder: T) -> Result<Self>
    where
        S: OpenSource,
    {
        Self::from_source(S::open(token), token, seeder)
    }

    /// Builds a device from the outcome of opening a native source.
    ///
    /// This is the seam for custom or mocked sources: pass `Ok(source)` for a
    /// working source, or the error its constructor produced.
    ///
    /// # Errors
    /// [`Error::ResourceExhausted`] if `source` is
    /// [`SourceError::ResourceExhausted`]. Any other error is absorbed.
    ///
    /// [`Error::ResourceExhausted`]: crate::Error::ResourceExhausted
    pub fn from_source(
        source: Result<S, SourceError>,
        token: Option<&str>,
        seeder: T,
    ) -> Result<Self> {
        let mut source = EntropyHandle::from_native(source, token)?;
        let extractor = source
            .range()
            .and_then(|(min, max)| Extractor::<W>::new(min, max));
        if extractor.is_none() && source.reliable() {
            #[cfg(feature = "tracing")]
            tracing::debug!(range = ?source.range(), "entropy source range carries no entropy");
            source.mark_unreliable();
        }
        Ok(Self {
            state: Mutex::new(DeviceState {
                source,
                fallback: None,
            }),
            extractor,
            seeder,
        })
    }

    /// Smallest value [`draw`](Self::draw) can return.
    pub fn min(&self) -> W {
        W::MIN
    }

    /// Largest value [`draw`](Self::draw) can return.
    pub fn max(&self) -> W {
        W::MAX
    }

    /// Whether the entropy source is still trusted. Once `false`, always
    /// `false`.
    pub fn is_reliable(&self) -> bool {
        lock(&self.state).source.reliable()
    }

    /// The token the device was opened with.
    pub fn token(&self) -> Option<String> {
        lock(&self.state).source.token().map(str::to_owned)
    }

    /// Draws one word. Never fails.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn draw(&self) -> W {
        let mut state = lock(&self.state);
        let DeviceState { source, fallback } = &mut *state;

        let mut result = W::ZERO;
        if source.reliable() {
            if let Some(extractor) = &self.extractor {
                match extractor.extract(|| source.draw()) {
                    Ok(word) => result = word,
                    Err(_e) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            token = ?source.token(),
                            "entropy source failed, switching to fallback permanently: {_e}"
                        );
                        source.mark_unreliable();
                    }
                }
            }
        }

        if !source.reliable() {
            let fallback = fallback.get_or_insert_with(|| {
                #[cfg(feature = "tracing")]
                tracing::debug!(token = ?source.token(), "seeding fallback generator");
                FallbackGenerator::new(&self.seeder, source.token())
            });
            result = result ^ fallback.draw::<W>();
        }

        result
    }

    /// Fills `bits` (at most 64) low-order bits from consecutive draws.
    fn draw_bits(&self, bits: u32) -> u64 {
        if W::BITS >= bits {
            return self.draw().widen();
        }
        let mut acc = 0u64;
        let mut filled = 0;
        while filled < bits {
            acc = (acc << W::BITS) | self.draw().widen();
            filled += W::BITS;
        }
        acc
    }
}

impl<W, S, T, R> core::fmt::Debug for RandomDevice<W, S, T, R>
where
    W: Word,
    S: EntropySource,
    T: SeedSource,
    R: SeedableRng + RngCore,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("RandomDevice")
            .field("bits", &W::BITS)
            .field("token", &state.source.token())
            .field("reliable", &state.source.reliable())
            .field("fallback_seeded", &state.fallback.is_some())
            .field("extraction", &self.extractor.map(|e| e.plan()))
            .finish()
    }
}

/// Lets a shared device seed any [`SeedableRng`] via
/// [`SeedableRng::from_rng`]. Narrow words are concatenated; wide words are
/// truncated.
impl<W, S, T, R> RngCore for &RandomDevice<W, S, T, R>
where
    W: Word,
    S: EntropySource,
    T: SeedSource,
    R: SeedableRng + RngCore,
{
    fn next_u32(&mut self) -> u32 {
        self.draw_bits(u32::BITS) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.draw_bits(u64::BITS)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        rand::rand_core::impls::fill_bytes_via_next(self, dst)
    }
}

impl<W, S, T, R> RngCore for RandomDevice<W, S, T, R>
where
    W: Word,
    S: EntropySource,
    T: SeedSource,
    R: SeedableRng + RngCore,
{
    fn next_u32(&mut self) -> u32 {
        (&*self).next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        (&*self).next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        (&*self).fill_bytes(dst)
    }
}
