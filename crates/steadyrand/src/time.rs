use std::sync::LazyLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A trait for clocks that report "now" as nanoseconds since some epoch.
///
/// Seeding reads two of these independently: a coarse wall clock and a
/// high-resolution monotonic clock. The epoch only has to be fixed for the
/// lifetime of the clock.
///
/// # Example
///
/// ```
/// use steadyrand::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_nanos(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_nanos(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in nanoseconds since the clock's epoch.
    fn current_nanos(&self) -> u64;
}

/// The system wall clock, in nanoseconds since the Unix epoch.
///
/// A wall clock set before 1970 reads as zero rather than failing; seeding
/// still has the monotonic reading to work with.
#[derive(Default, Clone, Copy, Debug)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn current_nanos(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    }
}

/// Shared origin for every [`MonotonicClock`] in the process.
static PROCESS_ANCHOR: LazyLock<Instant> = LazyLock::new(Instant::now);

/// A high-resolution monotonic clock, in nanoseconds since the first time any
/// `MonotonicClock` was read in this process.
///
/// Never goes backward, regardless of wall-clock adjustments (NTP, manual
/// changes).
#[derive(Default, Clone, Copy, Debug)]
pub struct MonotonicClock;

impl TimeSource for MonotonicClock {
    fn current_nanos(&self) -> u64 {
        PROCESS_ANCHOR.elapsed().as_nanos() as u64
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_nanos(&self) -> u64 {
        (**self).current_nanos()
    }
}
