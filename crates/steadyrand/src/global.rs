//! Process-wide default generators.
//!
//! Two mutually exclusive modes, chosen at build time:
//!
//! - **Lazy** (default): the first call to [`global_random_device`] or
//!   [`global_rng`] constructs the instance, exactly once, even under
//!   concurrent first access. Instances live until the process exits.
//! - **Host-injected** (`host-injected` feature): the host constructs both
//!   instances itself and hands them over with `set_global_instances` during
//!   startup, before any thread draws. The accessors only ever return what
//!   was registered.
//!
//! # Example
//! ```rust
//! # #[cfg(not(feature = "host-injected"))]
//! # {
//! use steadyrand::{global_random_device, global_rng};
//!
//! let seed = global_random_device().draw();
//! let value: u32 = global_rng().random();
//! println!("{seed:#x} {value}");
//! # }
//! ```

use crate::{Error, RandomDevice, Result, SharedRng};
use std::sync::OnceLock;

/// The process-wide default device type.
pub type DefaultRandomDevice = RandomDevice<u64>;

/// The process-wide default thread-safe generator type.
pub type DefaultRng = SharedRng;

/// Holds host-owned default instances.
///
/// Registration happens once; reads afterwards are lock-free. The
/// `host-injected` build routes the global accessors through a static
/// `Registry`; hosts embedding several independent subsystems can keep their
/// own.
#[derive(Debug, Default)]
pub struct Registry {
    instances: OnceLock<(&'static DefaultRandomDevice, &'static DefaultRng)>,
}

impl Registry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            instances: OnceLock::new(),
        }
    }

    /// Registers the default device and generator.
    ///
    /// # Errors
    /// [`Error::AlreadyRegistered`] if instances were registered before. The
    /// earlier registration stays in effect.
    pub fn register(
        &self,
        device: &'static DefaultRandomDevice,
        rng: &'static DefaultRng,
    ) -> Result<()> {
        self.instances
            .set((device, rng))
            .map_err(|_| Error::AlreadyRegistered)
    }

    /// Whether instances have been registered.
    pub fn is_registered(&self) -> bool {
        self.instances.get().is_some()
    }

    /// The registered device.
    ///
    /// # Panics
    /// If nothing has been registered yet. Registration is the host's
    /// startup responsibility.
    pub fn device(&self) -> &'static DefaultRandomDevice {
        self.instances().0
    }

    /// The registered generator.
    ///
    /// # Panics
    /// If nothing has been registered yet.
    pub fn rng(&self) -> &'static DefaultRng {
        self.instances().1
    }

    fn instances(&self) -> (&'static DefaultRandomDevice, &'static DefaultRng) {
        match self.instances.get() {
            Some(instances) => *instances,
            None => panic!("global random instances used before registration"),
        }
    }
}

#[cfg(not(feature = "host-injected"))]
mod lazy {
    use super::{DefaultRandomDevice, DefaultRng};
    use crate::SharedRng;
    use std::sync::LazyLock;

    #[cfg(test)]
    pub(super) static CONSTRUCTIONS: std::sync::atomic::AtomicUsize =
        std::sync::atomic::AtomicUsize::new(0);

    pub(super) static GLOBAL_RANDOM_DEVICE: LazyLock<DefaultRandomDevice> = LazyLock::new(|| {
        #[cfg(test)]
        CONSTRUCTIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match DefaultRandomDevice::new() {
            Ok(device) => device,
            Err(e) => panic!("cannot construct the global random device: {e}"),
        }
    });

    pub(super) static GLOBAL_RNG: LazyLock<DefaultRng> =
        LazyLock::new(|| SharedRng::from_device(&*GLOBAL_RANDOM_DEVICE));
}

#[cfg(feature = "host-injected")]
static GLOBAL_REGISTRY: Registry = Registry::new();

/// The process-wide default random device, constructed on first use.
///
/// # Panics
/// If the platform runs out of memory while opening the entropy source.
#[cfg(not(feature = "host-injected"))]
pub fn global_random_device() -> &'static DefaultRandomDevice {
    &lazy::GLOBAL_RANDOM_DEVICE
}

/// The process-wide default thread-safe generator, seeded from
/// [`global_random_device`] on first use.
#[cfg(not(feature = "host-injected"))]
pub fn global_rng() -> &'static DefaultRng {
    &lazy::GLOBAL_RNG
}

/// Registers host-owned default instances. Call once during startup, before
/// any thread uses [`global_random_device`] or [`global_rng`].
///
/// # Errors
/// [`Error::AlreadyRegistered`] on a second call.
#[cfg(feature = "host-injected")]
pub fn set_global_instances(
    device: &'static DefaultRandomDevice,
    rng: &'static DefaultRng,
) -> Result<()> {
    GLOBAL_REGISTRY.register(device, rng)
}

/// The host-registered default random device.
///
/// # Panics
/// If [`set_global_instances`] has not been called.
#[cfg(feature = "host-injected")]
pub fn global_random_device() -> &'static DefaultRandomDevice {
    GLOBAL_REGISTRY.device()
}

/// The host-registered default thread-safe generator.
///
/// # Panics
/// If [`set_global_instances`] has not been called.
#[cfg(feature = "host-injected")]
pub fn global_rng() -> &'static DefaultRng {
    GLOBAL_REGISTRY.rng()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak_instances() -> (&'static DefaultRandomDevice, &'static DefaultRng) {
        let device: &'static DefaultRandomDevice =
            Box::leak(Box::new(DefaultRandomDevice::new().unwrap()));
        let rng: &'static DefaultRng = Box::leak(Box::new(SharedRng::from_device(device)));
        (device, rng)
    }

    #[test]
    fn registry_returns_exactly_the_registered_instances() {
        let registry = Registry::new();
        assert!(!registry.is_registered());
        let (device, rng) = leak_instances();
        registry.register(device, rng).unwrap();
        assert!(registry.is_registered());
        assert!(core::ptr::eq(registry.device(), device));
        assert!(core::ptr::eq(registry.rng(), rng));
    }

    #[test]
    fn registry_rejects_second_registration() {
        let registry = Registry::new();
        let (first_device, first_rng) = leak_instances();
        let (second_device, second_rng) = leak_instances();
        registry.register(first_device, first_rng).unwrap();
        assert_eq!(
            registry.register(second_device, second_rng),
            Err(Error::AlreadyRegistered)
        );
        assert!(core::ptr::eq(registry.device(), first_device));
    }

    #[test]
    #[should_panic(expected = "before registration")]
    fn registry_access_before_registration_panics() {
        Registry::new().device();
    }

    #[cfg(not(feature = "host-injected"))]
    #[test]
    fn lazy_globals_construct_once_under_contention() {
        use std::sync::Barrier;
        use std::thread::scope;

        let threads = num_cpus::get().clamp(4, 16);
        let barrier = Barrier::new(threads);
        let addresses: Vec<(usize, usize)> = scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let device = global_random_device();
                        let rng = global_rng();
                        device.draw();
                        rng.next_u64();
                        (
                            device as *const DefaultRandomDevice as usize,
                            rng as *const DefaultRng as usize,
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(
            lazy::CONSTRUCTIONS.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[cfg(feature = "host-injected")]
    #[test]
    fn injected_globals_return_registered_instances() {
        let (device, rng) = leak_instances();
        set_global_instances(device, rng).unwrap();
        assert!(core::ptr::eq(global_random_device(), device));
        assert!(core::ptr::eq(global_rng(), rng));
        let (other_device, other_rng) = leak_instances();
        assert_eq!(
            set_global_instances(other_device, other_rng),
            Err(Error::AlreadyRegistered)
        );
    }
}
