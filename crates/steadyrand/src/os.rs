use crate::{EntropySource, OpenSource, SourceError};
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

/// The operating system's entropy source, selected by token.
///
/// | Token                                       | Device |
/// |---------------------------------------------|--------|
/// | `None`, `""`, `"default"`, `"os"`, `"getrandom"` | the OS generator (`getrandom`, `BCryptGenRandom`, ...) |
/// | a path starting with `/`                    | a device file, read four bytes per draw |
///
/// Any other token is rejected as unavailable. Raw values span
/// `[0, u32::MAX]`.
///
/// The OS generator is probed once when opened. Character devices report 32
/// bits of entropy per draw; regular files report zero, since their content
/// is fixed, and are therefore never trusted.
#[derive(Debug)]
pub struct OsSource {
    device: Device,
}

#[derive(Debug)]
enum Device {
    Os(OsRng),
    File { path: PathBuf, file: File, entropy: f64 },
}

impl OsSource {
    /// Tokens that select the OS generator.
    pub const DEFAULT_TOKENS: [&'static str; 4] = ["", "default", "os", "getrandom"];

    fn open_os() -> Result<Self, SourceError> {
        let mut rng = OsRng;
        rng.try_next_u32()
            .map_err(|e| SourceError::unavailable(format!("OS generator probe failed: {e}")))?;
        Ok(Self {
            device: Device::Os(rng),
        })
    }

    fn open_file(path: PathBuf) -> Result<Self, SourceError> {
        let file = File::open(&path).map_err(|e| Self::open_error(&path, e))?;
        let metadata = file.metadata().map_err(|e| Self::open_error(&path, e))?;
        let entropy = if metadata.is_file() {
            0.0
        } else {
            f64::from(u32::BITS)
        };
        Ok(Self {
            device: Device::File {
                path,
                file,
                entropy,
            },
        })
    }

    fn open_error(path: &std::path::Path, e: io::Error) -> SourceError {
        let context = format!("{}: {e}", path.display());
        if e.kind() == io::ErrorKind::OutOfMemory {
            SourceError::ResourceExhausted { context }
        } else {
            SourceError::Unavailable { reason: context }
        }
    }
}

impl OpenSource for OsSource {
    fn open(token: Option<&str>) -> Result<Self, SourceError> {
        match token {
            None => Self::open_os(),
            Some(token) if Self::DEFAULT_TOKENS.contains(&token) => Self::open_os(),
            Some(path) if path.starts_with('/') => Self::open_file(PathBuf::from(path)),
            Some(other) => Err(SourceError::unavailable(format!(
                "unknown entropy source token {other:?}"
            ))),
        }
    }
}

impl EntropySource for OsSource {
    fn entropy(&self) -> f64 {
        match &self.device {
            Device::Os(_) => f64::from(u32::BITS),
            Device::File { entropy, .. } => *entropy,
        }
    }

    fn min(&self) -> u64 {
        0
    }

    fn max(&self) -> u64 {
        u64::from(u32::MAX)
    }

    fn draw(&mut self) -> Result<u64, SourceError> {
        match &mut self.device {
            Device::Os(rng) => rng
                .try_next_u32()
                .map(u64::from)
                .map_err(|e| SourceError::draw_failed(e.to_string())),
            Device::File { path, file, .. } => {
                let mut buf = [0u8; 4];
                file.read_exact(&mut buf).map_err(|e| {
                    SourceError::draw_failed(format!("{}: {e}", path.display()))
                })?;
                Ok(u64::from(u32::from_ne_bytes(buf)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "steadyrand-{}-{name}",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn default_tokens_open_os_generator() {
        for token in [None, Some(""), Some("default"), Some("os"), Some("getrandom")] {
            let mut source = OsSource::open(token).unwrap();
            assert_eq!(source.entropy(), 32.0);
            assert_eq!((source.min(), source.max()), (0, u64::from(u32::MAX)));
            assert!(source.draw().unwrap() <= u64::from(u32::MAX));
        }
    }

    #[test]
    fn os_generator_varies() {
        let mut source = OsSource::open(None).unwrap();
        let draws: Vec<u64> = (0..8).map(|_| source.draw().unwrap()).collect();
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn unknown_token_is_unavailable() {
        let err = OsSource::open(Some("rdseed-please")).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn missing_device_is_unavailable() {
        let err = OsSource::open(Some("/definitely/not/a/device")).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn urandom_device_is_trusted() {
        let mut source = OsSource::open(Some("/dev/urandom")).unwrap();
        assert_eq!(source.entropy(), 32.0);
        assert!(source.draw().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn regular_file_is_untrusted_and_runs_dry() {
        let path = temp_file("regular", &[1, 0, 0, 0, 2, 0]);
        let mut source = OsSource::open(path.to_str()).unwrap();
        assert_eq!(source.entropy(), 0.0);
        assert_eq!(source.draw(), Ok(u64::from(u32::from_ne_bytes([1, 0, 0, 0]))));
        // Only two bytes left.
        assert!(matches!(source.draw(), Err(SourceError::DrawFailed { .. })));
        let _ = std::fs::remove_file(path);
    }
}
