use std::time::Duration;

/// Environment variable consulted by [`FrameCap::from_env`].
pub const MAX_FRAMES_ENV: &str = "FLIPBOOK_MAX_FRAMES";

/// Frame cap used when no valid override is supplied.
pub const DEFAULT_MAX_FRAMES: usize = 2000;

/// Upper bound no override may exceed.
pub const HARD_MAX_FRAMES: usize = 8000;

/// Manifest fetch budget.
pub const MANIFEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Largest manifest body accepted, in bytes.
pub const MANIFEST_MAX_BYTES: usize = 1024 * 1024;

/// Number of manifest results retained by [`crate::ManifestCache`].
pub const MANIFEST_CACHE_CAPACITY: usize = 50;

/// Maximum number of frames a resolved sequence may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameCap(usize);

impl Default for FrameCap {
    fn default() -> Self {
        Self(DEFAULT_MAX_FRAMES)
    }
}

impl FrameCap {
    /// Build a cap, clamped into `1..=HARD_MAX_FRAMES`.
    pub fn new(max_frames: usize) -> Self {
        Self(max_frames.clamp(1, HARD_MAX_FRAMES))
    }

    /// Interpret an external override.
    ///
    /// A positive integer is clamped to [`HARD_MAX_FRAMES`]; anything else (absent, empty, zero,
    /// negative, non-numeric) falls back to [`DEFAULT_MAX_FRAMES`].
    pub fn from_override(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => {
                tracing::warn!(value = raw, "ignoring invalid frame cap override");
                Self::default()
            }
            Ok(n) => Self(usize::try_from(n).unwrap_or(usize::MAX).min(HARD_MAX_FRAMES)),
        }
    }

    /// Read the override from [`MAX_FRAMES_ENV`].
    pub fn from_env() -> Self {
        Self::from_override(std::env::var(MAX_FRAMES_ENV).ok().as_deref())
    }

    /// Cap value.
    pub fn get(self) -> usize {
        self.0
    }

    /// Return `true` when `count` frames fit under the cap.
    pub fn admits(self, count: usize) -> bool {
        count <= self.0
    }
}

/// Resolver configuration.
#[derive(Clone, Debug)]
pub struct ResolverOpts {
    /// Maximum number of frames in a resolved sequence.
    pub frame_cap: FrameCap,
    /// Time budget for a manifest fetch, including reading the body.
    pub fetch_timeout: Duration,
    /// Largest manifest body accepted.
    pub max_manifest_bytes: usize,
}

impl Default for ResolverOpts {
    fn default() -> Self {
        Self {
            frame_cap: FrameCap::default(),
            fetch_timeout: MANIFEST_TIMEOUT,
            max_manifest_bytes: MANIFEST_MAX_BYTES,
        }
    }
}

impl ResolverOpts {
    /// Defaults with the frame cap taken from the environment.
    pub fn from_env() -> Self {
        Self {
            frame_cap: FrameCap::from_env(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
