//! Scroll timelines and the shared tick scheduler.
//!
//! A [`Scheduler`](scheduler::Scheduler) is constructed once per host and handed to every
//! [`Timeline`](timeline::Timeline). Timelines stay idle until subscribed, then publish
//! normalized scroll progress on each tick that moves it.

/// Progress math and cached layout measurements.
pub mod geometry;
/// Tick fan-out driven by the host's paint cadence.
pub mod scheduler;
/// RAII listener handles.
pub mod subscription;
/// Progress timelines and the observed-region seam.
#[allow(clippy::module_inception)]
pub mod timeline;
