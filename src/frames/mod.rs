//! Frame selection, loading and windowed caching.

/// Decoded-frame cache and the lazy index window.
pub mod cache;
/// The frame controller.
pub mod controller;
/// Loader seam and the file/HTTP loaders.
pub mod loader;
