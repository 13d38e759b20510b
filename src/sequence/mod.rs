//! Sequence resolution.
//!
//! Turns a [`SequenceSource`](model::SequenceSource) (manual list, index pattern or remote
//! manifest) into an ordered, protocol-validated and size-capped frame list.

/// Bounded memo of manifest resolutions.
pub mod cache;
/// Manifest transport seam and the hardened HTTP fetcher.
pub mod fetch;
/// Source descriptors, resolved sequences and manifest shapes.
pub mod model;
/// Async resolver and the IO-free manual/pattern paths.
pub mod resolver;
/// Frame URL validation and numeric ordering.
pub mod url;
