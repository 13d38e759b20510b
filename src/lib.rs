//! Flipbook drives scroll-synchronized image-sequence playback.
//!
//! The crate is split along the data flow:
//!
//! - Resolve a [`SequenceSource`] into a validated, capped [`ResolvedSequence`] with a
//!   [`SequenceResolver`]
//! - Observe a scrolling region with a [`Timeline`] driven by a shared [`Scheduler`]
//! - Feed progress into a [`FrameController`] that loads, windows and paints frames onto a
//!   [`DrawableSurface`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Frame controller, cache and loaders.
pub mod frames;
/// Drawing surfaces.
pub mod render;
/// Sequence sources and resolution.
pub mod sequence;
/// Scroll timelines and the tick scheduler.
pub mod timeline;

pub use crate::assets::decode::{DecodedFrame, decode_image};
pub use crate::foundation::config::{
    DEFAULT_MAX_FRAMES, FrameCap, HARD_MAX_FRAMES, MANIFEST_CACHE_CAPACITY, MANIFEST_MAX_BYTES,
    MANIFEST_TIMEOUT, MAX_FRAMES_ENV, ResolverOpts,
};
pub use crate::foundation::core::{
    Point, Rect, Size, fit_contain, frame_index_for_progress, round_progress,
};
pub use crate::foundation::error::{FlipbookError, FlipbookResult};

pub use crate::frames::cache::FrameWindow;
pub use crate::frames::controller::{
    ControllerStats, DEFAULT_BUFFER_RADIUS, FrameController, FrameControllerOpts, LoadStrategy,
};
pub use crate::frames::loader::{
    FRAME_MAX_BYTES, FileFrameLoader, FrameLoader, HttpFrameLoader, LoadCompletion, LoadRequest,
};
pub use crate::render::surface::{DrawableSurface, RasterCanvas, RasterSurface, SurfaceSource};
pub use crate::sequence::cache::ManifestCache;
pub use crate::sequence::fetch::{
    HttpManifestFetcher, ManifestFetcher, ManifestRequest, ManifestResponse,
};
pub use crate::sequence::model::{MAX_PAD_WIDTH, ResolvedSequence, SequenceSource};
pub use crate::sequence::resolver::{SequenceResolver, resolve_manual, resolve_pattern};
pub use crate::sequence::url::{numeric_key, validate_frame_url};
pub use crate::timeline::geometry::{PROGRESS_EPSILON, ScrollGeometry, scroll_progress};
pub use crate::timeline::scheduler::{FrameHost, ManualFrameHost, Scheduler, TickId};
pub use crate::timeline::subscription::Subscription;
pub use crate::timeline::timeline::{ObservableRegion, Timeline, TimelineState};
