use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::assets::decode::DecodedFrame;

/// Inclusive index window kept resident by the lazy strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameWindow {
    /// First index in the window.
    pub start: usize,
    /// Last index in the window (inclusive).
    pub end: usize,
}

impl FrameWindow {
    /// `[max(0, index - radius), min(frame_count - 1, index + radius)]`, or `None` for an empty
    /// sequence.
    pub fn around(index: usize, radius: usize, frame_count: usize) -> Option<Self> {
        let last = frame_count.checked_sub(1)?;
        let index = index.min(last);
        Some(Self {
            start: index.saturating_sub(radius),
            end: index.saturating_add(radius).min(last),
        })
    }

    /// Return `true` when `index` lies inside the window.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Number of indices covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`; a window covers at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Indices covered, in order.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Decoded frames keyed by URL.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: HashMap<String, DecodedFrame>,
}

impl FrameCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached frame for `url`.
    pub fn get(&self, url: &str) -> Option<&DecodedFrame> {
        self.frames.get(url)
    }

    /// Return `true` when `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.frames.contains_key(url)
    }

    /// Store a decoded frame, replacing any previous entry.
    pub fn insert(&mut self, url: String, frame: DecodedFrame) {
        self.frames.insert(url, frame);
    }

    /// Keep only entries whose URL satisfies `keep`; returns how many were evicted.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.frames.len();
        self.frames.retain(|url, _| keep(url));
        before - self.frames.len()
    }

    /// Number of cached frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total decoded pixel bytes held.
    pub fn byte_len(&self) -> usize {
        self.frames.values().map(DecodedFrame::byte_len).sum()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
