use crate::foundation::core::{Rect, round_progress};

/// Minimum progress change that reaches subscribers.
pub const PROGRESS_EPSILON: f64 = 1e-4;

/// Layout measurements cached between resizes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Height of the tracked region.
    pub tracked_height: f64,
    /// Height of the scroll port (nearest scrolling ancestor, or the viewport).
    pub viewport_height: f64,
    /// Top of the scroll port in the same coordinate space as the tracked region's box.
    pub viewport_offset: f64,
}

impl ScrollGeometry {
    /// Measure from the tracked region's box and its scroll port's box.
    pub fn measure(region: Rect, scroll_port: Rect) -> Self {
        Self {
            tracked_height: region.height(),
            viewport_height: scroll_port.height(),
            viewport_offset: scroll_port.y0,
        }
    }

    /// Distance the region can scroll while it still covers the scroll port.
    pub fn scroll_distance(&self) -> f64 {
        self.tracked_height - self.viewport_height
    }

    /// Progress for a live region top (same coordinate space as `viewport_offset`).
    pub fn progress_at(&self, region_top: f64) -> f64 {
        scroll_progress(region_top - self.viewport_offset, self.scroll_distance())
    }
}

/// Normalized progress for a region whose top sits `relative_top` below the scroll port's top.
///
/// A region no taller than the scroll port has no scroll range and is always complete (`1`).
/// Otherwise progress is `-relative_top / scroll_distance`, clamped to `[0, 1]` and rounded to 6
/// decimals.
pub fn scroll_progress(relative_top: f64, scroll_distance: f64) -> f64 {
    if scroll_distance <= 0.0 || scroll_distance.is_nan() {
        return 1.0;
    }
    let raw = -relative_top / scroll_distance;
    if raw.is_nan() {
        return 0.0;
    }
    round_progress(raw.clamp(0.0, 1.0))
}

/// Return `true` when `next` differs from `last` enough to notify subscribers.
pub fn progress_changed(last: f64, next: f64) -> bool {
    (next - last).abs() > PROGRESS_EPSILON
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/geometry.rs"]
mod tests;
