pub use kurbo::{Point, Rect, Size};

/// Map a normalized progress value onto a frame index.
///
/// Returns `None` for an empty sequence. Non-finite progress is treated as `0`; values outside
/// `[0, 1]` clamp to the first or last frame.
pub fn frame_index_for_progress(progress: f64, frame_count: usize) -> Option<usize> {
    if frame_count == 0 {
        return None;
    }
    let progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = frame_count - 1;
    let idx = (progress * last as f64).floor() as usize;
    Some(idx.min(last))
}

/// Round a progress value to 6 decimal places.
pub fn round_progress(progress: f64) -> f64 {
    (progress * 1e6).round() / 1e6
}

/// Largest rectangle with the aspect ratio of `content` that fits inside `bounds`, centered.
///
/// The non-fitting axis is letterboxed symmetrically. Degenerate sizes yield an empty rect at
/// the center of `bounds`.
pub fn fit_contain(content: Size, bounds: Size) -> Rect {
    let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
    if content.width <= 0.0 || content.height <= 0.0 || bounds.width <= 0.0 || bounds.height <= 0.0
    {
        return Rect::from_center_size(center, Size::ZERO);
    }
    let scale = (bounds.width / content.width).min(bounds.height / content.height);
    let size = Size::new(content.width * scale, content.height * scale);
    Rect::from_center_size(center, size)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
