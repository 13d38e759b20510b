use std::path::Path;

use anyhow::Context as _;
use image::{RgbaImage, imageops::FilterType};

use crate::assets::decode::DecodedFrame;
use crate::foundation::core::Rect;
use crate::foundation::error::FlipbookResult;
use crate::render::composite::{over, unpremultiply};

/// Largest accepted raster surface edge, in pixels.
pub const MAX_SURFACE_DIM: u32 = 16_384;

/// 2D drawing capability the frame controller paints through.
pub trait DrawableSurface {
    /// Current `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Resize the backing store. Contents are cleared.
    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Draw `frame` scaled to fill `dest` (surface pixel coordinates), source-over.
    fn draw_scaled(&mut self, frame: &DecodedFrame, dest: Rect);
}

/// Acquisition seam for a 2D drawing surface.
pub trait SurfaceSource {
    /// Surface handed out by this source.
    type Surface: DrawableSurface;

    /// Acquire the 2D surface, or `None` when the host cannot provide one.
    fn context_2d(&mut self) -> Option<Self::Surface>;
}

/// Source of [`RasterSurface`]s with fixed initial dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterCanvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RasterCanvas {
    /// Describe a canvas of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl SurfaceSource for RasterCanvas {
    type Surface = RasterSurface;

    fn context_2d(&mut self) -> Option<RasterSurface> {
        RasterSurface::new(self.width, self.height)
    }
}

/// In-memory premultiplied RGBA8 surface.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    pixels: RgbaImage,
    draws: u64,
}

impl RasterSurface {
    /// Allocate a transparent surface; `None` for a zero or oversized edge.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if !dims_ok(width, height) {
            return None;
        }
        Some(Self {
            pixels: RgbaImage::new(width, height),
            draws: 0,
        })
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Number of `draw_scaled` calls that touched at least one pixel.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Straight-alpha copy of the pixels, suitable for encoding.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.pixels.as_raw().clone();
        for px in out.chunks_exact_mut(4) {
            let s = unpremultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&s);
        }
        out
    }

    /// Encode the surface as a PNG file.
    pub fn save_png(&self, path: &Path) -> FlipbookResult<()> {
        let (width, height) = self.pixels.dimensions();
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba8(),
            width,
            height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl DrawableSurface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        let width = width.min(MAX_SURFACE_DIM);
        let height = height.min(MAX_SURFACE_DIM);
        self.pixels = RgbaImage::new(width, height);
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn draw_scaled(&mut self, frame: &DecodedFrame, dest: Rect) {
        let dest = dest.round();
        let (w, h) = (dest.width(), dest.height());
        if w < 1.0 || h < 1.0 || frame.width == 0 || frame.height == 0 {
            return;
        }
        let (w, h) = (w as u32, h as u32);
        let Some(src) = RgbaImage::from_raw(frame.width, frame.height, frame.rgba8_premul.to_vec())
        else {
            tracing::warn!(
                width = frame.width,
                height = frame.height,
                "frame pixel buffer does not match its dimensions"
            );
            return;
        };
        // Resampled in premultiplied space.
        let scaled = if (w, h) == (frame.width, frame.height) {
            src
        } else {
            image::imageops::resize(&src, w, h, FilterType::Triangle)
        };

        let (sw, sh) = self.pixels.dimensions();
        let (x0, y0) = (dest.x0 as i64, dest.y0 as i64);
        let mut touched = false;
        for (sx, sy, px) in scaled.enumerate_pixels() {
            let (dx, dy) = (x0 + i64::from(sx), y0 + i64::from(sy));
            if dx < 0 || dy < 0 || dx >= i64::from(sw) || dy >= i64::from(sh) {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(dx as u32, dy as u32);
            dst.0 = over(dst.0, px.0);
            touched = true;
        }
        if touched {
            self.draws += 1;
        }
    }
}

fn dims_ok(width: u32, height: u32) -> bool {
    (1..=MAX_SURFACE_DIM).contains(&width) && (1..=MAX_SURFACE_DIM).contains(&height)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
