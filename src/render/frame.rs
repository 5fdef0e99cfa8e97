use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::foundation::math::mul_div255_u16;

/// Opaque RGB8 raster, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// A frame filled with one color.
    pub fn solid(canvas: Canvas, color: Rgb8) -> Self {
        let mut data = Vec::with_capacity(canvas.pixel_count() * 3);
        for _ in 0..canvas.pixel_count() {
            data.extend_from_slice(&color.to_array());
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Color at `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb8::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }

    /// Number of pixels exactly equal to `color`.
    pub fn count_color(&self, color: Rgb8) -> usize {
        let want = color.to_array();
        self.data.chunks_exact(3).filter(|px| *px == want).count()
    }

    /// Encode as PNG.
    pub fn save_png(&self, path: &Path) -> KaraokeResult<()> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| KaraokeError::render("frame buffer does not match its dimensions"))?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Composite premultiplied RGBA8 over an opaque background into RGB8.
pub(crate) fn flatten_premul_over_bg_to_rgb8(
    dst_rgb: &mut [u8],
    src_premul: &[u8],
    bg: Rgb8,
) -> KaraokeResult<()> {
    if !src_premul.len().is_multiple_of(4) || dst_rgb.len() / 3 != src_premul.len() / 4 {
        return Err(KaraokeError::render(
            "flatten expects an rgba8 source and an rgb8 destination of the same pixel count",
        ));
    }

    let bg = [u16::from(bg.r), u16::from(bg.g), u16::from(bg.b)];
    for (d, s) in dst_rgb.chunks_exact_mut(3).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(&s[..3]);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
