use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{OverlayError, OverlayResult};

/// A decoded stream frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// An image with no pixels; what a source reports before (or instead of) loading.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            rgba8_premul: Arc::new(Vec::new()),
        }
    }

    /// True when the image has no drawable area.
    pub fn is_empty(&self) -> bool {
        u64::from(self.width) * u64::from(self.height) == 0
    }

    /// Build from straight (non-premultiplied) RGBA8 bytes.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> OverlayResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| OverlayError::source("image size overflow"))?;
        if rgba.len() != expected {
            return Err(OverlayError::source(format!(
                "image byte len {} does not match {width}x{height}",
                rgba.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// A single-color image, handy for synthetic sources.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> OverlayResult<Self> {
        let px = (width as usize).saturating_mul(height as usize);
        Self::from_straight_rgba8(width, height, rgba.repeat(px))
    }
}

/// Decode encoded image bytes (PNG, JPEG, ...) and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> OverlayResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
