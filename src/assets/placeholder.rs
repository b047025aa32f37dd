use anyhow::Context;

use crate::assets::decode::PreparedImage;
use crate::foundation::error::{OverlayError, OverlayResult};
use std::sync::Arc;

/// Built-in "no stream" icon drawn whenever the current source has no usable frame.
///
/// The background is fully opaque so the whole icon rect is covered.
pub(crate) const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
  <rect x="0" y="0" width="64" height="64" fill="#aaaaaa"/>
  <circle cx="32" cy="32" r="20" fill="none" stroke="#b00020" stroke-width="6"/>
  <path d="M18 46 L46 18" stroke="#b00020" stroke-width="6" stroke-linecap="round"/>
</svg>"##;

/// Parse SVG bytes into a `usvg` tree.
pub(crate) fn parse_svg(bytes: &[u8]) -> OverlayResult<usvg::Tree> {
    let opts = usvg::Options::default();
    usvg::Tree::from_data(bytes, &opts)
        .context("parse svg tree")
        .map_err(OverlayError::from)
}

pub(crate) fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> OverlayResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| OverlayError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Rasterize the placeholder icon at `width`x`height`.
pub(crate) fn placeholder_image(width: u32, height: u32) -> OverlayResult<PreparedImage> {
    let tree = parse_svg(PLACEHOLDER_SVG.as_bytes())?;
    let rgba8_premul = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}
