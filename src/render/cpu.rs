use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine};
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{OverlayError, OverlayResult};
use crate::render::overlay::LabelOp;

/// CPU rasterizer powered by `vello_cpu`, reused across ticks.
pub(crate) struct CpuRasterizer {
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuRasterizer {
    pub(crate) fn new() -> Self {
        Self { ctx: None }
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> OverlayResult<R>,
    ) -> OverlayResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Clear `dst` and draw `image` stretched over `dest`.
    pub(crate) fn draw_image(
        &mut self,
        dst: &mut vello_cpu::Pixmap,
        image: &PreparedImage,
        dest: Rect,
    ) -> OverlayResult<()> {
        if image.is_empty() {
            return Err(OverlayError::render("cannot draw an empty image"));
        }
        let paint = image_paint(image)?;
        let sx = dest.width() / f64::from(image.width);
        let sy = dest.height() / f64::from(image.height);

        clear_pixmap_to_transparent(dst);
        let (w, h) = (dst.width(), dst.height());
        self.with_ctx_mut(w, h, |ctx| {
            ctx.set_transform(
                vello_cpu::kurbo::Affine::translate((dest.x0, dest.y0))
                    * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
            );
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(image.width),
                f64::from(image.height),
            ));
            ctx.flush();
            ctx.render_to_pixmap(dst);
            Ok(())
        })
    }

    /// Clear `dst` and draw every label with its baseline-left corner at `(op.x, op.y)`.
    ///
    /// A label that cannot be shaped is logged and left out; the others are still drawn.
    pub(crate) fn draw_labels(
        &mut self,
        dst: &mut vello_cpu::Pixmap,
        labels: &[LabelOp],
        text: &mut TextLayoutEngine,
        brush: TextBrushRgba8,
    ) -> OverlayResult<()> {
        clear_pixmap_to_transparent(dst);
        if labels.is_empty() {
            return Ok(());
        }

        let mut layouts = Vec::with_capacity(labels.len());
        for op in labels {
            match text.layout_label(&op.text, op.font_size as f32, brush) {
                Ok(layout) => layouts.push((op, layout)),
                Err(e) => {
                    tracing::warn!(label = %op.text, font_size = op.font_size, error = %e, "label skipped");
                }
            }
        }

        let font = text.font().clone();
        let (w, h) = (dst.width(), dst.height());
        self.with_ctx_mut(w, h, |ctx| {
            for (op, layout) in &layouts {
                let baseline = layout
                    .lines()
                    .next()
                    .map(|l| f64::from(l.metrics().baseline))
                    .unwrap_or(0.0);
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    op.x,
                    op.y - baseline,
                )));
                for line in layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
            }
            ctx.flush();
            ctx.render_to_pixmap(dst);
            Ok(())
        })
    }
}

pub(crate) fn new_pixmap(canvas: Canvas) -> OverlayResult<vello_cpu::Pixmap> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| OverlayError::render("pixmap width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| OverlayError::render("pixmap height exceeds u16"))?;
    Ok(vello_cpu::Pixmap::new(w, h))
}

pub(crate) fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> OverlayResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| OverlayError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| OverlayError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(OverlayError::render("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let may_have_opacities = bytes.chunks_exact(4).any(|px| px[3] != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn image_paint(image: &PreparedImage) -> OverlayResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
