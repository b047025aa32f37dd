//! Annotation overlay: compile the active markers into label ops, then rasterize them onto a
//! dedicated transparent surface.
//!
//! The overlay is fully cleared and redrawn on every call; there is no damage tracking.

use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, system_sans_font};
use crate::foundation::core::Canvas;
use crate::foundation::error::OverlayResult;
use crate::markers::message::{ActiveMarkerSet, MarkerKind};
use crate::render::cpu::{CpuRasterizer, clear_pixmap_to_transparent, new_pixmap};
use crate::render::projection::project;
use crate::tf::tracker::TransformFrameTracker;

/// Draw `text` with its baseline starting at `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelOp {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

/// Everything drawn on the overlay for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayPlan {
    pub width: u32,
    pub height: u32,
    pub labels: Vec<LabelOp>,
}

impl OverlayPlan {
    pub fn label(&self, text: &str) -> Option<&LabelOp> {
        self.labels.iter().find(|l| l.text == text)
    }
}

/// Nearer labels (larger depth) are drawn larger.
pub fn label_font_size(depth: f64) -> f64 {
    (depth + 1.0) * 10.0
}

/// Labels are shaped with an `f32` size, so the size must survive that narrowing.
fn drawable_font_size(font_size: f64) -> bool {
    let narrowed = font_size as f32;
    narrowed.is_finite() && narrowed > 0.0
}

/// Build the label list for the current markers and poses.
///
/// Only [`MarkerKind::InteractiveMarkerInit`] messages are drawn. Each labelled element is
/// projected in its message's frame and shifted up-left by twice the font size so the text
/// does not cover its anchor.
pub fn compile_overlay(
    active: &ActiveMarkerSet,
    tracker: &TransformFrameTracker,
    canvas: Canvas,
) -> OverlayPlan {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let mut labels = Vec::new();

    for msg in active.iter() {
        if msg.kind != MarkerKind::InteractiveMarkerInit {
            continue;
        }
        let pose = tracker.lookup(&msg.source_frame);
        for element in msg.payload.elements() {
            let Some(text) = element.visible_label() else {
                continue;
            };
            let p = project(&pose, element.position, w, h);
            let font_size = label_font_size(p.depth);
            if !drawable_font_size(font_size) {
                tracing::debug!(label = text, depth = p.depth, "label depth outside drawable range");
                continue;
            }
            labels.push(LabelOp {
                text: text.to_string(),
                x: p.x - 2.0 * font_size,
                y: p.y - 2.0 * font_size,
                font_size,
            });
        }
    }

    OverlayPlan {
        width: canvas.width,
        height: canvas.height,
        labels,
    }
}

/// Owns the overlay surface and redraws it once per tick.
pub struct OverlayRenderer {
    canvas: Canvas,
    surface: vello_cpu::Pixmap,
    rasterizer: CpuRasterizer,
    text: Option<TextLayoutEngine>,
    brush: TextBrushRgba8,
    plan: OverlayPlan,
    warned_no_font: bool,
}

impl OverlayRenderer {
    /// Without `font_bytes` labels are still planned but not rasterized.
    pub(crate) fn new(
        canvas: Canvas,
        font_bytes: Option<Vec<u8>>,
        brush: TextBrushRgba8,
    ) -> OverlayResult<Self> {
        let text = font_bytes.map(TextLayoutEngine::with_font).transpose()?;
        if let Some(t) = &text {
            tracing::debug!(family = t.family_name(), "overlay label font loaded");
        }
        Ok(Self {
            canvas,
            surface: new_pixmap(canvas)?,
            rasterizer: CpuRasterizer::new(),
            text,
            brush,
            plan: OverlayPlan {
                width: canvas.width,
                height: canvas.height,
                labels: Vec::new(),
            },
            warned_no_font: false,
        })
    }

    /// Renderer drawing labels with a regular sans-serif system face.
    ///
    /// On a host without any installed font, labels are planned but not rasterized.
    pub(crate) fn with_system_font(canvas: Canvas, brush: TextBrushRgba8) -> OverlayResult<Self> {
        let text = match system_sans_font() {
            Some(font) => match TextLayoutEngine::with_font_face(font.bytes, font.index) {
                Ok(engine) => {
                    tracing::debug!(family = %font.family, "overlay label font taken from system");
                    Some(engine)
                }
                Err(e) => {
                    tracing::warn!(family = %font.family, error = %e, "system label font unusable");
                    None
                }
            },
            None => None,
        };
        let mut renderer = Self::new(canvas, None, brush)?;
        renderer.text = text;
        Ok(renderer)
    }

    /// Clear the overlay and draw every active marker label.
    pub fn render(
        &mut self,
        active: &ActiveMarkerSet,
        tracker: &TransformFrameTracker,
    ) -> OverlayResult<&OverlayPlan> {
        self.plan = compile_overlay(active, tracker, self.canvas);
        match self.text.as_mut() {
            Some(text) => {
                self.rasterizer
                    .draw_labels(&mut self.surface, &self.plan.labels, text, self.brush)?;
            }
            None => {
                clear_pixmap_to_transparent(&mut self.surface);
                if !self.plan.labels.is_empty() && !self.warned_no_font {
                    tracing::warn!("no label font available; overlay labels are not rasterized");
                    self.warned_no_font = true;
                }
            }
        }
        Ok(&self.plan)
    }

    /// The plan drawn by the last [`OverlayRenderer::render`] call.
    pub fn plan(&self) -> &OverlayPlan {
        &self.plan
    }

    /// Premultiplied RGBA8 overlay pixels.
    pub fn surface_bytes(&self) -> &[u8] {
        self.surface.data_as_u8_slice()
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
