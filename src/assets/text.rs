use crate::foundation::error::{OverlayError, OverlayResult};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for TextBrushRgba8 {
    fn default() -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }
    }
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Sans-serif families tried, in order, when looking for a system label font.
const SYSTEM_SANS_FAMILIES: [&str; 4] = ["Arial", "DejaVu Sans", "Liberation Sans", "Noto Sans"];

/// A font file installed on this host plus the face index inside it.
pub(crate) struct SystemFont {
    pub(crate) bytes: Vec<u8>,
    pub(crate) index: u32,
    pub(crate) family: String,
}

/// Find a regular sans-serif system face. Falls back to any installed face; `None` when the
/// host has no fonts at all.
pub(crate) fn system_sans_font() -> Option<SystemFont> {
    use usvg::fontdb::{Database, Family, Query};

    let mut db = Database::new();
    db.load_system_fonts();

    let id = std::iter::once(Family::SansSerif)
        .chain(SYSTEM_SANS_FAMILIES.into_iter().map(Family::Name))
        .find_map(|family| {
            db.query(&Query {
                families: &[family],
                ..Query::default()
            })
        })
        .or_else(|| db.faces().find(|f| !f.monospaced).map(|f| f.id))
        .or_else(|| db.faces().next().map(|f| f.id))?;

    let family = db
        .face(id)
        .and_then(|f| f.families.first())
        .map(|(name, _)| name.clone())
        .unwrap_or_default();
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
    Some(SystemFont {
        bytes,
        index,
        family,
    })
}

/// Parley layout state bound to a single label font.
///
/// The font is registered once; every label is shaped against the same family.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and prepare contexts for shaping labels with it.
    pub(crate) fn with_font(font_bytes: Vec<u8>) -> OverlayResult<Self> {
        Self::with_font_face(font_bytes, 0)
    }

    /// Like [`TextLayoutEngine::with_font`], for face `index` of a font collection.
    pub(crate) fn with_font_face(font_bytes: Vec<u8>, index: u32) -> OverlayResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| OverlayError::validation("no font families registered from font bytes"))?;

        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OverlayError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), index);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    pub(crate) fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape a single-line label.
    pub(crate) fn layout_label(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> OverlayResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(OverlayError::validation(
                "label font size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
