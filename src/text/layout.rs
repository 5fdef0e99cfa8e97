use std::borrow::Cow;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::text::font::FontHandle;
use crate::text::wrap::TextMeasure;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgb8> for TextBrushRgba8 {
    fn from(c: Rgb8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

/// Single-line Parley layout.
pub(crate) type LineLayout = parley::Layout<TextBrushRgba8>;

/// Parley contexts bound to one registered font family.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font` with a fresh font collection.
    pub(crate) fn new(font: &FontHandle) -> KaraokeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::new(font.shared_bytes()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| KaraokeError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| KaraokeError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Shape `text` as a single unbroken line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        color: Rgb8,
    ) -> KaraokeResult<LineLayout> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(KaraokeError::render("font size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            color,
        )));

        let mut layout: LineLayout = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Width of `text` laid out on one line at `size_px`.
    pub(crate) fn line_width(&mut self, text: &str, size_px: f32) -> KaraokeResult<f32> {
        Ok(self.layout_line(text, size_px, Rgb8::WHITE)?.width())
    }

    /// Borrow the engine as a [`TextMeasure`] at a fixed size.
    pub(crate) fn measure_at(&mut self, size_px: f32) -> SizedMeasure<'_> {
        SizedMeasure {
            engine: self,
            size_px,
        }
    }
}

/// [`TextLayoutEngine`] pinned to one font size.
pub(crate) struct SizedMeasure<'a> {
    engine: &'a mut TextLayoutEngine,
    size_px: f32,
}

impl TextMeasure for SizedMeasure<'_> {
    fn text_width(&mut self, text: &str) -> KaraokeResult<f32> {
        self.engine.line_width(text, self.size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
