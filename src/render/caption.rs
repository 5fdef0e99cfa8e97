use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::config::RenderConfig;
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::foundation::math::clamp_unit;
use crate::render::frame::{Frame, flatten_premul_over_bg_to_rgb8};
use crate::text::font::FontHandle;
use crate::text::layout::{LineLayout, TextLayoutEngine};
use crate::text::wrap::wrap_text;

/// Draws one caption frame: the current line with its sung prefix highlighted, plus a preview
/// of the next line.
///
/// Implementations are not shared across threads; parallel builds create one per worker through
/// a [`RendererFactory`].
pub trait CaptionRenderer {
    /// Render `current` with `progress` in `[0, 1]` of it highlighted, previewing `next`.
    ///
    /// Empty `current` yields a background-only frame.
    fn render(&mut self, current: &str, progress: f64, next: &str) -> KaraokeResult<Frame>;
}

impl<R: CaptionRenderer + ?Sized> CaptionRenderer for Box<R> {
    fn render(&mut self, current: &str, progress: f64, next: &str) -> KaraokeResult<Frame> {
        (**self).render(current, progress, next)
    }
}

/// Creates independent renderers, one per worker.
pub trait RendererFactory: Sync {
    /// Renderer type produced by this factory.
    type Renderer: CaptionRenderer;

    /// Build a fresh renderer.
    fn create(&self) -> KaraokeResult<Self::Renderer>;
}

impl<R, F> RendererFactory for F
where
    R: CaptionRenderer,
    F: Fn() -> KaraokeResult<R> + Sync,
{
    type Renderer = R;

    fn create(&self) -> KaraokeResult<R> {
        self()
    }
}

/// Split a highlight across wrapped lines.
///
/// `line_chars` holds the character count of each wrapped line. The lines are treated as one
/// stream joined by single separators, `floor(len * progress)` characters of it are highlighted,
/// and the result is the number highlighted on each line.
///
/// Whitespace is normalized by wrapping: leading, trailing, and repeated spaces in the raw text
/// do not count toward the stream.
pub fn plan_highlight(line_chars: &[usize], progress: f64) -> Vec<usize> {
    let stream_len = line_chars.iter().sum::<usize>() + line_chars.len().saturating_sub(1);
    let to_highlight = (stream_len as f64 * clamp_unit(progress)).floor() as usize;

    let mut consumed = 0usize;
    line_chars
        .iter()
        .map(|&count| {
            let n = to_highlight.saturating_sub(consumed).min(count);
            consumed += count + 1;
            n
        })
        .collect()
}

fn char_prefix(s: &str, n: usize) -> &str {
    let end = s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    &s[..end]
}

struct PlacedLine {
    text: String,
    chars: usize,
    x: f32,
    y: f32,
    layout: LineLayout,
}

struct CaptionBlock {
    current: String,
    next: String,
    lines: Vec<PlacedLine>,
    preview: Vec<PlacedLine>,
    /// Highlight-colored prefixes keyed by `(line, chars)`.
    prefixes: HashMap<(usize, usize), LineLayout>,
}

impl CaptionBlock {
    fn line_chars(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.chars).collect()
    }
}

/// [`CaptionRenderer`] rasterizing with `vello_cpu` and shaping with `parley`.
///
/// Layout of a `(current, next)` pair is cached, and a frame whose highlight split matches the
/// previous one is returned without re-rasterizing.
pub struct CpuCaptionRenderer {
    cfg: Arc<RenderConfig>,
    font: vello_cpu::peniko::FontData,
    engine: TextLayoutEngine,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    block: Option<CaptionBlock>,
    last: Option<(Vec<usize>, Frame)>,
}

impl CpuCaptionRenderer {
    /// Create a renderer for `cfg` drawing with `font`.
    pub fn new(cfg: Arc<RenderConfig>, font: &FontHandle) -> KaraokeResult<Self> {
        cfg.validate()?;
        let width: u16 = cfg
            .width
            .try_into()
            .map_err(|_| KaraokeError::render("canvas width exceeds u16"))?;
        let height: u16 = cfg
            .height
            .try_into()
            .map_err(|_| KaraokeError::render("canvas height exceeds u16"))?;

        Ok(Self {
            engine: TextLayoutEngine::new(font)?,
            font: font.to_glyph_font(),
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            block: None,
            last: None,
            cfg,
        })
    }

    /// Configuration this renderer draws with.
    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    /// Wrapped caption lines for the most recently rendered text.
    pub fn current_lines(&self) -> Vec<&str> {
        self.block
            .as_ref()
            .map(|b| b.lines.iter().map(|l| l.text.as_str()).collect())
            .unwrap_or_default()
    }

    fn ensure_block(&mut self, current: &str, next: &str) -> KaraokeResult<()> {
        let fresh = self
            .block
            .as_ref()
            .is_some_and(|b| b.current == current && b.next == next);
        if !fresh {
            self.block = Some(layout_block(&mut self.engine, &self.cfg, current, next)?);
            self.last = None;
        }
        Ok(())
    }
}

fn layout_block(
    engine: &mut TextLayoutEngine,
    cfg: &RenderConfig,
    current: &str,
    next: &str,
) -> KaraokeResult<CaptionBlock> {
    let mut block = CaptionBlock {
        current: current.to_owned(),
        next: next.to_owned(),
        lines: Vec::new(),
        preview: Vec::new(),
        prefixes: HashMap::new(),
    };
    if current.trim().is_empty() {
        return Ok(block);
    }

    let canvas_w = cfg.width as f32;
    let max_w = cfg.wrap_width_px();

    let wrapped = wrap_text(current, max_w, &mut engine.measure_at(cfg.font_size))?;
    let mut shaped = Vec::with_capacity(wrapped.len());
    for text in wrapped {
        let layout = engine.layout_line(&text, cfg.font_size, cfg.font_color)?;
        shaped.push((text, layout));
    }
    if shaped.is_empty() {
        return Err(KaraokeError::render("caption layout produced no lines"));
    }

    let total_h = shaped.iter().map(|(_, l)| l.height()).sum::<f32>()
        + cfg.line_spacing * (shaped.len() - 1) as f32;
    let mut y = (cfg.height as f32 * cfg.text_anchor - total_h / 2.0).floor() - cfg.text_lift_px;

    for (text, layout) in shaped {
        let h = layout.height();
        block.lines.push(PlacedLine {
            chars: text.chars().count(),
            x: ((canvas_w - layout.width()) / 2.0).floor(),
            y,
            text,
            layout,
        });
        y += h + cfg.line_spacing;
    }

    if next.trim().is_empty() || cfg.max_preview_lines == 0 {
        return Ok(block);
    }

    let mut y = y + cfg.preview_gap;
    let wrapped = wrap_text(next, max_w, &mut engine.measure_at(cfg.preview_font_size))?;
    for text in wrapped.into_iter().take(cfg.max_preview_lines) {
        let layout = engine.layout_line(&text, cfg.preview_font_size, cfg.preview_color)?;
        let h = layout.height();
        block.preview.push(PlacedLine {
            chars: text.chars().count(),
            x: ((canvas_w - layout.width()) / 2.0).floor(),
            y,
            text,
            layout,
        });
        y += h + cfg.preview_line_spacing;
    }

    Ok(block)
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &LineLayout,
    x: f32,
    y: f32,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        f64::from(x),
        f64::from(y),
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
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

impl CaptionRenderer for CpuCaptionRenderer {
    fn render(&mut self, current: &str, progress: f64, next: &str) -> KaraokeResult<Frame> {
        self.ensure_block(current, next)?;

        let Self {
            cfg,
            font,
            engine,
            ctx,
            pixmap,
            block,
            last,
        } = self;
        let block = block
            .as_mut()
            .ok_or_else(|| KaraokeError::render("caption block missing after layout"))?;

        let highlighted = plan_highlight(&block.line_chars(), progress);
        if let Some((key, frame)) = last.as_ref()
            && *key == highlighted
        {
            return Ok(frame.clone());
        }

        ctx.reset();
        pixmap.data_as_u8_slice_mut().fill(0);

        let CaptionBlock {
            lines,
            preview,
            prefixes,
            ..
        } = block;

        for (i, line) in lines.iter().enumerate() {
            draw_layout(ctx, font, &line.layout, line.x, line.y);

            let n = highlighted[i];
            if n == 0 {
                continue;
            }
            let overlay = match prefixes.entry((i, n)) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(engine.layout_line(
                    char_prefix(&line.text, n),
                    cfg.font_size,
                    cfg.highlight_color,
                )?),
            };
            draw_layout(ctx, font, overlay, line.x, line.y);
        }

        for line in preview.iter() {
            draw_layout(ctx, font, &line.layout, line.x, line.y);
        }

        ctx.flush();
        ctx.render_to_pixmap(pixmap);

        let mut frame = Frame {
            width: cfg.width,
            height: cfg.height,
            data: vec![0u8; cfg.canvas().pixel_count() * 3],
        };
        flatten_premul_over_bg_to_rgb8(&mut frame.data, pixmap.data_as_u8_slice(), cfg.bg_color)?;

        *last = Some((highlighted, frame.clone()));
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
