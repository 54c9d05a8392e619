use std::{borrow::Cow, path::Path, sync::Arc};

use sha2::Digest as _;

use crate::{
    config::FontSpec,
    foundation::color::Rgba8,
    foundation::error::{LastListenedError, LastListenedResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley text layout.
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// A font file registered with a [`TextEngine`], at a fixed size and color.
#[derive(Clone)]
pub struct LoadedFont {
    family: String,
    weight: parley::style::FontWeight,
    style: parley::style::FontStyle,
    width: parley::style::FontWidth,
    size_px: f32,
    color: Rgba8,
    bytes: Arc<Vec<u8>>,
    data: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("family", &self.family)
            .field("size_px", &self.size_px)
            .field("color", &self.color)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl LoadedFont {
    /// Family name as reported by the font file.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font size in pixels.
    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// SHA-256 of the raw font bytes, lowercase hex.
    pub fn sha256_hex(&self) -> String {
        let digest = sha2::Sha256::digest(self.bytes.as_slice());
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

/// Shaped single-line text plus the metrics the card layout needs.
pub struct TextBlock {
    layout: parley::Layout<TextBrush>,
    /// Advance width in pixels, rounded up.
    pub width: u32,
    /// Ascent of the first line in pixels, rounded up.
    pub height: u32,
    /// Descent of the first line in pixels, rounded up.
    pub descent: u32,
}

/// Stateful helper for registering fonts and shaping text with Parley.
///
/// Only fonts loaded through [`TextEngine::load_font`] are visible; system fonts are never
/// consulted, so output does not depend on the host.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Construct an engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Read and register the font file named by `spec`.
    pub fn load_font(&mut self, spec: &FontSpec) -> LastListenedResult<LoadedFont> {
        let bytes = read_font_file(&spec.face)?;
        self.register_font(bytes, spec.size, spec.color)
            .map_err(|e| match e {
                LastListenedError::Render(msg) => LastListenedError::render(format!(
                    "font '{}': {msg}",
                    spec.face.display()
                )),
                other => other,
            })
    }

    /// Register in-memory font bytes.
    pub fn register_font(
        &mut self,
        bytes: Vec<u8>,
        size_px: f32,
        color: Rgba8,
    ) -> LastListenedResult<LoadedFont> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LastListenedError::render(
                "font size must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let (family_id, info) = families
            .first()
            .and_then(|(id, fonts)| fonts.first().map(|info| (*id, info.clone())))
            .ok_or_else(|| LastListenedError::render("no font families found in font data"))?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LastListenedError::render("registered font family has no name"))?
            .to_string();

        let bytes = Arc::new(bytes);
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );

        Ok(LoadedFont {
            family,
            weight: info.weight(),
            style: info.style(),
            width: info.width(),
            size_px,
            color,
            bytes,
            data,
        })
    }

    /// Shape `text` as a single unwrapped line.
    pub fn shape(&mut self, text: &str, font: &LoadedFont) -> TextBlock {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(font.family.clone())),
        ));
        // Pin the exact face so a Bold file never shapes with a Regular sibling's glyph ids.
        builder.push_default(parley::style::StyleProperty::FontWeight(font.weight));
        builder.push_default(parley::style::StyleProperty::FontStyle(font.style));
        builder.push_default(parley::style::StyleProperty::FontWidth(font.width));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::from(
            font.color,
        )));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let (ascent, descent) = layout
            .lines()
            .next()
            .map(|line| {
                let m = line.metrics();
                (m.ascent, m.descent)
            })
            .unwrap_or((0.0, 0.0));
        let width = if text.is_empty() { 0.0 } else { layout.width() };

        TextBlock {
            width: ceil_px(width),
            height: if text.is_empty() { 0 } else { ceil_px(ascent) },
            descent: if text.is_empty() { 0 } else { ceil_px(descent) },
            layout,
        }
    }
}

fn ceil_px(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.ceil() as u32
    } else {
        0
    }
}

fn read_font_file(path: &Path) -> LastListenedResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        LastListenedError::render(format!("read font '{}': {e}", path.display()))
    })
}

/// Fill the glyphs of `block` with its top-left corner at `(x, y)`; the first baseline lands
/// at `y + ascent`.
pub(crate) fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    block: &TextBlock,
    font: &LoadedFont,
    x: i32,
    y: i32,
) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        f64::from(x),
        f64::from(y),
    )));

    for line in block.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            // Positioned glyphs carry the run offset and the line baseline, so `(x, y)` is the
            // top-left of the text box.
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font.data)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/text.rs"]
mod tests;
