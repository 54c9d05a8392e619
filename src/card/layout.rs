//! Composition of the track card.
//!
//! The engine draws, in order, a rounded background, a centered header and one row per track:
//!
//! ```text
//! +--------------------------------------+
//! |         Last listened tracks         |
//! | +----+ Title                         |
//! | |art | Artist              2 hours ago|
//! | +----+                               |
//! +--------------------------------------+
//! ```
//!
//! Rows are never bounds-checked: rows below the canvas are clipped.

use image::RgbaImage;
use vello_cpu::kurbo::{Affine, Rect, RoundedRect, Shape as _};

use crate::{
    card::{
        cover::CoverArt,
        pixels::{image_paint, unpremultiply_rgba8_in_place},
        text::{LoadedFont, TextBlock, TextEngine, draw_text},
    },
    config::ImageConfig,
    foundation::error::{LastListenedError, LastListenedResult},
    source::TrackRecord,
};

/// Corner radius of the background.
pub const CORNER_RADIUS: f64 = 10.0;
/// The background stops this many pixels short of the right and bottom edges.
pub const EDGE_INSET: u32 = 2;
/// Top offset of the header text.
pub const HEADER_Y: i32 = 5;
/// Space between the header and the first row.
pub const HEADER_PAD: i32 = 20;
/// Left offset of each cover.
pub const COVER_X: i32 = 5;
/// Gap between a cover and its text, and between rows.
pub const ROW_GAP: i32 = 10;
/// Extra space between the title line and the artist line.
pub const LINE_GAP: i32 = 3;
/// Right margin of the relative time.
pub const RIGHT_MARGIN: i32 = 5;

/// A track ready to be drawn.
#[derive(Clone, Debug)]
pub struct FormattedTrack {
    /// The play as returned by the source.
    pub record: TrackRecord,
    /// e.g. `"3 hours ago"`.
    pub relative_time: String,
    /// Square cover at `cover_size`.
    pub cover: CoverArt,
}

/// Fonts of the three text roles, registered with their own [`TextEngine`].
pub struct CardFonts {
    engine: TextEngine,
    header: LoadedFont,
    main: LoadedFont,
    sub: LoadedFont,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Header,
    Main,
    Sub,
}

impl CardFonts {
    /// Load the header, main and sub fonts named in `cfg`.
    pub fn load(cfg: &ImageConfig) -> LastListenedResult<Self> {
        let mut engine = TextEngine::new();
        let header = engine.load_font(&cfg.header.font)?;
        let main = engine.load_font(&cfg.font)?;
        let sub = engine.load_font(&cfg.sub_font)?;
        Ok(Self {
            engine,
            header,
            main,
            sub,
        })
    }

    /// Header font.
    pub fn header(&self) -> &LoadedFont {
        &self.header
    }

    /// Track title font.
    pub fn main(&self) -> &LoadedFont {
        &self.main
    }

    /// Artist and relative-time font.
    pub fn sub(&self) -> &LoadedFont {
        &self.sub
    }

    fn font(&self, role: Role) -> &LoadedFont {
        match role {
            Role::Header => &self.header,
            Role::Main => &self.main,
            Role::Sub => &self.sub,
        }
    }

    fn shape(&mut self, role: Role, text: &str) -> TextBlock {
        // Cheap: the font bytes are shared.
        let font = self.font(role).clone();
        self.engine.shape(text, &font)
    }
}

/// Where the engine is in its single pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
    /// Nothing drawn yet.
    Background,
    /// Background drawn; header and rows may be written.
    Composing,
    /// Canvas handed off.
    Complete,
}

/// `x` that centers `text_width` on a canvas of `canvas_width` (floored, may be negative).
pub fn centered_x(canvas_width: u32, text_width: u32) -> i32 {
    (px(canvas_width) - px(text_width)).div_euclid(2)
}

/// `x` that ends `text_width` [`RIGHT_MARGIN`] pixels before the right edge.
pub fn right_aligned_x(canvas_width: u32, text_width: u32) -> i32 {
    px(canvas_width) - px(text_width) - RIGHT_MARGIN
}

/// Vertical space taken by the header; the first row starts here.
pub fn header_extent(text_height: u32, descent: u32) -> i32 {
    px(text_height) + px(descent) + HEADER_PAD
}

/// Distance from the title line to the artist line.
pub fn line_padding(text_height: u32, descent: u32) -> i32 {
    px(text_height) + px(descent) + LINE_GAP
}

/// `(artist_y, next_row_y)` for a row starting at `row_y`.
///
/// `next_row_y - row_y == cover_size + ROW_GAP` whatever the padding, so rows advance
/// strictly for any positive cover size.
pub fn advance_row(row_y: i32, cover_size: u32, line_padding: i32) -> (i32, i32) {
    let artist_y = row_y.saturating_add(line_padding);
    let next = artist_y
        .saturating_add(px(cover_size))
        .saturating_add(ROW_GAP)
        .saturating_sub(line_padding);
    (artist_y, next)
}

fn px(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Single-pass composer of one card.
pub struct LayoutEngine<'a> {
    cfg: &'a ImageConfig,
    fonts: &'a mut CardFonts,
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    state: LayoutState,
    header_written: bool,
}

impl<'a> LayoutEngine<'a> {
    /// Prepare an engine for `cfg`. Nothing is drawn until [`Self::create_background`].
    pub fn new(cfg: &'a ImageConfig, fonts: &'a mut CardFonts) -> LastListenedResult<Self> {
        let width: u16 = cfg
            .width
            .try_into()
            .map_err(|_| LastListenedError::render("canvas width exceeds u16"))?;
        let height: u16 = cfg
            .height
            .try_into()
            .map_err(|_| LastListenedError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(LastListenedError::render("canvas width/height must be non-zero"));
        }

        Ok(Self {
            cfg,
            fonts,
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
            state: LayoutState::Background,
            header_written: false,
        })
    }

    /// Current state.
    pub fn state(&self) -> LayoutState {
        self.state
    }

    fn expect_state(&self, want: LayoutState, op: &str) -> LastListenedResult<()> {
        if self.state != want {
            return Err(LastListenedError::render(format!(
                "{op} called in state {:?} (expected {want:?})",
                self.state
            )));
        }
        Ok(())
    }

    /// Fill a rounded rectangle with the background color on a transparent canvas.
    pub fn create_background(&mut self) -> LastListenedResult<()> {
        self.expect_state(LayoutState::Background, "create_background")?;

        let right = f64::from(self.cfg.width.saturating_sub(EDGE_INSET));
        let bottom = f64::from(self.cfg.height.saturating_sub(EDGE_INSET));
        let shape = RoundedRect::new(0.0, 0.0, right, bottom, CORNER_RADIUS);

        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::IDENTITY);
        self.ctx.set_paint(self.cfg.background.to_paint());
        self.ctx.fill_path(&shape.to_path(0.1));

        self.state = LayoutState::Composing;
        Ok(())
    }

    /// Draw the centered header; returns the first row's `row_y`.
    pub fn write_header(&mut self) -> LastListenedResult<i32> {
        self.expect_state(LayoutState::Composing, "write_header")?;
        if self.header_written {
            return Err(LastListenedError::render("header already written"));
        }

        let block = self.fonts.shape(Role::Header, &self.cfg.header.text);
        let x = centered_x(self.cfg.width, block.width);
        draw_text(&mut self.ctx, &block, self.fonts.font(Role::Header), x, HEADER_Y);

        self.header_written = true;
        Ok(header_extent(block.height, block.descent))
    }

    /// Draw one track row starting at `row_y`; returns the next row's `row_y`.
    pub fn write_track(&mut self, track: &FormattedTrack, row_y: i32) -> LastListenedResult<i32> {
        self.expect_state(LayoutState::Composing, "write_track")?;
        if !self.header_written {
            return Err(LastListenedError::render("write_track called before write_header"));
        }

        let cover_size = self.cfg.cover_size;
        let text_x = px(cover_size).saturating_add(ROW_GAP);

        self.paste_cover(track.cover.image(), COVER_X, row_y)?;

        let title = self.fonts.shape(Role::Main, &track.record.title);
        draw_text(&mut self.ctx, &title, self.fonts.font(Role::Main), text_x, row_y);

        let padding = line_padding(title.height, title.descent);
        let (artist_y, next_row_y) = advance_row(row_y, cover_size, padding);

        let artist = self.fonts.shape(Role::Sub, &track.record.artist);
        draw_text(&mut self.ctx, &artist, self.fonts.font(Role::Sub), text_x, artist_y);

        let when = self.fonts.shape(Role::Sub, &track.relative_time);
        let when_x = right_aligned_x(self.cfg.width, when.width);
        draw_text(&mut self.ctx, &when, self.fonts.font(Role::Sub), when_x, artist_y);

        tracing::debug!(
            title = %track.record.title,
            row_y,
            next_row_y,
            clipped = next_row_y > i32::from(self.height),
            "wrote track row"
        );
        Ok(next_row_y)
    }

    fn paste_cover(&mut self, cover: &RgbaImage, x: i32, y: i32) -> LastListenedResult<()> {
        let paint = image_paint(cover)?;
        let (w, h) = cover.dimensions();

        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx
            .set_transform(Affine::translate((f64::from(x), f64::from(y))));
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
        Ok(())
    }

    /// Rasterize and hand off the canvas as straight-alpha RGBA8.
    pub fn finish(mut self) -> LastListenedResult<RgbaImage> {
        self.expect_state(LayoutState::Composing, "finish")?;

        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.state = LayoutState::Complete;

        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        RgbaImage::from_raw(u32::from(self.width), u32::from(self.height), data)
            .ok_or_else(|| LastListenedError::render("canvas byte length mismatch"))
    }
}

/// Run the whole pass: background, header, then every track in the given order.
#[tracing::instrument(skip_all, fields(tracks = tracks.len()))]
pub fn compose(
    cfg: &ImageConfig,
    fonts: &mut CardFonts,
    tracks: &[FormattedTrack],
) -> LastListenedResult<RgbaImage> {
    let mut engine = LayoutEngine::new(cfg, fonts)?;
    engine.create_background()?;
    let mut row_y = engine.write_header()?;
    for track in tracks {
        row_y = engine.write_track(track, row_y)?;
    }
    engine.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/card/layout.rs"]
mod tests;
