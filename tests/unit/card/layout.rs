use std::path::PathBuf;

use super::*;
use crate::{
    card::{cover::FallbackReason, test_fonts},
    config::{FontSpec, HeaderSpec},
    foundation::color::Rgba8,
};

#[test]
fn centering_floors_and_may_go_negative() {
    assert_eq!(centered_x(400, 100), 150);
    assert_eq!(centered_x(401, 100), 150);
    assert_eq!(centered_x(400, 101), 149);
    assert_eq!(centered_x(100, 103), -2);
}

#[test]
fn right_alignment_keeps_margin() {
    assert_eq!(right_aligned_x(400, 80), 315);
    assert_eq!(right_aligned_x(400, 0), 395);
    assert_eq!(right_aligned_x(50, 80), -35);
}

#[test]
fn header_extent_and_line_padding() {
    assert_eq!(header_extent(16, 4), 40);
    assert_eq!(header_extent(0, 0), HEADER_PAD);
    assert_eq!(line_padding(12, 3), 18);
    assert_eq!(line_padding(0, 0), LINE_GAP);
}

#[test]
fn rows_advance_by_cover_size_plus_gap() {
    for (row_y, cover, pad) in [(40, 50, 18), (0, 1, 0), (-10, 64, 200), (1000, 300, 7)] {
        let (artist_y, next) = advance_row(row_y, cover, pad);
        assert_eq!(artist_y, row_y + pad);
        assert_eq!(next - row_y, cover as i32 + ROW_GAP);
        assert!(next > row_y);
    }
}

#[test]
fn row_positions_are_monotonic() {
    let mut row_y = header_extent(20, 5);
    for _ in 0..10 {
        let (_, next) = advance_row(row_y, 50, line_padding(14, 4));
        assert!(next > row_y);
        row_y = next;
    }
    assert_eq!(row_y, 45 + 10 * 60);
}

fn font_spec(face: PathBuf, size: f32) -> FontSpec {
    FontSpec {
        face,
        size,
        color: Rgba8::rgb(255, 255, 255),
    }
}

fn image_config(face: PathBuf) -> ImageConfig {
    ImageConfig {
        width: 300,
        height: 240,
        cover_size: 40,
        background: Rgba8::rgb(30, 30, 30),
        header: HeaderSpec {
            text: "Last listened tracks".to_owned(),
            font: font_spec(face.clone(), 18.0),
        },
        font: font_spec(face.clone(), 14.0),
        sub_font: font_spec(face, 11.0),
        output: PathBuf::from("target/unit_layout/card.png"),
        placeholder: None,
    }
}

fn track(title: &str, artist: &str, when: &str, rgba: [u8; 4]) -> FormattedTrack {
    FormattedTrack {
        record: TrackRecord::new(artist, title, "", 0),
        relative_time: when.to_owned(),
        cover: CoverArt::Placeholder {
            image: RgbaImage::from_pixel(40, 40, image::Rgba(rgba)),
            reason: FallbackReason::NoReference,
        },
    }
}

#[test]
fn out_of_order_calls_are_render_errors() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let mut engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    assert_eq!(engine.state(), LayoutState::Background);
    assert!(matches!(engine.write_header(), Err(LastListenedError::Render(_))));
    let t = track("a", "b", "now", [0, 0, 0, 255]);
    assert!(matches!(engine.write_track(&t, 0), Err(LastListenedError::Render(_))));

    engine.create_background().unwrap();
    assert_eq!(engine.state(), LayoutState::Composing);
    assert!(matches!(engine.create_background(), Err(LastListenedError::Render(_))));
    assert!(matches!(engine.write_track(&t, 0), Err(LastListenedError::Render(_))));

    engine.write_header().unwrap();
    assert!(matches!(engine.write_header(), Err(LastListenedError::Render(_))));

    let mut fonts = CardFonts::load(&cfg).unwrap();
    let engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    assert!(matches!(engine.finish(), Err(LastListenedError::Render(_))));
}

#[test]
fn background_leaves_inset_edges_transparent() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let mut engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    engine.create_background().unwrap();
    let img = engine.finish().unwrap();

    assert_eq!(img.dimensions(), (300, 240));
    assert_eq!(img.get_pixel(150, 120).0, [30, 30, 30, 255]);
    assert_eq!(img.get_pixel(299, 120).0[3], 0);
    assert_eq!(img.get_pixel(150, 239).0[3], 0);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
}

#[test]
fn write_track_returns_next_row_and_pastes_cover() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let mut engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    engine.create_background().unwrap();
    let first = engine.write_header().unwrap();
    assert!(first > HEADER_PAD);

    let t = track("Song", "Band", "2 hours ago", [200, 10, 10, 255]);
    let second = engine.write_track(&t, first).unwrap();
    assert_eq!(second - first, 40 + ROW_GAP);
    let img = engine.finish().unwrap();

    let cy = u32::try_from(first + 20).unwrap();
    assert_eq!(img.get_pixel(COVER_X as u32 + 20, cy).0, [200, 10, 10, 255]);
}

#[test]
fn composing_is_deterministic() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let tracks = vec![
        track("First", "Artist A", "just now", [0, 128, 255, 255]),
        track("Second", "Artist B", "3 days ago", [255, 128, 0, 255]),
    ];

    let mut fonts = CardFonts::load(&cfg).unwrap();
    let a = compose(&cfg, &mut fonts, &tracks).unwrap();
    let b = compose(&cfg, &mut fonts, &tracks).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());

    let mut fresh = CardFonts::load(&cfg).unwrap();
    let c = compose(&cfg, &mut fresh, &tracks).unwrap();
    assert_eq!(a.as_raw(), c.as_raw());
}

#[test]
fn rows_past_the_bottom_are_clipped_not_errors() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let tracks: Vec<_> = (0..12)
        .map(|i| track(&format!("t{i}"), "a", "now", [9, 9, 9, 255]))
        .collect();

    let mut fonts = CardFonts::load(&cfg).unwrap();
    let img = compose(&cfg, &mut fonts, &tracks).unwrap();
    assert_eq!(img.dimensions(), (300, 240));
}

/// Bounding box of near-white pixels (the text color) inside `x`/`y` ranges.
fn text_ink(
    img: &RgbaImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
) -> Option<(u32, u32, u32, u32)> {
    let mut bbox: Option<(u32, u32, u32, u32)> = None;
    for y in ys {
        for x in xs.clone() {
            let [r, g, b, a] = img.get_pixel(x, y).0;
            if a != 255 || r < 100 || g < 100 || b < 100 {
                continue;
            }
            bbox = Some(match bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bbox
}

#[test]
fn header_is_centered_below_its_offset() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let mut engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    engine.create_background().unwrap();
    let first = engine.write_header().unwrap();
    let img = engine.finish().unwrap();

    let header = fonts.shape(Role::Header, &cfg.header.text);
    let (x0, y0, x1, y1) = text_ink(&img, 0..cfg.width, 0..u32::try_from(first).unwrap())
        .expect("header ink");

    let center = (x0 + x1) / 2;
    assert!(center.abs_diff(cfg.width / 2) <= 4, "header ink centered at {center}");
    assert!((x1 - x0 + 1) * 10 >= header.width * 8, "header ink {x0}..{x1}");
    assert!(y0 >= HEADER_Y as u32, "header ink starts at y={y0}");
    assert!(y1 < u32::try_from(first).unwrap());
}

#[test]
fn row_text_sits_right_of_cover_in_its_band() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let mut engine = LayoutEngine::new(&cfg, &mut fonts).unwrap();
    engine.create_background().unwrap();
    let first = engine.write_header().unwrap();
    let t = track("Song", "Band", "2 hours ago", [200, 10, 10, 255]);
    let second = engine.write_track(&t, first).unwrap();
    let img = engine.finish().unwrap();

    let title = fonts.shape(Role::Main, "Song");
    let artist_y = first + line_padding(title.height, title.descent);
    let (first, artist_y, second) = (
        u32::try_from(first).unwrap(),
        u32::try_from(artist_y).unwrap(),
        u32::try_from(second).unwrap(),
    );
    let text_x = cfg.cover_size + ROW_GAP as u32;

    // Nothing white left of the text column in this row.
    assert!(text_ink(&img, 0..text_x, first..second).is_none());

    let (tx0, ty0, _, ty1) = text_ink(&img, 0..cfg.width, first..artist_y).expect("title ink");
    assert!(tx0 >= text_x && tx0 <= text_x + 3, "title ink starts at x={tx0}");
    assert!(ty0 >= first && ty1 < artist_y);

    let (ax0, ay0, ax1, ay1) =
        text_ink(&img, 0..cfg.width, artist_y..second).expect("artist and time ink");
    assert!(ax0 >= text_x && ax0 <= text_x + 3, "artist ink starts at x={ax0}");
    assert!(ay0 >= artist_y && ay1 < second);
    let right_edge = cfg.width - RIGHT_MARGIN as u32;
    assert!(ax1 < right_edge && ax1 + 6 >= right_edge, "time ink ends at x={ax1}");
}

#[test]
fn shaping_uses_the_role_font() {
    let Some(face) = test_fonts::find() else {
        return;
    };
    let cfg = image_config(face);
    let mut fonts = CardFonts::load(&cfg).unwrap();

    let header = fonts.shape(Role::Header, "Same text");
    let main = fonts.shape(Role::Main, "Same text");
    let sub = fonts.shape(Role::Sub, "Same text");
    assert!(header.width > main.width && main.width > sub.width);
    assert!(header.height > sub.height);
}
