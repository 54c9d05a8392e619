//! lastlistened renders a PNG card of your most recently played tracks.
//!
//! A run reads a JSON config, asks one [`TrackSource`] (Last.fm, ListenBrainz or a local play
//! log) for recent plays, resolves each cover (falling back to a placeholder), composes the card
//! and writes it to disk. An optional compressor and SFTP upload follow.
//!
//! - Load an [`AppConfig`]
//! - Call [`run`] (or [`run_with_fetcher`] with your own [`CoverFetcher`])
//! - Or drive [`LayoutEngine`] / [`compose`] directly with [`FormattedTrack`]s
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod net;

pub(crate) mod card;
/// JSON configuration.
pub mod config;
/// Relative "time ago" strings.
pub mod elapsed;
/// Single-run orchestration.
pub mod pipeline;
/// PNG output, compression and upload.
pub mod sink;
/// Play-history providers.
pub mod source;

pub use crate::foundation::color::Rgba8;
pub use crate::foundation::error::{LastListenedError, LastListenedResult};

pub use crate::card::cover::{
    CoverArt, CoverFetcher, CoverResolver, FallbackReason, HttpCoverFetcher, RESIZE_FILTER,
    bundled_placeholder, load_placeholder, resolve_cover,
};
pub use crate::card::layout::{
    CardFonts, FormattedTrack, LayoutEngine, LayoutState, advance_row, centered_x, compose,
    header_extent, line_padding, right_aligned_x,
};
pub use crate::card::text::{LoadedFont, TextBlock, TextEngine};
pub use crate::config::{
    AppConfig, CompressorConfig, DEFAULT_CONFIG_PATH, FontSpec, HeaderSpec, ImageConfig,
    SftpConfig,
};
pub use crate::elapsed::{format_relative, now_unix};
pub use crate::pipeline::{RunOptions, RunReport, fetch_tracks, format_tracks, run, run_with_fetcher};
pub use crate::sink::{Compressor, SftpTransfer, deliver, write_png};
pub use crate::source::{SourceKind, TrackRecord, TrackSource, create_source};
