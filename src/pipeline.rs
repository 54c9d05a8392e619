//! One run from config to delivered PNG.

use std::path::PathBuf;

use crate::{
    card::{
        cover::{CoverFetcher, CoverResolver, HttpCoverFetcher, load_placeholder},
        layout::{CardFonts, FormattedTrack, compose},
    },
    config::AppConfig,
    elapsed::{format_relative, now_unix},
    foundation::error::{LastListenedError, LastListenedResult},
    sink::{Compressor, deliver, write_png},
    source::{SourceKind, TrackRecord, create_source},
};

/// Per-invocation overrides of the config.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Reference time for relative strings; the wall clock when `None`.
    pub now: Option<i64>,
    /// Forces `sftp.send` on or off.
    pub send_override: Option<bool>,
    /// Replaces `image.output`.
    pub output_override: Option<PathBuf>,
}

impl RunOptions {
    fn now(&self) -> i64 {
        self.now.unwrap_or_else(now_unix)
    }
}

/// What a run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Where the PNG was written (it may have been removed after upload).
    pub output: PathBuf,
    /// Rows drawn.
    pub tracks: usize,
    /// Rows that fell back to the placeholder cover.
    pub placeholders: usize,
    /// Whether the compressor ran successfully.
    pub compressed: bool,
    /// Whether the PNG was uploaded.
    pub transferred: bool,
}

/// Ask the configured source for up to `cfg.limit` plays.
pub fn fetch_tracks(cfg: &AppConfig) -> LastListenedResult<Vec<TrackRecord>> {
    let kind = SourceKind::from_name(&cfg.plugin)
        .ok_or_else(|| LastListenedError::config(format!("unknown plugin '{}'", cfg.plugin)))?;
    let source = create_source(kind, cfg.plugin_settings(), cfg.http_timeout())?;

    let span = tracing::info_span!("get_tracks", source = source.name(), limit = cfg.limit);
    let _enter = span.enter();
    let mut tracks = source.get_tracks(cfg.limit)?;
    tracks.truncate(cfg.limit);
    tracing::debug!(count = tracks.len(), "fetched tracks");
    Ok(tracks)
}

/// Attach relative times and covers to `records`, keeping their order.
///
/// A now-playing record is re-stamped with `now`.
pub fn format_tracks<F: CoverFetcher>(
    records: Vec<TrackRecord>,
    now: i64,
    resolver: &CoverResolver<F>,
) -> Vec<FormattedTrack> {
    records
        .into_iter()
        .map(|mut record| {
            if record.now_playing {
                record.listened_at = now;
            }
            let relative_time = format_relative(record.listened_at, now);
            let cover = resolver.resolve(&record.cover_ref);
            tracing::debug!(
                title = %record.title,
                artist = %record.artist,
                %relative_time,
                placeholder = cover.fallback_reason().is_some(),
                "formatted track"
            );
            FormattedTrack {
                record,
                relative_time,
                cover,
            }
        })
        .collect()
}

/// Render and deliver one card, fetching covers over HTTP.
pub fn run(cfg: &AppConfig, opts: RunOptions) -> LastListenedResult<RunReport> {
    let fetcher = HttpCoverFetcher::new(cfg.http_timeout())?;
    run_with_fetcher(cfg, opts, fetcher)
}

/// [`run`] with an injected cover transport.
#[tracing::instrument(skip_all, fields(plugin = %cfg.plugin))]
pub fn run_with_fetcher<F: CoverFetcher>(
    cfg: &AppConfig,
    opts: RunOptions,
    fetcher: F,
) -> LastListenedResult<RunReport> {
    // Fonts and placeholder first: a broken install should fail before any network traffic.
    let mut fonts = CardFonts::load(&cfg.image)?;
    let placeholder = load_placeholder(cfg.image.placeholder.as_deref())?;
    let resolver = CoverResolver::new(fetcher, &placeholder, cfg.image.cover_size);

    let records = fetch_tracks(cfg)?;
    let tracks = format_tracks(records, opts.now(), &resolver);
    let placeholders = tracks
        .iter()
        .filter(|t| t.cover.fallback_reason().is_some())
        .count();

    let img = compose(&cfg.image, &mut fonts, &tracks)?;

    let output = opts
        .output_override
        .clone()
        .unwrap_or_else(|| cfg.image.output.clone());
    write_png(&img, &output)?;

    let compressed = cfg
        .compressor
        .as_ref()
        .is_some_and(|c| Compressor::new(c).run(&output));

    let mut sftp = cfg.sftp.clone();
    if let Some(send) = opts.send_override {
        sftp.send = send;
    }
    let transferred = deliver(&output, &sftp)?;

    Ok(RunReport {
        output,
        tracks: tracks.len(),
        placeholders,
        compressed,
        transferred,
    })
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
