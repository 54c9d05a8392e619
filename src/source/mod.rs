//! Providers of play history.
//!
//! Every provider implements [`TrackSource`]; the config names one of them and
//! [`create_source`] builds it once at startup.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::foundation::error::{LastListenedError, LastListenedResult};

pub(crate) mod lastfm;
pub(crate) mod listenbrainz;
pub(crate) mod playlog;

pub use lastfm::{LastFmSettings, LastFmSource};
pub use listenbrainz::{ListenBrainzSettings, ListenBrainzSource};
pub use playlog::{LogSettings, LogSource};

/// One play-history entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRecord {
    /// Artist name.
    pub artist: String,
    /// Track title.
    pub title: String,
    /// Cover art URL; empty when none is known.
    pub cover_ref: String,
    /// When the play happened, Unix seconds (UTC).
    pub listened_at: i64,
    /// Still playing; `listened_at` is then the fetch time and the run's clock wins.
    pub now_playing: bool,
}

impl TrackRecord {
    /// Build a record.
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        cover_ref: impl Into<String>,
        listened_at: i64,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            cover_ref: cover_ref.into(),
            listened_at,
            now_playing: false,
        }
    }

    /// Mark the record as the track currently playing.
    pub fn playing(mut self) -> Self {
        self.now_playing = true;
        self
    }
}

/// Provider-agnostic access to recent plays.
pub trait TrackSource {
    /// Registry name of this provider.
    fn name(&self) -> &'static str;

    /// Up to `limit` most recent plays, in the order the provider returns them.
    fn get_tracks(&self, limit: usize) -> LastListenedResult<Vec<TrackRecord>>;
}

/// Known providers, selectable by name from the config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Last.fm `user.getRecentTracks`.
    LastFm,
    /// ListenBrainz listens API.
    ListenBrainz,
    /// Local JSON play log.
    Log,
}

impl SourceKind {
    /// All providers, in registry order.
    pub const ALL: [SourceKind; 3] = [
        SourceKind::LastFm,
        SourceKind::ListenBrainz,
        SourceKind::Log,
    ];

    /// Name used in the config `plugin` field.
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::LastFm => "lastfm",
            SourceKind::ListenBrainz => "listenbrainz",
            SourceKind::Log => "log",
        }
    }

    /// Look a provider up by config name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Every registered name.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.name()).collect()
    }
}

/// Build the provider `kind` from its config block.
///
/// `timeout` bounds each HTTP request made by network providers.
pub fn create_source(
    kind: SourceKind,
    settings: &serde_json::Value,
    timeout: Duration,
) -> LastListenedResult<Box<dyn TrackSource>> {
    let source: Box<dyn TrackSource> = match kind {
        SourceKind::LastFm => {
            Box::new(LastFmSource::new(parse_settings(kind, settings)?, timeout)?)
        }
        SourceKind::ListenBrainz => Box::new(ListenBrainzSource::new(
            parse_settings(kind, settings)?,
            timeout,
        )?),
        SourceKind::Log => Box::new(LogSource::new(parse_settings(kind, settings)?)),
    };
    Ok(source)
}

fn parse_settings<T: DeserializeOwned>(
    kind: SourceKind,
    settings: &serde_json::Value,
) -> LastListenedResult<T> {
    if settings.is_null() {
        return Err(LastListenedError::config(format!(
            "missing plugins.{} settings",
            kind.name()
        )));
    }
    serde_json::from_value(settings.clone()).map_err(|e| {
        LastListenedError::config(format!("invalid plugins.{} settings: {e}", kind.name()))
    })
}

/// Read a response body, mapping transport failures to [`LastListenedError::SourceUnavailable`].
pub(crate) fn response_text(
    source: &str,
    resp: reqwest::Result<reqwest::blocking::Response>,
) -> LastListenedResult<(reqwest::StatusCode, String)> {
    let resp = resp.map_err(|e| {
        LastListenedError::source_unavailable(format!("{source}: request failed: {e}"))
    })?;
    let status = resp.status();
    let body = resp.text().map_err(|e| {
        LastListenedError::source_unavailable(format!("{source}: read response body: {e}"))
    })?;
    Ok((status, body))
}

#[cfg(test)]
#[path = "../../tests/unit/source/registry.rs"]
mod tests;
