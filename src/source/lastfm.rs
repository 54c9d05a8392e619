use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    elapsed::now_unix,
    foundation::error::{LastListenedError, LastListenedResult},
    net::blocking_client,
    source::{TrackRecord, TrackSource, response_text},
};

const API_ROOT: &str = "https://ws.audioscrobbler.com/2.0/";

/// Last.fm serves this star image when an album has no artwork.
const NO_ART_IMAGE_ID: &str = "2a96cbd8b46e442fc41c2b86b821562f";

/// `plugins.lastfm` config block.
///
/// `api_secret` and `password` are accepted for compatibility with older configs but are not
/// needed to read public scrobbles.
#[derive(Clone, Debug, Deserialize)]
pub struct LastFmSettings {
    /// API key from the Last.fm developer console.
    pub api_key: String,
    /// Account whose scrobbles are shown.
    pub username: String,
    /// Unused.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Unused.
    #[serde(default)]
    pub password: Option<String>,
}

/// Recent scrobbles from Last.fm.
pub struct LastFmSource {
    settings: LastFmSettings,
    client: Client,
}

impl LastFmSource {
    /// Build the source with a bounded HTTP client.
    pub fn new(settings: LastFmSettings, timeout: Duration) -> LastListenedResult<Self> {
        Ok(Self {
            settings,
            client: blocking_client(timeout)?,
        })
    }
}

impl TrackSource for LastFmSource {
    fn name(&self) -> &'static str {
        "lastfm"
    }

    #[tracing::instrument(skip(self), fields(user = %self.settings.username))]
    fn get_tracks(&self, limit: usize) -> LastListenedResult<Vec<TrackRecord>> {
        let limit_arg = limit.max(1).to_string();
        let resp = self
            .client
            .get(API_ROOT)
            .query(&[
                ("method", "user.getrecenttracks"),
                ("user", self.settings.username.as_str()),
                ("api_key", self.settings.api_key.as_str()),
                ("format", "json"),
                ("limit", limit_arg.as_str()),
            ])
            .send();
        let (status, body) = response_text("lastfm", resp)?;

        match parse_recent_tracks(&body, now_unix(), limit) {
            Ok(tracks) => Ok(tracks),
            Err(e) if status.is_success() => Err(e),
            Err(_) => Err(LastListenedError::source_unavailable(format!(
                "lastfm: HTTP {status}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiResponse {
    Error { error: i64, message: String },
    Ok { recenttracks: RecentTracks },
}

#[derive(Debug, Deserialize)]
struct RecentTracks {
    #[serde(default)]
    track: OneOrMany<ScrobbledTrack>,
}

/// Last.fm collapses single-element lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(v) => v,
            Self::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScrobbledTrack {
    name: String,
    artist: TextNode,
    #[serde(default)]
    image: Vec<ImageNode>,
    #[serde(default)]
    date: Option<DateNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "#text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    #[serde(rename = "#text", default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct DateNode {
    uts: String,
}

/// Map a `user.getrecenttracks` JSON body to records.
///
/// The currently playing track has no `date`; it is stamped with `now` and marked playing.
pub(crate) fn parse_recent_tracks(
    body: &str,
    now: i64,
    limit: usize,
) -> LastListenedResult<Vec<TrackRecord>> {
    let resp: ApiResponse = serde_json::from_str(body).map_err(|e| {
        LastListenedError::source_unavailable(format!("lastfm: unexpected response: {e}"))
    })?;

    let recent = match resp {
        ApiResponse::Error { error, message } => {
            return Err(LastListenedError::source_unavailable(format!(
                "lastfm: error {error}: {message}"
            )));
        }
        ApiResponse::Ok { recenttracks } => recenttracks,
    };

    recent
        .track
        .into_vec()
        .into_iter()
        .take(limit)
        .map(|t| {
            let Some(date) = &t.date else {
                return Ok(
                    TrackRecord::new(t.artist.text, t.name, pick_cover(&t.image), now).playing(),
                );
            };
            let listened_at = date.uts.trim().parse::<i64>().map_err(|_| {
                LastListenedError::source_unavailable(format!(
                    "lastfm: bad timestamp '{}'",
                    date.uts
                ))
            })?;
            Ok(TrackRecord::new(
                t.artist.text,
                t.name,
                pick_cover(&t.image),
                listened_at,
            ))
        })
        .collect()
}

/// Images are listed smallest first; take the largest one that is real artwork.
fn pick_cover(images: &[ImageNode]) -> String {
    images
        .iter()
        .rev()
        .map(|i| i.url.trim())
        .find(|u| !u.is_empty() && !u.contains(NO_ART_IMAGE_ID))
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/source/lastfm.rs"]
mod tests;
