use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    foundation::error::{LastListenedError, LastListenedResult},
    net::blocking_client,
    source::{TrackRecord, TrackSource, response_text},
};

const API_ROOT: &str = "https://api.listenbrainz.org/1";
const COVER_ART_ROOT: &str = "https://coverartarchive.org/release";

/// `plugins.listenbrainz` config block.
#[derive(Clone, Debug, Deserialize)]
pub struct ListenBrainzSettings {
    /// Account whose listens are shown.
    pub username: String,
    /// User token; only needed for private profiles.
    #[serde(default)]
    pub token: Option<String>,
}

/// Recent listens from ListenBrainz, with covers from the Cover Art Archive.
pub struct ListenBrainzSource {
    settings: ListenBrainzSettings,
    client: Client,
}

impl ListenBrainzSource {
    /// Build the source with a bounded HTTP client.
    pub fn new(settings: ListenBrainzSettings, timeout: Duration) -> LastListenedResult<Self> {
        Ok(Self {
            settings,
            client: blocking_client(timeout)?,
        })
    }
}

impl TrackSource for ListenBrainzSource {
    fn name(&self) -> &'static str {
        "listenbrainz"
    }

    #[tracing::instrument(skip(self), fields(user = %self.settings.username))]
    fn get_tracks(&self, limit: usize) -> LastListenedResult<Vec<TrackRecord>> {
        let url = format!("{API_ROOT}/user/{}/listens", self.settings.username);
        let mut req = self
            .client
            .get(url)
            .query(&[("count", limit.max(1).to_string())]);
        if let Some(token) = &self.settings.token {
            req = req.header("Authorization", format!("Token {token}"));
        }

        let (status, body) = response_text("listenbrainz", req.send())?;
        if !status.is_success() {
            return Err(LastListenedError::source_unavailable(format!(
                "listenbrainz: HTTP {status}: {}",
                body.trim()
            )));
        }

        let mut tracks = parse_listens(&body)?;
        tracks.truncate(limit);
        Ok(tracks)
    }
}

#[derive(Debug, Deserialize)]
struct ListensResponse {
    payload: Payload,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    listens: Vec<Listen>,
}

#[derive(Debug, Deserialize)]
struct Listen {
    listened_at: i64,
    track_metadata: TrackMetadata,
}

#[derive(Debug, Deserialize)]
struct TrackMetadata {
    artist_name: String,
    track_name: String,
    #[serde(default)]
    additional_info: Option<AdditionalInfo>,
    #[serde(default)]
    mbid_mapping: Option<MbidMapping>,
}

#[derive(Debug, Deserialize)]
struct AdditionalInfo {
    #[serde(default)]
    release_mbid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbidMapping {
    #[serde(default)]
    caa_id: Option<u64>,
    #[serde(default)]
    caa_release_mbid: Option<String>,
}

/// Map a `/user/<name>/listens` JSON body to records.
pub(crate) fn parse_listens(body: &str) -> LastListenedResult<Vec<TrackRecord>> {
    let resp: ListensResponse = serde_json::from_str(body).map_err(|e| {
        LastListenedError::source_unavailable(format!("listenbrainz: unexpected response: {e}"))
    })?;

    Ok(resp
        .payload
        .listens
        .into_iter()
        .map(|l| {
            let cover = cover_url(&l.track_metadata);
            TrackRecord::new(
                l.track_metadata.artist_name,
                l.track_metadata.track_name,
                cover,
                l.listened_at,
            )
        })
        .collect())
}

fn cover_url(meta: &TrackMetadata) -> String {
    if let Some(MbidMapping {
        caa_id: Some(id),
        caa_release_mbid: Some(mbid),
    }) = &meta.mbid_mapping
        && !mbid.is_empty()
    {
        return format!("{COVER_ART_ROOT}/{mbid}/{id}-250.jpg");
    }

    match meta
        .additional_info
        .as_ref()
        .and_then(|i| i.release_mbid.as_deref())
    {
        Some(mbid) if !mbid.is_empty() => format!("{COVER_ART_ROOT}/{mbid}/front-250"),
        _ => String::new(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/listenbrainz.rs"]
mod tests;
