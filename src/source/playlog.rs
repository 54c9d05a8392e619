use std::{fs::File, io::BufReader, path::PathBuf};

use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    foundation::error::{LastListenedError, LastListenedResult},
    source::{TrackRecord, TrackSource},
};

/// `plugins.log` config block.
#[derive(Clone, Debug, Deserialize)]
pub struct LogSettings {
    /// JSON file holding an array of plays, most recent first.
    pub path: PathBuf,
}

/// Plays read from a local JSON file.
///
/// Each entry is `{"artist", "title", "cover"?, "listened_at"}` where `listened_at` is Unix
/// seconds or an RFC 3339 string.
pub struct LogSource {
    settings: LogSettings,
}

impl LogSource {
    /// Build the source. The file is read on every [`TrackSource::get_tracks`] call.
    pub fn new(settings: LogSettings) -> Self {
        Self { settings }
    }
}

impl TrackSource for LogSource {
    fn name(&self) -> &'static str {
        "log"
    }

    fn get_tracks(&self, limit: usize) -> LastListenedResult<Vec<TrackRecord>> {
        let path = &self.settings.path;
        let f = File::open(path).map_err(|e| {
            LastListenedError::source_unavailable(format!(
                "log: open '{}': {e}",
                path.display()
            ))
        })?;
        let entries: Vec<LogEntry> = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            LastListenedError::source_unavailable(format!(
                "log: parse '{}': {e}",
                path.display()
            ))
        })?;

        entries
            .into_iter()
            .take(limit)
            .map(LogEntry::into_record)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    artist: String,
    #[serde(alias = "track")]
    title: String,
    #[serde(default, alias = "cover_ref")]
    cover: String,
    listened_at: Timestamp,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Unix(i64),
    Text(String),
}

impl LogEntry {
    fn into_record(self) -> LastListenedResult<TrackRecord> {
        let listened_at = match self.listened_at {
            Timestamp::Unix(secs) => secs,
            Timestamp::Text(s) => parse_rfc3339_unix(&s).ok_or_else(|| {
                LastListenedError::source_unavailable(format!(
                    "log: '{s}' is neither Unix seconds nor RFC 3339"
                ))
            })?,
        };
        Ok(TrackRecord::new(self.artist, self.title, self.cover, listened_at))
    }
}

fn parse_rfc3339_unix(s: &str) -> Option<i64> {
    let odt = OffsetDateTime::parse(s.trim(), &Rfc3339).ok()?;
    Some(odt.unix_timestamp())
}

#[cfg(test)]
#[path = "../../tests/unit/source/playlog.rs"]
mod tests;
