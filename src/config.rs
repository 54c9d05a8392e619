use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    foundation::color::Rgba8,
    foundation::error::{LastListenedError, LastListenedResult},
    source::SourceKind,
};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config";

/// Root of the JSON config file.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Name of the track source to use (`lastfm`, `listenbrainz`, `log`).
    pub plugin: String,
    /// Per-source settings keyed by source name; only `plugins[plugin]` is read.
    #[serde(default)]
    pub plugins: BTreeMap<String, serde_json::Value>,
    /// Number of tracks to request from the source.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Canvas, font and output settings.
    pub image: ImageConfig,
    /// Optional upload of the finished image.
    #[serde(default)]
    pub sftp: SftpConfig,
    /// Optional lossless optimizer run on the written PNG.
    #[serde(default)]
    pub compressor: Option<CompressorConfig>,
    /// Upper bound for every HTTP request (track source and cover art).
    #[serde(default = "default_timeout_secs")]
    pub cover_timeout_secs: u64,
}

/// Layout and styling of the rendered card.
#[derive(Clone, Debug, Deserialize)]
pub struct ImageConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Edge length of each square cover thumbnail.
    pub cover_size: u32,
    /// Fill color of the rounded background.
    pub background: Rgba8,
    /// Header line settings.
    pub header: HeaderSpec,
    /// Font of the first line of each row (track title).
    pub font: FontSpec,
    /// Font of the second line of each row (artist and relative time).
    pub sub_font: FontSpec,
    /// Where the PNG is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Replacement for the bundled placeholder cover.
    #[serde(default)]
    pub placeholder: Option<PathBuf>,
}

/// Header text plus its font.
#[derive(Clone, Debug, Deserialize)]
pub struct HeaderSpec {
    /// Header string, centered at the top of the card.
    #[serde(default = "default_header_text")]
    pub text: String,
    /// Font used for the header.
    #[serde(flatten)]
    pub font: FontSpec,
}

/// A font file, a pixel size and a fill color.
#[derive(Clone, Debug, Deserialize)]
pub struct FontSpec {
    /// Path to a TrueType/OpenType font file.
    pub face: PathBuf,
    /// Font size in pixels.
    pub size: f32,
    /// Text color.
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
}

/// SFTP upload settings. Upload only happens when `send` is true.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SftpConfig {
    /// Whether to upload at all.
    pub send: bool,
    /// Remote host name or address.
    pub host: String,
    /// Remote SSH port (22 when omitted).
    pub port: Option<u16>,
    /// Login user.
    pub username: String,
    /// Password; requires `sshpass` on PATH.
    pub password: Option<String>,
    /// Private key passed to `sftp -i`.
    pub identity_file: Option<PathBuf>,
    /// Destination path on the server.
    pub remote_path: String,
}

/// External optimizer invoked as `command args.. <output path>`.
#[derive(Clone, Debug, Deserialize)]
pub struct CompressorConfig {
    /// Program name or path.
    pub command: String,
    /// Extra arguments placed before the output path.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_limit() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_output() -> PathBuf {
    PathBuf::from("last_listened.png")
}

fn default_header_text() -> String {
    "Last listened tracks".to_owned()
}

fn default_text_color() -> Rgba8 {
    Rgba8::rgb(255, 255, 255)
}

impl AppConfig {
    /// Read, parse and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> LastListenedResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LastListenedError::config(format!("open config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse and validate config JSON from any reader.
    pub fn from_reader(r: impl Read) -> LastListenedResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| LastListenedError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the renderer and sinks rely on.
    pub fn validate(&self) -> LastListenedResult<()> {
        if SourceKind::from_name(&self.plugin).is_none() {
            return Err(LastListenedError::config(format!(
                "unknown plugin '{}' (expected one of: {})",
                self.plugin,
                SourceKind::names().join(", ")
            )));
        }
        if self.cover_timeout_secs == 0 {
            return Err(LastListenedError::config(
                "cover_timeout_secs must be non-zero",
            ));
        }
        self.image.validate()?;
        self.sftp.validate()?;
        if let Some(c) = &self.compressor
            && c.command.trim().is_empty()
        {
            return Err(LastListenedError::config(
                "compressor.command must be non-empty",
            ));
        }
        Ok(())
    }

    /// Settings block for the selected plugin, or `null` when absent.
    pub fn plugin_settings(&self) -> &serde_json::Value {
        static NULL: serde_json::Value = serde_json::Value::Null;
        self.plugins.get(&self.plugin).unwrap_or(&NULL)
    }

    /// Timeout applied to every outgoing HTTP request.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.cover_timeout_secs)
    }
}

impl ImageConfig {
    /// Validate canvas and font settings.
    pub fn validate(&self) -> LastListenedResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LastListenedError::config(
                "image width/height must be non-zero",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(LastListenedError::config(format!(
                "image width/height must not exceed {}",
                u16::MAX
            )));
        }
        if self.cover_size == 0 {
            return Err(LastListenedError::config("image cover_size must be non-zero"));
        }
        for (name, font) in [
            ("header", &self.header.font),
            ("font", &self.font),
            ("sub_font", &self.sub_font),
        ] {
            if !font.size.is_finite() || font.size <= 0.0 {
                return Err(LastListenedError::config(format!(
                    "image.{name}.size must be finite and > 0"
                )));
            }
        }
        Ok(())
    }
}

impl SftpConfig {
    /// Remote port, defaulting to 22.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(22)
    }

    fn validate(&self) -> LastListenedResult<()> {
        if !self.send {
            return Ok(());
        }
        for (name, value) in [
            ("host", &self.host),
            ("username", &self.username),
            ("remote_path", &self.remote_path),
        ] {
            if value.trim().is_empty() {
                return Err(LastListenedError::config(format!(
                    "sftp.{name} is required when sftp.send is true"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
