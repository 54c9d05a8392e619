use std::{path::Path, time::Duration};

use anyhow::Context as _;
use image::{RgbaImage, imageops::FilterType};
use reqwest::blocking::Client;

use crate::{
    foundation::error::{LastListenedError, LastListenedResult},
    net::blocking_client,
};

/// Resampling filter used for every cover and placeholder resize.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Compiled-in default artwork.
const BUNDLED_PLACEHOLDER: &[u8] = include_bytes!("../../resources/blank.png");

/// Transport for cover art bytes.
pub trait CoverFetcher {
    /// Fetch the raw (still encoded) image behind `url`.
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Fetches covers over HTTP(S) with a bounded total timeout.
pub struct HttpCoverFetcher {
    client: Client,
}

impl HttpCoverFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> LastListenedResult<Self> {
        Ok(Self {
            client: blocking_client(timeout)?,
        })
    }
}

impl CoverFetcher for HttpCoverFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?;
        let bytes = resp.bytes().with_context(|| format!("read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}

/// Why a cover fell back to the placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// The track has no cover reference.
    NoReference,
    /// The cover could not be downloaded.
    Fetch(String),
    /// The downloaded bytes are not a decodable image.
    Decode(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NoReference => f.write_str("no cover reference"),
            FallbackReason::Fetch(e) => write!(f, "fetch failed: {e}"),
            FallbackReason::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

/// A resolved, square cover bitmap.
#[derive(Clone, Debug)]
pub enum CoverArt {
    /// The referenced artwork, resized.
    Fetched(RgbaImage),
    /// The placeholder, resized, and the reason it was used.
    Placeholder {
        /// Resized placeholder.
        image: RgbaImage,
        /// Why the real cover was not used.
        reason: FallbackReason,
    },
}

impl CoverArt {
    /// The bitmap to paste, whichever way it was obtained.
    pub fn image(&self) -> &RgbaImage {
        match self {
            CoverArt::Fetched(image) | CoverArt::Placeholder { image, .. } => image,
        }
    }

    /// Consume and return the bitmap.
    pub fn into_image(self) -> RgbaImage {
        match self {
            CoverArt::Fetched(image) | CoverArt::Placeholder { image, .. } => image,
        }
    }

    /// `Some(reason)` when the placeholder was used.
    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            CoverArt::Fetched(_) => None,
            CoverArt::Placeholder { reason, .. } => Some(reason),
        }
    }
}

/// Decode the compiled-in placeholder.
pub fn bundled_placeholder() -> LastListenedResult<RgbaImage> {
    let img = image::load_from_memory(BUNDLED_PLACEHOLDER)
        .map_err(|e| LastListenedError::render(format!("decode bundled placeholder: {e}")))?;
    Ok(img.to_rgba8())
}

/// Load the placeholder from `path`, or the bundled one when `None`.
pub fn load_placeholder(path: Option<&Path>) -> LastListenedResult<RgbaImage> {
    let Some(path) = path else {
        return bundled_placeholder();
    };
    let img = image::open(path).map_err(|e| {
        LastListenedError::render(format!("load placeholder '{}': {e}", path.display()))
    })?;
    Ok(img.to_rgba8())
}

/// Resize to `size × size` with [`RESIZE_FILTER`].
pub fn square(img: &RgbaImage, size: u32) -> RgbaImage {
    image::imageops::resize(img, size, size, RESIZE_FILTER)
}

/// Resolve one cover reference to a `size × size` bitmap. Never fails.
pub fn resolve_cover<F: CoverFetcher + ?Sized>(
    fetcher: &F,
    placeholder: &RgbaImage,
    cover_ref: &str,
    size: u32,
) -> CoverArt {
    match fetch_and_decode(fetcher, cover_ref) {
        Ok(img) => CoverArt::Fetched(square(&img, size)),
        Err(reason) => CoverArt::Placeholder {
            image: square(placeholder, size),
            reason,
        },
    }
}

fn fetch_and_decode<F: CoverFetcher + ?Sized>(
    fetcher: &F,
    cover_ref: &str,
) -> Result<RgbaImage, FallbackReason> {
    let url = cover_ref.trim();
    if url.is_empty() {
        return Err(FallbackReason::NoReference);
    }
    let bytes = fetcher
        .fetch(url)
        .map_err(|e| FallbackReason::Fetch(format!("{e:#}")))?;
    let img =
        image::load_from_memory(&bytes).map_err(|e| FallbackReason::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// [`resolve_cover`] bound to one fetcher, placeholder and size.
///
/// The resized placeholder is computed once and cloned for each fallback.
pub struct CoverResolver<F> {
    fetcher: F,
    sized_placeholder: RgbaImage,
    size: u32,
}

impl<F: CoverFetcher> CoverResolver<F> {
    /// Bind `fetcher` and `placeholder` for covers of edge length `size`.
    pub fn new(fetcher: F, placeholder: &RgbaImage, size: u32) -> Self {
        Self {
            fetcher,
            sized_placeholder: square(placeholder, size),
            size,
        }
    }

    /// Cover edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The placeholder at cover size.
    pub fn placeholder(&self) -> &RgbaImage {
        &self.sized_placeholder
    }

    /// Resolve `cover_ref`; failures degrade to the placeholder and are logged.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, cover_ref: &str) -> CoverArt {
        match fetch_and_decode(&self.fetcher, cover_ref) {
            Ok(img) => CoverArt::Fetched(square(&img, self.size)),
            Err(reason) => {
                match &reason {
                    FallbackReason::NoReference => tracing::debug!("no cover, using placeholder"),
                    other => tracing::warn!(%other, "cover unavailable, using placeholder"),
                }
                CoverArt::Placeholder {
                    image: self.sized_placeholder.clone(),
                    reason,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/cover.rs"]
mod tests;
