/// Convenience result type used across lastlistened.
pub type LastListenedResult<T> = Result<T, LastListenedError>;

/// Top-level error taxonomy.
///
/// Cover-art failures never surface here: the resolver degrades to the placeholder and
/// reports why through [`crate::FallbackReason`] instead.
#[derive(thiserror::Error, Debug)]
pub enum LastListenedError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The track source could not be reached, authenticated or parsed.
    #[error("track source unavailable: {0}")]
    SourceUnavailable(String),

    /// The image could not be composed or written (bad font, unwritable output, ...).
    #[error("render error: {0}")]
    Render(String),

    /// Uploading the finished image failed. The local file is left in place.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LastListenedError {
    /// Build a [`LastListenedError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LastListenedError::SourceUnavailable`] value.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Build a [`LastListenedError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LastListenedError::Transfer`] value.
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
