/// Convenience result type used across the crate.
pub type KaraokeResult<T> = Result<T, KaraokeError>;

/// Top-level error taxonomy used by the rendering core.
#[derive(thiserror::Error, Debug)]
pub enum KaraokeError {
    /// Missing or unreadable audio, malformed lyric segments, invalid configuration.
    #[error("input error: {0}")]
    Input(String),

    /// Font lookup or text layout failures.
    #[error("render error: {0}")]
    Render(String),

    /// An external encode process failed. The message carries the process diagnostic.
    #[error("encode error: {0}")]
    Encode(String),

    /// Working directory or temporary artifact management failed.
    #[error("resource error: {0}")]
    Resource(String),

    /// The job was cancelled between phases.
    #[error("job cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KaraokeError {
    /// Build a [`KaraokeError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`KaraokeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`KaraokeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`KaraokeError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`KaraokeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Short, stable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Render(_) => "render",
            Self::Encode(_) => "encode",
            Self::Resource(_) => "resource",
            Self::Cancelled => "cancelled",
            Self::Serde(_) => "serde",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
