use std::path::PathBuf;

/// All errors produced by the blob engine.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A shape parameter is outside its accepted range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A CSS-style color string could not be parsed.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// A preset file failed to (de)serialize.
    #[error("preset error: {0}")]
    Preset(#[from] serde_json::Error),

    /// Filesystem failure, with the path involved.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raster encoding failed.
    #[error("image encode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Rendering could not proceed (pixmap allocation, degenerate geometry).
    #[error("render failed: {0}")]
    Render(String),

    /// Unknown export format name.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, BlobError>;

/// Shorthand constructors.
impl BlobError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
