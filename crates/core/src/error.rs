use std::path::PathBuf;

/// Result alias that carries the custom [`PulseRingError`] type.
pub type Result<T> = std::result::Result<T, PulseRingError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PulseRingError {
    /// The selected, dropped or pasted item is not an image. Raised before any
    /// bytes are read.
    #[error("`{0}` is not an image file")]
    InvalidFile(String),
    /// The file could not be read from disk.
    #[error("could not read `{}`: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The bytes were read but do not decode to an image.
    #[error("image data is corrupt: {0}")]
    CorruptImage(String),
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("parameter `{name}` expects a {expected} value")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
    },
    #[error("parameter `{0}` is derived and cannot be set directly")]
    ReadOnlyParameter(&'static str),
    #[error("`{0}` is not a valid hex color")]
    InvalidColor(String),
    #[error("unknown blend mode `{0}`")]
    InvalidBlendMode(String),
    /// Malformed configuration file.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl PulseRingError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
