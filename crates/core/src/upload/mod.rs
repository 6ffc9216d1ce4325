//! Image upload jobs: validate, read, decode.
//!
//! A job owns its input and needs no access to the pipeline, so the two slow
//! steps (file read, then decode) can run wherever the caller likes. Each job
//! carries an [`UploadTicket`]; the pipeline uses the ticket generation to
//! drop results that arrive after a newer image has already been installed.

use std::{fmt, fs, path::PathBuf};

use crate::{texture::DecodedImage, PulseRingError, Result};

/// File extensions the decoder is built to handle.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Where an uploaded image comes from: a picked or dropped file, or bytes
/// pasted from the clipboard together with their media type.
#[derive(Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Memory {
        name: String,
        media_type: String,
        bytes: Vec<u8>,
    },
}

impl ImageSource {
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    /// Rejects anything that is not an image type before any bytes are read.
    pub fn validate(&self) -> Result<()> {
        let is_image = match self {
            Self::Path(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    IMAGE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false),
            Self::Memory { media_type, .. } => media_type
                .trim()
                .to_ascii_lowercase()
                .starts_with("image/"),
        };

        if is_image {
            Ok(())
        } else {
            Err(PulseRingError::InvalidFile(self.label()))
        }
    }

    fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => {
                fs::read(&path).map_err(|source| PulseRingError::UnreadableFile { path, source })
            }
            Self::Memory { bytes, .. } => Ok(bytes),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Memory {
                name,
                media_type,
                bytes,
            } => f
                .debug_struct("Memory")
                .field("name", name)
                .field("media_type", media_type)
                .field("bytes", &bytes.len())
                .finish(),
        }
    }
}

/// Monotonic upload generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadTicket(u64);

impl UploadTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Issues tickets and remembers the newest one whose image was installed.
#[derive(Debug, Default)]
pub struct UploadTracker {
    issued: u64,
    installed: Option<UploadTicket>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> UploadTicket {
        self.issued += 1;
        UploadTicket(self.issued)
    }

    /// A result is stale once a newer upload has been installed.
    pub fn is_stale(&self, ticket: UploadTicket) -> bool {
        self.installed.is_some_and(|installed| ticket < installed)
    }

    pub fn mark_installed(&mut self, ticket: UploadTicket) {
        self.installed = Some(self.installed.map_or(ticket, |current| current.max(ticket)));
    }

    pub fn installed(&self) -> Option<UploadTicket> {
        self.installed
    }
}

/// A validated upload waiting to be read and decoded.
#[derive(Debug)]
pub struct UploadJob {
    ticket: UploadTicket,
    label: String,
    source: ImageSource,
}

impl UploadJob {
    pub(crate) fn new(ticket: UploadTicket, source: ImageSource) -> Self {
        Self {
            ticket,
            label: source.label(),
            source,
        }
    }

    pub fn ticket(&self) -> UploadTicket {
        self.ticket
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Reads the bytes, then decodes them. Both failures are captured in the
    /// outcome rather than returned.
    pub fn run(self) -> UploadOutcome {
        let result = self
            .source
            .into_bytes()
            .and_then(|bytes| DecodedImage::decode(&bytes));
        UploadOutcome {
            ticket: self.ticket,
            label: self.label,
            result,
        }
    }
}

/// Finished read + decode, ready to be handed back to the pipeline.
#[derive(Debug)]
pub struct UploadOutcome {
    pub ticket: UploadTicket,
    pub label: String,
    pub result: Result<DecodedImage>,
}

/// User-facing progress of an upload.
#[derive(Debug)]
pub enum UploadStatus {
    Loading {
        label: String,
    },
    Loaded {
        label: String,
        width: u32,
        height: u32,
    },
    Failed {
        label: String,
        error: PulseRingError,
    },
    /// Decoded fine, but a newer image was installed first.
    Superseded {
        label: String,
    },
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading { .. })
    }

    pub fn error(&self) -> Option<&PulseRingError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { label } => write!(f, "Loading {label}..."),
            Self::Loaded {
                label,
                width,
                height,
            } => write!(f, "Loaded {label} ({width}x{height})"),
            Self::Superseded { label } => {
                write!(f, "Skipped {label}: a newer image is already showing")
            }
            Self::Failed { label, error } => match error {
                PulseRingError::InvalidFile(_) => write!(
                    f,
                    "{label} is not an image. Use a PNG, JPEG, GIF, BMP or WebP file."
                ),
                PulseRingError::UnreadableFile { .. } => {
                    write!(f, "Could not read {label}. Try selecting it again.")
                }
                PulseRingError::CorruptImage(_) => {
                    write!(f, "{label} could not be decoded. The image looks corrupt.")
                }
                other => write!(f, "Could not load {label}: {other}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn validates_by_extension_and_media_type() {
        assert!(ImageSource::Path("photo.JPG".into()).validate().is_ok());
        assert!(ImageSource::Path("dir/pic.webp".into()).validate().is_ok());

        let err = ImageSource::Path("notes.txt".into()).validate().unwrap_err();
        assert!(matches!(err, PulseRingError::InvalidFile(ref name) if name == "notes.txt"));
        assert!(ImageSource::Path("no_extension".into()).validate().is_err());

        let pasted = ImageSource::Memory {
            name: "clipboard".into(),
            media_type: "image/png".into(),
            bytes: Vec::new(),
        };
        assert!(pasted.validate().is_ok());

        let text = ImageSource::Memory {
            name: "clipboard".into(),
            media_type: "text/plain".into(),
            bytes: b"hello".to_vec(),
        };
        assert!(text.validate().is_err());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let path = Path::new("definitely/missing/image.png").to_path_buf();
        let job = UploadJob::new(UploadTracker::new().issue(), ImageSource::Path(path));
        let outcome = job.run();
        assert!(matches!(
            outcome.result,
            Err(PulseRingError::UnreadableFile { .. })
        ));
        assert_eq!(outcome.label, "image.png");
    }

    #[test]
    fn tickets_increase_and_staleness_follows_installs() {
        let mut tracker = UploadTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(second > first);

        assert!(!tracker.is_stale(first));
        tracker.mark_installed(second);
        assert!(tracker.is_stale(first));
        assert!(!tracker.is_stale(second));

        tracker.mark_installed(first);
        assert_eq!(tracker.installed(), Some(second));
    }

    #[test]
    fn statuses_have_readable_messages() {
        let failed = UploadStatus::Failed {
            label: "cat.png".into(),
            error: PulseRingError::CorruptImage("bad header".into()),
        };
        assert!(failed.to_string().contains("corrupt"));
        assert!(failed.is_terminal());
        assert!(!UploadStatus::Loading {
            label: "cat.png".into()
        }
        .is_terminal());
    }
}
