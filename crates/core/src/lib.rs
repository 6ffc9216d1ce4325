//! Core library for the Pulse Ring visualiser.
//!
//! The crate owns everything between the control panel and the shader: the
//! settings store, tap-tempo estimation, projection of settings onto render
//! parameters, the texture lifecycle for user images and the per-frame clock.
//! Drawing and texture allocation sit behind the [`RenderStage`] and
//! [`TextureBackend`] traits so the pipeline runs headless as well.

pub mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod tempo;
pub mod texture;
pub mod uniforms;
pub mod upload;

pub use clock::{ClockState, FrameClock};
pub use config::{AppConfig, WindowConfig};
pub use error::{PulseRingError, Result};
pub use pipeline::{Event, Pipeline};
pub use render::{FrameRecorder, RenderLoop, RenderStage};
pub use settings::{BlendMode, ParamName, Rgb, SettingValue, Settings};
pub use tempo::{TapTempo, TempoConfig};
pub use texture::{DecodedImage, HeadlessTextures, TextureBackend, TextureHandle, TextureManager};
pub use uniforms::{sync_uniforms, RenderParameters};
pub use upload::{ImageSource, UploadJob, UploadOutcome, UploadStatus, UploadTicket};
