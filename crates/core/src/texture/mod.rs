//! Ownership of the single image resource sampled by the render stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PulseRingError, Result};

/// Tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(PulseRingError::CorruptImage(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// The 1x1 opaque black image shown before any upload.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        }
    }

    /// Decodes any supported container format into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| PulseRingError::CorruptImage(err.to_string()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba8(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Copyable reference to a backend texture. Carries no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

/// GPU-side texture allocation.
pub trait TextureBackend {
    fn create(&mut self, image: &DecodedImage) -> TextureHandle;
    fn release(&mut self, handle: TextureHandle);
}

/// In-memory backend for headless runs and tests. Tracks which handles are
/// still alive so leaks and double releases are observable.
#[derive(Debug, Default)]
pub struct HeadlessTextures {
    next_id: u64,
    live: BTreeMap<u64, TextureHandle>,
    released: Vec<u64>,
}

impl HeadlessTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: TextureHandle) -> bool {
        self.live.contains_key(&handle.id)
    }

    /// Ids in the order they were released.
    pub fn released(&self) -> &[u64] {
        &self.released
    }
}

impl TextureBackend for HeadlessTextures {
    fn create(&mut self, image: &DecodedImage) -> TextureHandle {
        self.next_id += 1;
        let handle = TextureHandle {
            id: self.next_id,
            width: image.width(),
            height: image.height(),
        };
        self.live.insert(handle.id, handle);
        handle
    }

    fn release(&mut self, handle: TextureHandle) {
        if self.live.remove(&handle.id).is_some() {
            self.released.push(handle.id);
        } else {
            tracing::warn!(id = handle.id, "release of unknown texture");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Placeholder,
    UserImage,
}

/// Holds exactly one live texture. Installing a new one releases the old one
/// in the same call; dropping the manager releases the last one.
#[derive(Debug)]
pub struct TextureManager<B: TextureBackend> {
    backend: B,
    current: TextureHandle,
    state: TextureState,
}

impl<B: TextureBackend> TextureManager<B> {
    pub fn new(mut backend: B) -> Self {
        let current = backend.create(&DecodedImage::placeholder());
        Self {
            backend,
            current,
            state: TextureState::Placeholder,
        }
    }

    /// Uploads `image` and makes it current. Never returns to the placeholder.
    pub fn set_from_image(&mut self, image: &DecodedImage) -> TextureHandle {
        let next = self.backend.create(image);
        let previous = std::mem::replace(&mut self.current, next);
        self.backend.release(previous);
        self.state = TextureState::UserImage;
        tracing::debug!(
            released = previous.id,
            installed = next.id,
            width = next.width,
            height = next.height,
            "texture swapped"
        );
        next
    }

    pub fn current(&self) -> TextureHandle {
        self.current
    }

    pub fn state(&self) -> TextureState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: TextureBackend> Drop for TextureManager<B> {
    fn drop(&mut self) {
        self.backend.release(self.current);
    }
}
