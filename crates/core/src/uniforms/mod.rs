use serde::Serialize;

use crate::{settings::Settings, texture::TextureHandle};

/// Inputs consumed by the render stage once per frame.
///
/// Settings-derived fields are only ever written by [`sync_uniforms`]. `time`
/// belongs to the frame clock, `resolution` to resize handling, and `texture`
/// to the texture manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderParameters {
    pub time: f32,
    pub resolution: [f32; 2],
    pub texture: TextureHandle,
    pub bpm: f32,
    pub pulse_strength: f32,
    pub ring_radius: f32,
    pub ring_softness: f32,
    /// Linear RGB.
    pub color_a: [f32; 3],
    /// Linear RGB.
    pub color_b: [f32; 3],
    pub blend_mode: i32,
    pub noise_amount: f32,
    pub vignette_amount: f32,
    pub animate: f32,
    pub use_texture: f32,
    pub distortion_amount: f32,
    pub ripple_speed: f32,
    pub chromatic_aberration: f32,
    pub show_ring: f32,
}

impl RenderParameters {
    /// Builds a fully synced parameter set.
    pub fn new(settings: &Settings, texture: TextureHandle, resolution: [f32; 2]) -> Self {
        let mut params = Self {
            time: 0.0,
            resolution,
            texture,
            bpm: 0.0,
            pulse_strength: 0.0,
            ring_radius: 0.0,
            ring_softness: 0.0,
            color_a: [0.0; 3],
            color_b: [0.0; 3],
            blend_mode: 0,
            noise_amount: 0.0,
            vignette_amount: 0.0,
            animate: 0.0,
            use_texture: 0.0,
            distortion_amount: 0.0,
            ripple_speed: 0.0,
            chromatic_aberration: 0.0,
            show_ring: 0.0,
        };
        sync_uniforms(settings, &mut params);
        params
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Projects every setting onto the render inputs. Idempotent; leaves `time`,
/// `resolution` and `texture` untouched.
pub fn sync_uniforms(settings: &Settings, params: &mut RenderParameters) {
    params.bpm = settings.bpm() as f32;
    params.pulse_strength = settings.pulse_strength();
    params.ring_radius = settings.ring_radius();
    params.ring_softness = settings.ring_softness();
    params.color_a = settings.color_a().to_linear();
    params.color_b = settings.color_b().to_linear();
    params.blend_mode = settings.blend_mode_index();
    params.noise_amount = settings.noise_amount();
    params.vignette_amount = settings.vignette_amount();
    params.animate = flag(settings.animate());
    params.use_texture = flag(settings.use_texture());
    params.distortion_amount = settings.distortion_amount();
    params.ripple_speed = settings.ripple_speed();
    params.chromatic_aberration = settings.chromatic_aberration();
    params.show_ring = flag(settings.show_ring());
}
