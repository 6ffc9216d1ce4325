use crate::{clock::FrameClock, settings::Settings, uniforms::RenderParameters, Result};

/// Drawing backend. Receives the full parameter set once per frame.
pub trait RenderStage {
    fn draw(&mut self, params: &RenderParameters) -> Result<()>;

    /// Called after the viewport changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Headless render stage that keeps track of what it was asked to draw.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frames: u64,
    last: Option<RenderParameters>,
    viewport: Option<(u32, u32)>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last(&self) -> Option<&RenderParameters> {
        self.last.as_ref()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }
}

impl RenderStage for FrameRecorder {
    fn draw(&mut self, params: &RenderParameters) -> Result<()> {
        self.frames += 1;
        self.last = Some(params.clone());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }
}

/// Per-frame driver: advance time (unless paused), then draw.
///
/// The loop only reads settings; the one parameter it writes is `time`.
#[derive(Debug)]
pub struct RenderLoop<R: RenderStage> {
    stage: R,
    clock: FrameClock,
}

impl<R: RenderStage> RenderLoop<R> {
    pub fn new(stage: R) -> Self {
        Self {
            stage,
            clock: FrameClock::new(),
        }
    }

    pub fn frame(
        &mut self,
        settings: &Settings,
        params: &mut RenderParameters,
        delta_seconds: f32,
    ) -> Result<()> {
        params.time = self.clock.tick(settings.animate(), delta_seconds);
        self.stage.draw(params)
    }

    /// Updates the resolution input and notifies the stage. Nothing else in
    /// `params` changes.
    pub fn resize(&mut self, params: &mut RenderParameters, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        params.resolution = [width as f32, height as f32];
        self.stage.resize(width, height);
        tracing::debug!(width, height, "viewport resized");
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn stage(&self) -> &R {
        &self.stage
    }
}
