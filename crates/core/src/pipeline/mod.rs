//! Single owner of the parameter pipeline.
//!
//! Every mutation is followed by a synchronous [`sync_uniforms`], so the
//! render stage never sees a half-applied change.

use crate::{
    config::AppConfig,
    render::{RenderLoop, RenderStage},
    settings::{ParamName, SettingValue, Settings},
    tempo::TapTempo,
    texture::{TextureBackend, TextureManager},
    uniforms::{sync_uniforms, RenderParameters},
    upload::{ImageSource, UploadJob, UploadOutcome, UploadStatus, UploadTracker},
    Result,
};

/// Input from the UI, the window and upload workers.
#[derive(Debug)]
pub enum Event {
    SettingChanged { name: ParamName, value: SettingValue },
    Tap { timestamp_ms: f64 },
    ImageLoaded(UploadOutcome),
    Resize { width: u32, height: u32 },
    Frame { delta_seconds: f32 },
}

#[derive(Debug)]
pub struct Pipeline<B: TextureBackend, R: RenderStage> {
    settings: Settings,
    tempo: TapTempo,
    params: RenderParameters,
    textures: TextureManager<B>,
    render: RenderLoop<R>,
    uploads: UploadTracker,
}

impl<B: TextureBackend, R: RenderStage> Pipeline<B, R> {
    pub fn new(config: &AppConfig, backend: B, stage: R) -> Self {
        let mut settings = config.settings.clone();
        settings.clamp_to_ranges();

        let textures = TextureManager::new(backend);
        let resolution = [
            config.window.width.max(1) as f32,
            config.window.height.max(1) as f32,
        ];
        let params = RenderParameters::new(&settings, textures.current(), resolution);

        Self {
            settings,
            tempo: TapTempo::new(config.tempo.clone()),
            params,
            textures,
            render: RenderLoop::new(stage),
            uploads: UploadTracker::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn tempo(&self) -> &TapTempo {
        &self.tempo
    }

    pub fn textures(&self) -> &TextureManager<B> {
        &self.textures
    }

    pub fn render(&self) -> &RenderLoop<R> {
        &self.render
    }

    /// Re-reads the settings into the render parameters.
    pub fn on_settings_changed(&mut self) {
        sync_uniforms(&self.settings, &mut self.params);
    }

    pub fn set_setting(&mut self, name: ParamName, value: SettingValue) -> Result<()> {
        self.settings.set(name, value)?;
        self.on_settings_changed();
        Ok(())
    }

    /// Feeds one tap to the estimator. Returns the new BPM once two or more
    /// taps are known; otherwise the current BPM is kept.
    pub fn record_tap(&mut self, timestamp_ms: f64) -> Option<u32> {
        let bpm = self.tempo.record_tap(timestamp_ms)?;
        self.settings.set_bpm(bpm);
        self.on_settings_changed();
        Some(bpm)
    }

    /// Validates the source and hands out a job tagged with a fresh ticket.
    /// Invalid sources are rejected here, before anything is read.
    pub fn begin_upload(&mut self, source: ImageSource) -> Result<UploadJob> {
        source.validate()?;
        let job = UploadJob::new(self.uploads.issue(), source);
        tracing::debug!(
            generation = job.ticket().generation(),
            label = job.label(),
            "upload started"
        );
        Ok(job)
    }

    /// Installs a finished upload, unless a newer one already won. Failures are
    /// reported as such whatever their ticket.
    pub fn finish_upload(&mut self, outcome: UploadOutcome) -> UploadStatus {
        let UploadOutcome {
            ticket,
            label,
            result,
        } = outcome;

        match result {
            Ok(_) if self.uploads.is_stale(ticket) => {
                tracing::debug!(generation = ticket.generation(), %label, "discarding stale upload");
                UploadStatus::Superseded { label }
            }
            Ok(image) => {
                self.params.texture = self.textures.set_from_image(&image);
                self.uploads.mark_installed(ticket);
                self.settings.set_use_texture(true);
                self.on_settings_changed();
                tracing::info!(%label, width = image.width(), height = image.height(), "image loaded");
                UploadStatus::Loaded {
                    label,
                    width: image.width(),
                    height: image.height(),
                }
            }
            Err(error) => {
                tracing::warn!(%label, %error, "image upload failed");
                UploadStatus::Failed { label, error }
            }
        }
    }

    /// Runs a whole upload in place, reporting progress through `on_status`.
    pub fn load_image<F>(&mut self, source: ImageSource, mut on_status: F) -> UploadStatus
    where
        F: FnMut(&UploadStatus),
    {
        let label = source.label();
        let job = match self.begin_upload(source) {
            Ok(job) => job,
            Err(error) => {
                tracing::warn!(%label, %error, "rejected upload");
                let status = UploadStatus::Failed { label, error };
                on_status(&status);
                return status;
            }
        };

        on_status(&UploadStatus::Loading { label });
        let status = self.finish_upload(job.run());
        on_status(&status);
        status
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render.resize(&mut self.params, width, height);
    }

    pub fn frame(&mut self, delta_seconds: f32) -> Result<()> {
        self.render
            .frame(&self.settings, &mut self.params, delta_seconds)
    }

    /// Dispatches one event. Image events yield the resulting upload status.
    pub fn handle(&mut self, event: Event) -> Result<Option<UploadStatus>> {
        match event {
            Event::SettingChanged { name, value } => self.set_setting(name, value)?,
            Event::Tap { timestamp_ms } => {
                self.record_tap(timestamp_ms);
            }
            Event::ImageLoaded(outcome) => return Ok(Some(self.finish_upload(outcome))),
            Event::Resize { width, height } => self.resize(width, height),
            Event::Frame { delta_seconds } => self.frame(delta_seconds)?,
        }
        Ok(None)
    }
}
