use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::animation::ease::Ease;
use crate::foundation::core::Canvas;
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::scene::color::Color;
use crate::scene::model::{Route, Scene};

pub use crate::encode::ffmpeg::{Quality, VideoFormat};

/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 120;

/// Output parameters, fixed for the lifetime of one job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    /// Output width in pixels; must be even.
    pub width: u32,
    /// Output height in pixels; must be even.
    pub height: u32,
    /// Frames per second, `1..=120`.
    pub fps: u32,
    /// Canvas color under the background image.
    #[serde(default = "default_background_color")]
    pub background_color: Color,
    /// Output container.
    #[serde(default)]
    pub format: VideoFormat,
    /// Encoder quality preset.
    #[serde(default)]
    pub quality: Quality,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            background_color: default_background_color(),
            format: VideoFormat::default(),
            quality: Quality::default(),
        }
    }
}

impl VideoSettings {
    /// Reject settings the encoder cannot honor.
    pub fn validate(&self) -> PathreelResult<()> {
        Canvas::new(self.width, self.height)?;
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(PathreelError::validation(format!(
                "width/height must be even (got {}x{})",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(PathreelError::validation(format!(
                "fps must be in 1..={MAX_FPS} (got {})",
                self.fps
            )));
        }
        Ok(())
    }

    /// Output canvas.
    pub fn canvas(&self) -> PathreelResult<Canvas> {
        Canvas::new(self.width, self.height)
    }
}

fn default_background_color() -> Color {
    Color::rgb(0, 0, 0)
}

/// Where the background image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundSource {
    /// Encoded image bytes.
    Bytes(Arc<Vec<u8>>),
    /// Image file on local disk.
    Path(PathBuf),
}

impl BackgroundSource {
    /// Load the encoded bytes.
    pub fn load(&self) -> PathreelResult<Arc<Vec<u8>>> {
        match self {
            Self::Bytes(b) => Ok(b.clone()),
            Self::Path(p) => {
                use anyhow::Context as _;
                let bytes = std::fs::read(p)
                    .with_context(|| format!("read background image '{}'", p.display()))?;
                Ok(Arc::new(bytes))
            }
        }
    }
}

impl From<Vec<u8>> for BackgroundSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::new(bytes))
    }
}

impl From<PathBuf> for BackgroundSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Everything needed to start an export.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Route snapshot.
    pub routes: Vec<Route>,
    /// Output parameters.
    pub settings: VideoSettings,
    /// Timeline length.
    pub total_duration_ms: u64,
    /// Global easing.
    pub easing: Ease,
    /// Background image reference.
    pub background: Option<BackgroundSource>,
}

impl ExportRequest {
    /// Request with linear easing.
    pub fn new(
        routes: Vec<Route>,
        settings: VideoSettings,
        total_duration_ms: u64,
        background: Option<BackgroundSource>,
    ) -> Self {
        Self {
            routes,
            settings,
            total_duration_ms,
            easing: Ease::Linear,
            background,
        }
    }

    /// Same request with another global easing.
    pub fn with_easing(mut self, easing: Ease) -> Self {
        self.easing = easing;
        self
    }

    /// Build a request from a scene snapshot.
    pub fn from_scene(
        scene: &Scene,
        settings: VideoSettings,
        background: Option<BackgroundSource>,
    ) -> Self {
        Self {
            routes: scene.routes.clone(),
            settings,
            total_duration_ms: scene.total_duration_ms,
            easing: scene.easing,
            background,
        }
    }

    /// Scene snapshot the renderer consumes.
    pub fn scene(&self) -> Scene {
        Scene::new(self.routes.clone(), self.total_duration_ms, self.easing)
    }

    /// Synchronous submit-time checks.
    pub fn validate(&self) -> PathreelResult<()> {
        if !self.routes.iter().any(Route::is_drawable) {
            return Err(PathreelError::validation(
                "no visible routes with at least two waypoints to export",
            ));
        }
        if self.background.is_none() {
            return Err(PathreelError::validation("background image is required"));
        }
        if self.total_duration_ms == 0 {
            return Err(PathreelError::validation(
                "total duration must be greater than zero",
            ));
        }
        self.settings.validate()?;
        self.scene().validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/settings.rs"]
mod tests;
