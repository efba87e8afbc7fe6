//! Turning a scene snapshot into pixels.
//!
//! [`timing`] resolves which routes draw and how far, [`path`] cuts each polyline at its local
//! progress, [`cpu`] rasterizes a frame and [`frames`] drives the export frame sequence.

pub mod background;
pub mod cpu;
pub mod frames;
pub mod path;
pub mod timing;

/// Period of the tip indicator pulse.
pub const PULSE_PERIOD_MS: f64 = 1000.0;

/// One rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

/// Per-render switches that are not part of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Draw waypoint markers. Editing aid only; export frames never show them.
    pub show_markers: bool,
    /// Tip pulse phase in `[0, 1)`.
    pub pulse_phase: f64,
}

impl RenderOptions {
    /// Options used for export frames.
    pub fn export() -> Self {
        Self {
            show_markers: false,
            pulse_phase: 0.0,
        }
    }

    /// Options used for interactive previews.
    pub fn preview() -> Self {
        Self {
            show_markers: true,
            pulse_phase: 0.0,
        }
    }

    /// Same options with the pulse phase taken from `time_ms`.
    pub fn at_time(self, time_ms: f64) -> Self {
        let phase = if time_ms.is_finite() {
            (time_ms / PULSE_PERIOD_MS).rem_euclid(1.0)
        } else {
            0.0
        };
        Self {
            pulse_phase: phase,
            ..self
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::export()
    }
}
