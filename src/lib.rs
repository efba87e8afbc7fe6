//! Pathreel animates routes drawn over a background image and exports the animation.
//!
//! - Describe routes and timing as a [`Scene`]
//! - Preview frames with a [`FrameRasterizer`] or drive playback with a [`Player`]
//! - Export through an [`ExportOrchestrator`], which falls back from video to a still frame to
//!   a JSON manifest depending on the probed [`Capabilities`]
#![forbid(unsafe_code)]

/// Easing curves.
pub mod animation;
/// Process configuration.
pub mod config;
/// Frame sinks and the external video encoder.
pub mod encode;
/// Export jobs and their orchestration.
pub mod export;
mod foundation;
/// Route timing, path tracing and rasterization.
pub mod render;
/// Routes, styles and scene snapshots.
pub mod scene;
/// Playback state machine.
pub mod timeline;

pub use crate::foundation::cancel::{CancelHandle, CancelToken, cancel_pair};
pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Affine, BezPath, Canvas, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{PathreelError, PathreelResult};

pub use crate::animation::ease::Ease;
pub use crate::config::{AppConfig, ExportConfig, LoggingConfig};
pub use crate::encode::ffmpeg::{Quality, VideoFormat};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::export::capabilities::Capabilities;
pub use crate::export::job::{Artifact, ArtifactKind, FetchedArtifact, JobId, JobSnapshot, JobStatus};
pub use crate::export::orchestrator::ExportOrchestrator;
pub use crate::export::settings::{BackgroundSource, ExportRequest, VideoSettings};
pub use crate::export::tier::Tier;
pub use crate::render::background::BackgroundImage;
pub use crate::render::cpu::FrameRasterizer;
pub use crate::render::frames::{FramePlan, FrameProducer, RenderThreading};
pub use crate::render::{FrameRGBA, RenderOptions};
pub use crate::scene::color::Color;
pub use crate::scene::model::{Route, RouteAnimation, RouteStyle, Scene, Waypoint};
pub use crate::timeline::{PlaybackState, Timeline};
pub use crate::timeline::player::{FrameRequest, Player, TickToken};
