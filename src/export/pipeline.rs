//! Tier runners: each turns an export request into one persisted artifact.
//!
//! Progress milestones, in percent:
//!
//! | tier          | setup | background | frames   | encode   | done |
//! |---------------|-------|------------|----------|----------|------|
//! | raster-encode | 5     | 10         | 10..=80  | 80..=95  | 100  |
//! | still-frame   | 5     | 10         | 90       |          | 100  |
//! | manifest      | 5     |            |          | 90       | 100  |
//!
//! The final 100 is committed by the orchestrator together with the artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::animation::ease::Ease;
use crate::config::ExportConfig;
use crate::encode::ffmpeg::{EncodeJob, ensure_parent_dir, run_encoder};
use crate::encode::sink::PngSequenceSink;
use crate::export::capabilities::Capabilities;
use crate::export::job::{Artifact, ArtifactKind, JobId};
use crate::export::settings::{ExportRequest, VideoSettings};
use crate::export::tier::Tier;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::RenderOptions;
use crate::render::background::BackgroundImage;
use crate::render::cpu::FrameRasterizer;
use crate::render::frames::{FramePlan, FrameProducer, render_to_sink};
use crate::scene::model::Route;

pub const PROGRESS_SETUP: u8 = 5;
pub const PROGRESS_BACKGROUND: u8 = 10;
pub const PROGRESS_FRAMES_DONE: u8 = 80;
pub const PROGRESS_ENCODED: u8 = 95;
pub const PROGRESS_WRITTEN: u8 = 90;

/// Manifest format identifier.
pub const MANIFEST_KIND: &str = "pathreel-manifest";
pub const MANIFEST_VERSION: u32 = 1;

/// Progress sink shared with blocking render workers.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Everything a tier needs to run one job.
#[derive(Clone)]
pub struct TierInput {
    pub job_id: JobId,
    pub request: Arc<ExportRequest>,
    pub config: Arc<ExportConfig>,
    pub caps: Arc<Capabilities>,
    pub cancel: CancelToken,
    pub progress: ProgressFn,
}

impl TierInput {
    fn report(&self, percent: u8) {
        (self.progress)(percent);
    }

    /// `output_dir/<job id>.<ext>`.
    pub fn output_path(&self, kind: ArtifactKind) -> PathBuf {
        artifact_path(&self.config.output_dir, self.job_id, kind)
    }

    fn frame_dir(&self) -> PathBuf {
        self.config.work_dir.join(self.job_id.to_string())
    }
}

/// Where a job's artifact of `kind` lives.
pub fn artifact_path(output_dir: &Path, job_id: JobId, kind: ArtifactKind) -> PathBuf {
    output_dir.join(format!("{job_id}.{}", kind.extension()))
}

/// Run `tier` to completion. A failed tier is not retried with another one.
#[tracing::instrument(skip(input), fields(job = %input.job_id))]
pub async fn run_tier(tier: Tier, input: &TierInput) -> PathreelResult<Artifact> {
    if !tier.is_supported(&input.caps) {
        return Err(PathreelError::capability(format!(
            "tier {tier} is not available in this process"
        )));
    }
    input.cancel.check()?;
    input.report(PROGRESS_SETUP);
    match tier {
        Tier::RasterEncode => raster_encode(input).await,
        Tier::StillFrame => still_frame(input).await,
        Tier::Manifest => manifest(input).await,
    }
}

/// Map `done` of `total` frames onto the frame-generation progress span.
pub fn frame_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return PROGRESS_FRAMES_DONE;
    }
    let span = u64::from(PROGRESS_FRAMES_DONE - PROGRESS_BACKGROUND);
    let pct = u64::from(PROGRESS_BACKGROUND) + span * done.min(total) / total;
    pct as u8
}

fn prepare_rasterizer(request: &ExportRequest) -> PathreelResult<FrameRasterizer> {
    let source = request
        .background
        .as_ref()
        .ok_or_else(|| PathreelError::validation("background image is required"))?;
    let bytes = source.load()?;
    let background = BackgroundImage::decode(&bytes)?;
    FrameRasterizer::new(
        &request.scene(),
        request.settings.canvas()?,
        request.settings.background_color.rgba8(),
        Some(&background),
    )
}

async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> PathreelResult<T> + Send + 'static,
) -> PathreelResult<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PathreelError::render(format!("render task failed: {e}")))?
}

async fn raster_encode(input: &TierInput) -> PathreelResult<Artifact> {
    let program = input
        .caps
        .encoder
        .clone()
        .ok_or_else(|| PathreelError::capability("no encoder available"))?;
    let kind = ArtifactKind::from(input.request.settings.format);
    let out_path = input.output_path(kind);

    let worker = input.clone();
    let mut sink = blocking(move || render_frames(&worker)).await?;

    let encoded = async {
        input.cancel.check()?;
        input.report(PROGRESS_FRAMES_DONE);
        let settings = &input.request.settings;
        let job = EncodeJob {
            program,
            frame_pattern: sink.pattern(),
            fps: settings.fps,
            format: settings.format,
            quality: settings.quality,
            out_path: out_path.clone(),
            timeout: input.config.encoder_timeout(),
        };
        tracing::info!(frames = sink.written().len(), "encoding");
        run_encoder(&job, &input.cancel).await
    }
    .await;

    let failures = sink.remove_files();
    if failures > 0 {
        tracing::warn!(failures, "temp frames left behind");
    }
    if encoded.is_err() {
        remove_partial(&out_path);
    }
    encoded?;

    input.report(PROGRESS_ENCODED);
    Ok(Artifact {
        path: out_path,
        kind,
    })
}

fn render_frames(input: &TierInput) -> PathreelResult<PngSequenceSink> {
    let rasterizer = prepare_rasterizer(&input.request)?;
    input.cancel.check()?;
    input.report(PROGRESS_BACKGROUND);

    let settings = &input.request.settings;
    let plan = FramePlan::new(settings.fps, input.request.total_duration_ms)?;
    tracing::info!(frames = plan.frame_count(), fps = plan.fps(), "rendering frames");

    let mut sink = PngSequenceSink::new(input.frame_dir(), rasterizer.background_color());
    let rendered = FrameProducer::new(
        &rasterizer,
        plan,
        RenderOptions::export(),
        &input.config.threading(),
    )
    .and_then(|producer| {
        render_to_sink(producer, &mut sink, &input.cancel, |done, total| {
            input.report(frame_percent(done, total));
        })
    });
    match rendered {
        Ok(_) => Ok(sink),
        Err(e) => {
            sink.remove_files();
            Err(e)
        }
    }
}

async fn still_frame(input: &TierInput) -> PathreelResult<Artifact> {
    let out_path = input.output_path(ArtifactKind::Png);
    let worker = input.clone();
    let path = out_path.clone();
    blocking(move || {
        let rasterizer = prepare_rasterizer(&worker.request)?;
        worker.cancel.check()?;
        worker.report(PROGRESS_BACKGROUND);
        let png = rasterizer.render_preview_png(None, RenderOptions::export())?;
        worker.cancel.check()?;
        write_artifact(&path, &png)
    })
    .await?;
    input.report(PROGRESS_WRITTEN);
    Ok(Artifact {
        path: out_path,
        kind: ArtifactKind::Png,
    })
}

async fn manifest(input: &TierInput) -> PathreelResult<Artifact> {
    let out_path = input.output_path(ArtifactKind::Manifest);
    let doc = Manifest::new(&input.request, manifest_reason(&input.caps));
    let json = serde_json::to_vec_pretty(&doc)?;
    let path = out_path.clone();
    blocking(move || write_artifact(&path, &json)).await?;
    input.report(PROGRESS_WRITTEN);
    Ok(Artifact {
        path: out_path,
        kind: ArtifactKind::Manifest,
    })
}

fn write_artifact(path: &Path, bytes: &[u8]) -> PathreelResult<()> {
    use anyhow::Context as _;
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("write artifact '{}'", path.display()))?;
    Ok(())
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to delete partial output");
    }
}

/// Why the manifest tier was chosen.
pub fn manifest_reason(caps: &Capabilities) -> String {
    match (caps.rasterizer, caps.encoder.as_deref()) {
        (false, _) => "rasterizer unavailable".to_string(),
        (true, None) => "encoder unavailable".to_string(),
        (true, Some(_)) => "manifest export requested".to_string(),
    }
}

/// Structured description of an animation, written when nothing can be rendered.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<'a> {
    pub kind: &'static str,
    pub version: u32,
    pub settings: &'a VideoSettings,
    pub total_duration_ms: u64,
    pub easing: Ease,
    pub routes: &'a [Route],
    pub reason: String,
}

impl<'a> Manifest<'a> {
    pub fn new(request: &'a ExportRequest, reason: impl Into<String>) -> Self {
        Self {
            kind: MANIFEST_KIND,
            version: MANIFEST_VERSION,
            settings: &request.settings,
            total_duration_ms: request.total_duration_ms,
            easing: request.easing,
            routes: &request.routes,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
