use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{PathreelError, PathreelResult};

/// Output container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// H.264 in MP4.
    #[default]
    Mp4,
    /// VP9 in WebM.
    Webm,
}

/// Encoder quality preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Smallest files.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Best looking.
    High,
}

impl VideoFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// MIME type of the container.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    /// Codec arguments for `quality`.
    pub fn codec_args(self, quality: Quality) -> Vec<String> {
        let crf = quality.crf(self).to_string();
        match self {
            Self::Mp4 => vec![
                "-c:v".into(),
                "libx264".into(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                "-crf".into(),
                crf,
                "-movflags".into(),
                "+faststart".into(),
            ],
            Self::Webm => vec![
                "-c:v".into(),
                "libvpx-vp9".into(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                "-crf".into(),
                crf,
                "-b:v".into(),
                "0".into(),
            ],
        }
    }
}

impl Quality {
    /// Constant rate factor for `format`.
    pub fn crf(self, format: VideoFormat) -> u8 {
        match (format, self) {
            (VideoFormat::Mp4, Self::Low) => 28,
            (VideoFormat::Mp4, Self::Medium) => 23,
            (VideoFormat::Mp4, Self::High) => 18,
            (VideoFormat::Webm, Self::Low) => 40,
            (VideoFormat::Webm, Self::Medium) => 32,
            (VideoFormat::Webm, Self::High) => 24,
        }
    }
}

/// One encoder run over a numbered PNG sequence.
#[derive(Clone, Debug)]
pub struct EncodeJob {
    /// Encoder executable, normally `ffmpeg`.
    pub program: String,
    /// Input pattern such as `dir/frame_%06d.png`.
    pub frame_pattern: PathBuf,
    /// Input and output frame rate.
    pub fps: u32,
    /// Output container.
    pub format: VideoFormat,
    /// Quality preset.
    pub quality: Quality,
    /// Output file.
    pub out_path: PathBuf,
    /// Wall-clock limit for the whole run.
    pub timeout: Duration,
}

impl EncodeJob {
    /// Check the parameters before spawning anything.
    pub fn validate(&self) -> PathreelResult<()> {
        if self.fps == 0 {
            return Err(PathreelError::validation("encode fps must be non-zero"));
        }
        if self.program.trim().is_empty() {
            return Err(PathreelError::validation("encoder program must be set"));
        }
        if self.timeout.is_zero() {
            return Err(PathreelError::validation("encoder timeout must be non-zero"));
        }
        Ok(())
    }

    /// Full argument list passed to the encoder.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-y",
            "-loglevel",
            "error",
            "-framerate",
            &self.fps.to_string(),
            "-start_number",
            "0",
            "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(self.frame_pattern.clone().into_os_string());
        args.push("-an".into());
        args.extend(
            self.format
                .codec_args(self.quality)
                .into_iter()
                .map(OsString::from),
        );
        args.push(self.out_path.clone().into_os_string());
        args
    }
}

/// Return `true` when `program -version` runs successfully.
pub fn is_encoder_available(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> PathreelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Run the encoder to completion.
///
/// The child is killed if `cancel` fires, the timeout elapses, or the returned future is dropped.
#[tracing::instrument(skip_all, fields(program = %job.program, out = %job.out_path.display()))]
pub async fn run_encoder(job: &EncodeJob, cancel: &CancelToken) -> PathreelResult<()> {
    job.validate()?;
    ensure_parent_dir(&job.out_path)?;

    let mut cmd = tokio::process::Command::new(&job.program);
    cmd.args(job.args())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        PathreelError::encoding(format!(
            "failed to spawn {} (is it installed and on PATH?): {e}",
            job.program
        ))
    })?;
    tracing::debug!("encoder started");

    tokio::select! {
        res = child.wait_with_output() => {
            let output = res.map_err(|e| {
                PathreelError::encoding(format!("failed to wait for {} to finish: {e}", job.program))
            })?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(PathreelError::encoding(format!(
                    "{} exited with status {}: {}",
                    job.program,
                    output.status,
                    stderr.trim()
                )));
            }
            Ok(())
        }
        _ = tokio::time::sleep(job.timeout) => {
            Err(PathreelError::encoding(format!(
                "{} timed out after {}s",
                job.program,
                job.timeout.as_secs_f64()
            )))
        }
        _ = cancel.cancelled() => Err(PathreelError::Cancelled),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
