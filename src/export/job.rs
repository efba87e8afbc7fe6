use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encode::ffmpeg::VideoFormat;
use crate::export::tier::Tier;
use crate::foundation::error::PathreelError;

/// Opaque job identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = PathreelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| PathreelError::validation(format!("invalid job id '{s}': {e}")))
    }
}

/// Lifecycle state of a job.
///
/// `Queued -> Processing -> Completed | Error`; nothing leaves a terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not started.
    Queued,
    /// Running.
    Processing,
    /// Finished with an artifact.
    Completed,
    /// Finished without an artifact.
    Error,
}

impl JobStatus {
    /// `Completed` or `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished job produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// H.264 MP4 video.
    Mp4,
    /// VP9 WebM video.
    Webm,
    /// Single PNG frame.
    Png,
    /// JSON description of the animation.
    Manifest,
}

impl ArtifactKind {
    /// MIME type served with the artifact.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mp4 => VideoFormat::Mp4.content_type(),
            Self::Webm => VideoFormat::Webm.content_type(),
            Self::Png => "image/png",
            Self::Manifest => "application/json",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => VideoFormat::Mp4.extension(),
            Self::Webm => VideoFormat::Webm.extension(),
            Self::Png => "png",
            Self::Manifest => "json",
        }
    }
}

impl From<VideoFormat> for ArtifactKind {
    fn from(format: VideoFormat) -> Self {
        match format {
            VideoFormat::Mp4 => Self::Mp4,
            VideoFormat::Webm => Self::Webm,
        }
    }
}

/// Reference to a persisted artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// File holding the artifact.
    pub path: PathBuf,
    /// Artifact type.
    pub kind: ArtifactKind,
}

impl Artifact {
    /// MIME type of the artifact.
    pub fn content_type(&self) -> &'static str {
        self.kind.content_type()
    }
}

/// Artifact contents returned by `fetch_artifact`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedArtifact {
    /// Raw artifact bytes.
    pub bytes: Vec<u8>,
    /// MIME type matching the tier that produced it.
    pub content_type: &'static str,
    /// Suggested download file name.
    pub file_name: String,
}

/// Point-in-time copy of a job, as returned to pollers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Job id.
    pub id: JobId,
    /// Lifecycle state.
    pub status: JobStatus,
    /// `0..=100`, non-decreasing while not in error.
    pub progress_percent: u8,
    /// Creation time, clock milliseconds.
    pub created_at_ms: u64,
    /// Last state change, clock milliseconds.
    pub updated_at_ms: u64,
    /// Tier chosen when processing started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Set if and only if `status == Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Artifact>,
    /// Set when `status == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// A freshly queued job.
    pub fn queued(id: JobId, now_ms: u64) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            progress_percent: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            tier: None,
            output: None,
            error_message: None,
        }
    }
}
