use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::frames::RenderThreading;

/// Process configuration, read once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Export orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Where finished artifacts are written, one file per job.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Root for temporary frame directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Jobs older than this are evicted by cleanup.
    #[serde(default = "default_max_job_age_secs")]
    pub max_job_age_secs: u64,
    /// Period of the background cleanup loop.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Encoder executable, looked up on `PATH` unless absolute.
    #[serde(default = "default_encoder_program")]
    pub encoder_program: String,
    /// Upper bound on one encoder run.
    #[serde(default = "default_encoder_timeout_secs")]
    pub encoder_timeout_secs: u64,
    /// Render worker threads; unset uses rayon's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_threads: Option<usize>,
    /// Frames rendered in parallel before being handed to the sink.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Set to false to force the manifest tier.
    #[serde(default = "default_true")]
    pub rasterizer_enabled: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
            max_job_age_secs: default_max_job_age_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            encoder_program: default_encoder_program(),
            encoder_timeout_secs: default_encoder_timeout_secs(),
            render_threads: None,
            chunk_size: default_chunk_size(),
            rasterizer_enabled: default_true(),
        }
    }
}

impl ExportConfig {
    pub fn max_job_age_ms(&self) -> u64 {
        self.max_job_age_secs.saturating_mul(1000)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }

    pub fn encoder_timeout(&self) -> Duration {
        Duration::from_secs(self.encoder_timeout_secs)
    }

    /// Frame rendering parallelism derived from this config.
    pub fn threading(&self) -> RenderThreading {
        RenderThreading {
            chunk_size: self.chunk_size,
            threads: self.render_threads,
            ..RenderThreading::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("pathreel").join("exports")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("pathreel").join("work")
}

fn default_max_job_age_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_encoder_program() -> String {
    "ffmpeg".to_string()
}

fn default_encoder_timeout_secs() -> u64 {
    600
}

fn default_chunk_size() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given or the file is absent.
    pub fn load(path: Option<&Path>) -> PathreelResult<Self> {
        match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                Self::from_toml(&content)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse configuration TOML.
    pub fn from_toml(content: &str) -> PathreelResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PathreelError::validation(format!("invalid config: {e}")))?;
        if config.export.encoder_timeout_secs == 0 {
            return Err(PathreelError::validation(
                "export.encoder_timeout_secs must be greater than zero",
            ));
        }
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> PathreelResult<String> {
        toml::to_string_pretty(self).map_err(|e| PathreelError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
