use serde::Serialize;

use crate::config::ExportConfig;
use crate::encode::ffmpeg::is_encoder_available;
use crate::export::tier::Tier;
use crate::render::cpu;

/// What this process can do, probed once at startup and injected into the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Encoder program that answered the probe.
    pub encoder: Option<String>,
    /// The CPU rasterizer produced a visible test frame.
    pub rasterizer: bool,
}

impl Capabilities {
    /// Probe the encoder and rasterizer named in `config`.
    pub fn probe(config: &ExportConfig) -> Self {
        let encoder = is_encoder_available(&config.encoder_program)
            .then(|| config.encoder_program.clone());
        let rasterizer = config.rasterizer_enabled && cpu::smoke_test();
        let caps = Self {
            encoder,
            rasterizer,
        };
        tracing::info!(
            encoder = caps.encoder.as_deref().unwrap_or("none"),
            rasterizer = caps.rasterizer,
            tier = %caps.best_tier(),
            "capabilities probed"
        );
        caps
    }

    /// Encoder and rasterizer both present.
    pub fn full(encoder: impl Into<String>) -> Self {
        Self {
            encoder: Some(encoder.into()),
            rasterizer: true,
        }
    }

    /// Rasterizer only.
    pub fn still_only() -> Self {
        Self {
            encoder: None,
            rasterizer: true,
        }
    }

    /// Neither encoder nor rasterizer.
    pub fn manifest_only() -> Self {
        Self {
            encoder: None,
            rasterizer: false,
        }
    }

    /// Tier every job will use.
    pub fn best_tier(&self) -> Tier {
        Tier::select(self)
    }
}
