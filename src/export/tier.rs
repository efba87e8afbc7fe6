use std::fmt;

use serde::{Deserialize, Serialize};

use crate::export::capabilities::Capabilities;

/// Artifact production strategy, highest fidelity first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Render every frame and encode a video.
    RasterEncode,
    /// Render the finished scene as one PNG.
    StillFrame,
    /// Write a JSON description of the animation.
    Manifest,
}

impl Tier {
    /// Every tier in fallback order.
    pub const ORDERED: [Tier; 3] = [Tier::RasterEncode, Tier::StillFrame, Tier::Manifest];

    pub fn name(self) -> &'static str {
        match self {
            Self::RasterEncode => "raster-encode",
            Self::StillFrame => "still-frame",
            Self::Manifest => "manifest",
        }
    }

    /// Whether `caps` can run this tier. The manifest needs nothing.
    pub fn is_supported(self, caps: &Capabilities) -> bool {
        match self {
            Self::RasterEncode => caps.rasterizer && caps.encoder.is_some(),
            Self::StillFrame => caps.rasterizer,
            Self::Manifest => true,
        }
    }

    /// First supported tier in [`Tier::ORDERED`].
    pub fn select(caps: &Capabilities) -> Tier {
        Self::ORDERED
            .into_iter()
            .find(|t| t.is_supported(caps))
            .unwrap_or(Tier::Manifest)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
