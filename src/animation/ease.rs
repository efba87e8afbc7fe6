/// Easing functions used to map normalized progress.
///
/// Every variant satisfies `apply(0) == 0`, `apply(1) == 1` and is non-decreasing on `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
}

impl Ease {
    /// All supported easings.
    pub const ALL: [Ease; 7] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
    ];

    /// Apply this easing function to normalized progress `t`. Input is clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// Look up an easing by name. Unknown names fall back to [`Ease::Linear`].
    ///
    /// Accepts camelCase (`easeInOutCubic`, `inOutCubic`), kebab-case and snake_case spellings.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let key = key.strip_prefix("ease").unwrap_or(&key);
        match key {
            "inquad" => Self::InQuad,
            "outquad" => Self::OutQuad,
            "inoutquad" => Self::InOutQuad,
            "incubic" => Self::InCubic,
            "outcubic" => Self::OutCubic,
            "inoutcubic" => Self::InOutCubic,
            _ => Self::Linear,
        }
    }

    /// Canonical camelCase name, as used in serialized scenes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "inQuad",
            Self::OutQuad => "outQuad",
            Self::InOutQuad => "inOutQuad",
            Self::InCubic => "inCubic",
            Self::OutCubic => "outCubic",
            Self::InOutCubic => "inOutCubic",
        }
    }
}

/// Reads any name [`Ease::from_name`] accepts; unknown names become [`Ease::Linear`].
impl<'de> serde::Deserialize<'de> for Ease {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
