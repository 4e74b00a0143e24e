pub(crate) mod batch;
pub(crate) mod fit;

use crate::geometry::grid::Ratio;

/// Resizer tabs; each one converts a batch to a single kind of target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeTab {
    /// Every image at its own recommended integer ratio.
    Recommend,
    /// Square canvas sized to the longer edge.
    Square,
    /// Fixed 480×720 box.
    Resize,
    /// A user-supplied ratio shared by every image.
    Custom,
}

impl ResizeTab {
    /// Label used in archive names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Recommend => "recommended_ratio",
            Self::Square => "1x1_ratio",
            Self::Resize => "480x720",
            Self::Custom => "custom_ratio",
        }
    }
}

impl std::str::FromStr for ResizeTab {
    type Err = crate::LetterpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommend" | "recommended" => Ok(Self::Recommend),
            "square" => Ok(Self::Square),
            "resize" | "480x720" => Ok(Self::Resize),
            "custom" => Ok(Self::Custom),
            other => Err(crate::LetterpressError::validation(format!(
                "unknown resize tab {other:?} (expected recommend, square, resize or custom)"
            ))),
        }
    }
}

/// Output box of a single conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeTarget {
    /// `max(w, h)` square, source centred unscaled.
    Square,
    /// 480×720, aspect-fit.
    Fixed480x720,
    /// `ratio × 24px` grid box, aspect-fit.
    Ratio(Ratio),
}

impl ResizeTarget {
    /// File name suffix: `square`, `480x720` or `{w}x{h}` of the ratio terms.
    pub fn file_suffix(self) -> String {
        match self {
            Self::Square => "square".to_owned(),
            Self::Fixed480x720 => "480x720".to_owned(),
            Self::Ratio(r) => format!("{}x{}", r.width, r.height),
        }
    }
}
