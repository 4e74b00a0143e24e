use serde::{Deserialize, Serialize};

use crate::effect::color::Color;
use crate::foundation::core::{Point, Rgba8Premul, Vec2};

/// Gradient geometry selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    /// Gradient along a line through the box centre.
    #[default]
    Linear,
    /// Gradient radiating from the box centre.
    Radial,
}

/// Editor-facing gradient description.
///
/// `center_x`, `center_y` and `radius` are carried for round-tripping but the radial builder
/// always centres on the box midpoint with radius `min(w, h) / 2`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradientSpec {
    /// Editor toggle; the fill decision is driven by `use_text_gradient`/`use_gradient`.
    pub enabled: bool,
    /// Linear or radial.
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// Colour stops, evenly spaced.
    pub colors: Vec<Color>,
    /// Linear angle in degrees; `0` points along +X.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Radial centre X in percent (not applied).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    /// Radial centre Y in percent (not applied).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
    /// Radial radius in percent (not applied).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl GradientSpec {
    /// Linear gradient over `colors` at `angle` degrees.
    pub fn linear(colors: Vec<Color>, angle: f64) -> Self {
        Self {
            enabled: true,
            kind: GradientKind::Linear,
            colors,
            angle: Some(angle),
            ..Self::default()
        }
    }

    /// Radial gradient over `colors`.
    pub fn radial(colors: Vec<Color>) -> Self {
        Self {
            enabled: true,
            kind: GradientKind::Radial,
            colors,
            ..Self::default()
        }
    }

    /// `true` when the spec has enough colours to build a gradient.
    pub fn is_buildable(&self) -> bool {
        self.colors.len() >= 2
    }
}

/// One colour stop at a normalized offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    /// Stop colour.
    pub color: Color,
}

/// Resolved gradient geometry in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientGeometry {
    /// Linear between two points.
    Linear {
        /// Offset-0 end.
        start: Point,
        /// Offset-1 end.
        end: Point,
    },
    /// Radial from `center` (offset 0) to `radius` (offset 1).
    Radial {
        /// Circle centre.
        center: Point,
        /// Outer radius.
        radius: f64,
    },
}

/// Gradient paint built for a specific target box.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    geometry: GradientGeometry,
    stops: Vec<ColorStop>,
}

/// Build a gradient for a `w`×`h` box; `None` when fewer than two colours are given.
pub fn build_gradient(spec: &GradientSpec, w: f64, h: f64) -> Option<Gradient> {
    if !spec.is_buildable() {
        return None;
    }

    let center = Point::new(w / 2.0, h / 2.0);
    let geometry = match spec.kind {
        GradientKind::Linear => {
            let theta = spec.angle.unwrap_or(0.0).to_radians();
            let half_diag = w.hypot(h) / 2.0;
            let dir = Vec2::new(theta.cos(), theta.sin()) * half_diag;
            GradientGeometry::Linear {
                start: center - dir,
                end: center + dir,
            }
        }
        GradientKind::Radial => GradientGeometry::Radial {
            center,
            radius: w.min(h) / 2.0,
        },
    };

    let last = (spec.colors.len() - 1) as f64;
    let stops = spec
        .colors
        .iter()
        .enumerate()
        .map(|(i, &color)| ColorStop {
            offset: i as f64 / last,
            color,
        })
        .collect();

    Some(Gradient { geometry, stops })
}

impl Gradient {
    /// Resolved geometry.
    pub fn geometry(&self) -> GradientGeometry {
        self.geometry
    }

    /// Colour stops in ascending offset order.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Gradient parameter at a pixel-space point, clamped to `[0, 1]`.
    pub fn offset_at(&self, x: f64, y: f64) -> f64 {
        let p = Point::new(x, y);
        let t = match self.geometry {
            GradientGeometry::Linear { start, end } => {
                let d = end - start;
                let len2 = d.hypot2();
                if len2 <= f64::EPSILON {
                    0.0
                } else {
                    (p - start).dot(d) / len2
                }
            }
            GradientGeometry::Radial { center, radius } => {
                if radius <= f64::EPSILON {
                    1.0
                } else {
                    (p - center).hypot() / radius
                }
            }
        };
        if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Premultiplied colour at a pixel-space point.
    pub fn sample(&self, x: f64, y: f64) -> Rgba8Premul {
        self.color_at(self.offset_at(x, y)).to_premul()
    }

    /// Piecewise-linear interpolation of the straight stop colours.
    pub fn color_at(&self, t: f64) -> Color {
        let Some(first) = self.stops.first() else {
            return Color::TRANSPARENT;
        };
        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let f = if span <= f64::EPSILON {
                    1.0
                } else {
                    (t - a.offset) / span
                };
                return lerp_color(a.color, b.color, f);
            }
        }
        self.stops.last().map(|s| s.color).unwrap_or(first.color)
    }

    /// Rasterize into a tightly packed premultiplied RGBA8 buffer, sampling pixel centres.
    pub fn rasterize(&self, width: u32, height: u32) -> Vec<u8> {
        let mut out = vec![0u8; (width as usize) * (height as usize) * 4];
        for (i, px) in out.chunks_exact_mut(4).enumerate() {
            let x = (i % width as usize) as f64 + 0.5;
            let y = (i / width as usize) as f64 + 0.5;
            px.copy_from_slice(&self.sample(x, y).to_array());
        }
        out
    }
}

fn lerp_color(a: Color, b: Color, f: f64) -> Color {
    let f = f.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * f).round() as u8;
    Color::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

#[cfg(test)]
#[path = "../../tests/unit/effect/gradient.rs"]
mod tests;
