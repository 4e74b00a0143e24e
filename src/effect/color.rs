use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{LetterpressError, LetterpressResult};

/// Straight (non-premultiplied) sRGB colour as the editor stores it.
///
/// Parses CSS-style strings (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
/// `hsl()`, `hsla()` and a handful of names) and serializes back to `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque colour from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour from straight RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with its alpha scaled by `factor` (clamped to `[0, 1]`).
    pub fn scale_alpha(self, factor: f32) -> Self {
        let f = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a: (f32::from(self.a) * f).round() as u8,
            ..self
        }
    }

    /// Premultiplied form used by the pixel kernels.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    /// Parse a CSS-style colour string.
    pub fn parse(s: &str) -> LetterpressResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = func_args(&lower, "rgba").or_else(|| func_args(&lower, "rgb")) {
            return parse_rgb_func(args);
        }
        if let Some(args) = func_args(&lower, "hsla").or_else(|| func_args(&lower, "hsl")) {
            return parse_hsl_func(args);
        }
        named(&lower).ok_or_else(|| {
            LetterpressError::validation(format!("unrecognized colour \"{s}\""))
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl FromStr for Color {
    type Err = LetterpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            RgbaObj {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: u8,
            },
        }

        fn opaque() -> u8 {
            255
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => Color::parse(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Color::rgba(r, g, b, a)),
        }
    }
}

fn func_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_hex(s: &str) -> LetterpressResult<Color> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = s.as_bytes();
    let bad = || {
        LetterpressError::validation(format!(
            "hex colour must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA (got \"#{s}\")"
        ))
    };
    let digits: Vec<u8> = bytes
        .iter()
        .map(|&c| nibble(c))
        .collect::<Option<_>>()
        .ok_or_else(bad)?;

    match digits.len() {
        3 | 4 => {
            let d = |i: usize| digits.get(i).map(|&v| v * 17).unwrap_or(255);
            Ok(Color::rgba(d(0), d(1), d(2), d(3)))
        }
        6 | 8 => {
            let d = |i: usize| {
                digits
                    .get(2 * i)
                    .zip(digits.get(2 * i + 1))
                    .map(|(&hi, &lo)| hi * 16 + lo)
                    .unwrap_or(255)
            };
            Ok(Color::rgba(d(0), d(1), d(2), d(3)))
        }
        _ => Err(bad()),
    }
}

fn parse_channel(p: &str) -> LetterpressResult<u8> {
    let bad = || LetterpressError::validation(format!("invalid colour channel \"{p}\""));
    if let Some(pct) = p.strip_suffix('%') {
        let v: f64 = pct.parse().map_err(|_| bad())?;
        return Ok((v.clamp(0.0, 100.0) * 2.55).round() as u8);
    }
    let v: f64 = p.parse().map_err(|_| bad())?;
    Ok(v.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(p: &str) -> LetterpressResult<u8> {
    let bad = || LetterpressError::validation(format!("invalid alpha \"{p}\""));
    let v: f64 = match p.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().map_err(|_| bad())? / 100.0,
        None => p.parse().map_err(|_| bad())?,
    };
    Ok((v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_rgb_func(args: &str) -> LetterpressResult<Color> {
    let parts = split_args(args);
    match parts.as_slice() {
        [r, g, b] => Ok(Color::rgb(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
        )),
        [r, g, b, a] => Ok(Color::rgba(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
            parse_alpha(a)?,
        )),
        _ => Err(LetterpressError::validation(format!(
            "rgb()/rgba() expects 3 or 4 arguments (got \"{args}\")"
        ))),
    }
}

fn parse_hsl_func(args: &str) -> LetterpressResult<Color> {
    let parts = split_args(args);
    let (h, s, l, a) = match parts.as_slice() {
        [h, s, l] => (h, s, l, None),
        [h, s, l, a] => (h, s, l, Some(a)),
        _ => {
            return Err(LetterpressError::validation(format!(
                "hsl()/hsla() expects 3 or 4 arguments (got \"{args}\")"
            )));
        }
    };
    let num = |p: &str| -> LetterpressResult<f64> {
        p.trim_end_matches("deg")
            .trim_end_matches('%')
            .parse()
            .map_err(|_| LetterpressError::validation(format!("invalid hsl component \"{p}\"")))
    };
    let (r, g, b) = hsl_to_rgb(num(h)?, num(s)? / 100.0, num(l)? / 100.0);
    let a = match a {
        Some(a) => parse_alpha(a)?,
        None => 255,
    };
    let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Ok(Color::rgba(to_u8(r), to_u8(g), to_u8(b), a))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return (l, l, l);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn named(s: &str) -> Option<Color> {
    Some(match s {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/effect/color.rs"]
mod tests;
