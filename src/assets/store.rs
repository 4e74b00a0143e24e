use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::decode::{decode_image, parse_data_url};
use crate::effect::config::EffectConfig;
use crate::foundation::error::{LetterpressError, LetterpressResult};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Where an image source string points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:` URL with its decoded payload.
    DataUrl {
        /// Declared MIME type.
        mime: String,
        /// Encoded image bytes.
        bytes: Vec<u8>,
    },
    /// Normalized path relative to the assets root.
    Path(String),
}

impl ImageSource {
    /// Classify and validate an image source string.
    pub fn parse(source: &str) -> LetterpressResult<Self> {
        if source.starts_with("data:") {
            let (mime, bytes) = parse_data_url(source)?;
            return Ok(Self::DataUrl { mime, bytes });
        }
        Ok(Self::Path(normalize_rel_path(source)?))
    }

    /// Read and decode the image.
    pub fn load(&self, root: Option<&Path>) -> LetterpressResult<PreparedImage> {
        match self {
            Self::DataUrl { bytes, .. } => decode_image(bytes),
            Self::Path(rel) => {
                let root = root.ok_or_else(|| {
                    LetterpressError::validation(format!(
                        "image path \"{rel}\" needs an assets root"
                    ))
                })?;
                let path: PathBuf = root.join(rel);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read image {}", path.display()))?;
                decode_image(&bytes)
            }
        }
    }
}

/// Normalize and validate assets-root-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> LetterpressResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') || s.get(1..2) == Some(":") {
        return Err(LetterpressError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(LetterpressError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(LetterpressError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(LetterpressError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Outcome of loading one image source.
#[derive(Clone, Debug)]
pub enum AssetState {
    /// Decoded and ready to draw.
    Ready(PreparedImage),
    /// Could not be loaded; the reason is kept for reporting.
    Failed(String),
}

/// Images resolved ahead of rendering, keyed by their source string.
///
/// The compositor only reads from this store. A missing entry is treated as "not loaded yet".
#[derive(Clone, Debug, Default)]
pub struct PreparedAssets {
    entries: HashMap<String, AssetState>,
}

impl PreparedAssets {
    /// Store with nothing loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every image `config` needs, in parallel. Failures are recorded, not returned.
    #[tracing::instrument(skip(config))]
    pub fn prepare(config: &EffectConfig, root: Option<&Path>) -> Self {
        Self::prepare_sources(&config.required_images(), root)
    }

    /// Load the given sources in parallel.
    pub fn prepare_sources(sources: &[String], root: Option<&Path>) -> Self {
        let entries = sources
            .par_iter()
            .map(|src| {
                let state = match ImageSource::parse(src).and_then(|s| s.load(root)) {
                    Ok(img) => AssetState::Ready(img),
                    Err(e) => {
                        tracing::warn!(source = %short(src), error = %e, "image failed to load");
                        AssetState::Failed(e.to_string())
                    }
                };
                (src.clone(), state)
            })
            .collect();
        Self { entries }
    }

    /// Add or replace a decoded image.
    pub fn insert(&mut self, source: impl Into<String>, image: PreparedImage) {
        self.entries.insert(source.into(), AssetState::Ready(image));
    }

    /// Ready image for `source`, if loaded.
    pub fn get(&self, source: &str) -> Option<&PreparedImage> {
        match self.entries.get(source) {
            Some(AssetState::Ready(img)) => Some(img),
            _ => None,
        }
    }

    /// Load state for `source`.
    pub fn state(&self, source: &str) -> Option<&AssetState> {
        self.entries.get(source)
    }

    /// `true` once every image `config` needs has resolved (ready or failed).
    pub fn is_complete_for(&self, config: &EffectConfig) -> bool {
        config
            .required_images()
            .iter()
            .all(|s| self.entries.contains_key(s))
    }

    /// Sources that failed to load with their reasons, sorted by source.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter_map(|(k, v)| match v {
                AssetState::Failed(reason) => Some((k.as_str(), reason.as_str())),
                AssetState::Ready(_) => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of resolved sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing has resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Data URLs are long; keep log lines readable.
fn short(src: &str) -> &str {
    match src.char_indices().nth(48) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
