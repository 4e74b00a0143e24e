use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::export::png::encode_straight_png;
use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::geometry::grid::{Ratio, best_integer_ratio};
use crate::resize::fit::resize;
use crate::resize::{ResizeTab, ResizeTarget};

/// Per-file size cap of the batch resizer.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// A user-supplied file before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFile {
    /// Original file name, extension included.
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// Raw contents.
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> LetterpressResult<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_owned())
            .unwrap_or_else(|_| "application/octet-stream".to_owned());
        Ok(Self { name, mime, bytes })
    }
}

/// Validation limits applied before decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchLimits {
    /// Files larger than this are rejected.
    pub max_file_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
        }
    }
}

/// Why a file (or the whole batch) was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Over [`BatchLimits::max_file_bytes`].
    TooLarge,
    /// MIME type outside `image/*`.
    NotAnImage,
    /// Bytes could not be decoded.
    DecodeFailed,
    /// Nothing in the batch passed validation.
    NoValidFiles,
}

/// User-facing message about one file, or about the batch when `file` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// File the notice refers to.
    pub file: Option<String>,
    /// Category.
    pub kind: NoticeKind,
    /// Human-readable text.
    pub message: String,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// A decoded source image.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    /// Position among the files that passed validation.
    pub id: usize,
    /// Original file name.
    pub name: String,
    /// Straight-alpha pixels.
    pub image: RgbaImage,
    /// Closest `1..=10` integer ratio.
    pub recommended: Ratio,
}

/// Result of [`load_batch`].
#[derive(Clone, Debug, Default)]
pub struct BatchLoad {
    /// Decoded images in input order.
    pub images: Vec<LoadedImage>,
    /// Rejections in input order.
    pub notices: Vec<Notice>,
}

/// Validate then decode a batch. Bad files produce notices; the rest still load.
#[tracing::instrument(skip_all, fields(files = files.len()))]
pub fn load_batch(files: &[InputFile], limits: &BatchLimits) -> BatchLoad {
    let mut notices = Vec::new();
    let valid: Vec<&InputFile> = files
        .iter()
        .filter(|f| match validate(f, limits) {
            Ok(()) => true,
            Err(n) => {
                notices.push(n);
                false
            }
        })
        .collect();

    if valid.is_empty() {
        notices.push(Notice {
            file: None,
            kind: NoticeKind::NoValidFiles,
            message: "no valid image files".to_owned(),
        });
        log_notices(&notices);
        return BatchLoad {
            images: Vec::new(),
            notices,
        };
    }

    let decoded: Vec<Result<RgbaImage, String>> = valid
        .par_iter()
        .map(|f| {
            image::load_from_memory(&f.bytes)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string())
        })
        .collect();

    let mut images = Vec::with_capacity(valid.len());
    for (id, (file, result)) in valid.into_iter().zip(decoded).enumerate() {
        match result {
            Ok(image) => images.push(LoadedImage {
                id,
                name: file.name.clone(),
                recommended: best_integer_ratio(image.width(), image.height()),
                image,
            }),
            Err(reason) => notices.push(Notice {
                file: Some(file.name.clone()),
                kind: NoticeKind::DecodeFailed,
                message: format!("failed to load image \"{}\": {reason}", file.name),
            }),
        }
    }
    log_notices(&notices);
    info!(loaded = images.len(), rejected = notices.len(), "batch loaded");
    BatchLoad { images, notices }
}

fn validate(file: &InputFile, limits: &BatchLimits) -> Result<(), Notice> {
    if file.bytes.len() > limits.max_file_bytes {
        return Err(Notice {
            file: Some(file.name.clone()),
            kind: NoticeKind::TooLarge,
            message: format!(
                "file \"{}\" is too large (max {}MB)",
                file.name,
                limits.max_file_bytes / (1024 * 1024)
            ),
        });
    }
    if !file.mime.starts_with("image/") {
        return Err(Notice {
            file: Some(file.name.clone()),
            kind: NoticeKind::NotAnImage,
            message: format!("file \"{}\" is not an image file", file.name),
        });
    }
    Ok(())
}

fn log_notices(notices: &[Notice]) {
    for n in notices {
        warn!(file = n.file.as_deref().unwrap_or("-"), kind = ?n.kind, "{}", n.message);
    }
}

/// One converted output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedImage {
    /// Id of the source image.
    pub id: usize,
    /// Source file name.
    pub name: String,
    /// Output file name, e.g. `photo_square.png`.
    pub file_name: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Lossless PNG bytes.
    pub png: Vec<u8>,
}

/// Target a tab applies to `image`. `Custom` needs `custom`.
pub fn tab_target(
    tab: ResizeTab,
    image: &LoadedImage,
    custom: Option<Ratio>,
) -> LetterpressResult<ResizeTarget> {
    Ok(match tab {
        ResizeTab::Recommend => ResizeTarget::Ratio(image.recommended),
        ResizeTab::Square => ResizeTarget::Square,
        ResizeTab::Resize => ResizeTarget::Fixed480x720,
        ResizeTab::Custom => ResizeTarget::Ratio(
            custom.ok_or_else(|| LetterpressError::validation("the custom tab needs a ratio"))?,
        ),
    })
}

/// Convert every loaded image for `tab`, in parallel, keeping input order.
#[tracing::instrument(skip(load), fields(images = load.images.len()))]
pub fn convert_batch(
    load: &BatchLoad,
    tab: ResizeTab,
    custom: Option<Ratio>,
) -> LetterpressResult<Vec<ConvertedImage>> {
    load.images
        .par_iter()
        .map(|img| {
            let target = tab_target(tab, img, custom)?;
            let out = resize(&img.image, target)?;
            Ok(ConvertedImage {
                id: img.id,
                name: img.name.clone(),
                file_name: format!("{}_{}.png", file_stem(&img.name), target.file_suffix()),
                width: out.width(),
                height: out.height(),
                png: encode_straight_png(&out)?,
            })
        })
        .collect()
}

/// `name` without its last extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i + 1 < name.len() && !name[i + 1..].contains('/') => &name[..i],
        _ => name,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resize/batch.rs"]
mod tests;
