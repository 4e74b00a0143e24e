//! Letterpress renders layered text effects and batch-resizes images to fixed aspect boxes.
//!
//! The text side is a pure function of an [`EffectConfig`] snapshot:
//!
//! - Resolve images into [`PreparedAssets`] and fonts into a [`FontBook`]
//! - Render with [`render_effect`] (or a long-lived [`Renderer`]) into a premultiplied
//!   [`FrameRGBA`]
//! - Export with [`encode_png`] and [`export_file_name`]
//!
//! [`EditorSession`] bundles those steps for an editor that swaps snapshots on every edit.
//!
//! The image side validates and decodes a batch with [`load_batch`], converts it for one
//! [`ResizeTab`] with [`convert_batch`] and bundles the outputs with [`zip_archive`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod effect;
mod export;
mod foundation;
mod geometry;
mod render;
mod resize;
mod session;
mod text;

pub use crate::foundation::core::{
    Affine, Canvas, MAX_OUTPUT_PIXELS, Point, Rect, Rgba8Premul, Vec2, ensure_pixel_budget,
};
pub use crate::foundation::error::{LetterpressError, LetterpressResult};

pub use crate::geometry::grid::{
    FitRect, GRID_RANGE, GRID_UNIT_PX, MAX_CUSTOM_RATIO_TERM, MAX_RATIO_TERM, PREVIEW_GRID_RANGE,
    Ratio, aspect_fit, best_integer_ratio, canvas_size, clamp_grid, clamp_preview_grid, parse_ratio, square_fit,
};

pub use crate::effect::color::Color;
pub use crate::effect::config::{
    BackgroundConfig, BlendMode, BlockStroke, DEFAULT_FONT_FAMILY, DEFAULT_PREVIEW_GRID,
    EffectConfig, FillSource, ImageFillConfig, ShadowConfig, StrokeConfig, TextBlock, TextMode,
    TextureConfig,
};
pub use crate::effect::gradient::{
    ColorStop, Gradient, GradientGeometry, GradientKind, GradientSpec, build_gradient,
};

pub use crate::text::fonts::{FONT_EXTENSIONS, FontBook, font_name_for_path};
pub use crate::text::layout::{
    DrawUnit, MIN_EFFECTIVE_SPACING_PX, PlacedGlyph, ShapedText, Shaper, TextLayout, TextStyle,
    layout_text,
};

pub use crate::assets::decode::{decode_image, encode_data_url, parse_data_url};
pub use crate::assets::store::{
    AssetState, ImageSource, PreparedAssets, PreparedImage, normalize_rel_path,
};

pub use crate::render::scene::{Renderer, render_effect, render_effect_into};
pub use crate::render::surface::Surface;
pub use crate::render::surface_pool::{ENV_POOL_MAX_BYTES, ENV_POOL_MAX_PER_BUCKET};
pub use crate::render::{FrameRGBA, RenderOpts, SurfacePoolOpts, SurfacePoolStats};

pub use crate::resize::batch::{
    BatchLimits, BatchLoad, ConvertedImage, InputFile, LoadedImage, MAX_FILE_BYTES, Notice,
    NoticeKind, convert_batch, file_stem, load_batch, tab_target,
};
pub use crate::resize::fit::{
    FIXED_BOX_HEIGHT, FIXED_BOX_WIDTH, resize, resize_square, resize_to_box,
};
pub use crate::resize::{ResizeTab, ResizeTarget};

pub use crate::export::archive::{archive_name, archive_name_today, zip_archive};
pub use crate::export::png::{
    DEFAULT_EXPORT_STEM, encode_png, encode_straight_png, export_file_name,
};

pub use crate::session::EditorSession;
