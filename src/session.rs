//! Editor session: the current config snapshot plus everything needed to render it.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::assets::store::PreparedAssets;
use crate::effect::config::EffectConfig;
use crate::export::png::{encode_png, export_file_name};
use crate::foundation::error::LetterpressResult;
use crate::render::scene::Renderer;
use crate::render::{FrameRGBA, RenderOpts};
use crate::text::fonts::FontBook;

/// Holds an immutable [`EffectConfig`] snapshot and swaps it on every edit.
///
/// Images referenced by the config are decoded when the snapshot changes which images it needs,
/// so a render always sees every load settled (ready or failed).
#[derive(Debug)]
pub struct EditorSession {
    config: Arc<EffectConfig>,
    required: Vec<String>,
    assets: PreparedAssets,
    fonts: FontBook,
    renderer: Renderer,
    assets_root: Option<PathBuf>,
}

impl EditorSession {
    /// Start a session; images are resolved relative to `assets_root` unless they are data URLs.
    pub fn new(
        config: EffectConfig,
        fonts: FontBook,
        opts: RenderOpts,
        assets_root: Option<PathBuf>,
    ) -> Self {
        let required = config.required_images();
        let assets = PreparedAssets::prepare_sources(&required, assets_root.as_deref());
        Self {
            config: Arc::new(config),
            required,
            assets,
            fonts,
            renderer: Renderer::new(opts),
            assets_root,
        }
    }

    /// Current snapshot.
    pub fn config(&self) -> Arc<EffectConfig> {
        Arc::clone(&self.config)
    }

    /// Prepared images of the current snapshot.
    pub fn assets(&self) -> &PreparedAssets {
        &self.assets
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Register a font; it becomes selectable by `name` on the next render.
    pub fn register_font(&mut self, name: &str, bytes: Vec<u8>) -> LetterpressResult<()> {
        self.fonts.register(name, bytes)
    }

    /// Replace the snapshot with `edit(current)`.
    ///
    /// Returns true when the new snapshot needed a different image set and assets were
    /// re-prepared.
    pub fn update(&mut self, edit: impl FnOnce(&EffectConfig) -> EffectConfig) -> bool {
        let next = edit(&self.config);
        self.replace(next)
    }

    /// Swap in a whole new snapshot. Same return value as [`EditorSession::update`].
    pub fn replace(&mut self, config: EffectConfig) -> bool {
        let required = config.required_images();
        self.config = Arc::new(config);
        if required == self.required {
            return false;
        }
        debug!(images = required.len(), "image set changed; preparing assets");
        self.assets = PreparedAssets::prepare_sources(&required, self.assets_root.as_deref());
        self.required = required;
        true
    }

    /// True when every image the snapshot needs has settled.
    pub fn is_ready(&self) -> bool {
        self.assets.is_complete_for(&self.config)
    }

    /// Render the current snapshot.
    pub fn render(&mut self) -> LetterpressResult<FrameRGBA> {
        self.renderer
            .render(&self.config, &self.assets, &mut self.fonts)
    }

    /// Render and encode the current snapshot: `(file name, png bytes)`.
    pub fn export_png(&mut self, scale: u32) -> LetterpressResult<(String, Vec<u8>)> {
        let frame = self.render()?;
        let png = encode_png(&frame, scale)?;
        Ok((export_file_name(&self.config.text), png))
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
