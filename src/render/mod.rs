pub(crate) mod blend;
pub(crate) mod compositor;
pub(crate) mod raster;
pub(crate) mod scene;
pub(crate) mod surface;
pub(crate) mod surface_pool;

pub use surface_pool::{SurfacePoolOpts, SurfacePoolStats};

/// Rendered pixels, row-major RGBA8.
///
/// Renderer output is always premultiplied; `premultiplied` records it for consumers that
/// also carry straight-alpha buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Whether colour channels are multiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when every pixel has zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }
}

/// Renderer settings.
#[derive(Clone, Debug, Default)]
pub struct RenderOpts {
    /// Straight RGBA the target is cleared to before drawing; transparent when `None`.
    pub clear_rgba: Option<[u8; 4]>,
    /// Scratch surface pool limits.
    pub pool: SurfacePoolOpts,
}

impl RenderOpts {
    /// Defaults with pool limits read from the environment.
    pub fn from_env() -> Self {
        Self {
            clear_rgba: None,
            pool: SurfacePoolOpts::from_env(),
        }
    }

    /// Clear the target to `rgba` before drawing.
    pub fn with_clear_rgba(mut self, rgba: [u8; 4]) -> Self {
        self.clear_rgba = Some(rgba);
        self
    }

    /// Replace the pool limits.
    pub fn with_pool(mut self, pool: SurfacePoolOpts) -> Self {
        self.pool = pool;
        self
    }
}
