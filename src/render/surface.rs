use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::LetterpressResult;
use crate::render::FrameRGBA;

/// Caller-owned render target in premultiplied RGBA8.
pub struct Surface {
    canvas: Canvas,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.canvas.width)
            .field("height", &self.canvas.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Allocate a transparent surface. The handle is usable immediately.
    pub fn new(width: u32, height: u32) -> LetterpressResult<Self> {
        let canvas = Canvas::new(width, height)?;
        Ok(Self {
            canvas,
            // `Canvas::new` bounds both edges to u16.
            pixmap: vello_cpu::Pixmap::new(width as u16, height as u16),
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Fill with a straight-alpha colour (`None` clears to transparent).
    pub fn clear(&mut self, rgba: Option<[u8; 4]>) {
        let [r, g, b, a] = rgba.unwrap_or([0, 0, 0, 0]);
        let px = Rgba8Premul::from_straight_rgba(r, g, b, a).to_array();
        for d in self.data_mut().chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Copy out as a frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
