use std::sync::Arc;

use anyhow::Context;

use crate::foundation::{
    error::{ReelError, ReelResult},
    math::premultiply_rgba8_in_place,
};

/// Decoded raster frame, held as a paint-ready premultiplied RGBA8 pixmap.
#[derive(Clone)]
pub struct DecodedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl DecodedFrame {
    /// Wrap row-major premultiplied RGBA8 bytes.
    ///
    /// Dimensions must be non-zero and fit in `u16`, and `rgba8_premul` must hold exactly
    /// `width * height` pixels.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: &[u8]) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::load("decoded frame has zero size"));
        }
        let w: u16 = width
            .try_into()
            .map_err(|_| ReelError::load("frame width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ReelError::load("frame height exceeds u16"))?;
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(ReelError::load("decoded frame byte length mismatch"));
        }

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for px in rgba8_premul.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(Self {
            width,
            height,
            pixmap: Arc::new(vello_cpu::Pixmap::from_parts_with_opacity(
                pixels,
                w,
                h,
                may_have_opacities,
            )),
        })
    }

    /// Natural aspect ratio (`width / height`).
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Pixel bytes in row-major premultiplied RGBA8.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn pixmap(&self) -> &Arc<vello_cpu::Pixmap> {
        &self.pixmap
    }
}

/// Decode encoded image bytes into a premultiplied frame.
pub fn decode_frame(bytes: &[u8]) -> ReelResult<DecodedFrame> {
    let dyn_img = image::load_from_memory(bytes).context("decode frame from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    DecodedFrame::from_premul_rgba8(width, height, &rgba8_premul)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
