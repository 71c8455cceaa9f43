use crate::foundation::{
    error::{ReelError, ReelResult},
    math::unpremultiply_rgba8_in_place,
};

/// A read-back copy of the surface pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert to straight alpha, as expected by PNG encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize * self.width as usize) + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Backing pixel buffer of the drawing surface.
///
/// Starts unallocated; [`ensure_size`](Self::ensure_size) reallocates only on dimension change.
#[derive(Default)]
pub struct Surface {
    pixmap: Option<vello_cpu::Pixmap>,
    width: u16,
    height: u16,
    allocations: u64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("allocated", &self.pixmap.is_some())
            .field("allocations", &self.allocations)
            .finish()
    }
}

impl Surface {
    /// Unallocated surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the buffer exactly `width x height`. Returns `true` if it was (re)allocated.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> ReelResult<bool> {
        let w: u16 = width
            .try_into()
            .map_err(|_| ReelError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ReelError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ReelError::render("surface must be at least 1x1"));
        }

        if self.pixmap.is_some() && self.width == w && self.height == h {
            return Ok(false);
        }

        tracing::debug!(
            from_w = self.width,
            from_h = self.height,
            to_w = w,
            to_h = h,
            "reallocating surface"
        );
        self.pixmap = Some(vello_cpu::Pixmap::new(w, h));
        self.width = w;
        self.height = h;
        self.allocations += 1;
        Ok(true)
    }

    /// Physical size, `(0, 0)` before the first allocation.
    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Number of (re)allocations so far.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Fill every pixel with a premultiplied color.
    pub fn clear(&mut self, premul: [u8; 4]) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
                px.copy_from_slice(&premul);
            }
        }
    }

    pub(crate) fn pixmap_mut(&mut self) -> Option<&mut vello_cpu::Pixmap> {
        self.pixmap.as_mut()
    }

    /// Copy the current pixels out. `None` before the first allocation.
    pub fn readback(&self) -> Option<FrameRGBA> {
        let pixmap = self.pixmap.as_ref()?;
        Some(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
