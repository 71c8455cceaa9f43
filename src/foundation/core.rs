pub use kurbo::{Affine, Rect, Vec2};

/// Zero-based address of a frame within a sequence.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

impl FrameIndex {
    /// Clamp into `[0, count - 1]`. An empty sequence clamps to `0`.
    pub fn clamp_to(self, count: u32) -> Self {
        Self(self.0.min(count.saturating_sub(1)))
    }

    /// Index as `usize` for slot lookups.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Viewport metrics sampled from the hosting surface.
///
/// `width`/`height` are logical pixels; the backing buffer is `logical * device_pixel_ratio`.
/// A height of `0` means layout has not settled yet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Build viewport metrics, normalizing unusable inputs.
    ///
    /// Negative or non-finite sizes become `0`; a DPR that is not finite and positive becomes `1`.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        fn size(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 { v } else { 0.0 }
        }

        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        Self {
            width: size(width),
            height: size(height),
            device_pixel_ratio: dpr,
        }
    }

    /// Whether there is anything to draw into.
    pub fn is_drawable(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Logical aspect ratio (`width / height`), `None` if the viewport is empty.
    pub fn aspect_ratio(self) -> Option<f64> {
        self.is_drawable().then(|| self.width / self.height)
    }

    /// Physical backing-buffer size, truncated the same way canvas dimensions are.
    pub fn backing_size(self) -> (u32, u32) {
        let w = (self.width * self.device_pixel_ratio).floor().max(0.0);
        let h = (self.height * self.device_pixel_ratio).floor().max(0.0);
        (w as u32, h as u32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
