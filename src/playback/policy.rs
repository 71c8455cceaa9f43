use crate::foundation::{
    core::FrameIndex,
    error::{ReelError, ReelResult},
    math::clamp01,
};

/// How raw scroll samples map onto the frame sequence.
///
/// Selected by whichever part of the page owns the effect; the scheduler treats both the same
/// way and only asks for the active [`ScrollRange`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingPolicy {
    /// Absolute page offset in pixels over `[0, viewport_height * viewport_multiple]`.
    /// Used when the surface stays pinned for the whole page.
    GlobalOffset {
        /// Number of viewport heights the sequence spans.
        viewport_multiple: f64,
    },
    /// Container-scoped progress already normalized to `[0, 1]`.
    LocalProgress,
}

impl Default for MappingPolicy {
    fn default() -> Self {
        Self::GlobalOffset {
            viewport_multiple: 4.0,
        }
    }
}

impl MappingPolicy {
    /// Active input range, `None` while the viewport height is unknown.
    pub fn range(self, viewport_height: f64) -> Option<ScrollRange> {
        if !(viewport_height.is_finite() && viewport_height > 0.0) {
            return None;
        }
        match self {
            Self::GlobalOffset { viewport_multiple } => {
                ScrollRange::new(0.0, viewport_height * viewport_multiple)
            }
            Self::LocalProgress => ScrollRange::new(0.0, 1.0),
        }
    }

    /// Reject multipliers that cannot produce a usable range.
    pub fn validate(self) -> ReelResult<()> {
        if let Self::GlobalOffset { viewport_multiple } = self
            && !(viewport_multiple.is_finite() && viewport_multiple > 0.0)
        {
            return Err(ReelError::validation(
                "global offset policy 'viewport_multiple' must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Input span of a policy. Always `start < end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRange {
    /// Sample mapped to progress `0`.
    pub start: f64,
    /// Sample mapped to progress `1`.
    pub end: f64,
}

impl ScrollRange {
    /// `None` for empty, inverted or non-finite spans.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        (start.is_finite() && end.is_finite() && end > start).then_some(Self { start, end })
    }

    /// `clamp((sample - start) / (end - start), 0, 1)`; NaN maps to `0`.
    pub fn progress(self, sample: f64) -> f64 {
        clamp01((sample - self.start) / (self.end - self.start))
    }
}

/// Map normalized progress to a frame: `min(N - 1, floor(progress * N))`.
///
/// Every frame owns an equal `1 / N` share of the range; `progress == 1` lands on the last frame.
pub fn frame_for_progress(progress: f64, count: u32) -> FrameIndex {
    let scaled = (clamp01(progress) * f64::from(count)).floor();
    FrameIndex(scaled as u32).clamp_to(count)
}

/// Progress of a container scrolled from its top reaching the viewport top to its bottom
/// reaching the viewport bottom.
///
/// The scroll-through distance is `container_height - viewport_height`. A container no taller
/// than the viewport jumps straight from `0` to `1` once its top is passed.
pub fn container_progress(
    page_offset: f64,
    container_top: f64,
    container_height: f64,
    viewport_height: f64,
) -> f64 {
    let travelled = page_offset - container_top;
    let distance = container_height - viewport_height;
    if distance <= 0.0 {
        return if travelled >= 0.0 { 1.0 } else { 0.0 };
    }
    clamp01(travelled / distance)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/policy.rs"]
mod tests;
