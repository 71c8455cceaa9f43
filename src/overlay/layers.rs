use crate::{
    foundation::core::{Affine, Vec2},
    overlay::transform::ScrollTransform,
};

/// Viewport height assumed before layout reports a real one.
pub const FALLBACK_VIEWPORT_HEIGHT: f64 = 1000.0;

/// Style of one overlay layer at a given scroll position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct OverlayStyle {
    /// `0..=1`.
    pub opacity: f64,
    /// Vertical offset in logical pixels.
    pub translate_y: f64,
    /// Uniform scale.
    pub scale: f64,
}

impl OverlayStyle {
    /// Whether the layer contributes anything.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Placement transform: scale about `anchor`, then shift vertically.
    pub fn to_affine(&self, anchor: Vec2) -> Affine {
        Affine::translate(Vec2::new(0.0, self.translate_y))
            * Affine::translate(anchor)
            * Affine::scale(self.scale)
            * Affine::translate(-anchor)
    }
}

/// A text overlay whose opacity, offset and scale follow the scroll signal.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayLayer {
    /// Stable identifier.
    pub name: String,
    /// Opacity over scroll.
    pub opacity: ScrollTransform,
    /// Vertical offset over scroll.
    pub translate_y: ScrollTransform,
    /// Scale over scroll; `1` when absent.
    #[serde(default)]
    pub scale: Option<ScrollTransform>,
}

impl OverlayLayer {
    /// Evaluate every bound property at `scroll`.
    pub fn sample(&self, scroll: f64) -> OverlayStyle {
        OverlayStyle {
            opacity: self.opacity.sample(scroll).clamp(0.0, 1.0),
            translate_y: self.translate_y.sample(scroll),
            scale: self.scale.as_ref().map_or(1.0, |s| s.sample(scroll)),
        }
    }
}

fn fading_layer(name: &str, fade: [f64; 4], drift: [f64; 2], offsets: [f64; 2]) -> OverlayLayer {
    OverlayLayer {
        name: name.to_string(),
        opacity: ScrollTransform::fixed(&fade, &[0.0, 1.0, 1.0, 0.0]),
        translate_y: ScrollTransform::fixed(&drift, &offsets),
        scale: None,
    }
}

/// Layers pinned over the whole-page player, driven by absolute scroll offset.
///
/// Breakpoints are expressed in viewport heights; an unknown height uses
/// [`FALLBACK_VIEWPORT_HEIGHT`].
pub fn hero_layers(viewport_height: f64) -> Vec<OverlayLayer> {
    let h = if viewport_height.is_finite() && viewport_height > 0.0 {
        viewport_height
    } else {
        FALLBACK_VIEWPORT_HEIGHT
    };

    let title = OverlayLayer {
        name: "title".to_string(),
        opacity: ScrollTransform::fixed(&[0.0, h * 0.5, h * 0.8], &[1.0, 1.0, 0.0]),
        translate_y: ScrollTransform::fixed(&[0.0, h * 0.8], &[0.0, -50.0]),
        scale: Some(ScrollTransform::fixed(&[0.0, h * 0.8], &[1.0, 0.9])),
    };

    vec![
        title,
        fading_layer(
            "responsive",
            [h * 0.9, h * 1.1, h * 1.6, h * 1.8],
            [h * 0.9, h * 1.8],
            [50.0, -50.0],
        ),
        fading_layer(
            "modern_web",
            [h * 1.9, h * 2.1, h * 2.6, h * 2.8],
            [h * 1.9, h * 2.8],
            [50.0, -50.0],
        ),
        fading_layer(
            "call_to_action",
            [h * 2.9, h * 3.1, h * 3.6, h * 3.8],
            [h * 2.9, h * 3.8],
            [30.0, -30.0],
        ),
    ]
}

/// Layers scoped to a sticky container, driven by its normalized progress.
pub fn section_layers() -> Vec<OverlayLayer> {
    vec![
        fading_layer("intro", [0.0, 0.05, 0.18, 0.22], [0.0, 0.22], [30.0, -60.0]),
        fading_layer("scalable", [0.26, 0.30, 0.44, 0.48], [0.26, 0.48], [40.0, -40.0]),
        fading_layer(
            "infrastructure",
            [0.54, 0.58, 0.72, 0.76],
            [0.54, 0.76],
            [40.0, -40.0],
        ),
        fading_layer("production", [0.78, 0.82, 0.92, 0.96], [0.78, 0.96], [30.0, -30.0]),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/layers.rs"]
mod tests;
