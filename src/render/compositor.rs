use std::sync::Arc;

use crate::{
    assets::decode::DecodedFrame,
    foundation::{
        core::{Affine, FrameIndex, Rect, Vec2, Viewport},
        error::{ReelError, ReelResult},
        math::premultiply_rgba8,
    },
    render::surface::{FrameRGBA, Surface},
};

/// Compositor settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSettings {
    /// Straight-alpha color the drawable area is cleared to before each frame.
    /// `None` clears to transparent.
    pub clear_rgba: Option<[u8; 4]>,
}

/// Result of a draw request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawOutcome {
    /// Image missing or viewport empty; previous pixels left untouched.
    Skipped,
    /// Frame drawn at `placement` (logical pixels).
    Drawn {
        /// Cover-fit destination rectangle.
        placement: Rect,
        /// Whether the backing buffer had to be reallocated first.
        reallocated: bool,
    },
}

/// "Cover" placement of an `image_w x image_h` image in a `view_w x view_h` area.
///
/// A relatively wider image fits the height and is centered horizontally (cropping left and
/// right); otherwise it fits the width and is centered vertically (cropping top and bottom).
pub fn cover_fit(image_w: f64, image_h: f64, view_w: f64, view_h: f64) -> Rect {
    let image_ratio = image_w / image_h;
    let view_ratio = view_w / view_h;

    let (dw, dh, dx, dy) = if image_ratio > view_ratio {
        let dh = view_h;
        let dw = dh * image_ratio;
        (dw, dh, (view_w - dw) / 2.0, 0.0)
    } else {
        let dw = view_w;
        let dh = dw / image_ratio;
        (dw, dh, 0.0, (view_h - dh) / 2.0)
    };

    Rect::new(dx, dy, dx + dw, dy + dh)
}

/// Draws decoded frames onto a DPR-aware [`Surface`].
#[derive(Debug)]
pub struct CanvasCompositor {
    settings: RenderSettings,
    surface: Surface,
}

impl CanvasCompositor {
    /// Compositor with an unallocated surface.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            surface: Surface::new(),
        }
    }

    /// Draw `image` (the decoded form of `frame`) covering `viewport`.
    ///
    /// A missing image is a no-op so the previous frame stays visible.
    pub fn draw(
        &mut self,
        frame: FrameIndex,
        image: Option<&Arc<DecodedFrame>>,
        viewport: Viewport,
    ) -> ReelResult<DrawOutcome> {
        let Some(image) = image else {
            return Ok(DrawOutcome::Skipped);
        };
        if !viewport.is_drawable() {
            return Ok(DrawOutcome::Skipped);
        }

        let (bw, bh) = viewport.backing_size();
        let reallocated = self.surface.ensure_size(bw, bh)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(image.pixmap())),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        let placement = cover_fit(
            f64::from(image.width),
            f64::from(image.height),
            viewport.width,
            viewport.height,
        );
        let to_device = Affine::scale(viewport.device_pixel_ratio)
            * Affine::translate(Vec2::new(placement.x0, placement.y0))
            * Affine::scale_non_uniform(
                placement.width() / f64::from(image.width),
                placement.height() / f64::from(image.height),
            );

        let (w, h) = self.surface.size();
        let mut ctx = vello_cpu::RenderContext::new(w as u16, h as u16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let clear = match self.settings.clear_rgba {
            Some([r, g, b, a]) => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(w),
                    f64::from(h),
                ));
                premultiply_rgba8(r, g, b, a)
            }
            None => [0, 0, 0, 0],
        };

        ctx.set_transform(affine_to_cpu(to_device));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        ctx.flush();

        self.surface.clear(clear);
        let pixmap = self
            .surface
            .pixmap_mut()
            .ok_or_else(|| ReelError::render("surface was not allocated"))?;
        ctx.render_to_pixmap(pixmap);
        tracing::trace!(frame = frame.0, reallocated, "frame drawn");

        Ok(DrawOutcome::Drawn {
            placement,
            reallocated,
        })
    }

    /// Backing surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Copy of the current pixels, `None` before anything was drawn.
    pub fn readback(&self) -> Option<FrameRGBA> {
        self.surface.readback()
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
