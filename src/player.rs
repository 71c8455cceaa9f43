use std::sync::Arc;

use crate::{
    assets::{
        preloader::{FramePreloader, LoadState, PollReport},
        source::FrameSource,
    },
    config::PlayerConfig,
    foundation::{
        core::{FrameIndex, Rect, Viewport},
        error::ReelResult,
    },
    playback::scheduler::{FrameScheduler, PlaybackState, SampleGate, SampleOutcome},
    render::{
        compositor::{CanvasCompositor, DrawOutcome},
        surface::{FrameRGBA, Surface},
    },
};

/// What one display-refresh tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickReport {
    /// The frame was drawn at `placement`.
    Drawn {
        /// Frame drawn.
        frame: FrameIndex,
        /// Cover-fit rectangle in logical pixels.
        placement: Rect,
    },
    /// The frame had no decoded image (or the draw failed); the previous frame stays visible.
    Skipped {
        /// Frame that was due.
        frame: FrameIndex,
    },
}

/// Scroll-synchronized frame-sequence player.
///
/// Owns the preloader, scheduler and compositor for its whole lifetime. Everything runs on the
/// owning thread: the host feeds scroll samples and resize events, calls [`tick`](Self::tick)
/// once per display refresh, and [`poll_loads`](Self::poll_loads) to pick up finished loads.
#[derive(Debug)]
pub struct ScrollPlayer {
    preloader: FramePreloader,
    scheduler: FrameScheduler,
    compositor: CanvasCompositor,
    viewport: Viewport,
    torn_down: bool,
}

impl ScrollPlayer {
    /// Validate `config` and start preloading from `source`.
    pub fn new(
        config: &PlayerConfig,
        source: Arc<dyn FrameSource>,
        viewport: Viewport,
    ) -> ReelResult<Self> {
        config.validate()?;
        let count = config.frames.count;
        let preloader = FramePreloader::start(source, count, config.preload_opts())?;
        Ok(Self {
            preloader,
            scheduler: FrameScheduler::new(config.policy, count),
            compositor: CanvasCompositor::new(config.render_settings()),
            viewport,
            torn_down: false,
        })
    }

    /// Apply finished loads; on the readiness edge the first frame is scheduled.
    pub fn poll_loads(&mut self) -> PollReport {
        if self.torn_down {
            return PollReport::default();
        }
        let report = self.preloader.poll();
        self.after_poll(report);
        report
    }

    /// Block until the frame set is ready or `limit` elapses.
    pub fn wait_ready(&mut self, limit: std::time::Duration) -> LoadState {
        if self.torn_down {
            return self.preloader.load_state();
        }
        let was_ready = self.preloader.is_ready();
        let state = self.preloader.wait_ready(limit);
        if !was_ready && state.ready {
            self.after_poll(PollReport {
                settled: 0,
                became_ready: true,
            });
        }
        state
    }

    fn after_poll(&mut self, report: PollReport) {
        if report.became_ready {
            self.scheduler.request_redraw();
        }
    }

    /// Feed a scroll sample (page offset or container progress, per the policy).
    pub fn on_scroll(&mut self, sample: f64) -> SampleOutcome {
        if self.torn_down {
            return SampleOutcome::Ignored;
        }
        let gate = SampleGate {
            ready: self.preloader.is_ready(),
            viewport_height: self.viewport.height,
        };
        self.scheduler.on_sample(sample, gate)
    }

    /// Re-sample viewport metrics and redraw the current frame when ready.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if self.torn_down {
            return;
        }
        self.viewport = viewport;
        if self.preloader.is_ready() {
            self.scheduler.request_redraw();
        }
    }

    /// Display-refresh tick: draw the pending frame, if any.
    ///
    /// Draw failures are logged and reported as skipped; they never stop playback.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.torn_down || !self.preloader.is_ready() {
            return None;
        }
        let frame = self.scheduler.on_tick()?;
        let image = self.preloader.image_at(frame);

        match self.compositor.draw(frame, image, self.viewport) {
            Ok(DrawOutcome::Drawn { placement, .. }) => Some(TickReport::Drawn { frame, placement }),
            Ok(DrawOutcome::Skipped) => {
                tracing::debug!(frame = frame.0, "frame not drawable, keeping previous");
                Some(TickReport::Skipped { frame })
            }
            Err(err) => {
                tracing::warn!(frame = frame.0, error = %err, "frame draw failed");
                Some(TickReport::Skipped { frame })
            }
        }
    }

    /// Stop listening for loads and drop any pending redraw. Later calls are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.preloader.teardown();
        self.scheduler.cancel();
        self.torn_down = true;
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Loader counters (`progress_percent`, `ready`).
    pub fn load_state(&self) -> LoadState {
        self.preloader.load_state()
    }

    /// Current/target frames.
    pub fn playback(&self) -> PlaybackState {
        self.scheduler.playback()
    }

    /// Frame waiting for the next tick.
    pub fn pending_frame(&self) -> Option<FrameIndex> {
        self.scheduler.pending()
    }

    /// Last sampled viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Drawing surface.
    pub fn surface(&self) -> &Surface {
        self.compositor.surface()
    }

    /// Copy of the current pixels.
    pub fn readback(&self) -> Option<FrameRGBA> {
        self.compositor.readback()
    }

    /// Underlying loader.
    pub fn preloader(&self) -> &FramePreloader {
        &self.preloader
    }
}

#[cfg(test)]
#[path = "../tests/unit/player/player.rs"]
mod tests;
