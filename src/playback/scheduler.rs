use crate::{
    foundation::core::FrameIndex,
    playback::policy::{MappingPolicy, frame_for_progress},
};

/// Last drawn and last computed frame. Both stay within `[0, N - 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PlaybackState {
    /// Frame most recently handed out for drawing.
    pub current: FrameIndex,
    /// Frame computed from the latest accepted sample.
    pub target: FrameIndex,
}

/// Conditions a sample must satisfy before it is mapped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleGate {
    /// Frame set readiness.
    pub ready: bool,
    /// Current logical viewport height; `0` while unknown.
    pub viewport_height: f64,
}

/// Result of feeding one scroll sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Not ready yet, or the viewport height is unknown.
    Ignored,
    /// Maps to the frame already scheduled; nothing to do.
    Unchanged(FrameIndex),
    /// A redraw for this frame is now pending.
    Scheduled(FrameIndex),
    /// Replaced an earlier pending redraw that had not run yet.
    Coalesced(FrameIndex),
}

/// Scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    /// Samples fed in.
    pub samples: u64,
    /// Samples dropped by the gate.
    pub ignored: u64,
    /// Pending redraws superseded before their tick.
    pub coalesced: u64,
    /// Ticks that produced a draw.
    pub draws: u64,
}

/// Maps scroll samples to frames and keeps at most one redraw pending.
///
/// Samples can arrive far faster than the display refreshes. Each accepted sample overwrites
/// the single pending slot, so the next [`on_tick`](Self::on_tick) always draws the most recent
/// target and never a backlog.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    policy: MappingPolicy,
    frame_count: u32,
    playback: PlaybackState,
    last_scheduled: FrameIndex,
    pending: Option<FrameIndex>,
    stats: SchedulerStats,
}

impl FrameScheduler {
    /// Start at frame `0` with nothing pending.
    pub fn new(policy: MappingPolicy, frame_count: u32) -> Self {
        Self {
            policy,
            frame_count,
            playback: PlaybackState::default(),
            last_scheduled: FrameIndex(0),
            pending: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Active mapping policy.
    pub fn policy(&self) -> MappingPolicy {
        self.policy
    }

    /// Feed one scroll sample (pixels or progress, depending on the policy).
    pub fn on_sample(&mut self, sample: f64, gate: SampleGate) -> SampleOutcome {
        self.stats.samples += 1;

        let range = if gate.ready {
            self.policy.range(gate.viewport_height)
        } else {
            None
        };
        let Some(range) = range else {
            self.stats.ignored += 1;
            return SampleOutcome::Ignored;
        };

        let target = frame_for_progress(range.progress(sample), self.frame_count);
        self.playback.target = target;

        if target == self.last_scheduled {
            return SampleOutcome::Unchanged(target);
        }
        self.last_scheduled = target;

        let replaced = self.pending.replace(target).is_some();
        tracing::trace!(sample, frame = target.0, replaced, "redraw scheduled");
        if replaced {
            self.stats.coalesced += 1;
            SampleOutcome::Coalesced(target)
        } else {
            SampleOutcome::Scheduled(target)
        }
    }

    /// Display-refresh tick: hand out the pending redraw, if any.
    pub fn on_tick(&mut self) -> Option<FrameIndex> {
        let frame = self.pending.take()?;
        self.playback.current = frame;
        self.stats.draws += 1;
        Some(frame)
    }

    /// Schedule a redraw of the current frame (initial render, resize).
    pub fn request_redraw(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.playback.current);
        }
    }

    /// Drop any pending redraw.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Frame waiting for the next tick.
    pub fn pending(&self) -> Option<FrameIndex> {
        self.pending
    }

    /// Current/target frames.
    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Counters since construction.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
