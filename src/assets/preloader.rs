use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError, TryRecvError},
    },
    time::{Duration, Instant},
};

use crate::{
    assets::{
        decode::{DecodedFrame, decode_frame},
        source::FrameSource,
    },
    foundation::{
        core::FrameIndex,
        error::{ReelError, ReelResult},
        math::percent,
    },
};

/// Why a slot ended up without an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailReason {
    /// The source could not produce bytes.
    Fetch(String),
    /// Bytes were fetched but did not decode.
    Decode(String),
    /// The load did not settle before the configured timeout.
    TimedOut,
}

/// Per-frame load state. Transitions only `Pending -> Loaded | Failed`.
#[derive(Clone, Debug)]
pub enum SlotState {
    /// Load in flight.
    Pending,
    /// Decoded and ready to draw.
    Loaded(Arc<DecodedFrame>),
    /// Permanently empty; never retried.
    Failed(FailReason),
}

impl SlotState {
    /// `true` once the slot is `Loaded` or `Failed`.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Aggregate load counters over the whole frame set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadState {
    /// Number of slots in the set.
    pub total: u32,
    /// Slots that are `Loaded` or `Failed`. Monotonic.
    pub settled: u32,
    /// Slots that decoded successfully.
    pub loaded: u32,
    /// Slots that failed or timed out.
    pub failed: u32,
    /// One-shot readiness gate: `settled == total`.
    pub ready: bool,
}

impl LoadState {
    /// `round(settled / total * 100)`.
    pub fn progress_percent(&self) -> u8 {
        percent(self.settled as usize, self.total as usize)
    }
}

/// Loader options.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreloadOpts {
    /// Worker thread count. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Slots whose fetch has been running this long are failed with [`FailReason::TimedOut`].
    /// Loads still queued behind busy workers are not on the clock.
    pub timeout: Option<Duration>,
}

/// What a call to [`FramePreloader::poll`] changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Slots settled during this poll.
    pub settled: u32,
    /// `true` only on the poll that flipped readiness.
    pub became_ready: bool,
}

enum LoadEvent {
    Started {
        index: FrameIndex,
        at: Instant,
    },
    Settled {
        index: FrameIndex,
        outcome: Result<DecodedFrame, FailReason>,
    },
}

/// Fetches and decodes every frame of a sequence concurrently.
///
/// Workers run on a dedicated rayon pool and post completions over a channel; slot state is
/// only mutated by the owning thread inside [`poll`](Self::poll). After
/// [`teardown`](Self::teardown) late completions are discarded.
pub struct FramePreloader {
    slots: Vec<SlotState>,
    fetch_started: Vec<Option<Instant>>,
    state: LoadState,
    completions: Option<mpsc::Receiver<LoadEvent>>,
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
    timeout: Option<Duration>,
    _pool: rayon::ThreadPool,
}

impl std::fmt::Debug for FramePreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePreloader")
            .field("state", &self.state)
            .field("torn_down", &self.completions.is_none())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FramePreloader {
    /// Issue all `count` loads at once. No throttling beyond the pool size.
    #[tracing::instrument(skip(source))]
    pub fn start(
        source: Arc<dyn FrameSource>,
        count: u32,
        opts: PreloadOpts,
    ) -> ReelResult<Self> {
        if count == 0 {
            return Err(ReelError::validation("frame count must be > 0"));
        }

        let pool = build_thread_pool(opts.threads)?;
        let (tx, rx) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        for i in 0..count {
            let tx = tx.clone();
            let source = Arc::clone(&source);
            let cancelled = Arc::clone(&cancelled);
            pool.spawn(move || {
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let index = FrameIndex(i);
                // The receiver is gone after teardown.
                let _ = tx.send(LoadEvent::Started {
                    index,
                    at: Instant::now(),
                });
                let outcome = load_one(source.as_ref(), index);
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let _ = tx.send(LoadEvent::Settled { index, outcome });
            });
        }

        Ok(Self {
            slots: vec![SlotState::Pending; count as usize],
            fetch_started: vec![None; count as usize],
            state: LoadState {
                total: count,
                ..LoadState::default()
            },
            completions: Some(rx),
            cancelled,
            started_at: Instant::now(),
            timeout: opts.timeout,
            _pool: pool,
        })
    }

    /// Apply completions that have arrived so far.
    pub fn poll(&mut self) -> PollReport {
        self.poll_at(Instant::now())
    }

    /// Like [`poll`](Self::poll), evaluating the load timeout against `now`.
    pub fn poll_at(&mut self, now: Instant) -> PollReport {
        let mut report = PollReport::default();
        let Some(rx) = self.completions.as_ref() else {
            return report;
        };

        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        for ev in events {
            if self.apply(ev) {
                report.settled += 1;
            }
        }

        report.settled += self.expire_overdue(now);
        report.became_ready = self.update_ready();
        report
    }

    /// Block until every slot settles or `limit` elapses. Returns the resulting state.
    pub fn wait_ready(&mut self, limit: Duration) -> LoadState {
        let deadline = Instant::now() + limit;
        loop {
            let _ = self.poll();
            if self.state.ready {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let mut wait = deadline - now;
            if let Some(expires_at) = self.next_expiry() {
                wait = wait.min(expires_at.saturating_duration_since(now));
            }

            let Some(rx) = self.completions.as_ref() else {
                break;
            };
            let received = rx.recv_timeout(wait);
            match received {
                Ok(ev) => {
                    let _ = self.apply(ev);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = self.poll();
                    break;
                }
            }
        }
        self.state
    }

    /// Stop listening for in-flight completions. Idempotent.
    pub fn teardown(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if self.completions.take().is_some() {
            tracing::debug!(
                settled = self.state.settled,
                total = self.state.total,
                "frame preloader torn down"
            );
        }
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.completions.is_none()
    }

    /// Aggregate counters.
    pub fn load_state(&self) -> LoadState {
        self.state
    }

    /// `0..=100`, non-decreasing.
    pub fn progress_percent(&self) -> u8 {
        self.state.progress_percent()
    }

    /// One-shot readiness gate.
    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    /// Number of frames in the set.
    pub fn frame_count(&self) -> u32 {
        self.state.total
    }

    /// Slot state, `None` when out of range.
    pub fn slot(&self, index: FrameIndex) -> Option<&SlotState> {
        self.slots.get(index.as_usize())
    }

    /// Decoded image for `index`; `None` for out-of-range, pending or failed slots.
    pub fn image_at(&self, index: FrameIndex) -> Option<&Arc<DecodedFrame>> {
        match self.slots.get(index.as_usize()) {
            Some(SlotState::Loaded(frame)) => Some(frame),
            _ => None,
        }
    }

    fn apply(&mut self, ev: LoadEvent) -> bool {
        match ev {
            LoadEvent::Started { index, at } => {
                if let Some(started) = self.fetch_started.get_mut(index.as_usize()) {
                    *started = Some(at);
                }
                false
            }
            LoadEvent::Settled { index, outcome } => self.settle(index, outcome),
        }
    }

    /// Earliest instant at which an in-flight fetch runs past the timeout.
    fn next_expiry(&self) -> Option<Instant> {
        let timeout = self.timeout?;
        self.slots
            .iter()
            .zip(&self.fetch_started)
            .filter(|(slot, _)| !slot.is_settled())
            .filter_map(|(_, started)| started.map(|at| at + timeout))
            .min()
    }

    fn settle(&mut self, index: FrameIndex, outcome: Result<DecodedFrame, FailReason>) -> bool {
        let Some(slot) = self.slots.get_mut(index.as_usize()) else {
            return false;
        };
        if slot.is_settled() {
            return false;
        }

        match outcome {
            Ok(frame) => {
                tracing::debug!(index = index.0, w = frame.width, h = frame.height, "frame loaded");
                *slot = SlotState::Loaded(Arc::new(frame));
                self.state.loaded += 1;
            }
            Err(reason) => {
                tracing::warn!(index = index.0, ?reason, "frame failed to load");
                *slot = SlotState::Failed(reason);
                self.state.failed += 1;
            }
        }
        self.state.settled += 1;
        true
    }

    fn expire_overdue(&mut self, now: Instant) -> u32 {
        let Some(timeout) = self.timeout else {
            return 0;
        };

        let overdue: Vec<FrameIndex> = self
            .slots
            .iter()
            .zip(&self.fetch_started)
            .enumerate()
            .filter(|(_, (slot, started))| {
                !slot.is_settled()
                    && started.is_some_and(|at| now.saturating_duration_since(at) >= timeout)
            })
            .map(|(i, _)| FrameIndex(i as u32))
            .collect();

        let mut expired = 0u32;
        for index in overdue {
            if self.settle(index, Err(FailReason::TimedOut)) {
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::warn!(expired, ?timeout, "frame loads timed out");
        }
        expired
    }

    fn update_ready(&mut self) -> bool {
        if self.state.ready || self.state.settled < self.state.total {
            return false;
        }
        self.state.ready = true;
        tracing::info!(
            loaded = self.state.loaded,
            failed = self.state.failed,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "frame set ready"
        );
        true
    }
}

impl Drop for FramePreloader {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

fn load_one(source: &dyn FrameSource, index: FrameIndex) -> Result<DecodedFrame, FailReason> {
    let bytes = source
        .fetch(index)
        .map_err(|e| FailReason::Fetch(e.to_string()))?;
    decode_frame(&bytes).map_err(|e| FailReason::Decode(e.to_string()))
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "loader 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("reel-load-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::load(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/preloader.rs"]
mod tests;
