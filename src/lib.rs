//! scrollreel is a scroll-synchronized image-sequence player.
//!
//! A numbered sequence of raster frames is preloaded up front, a scroll signal selects the
//! frame to show, and the selected frame is drawn onto a DPR-aware CPU surface with a
//! "cover" fit.
//!
//! # Pipeline overview
//!
//! 1. **Preload**: `FrameSource -> FramePreloader` (all frames fetched and decoded concurrently;
//!    failures and timeouts still count toward readiness)
//! 2. **Schedule**: `scroll sample -> MappingPolicy -> FrameIndex` (at most one redraw pending,
//!    always the latest target)
//! 3. **Composite**: `DecodedFrame + Viewport -> Surface` (cover fit, buffer reused until the
//!    viewport changes)
//!
//! [`ScrollPlayer`] wires the three together and is driven by the host: scroll samples,
//! resize events, one [`ScrollPlayer::tick`] per display refresh.
//!
//! The overlay module carries the pure scroll-to-style transforms used by the text layers
//! that sit on top of the player.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single owner**: loader workers only post completions; all state is mutated by the thread
//!   that owns the player.
//! - **Never fatal**: a missing frame leaves the previous one on screen; out-of-range scroll
//!   values clamp.
//! - **Premultiplied RGBA8** end-to-end: decoded frames and surfaces hold premultiplied pixels.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod foundation;
mod overlay;
mod playback;
mod player;
mod render;

pub use assets::decode::{DecodedFrame, decode_frame};
pub use assets::preloader::{
    FailReason, FramePreloader, LoadState, PollReport, PreloadOpts, SlotState,
};
pub use assets::source::{DirFrameSource, FrameSetSpec, FrameSource, MemoryFrameSource};
pub use config::{ENV_LOAD_TIMEOUT_MS, ENV_THREADS, PlayerConfig};
pub use foundation::core::{Affine, FrameIndex, Rect, Vec2, Viewport};
pub use foundation::error::{ReelError, ReelResult};
pub use overlay::ease::Ease;
pub use overlay::layers::{
    FALLBACK_VIEWPORT_HEIGHT, OverlayLayer, OverlayStyle, hero_layers, section_layers,
};
pub use overlay::transform::ScrollTransform;
pub use playback::policy::{MappingPolicy, ScrollRange, container_progress, frame_for_progress};
pub use playback::scheduler::{
    FrameScheduler, PlaybackState, SampleGate, SampleOutcome, SchedulerStats,
};
pub use player::{ScrollPlayer, TickReport};
pub use render::compositor::{CanvasCompositor, DrawOutcome, RenderSettings, cover_fit};
pub use render::surface::{FrameRGBA, Surface};
