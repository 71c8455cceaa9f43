use std::io::Cursor;

use super::*;
use crate::assets::source::MemoryFrameSource;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn memory_source(count: u32, skip: &[u32]) -> MemoryFrameSource {
    let mut src = MemoryFrameSource::new();
    for i in 0..count {
        if skip.contains(&i) {
            continue;
        }
        src.insert(FrameIndex(i), png_bytes(4, 3, [i as u8, 0, 0, 255]));
    }
    src
}

/// Sleeps before serving `slow` indices.
struct SlowSource {
    inner: MemoryFrameSource,
    slow: Vec<u32>,
    delay: Duration,
}

impl FrameSource for SlowSource {
    fn fetch(&self, index: FrameIndex) -> ReelResult<Vec<u8>> {
        if self.slow.contains(&index.0) {
            std::thread::sleep(self.delay);
        }
        self.inner.fetch(index)
    }
}

#[test]
fn all_frames_load_and_gate_opens() {
    let src = Arc::new(memory_source(12, &[]));
    let mut pre = FramePreloader::start(
        src,
        12,
        PreloadOpts {
            threads: Some(3),
            timeout: None,
        },
    )
    .unwrap();

    let state = pre.wait_ready(Duration::from_secs(10));
    assert!(state.ready);
    assert_eq!(state.loaded, 12);
    assert_eq!(state.failed, 0);
    assert_eq!(pre.progress_percent(), 100);

    let frame = pre.image_at(FrameIndex(5)).unwrap();
    assert_eq!((frame.width, frame.height), (4, 3));
    assert_eq!(frame.rgba8_premul()[0], 5);
    assert!(pre.image_at(FrameIndex(12)).is_none());
}

#[test]
fn failed_slots_still_count_toward_readiness() {
    let mut src = memory_source(10, &[2, 7]);
    src.insert(FrameIndex(4), b"corrupt".to_vec());
    let mut pre = FramePreloader::start(Arc::new(src), 10, PreloadOpts::default()).unwrap();

    let state = pre.wait_ready(Duration::from_secs(10));
    assert!(state.ready);
    assert_eq!(state.settled, 10);
    assert_eq!(state.loaded, 7);
    assert_eq!(state.failed, 3);
    assert_eq!(state.progress_percent(), 100);

    assert!(matches!(
        pre.slot(FrameIndex(2)),
        Some(SlotState::Failed(FailReason::Fetch(_)))
    ));
    assert!(matches!(
        pre.slot(FrameIndex(4)),
        Some(SlotState::Failed(FailReason::Decode(_)))
    ));
    assert!(pre.image_at(FrameIndex(7)).is_none());
}

#[test]
fn progress_is_monotonic_and_ready_flips_once() {
    let src = SlowSource {
        inner: memory_source(20, &[]),
        slow: (0..20).step_by(3).collect(),
        delay: Duration::from_millis(15),
    };
    let mut pre = FramePreloader::start(
        Arc::new(src),
        20,
        PreloadOpts {
            threads: Some(2),
            timeout: None,
        },
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut last = 0u8;
    let mut flips = 0;
    while Instant::now() < deadline {
        let report = pre.poll();
        if report.became_ready {
            flips += 1;
        }
        let p = pre.progress_percent();
        assert!(p >= last, "progress went backwards: {last} -> {p}");
        last = p;
        if pre.is_ready() {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    assert!(pre.is_ready());
    assert_eq!(last, 100);
    for _ in 0..3 {
        assert!(!pre.poll().became_ready);
    }
    assert_eq!(flips, 1);
    assert!(pre.is_ready());
}

#[test]
fn stalled_loads_time_out_and_late_completions_are_ignored() {
    let src = SlowSource {
        inner: memory_source(6, &[]),
        slow: vec![3],
        delay: Duration::from_millis(600),
    };
    let mut pre = FramePreloader::start(
        Arc::new(src),
        6,
        PreloadOpts {
            threads: Some(6),
            timeout: Some(Duration::from_millis(150)),
        },
    )
    .unwrap();

    let state = pre.wait_ready(Duration::from_secs(5));
    assert!(state.ready);
    assert_eq!(state.failed, 1);
    assert!(matches!(
        pre.slot(FrameIndex(3)),
        Some(SlotState::Failed(FailReason::TimedOut))
    ));

    std::thread::sleep(Duration::from_millis(700));
    let report = pre.poll();
    assert_eq!(report.settled, 0);
    assert!(!report.became_ready);
    assert!(pre.image_at(FrameIndex(3)).is_none());
    assert_eq!(pre.load_state(), state);
}

#[test]
fn queued_loads_are_not_on_the_timeout_clock() {
    let src = SlowSource {
        inner: memory_source(10, &[]),
        slow: (0..10).collect(),
        delay: Duration::from_millis(60),
    };
    let mut pre = FramePreloader::start(
        Arc::new(src),
        10,
        PreloadOpts {
            threads: Some(1),
            timeout: Some(Duration::from_millis(250)),
        },
    )
    .unwrap();

    let state = pre.wait_ready(Duration::from_secs(5));
    assert!(state.ready);
    assert_eq!(state.failed, 0);
    assert_eq!(state.loaded, 10);
}

#[test]
fn stalled_fetch_times_out_without_failing_the_queue_behind_it() {
    let src = SlowSource {
        inner: memory_source(4, &[]),
        slow: vec![0],
        delay: Duration::from_millis(400),
    };
    let mut pre = FramePreloader::start(
        Arc::new(src),
        4,
        PreloadOpts {
            threads: Some(1),
            timeout: Some(Duration::from_millis(100)),
        },
    )
    .unwrap();

    let state = pre.wait_ready(Duration::from_secs(5));
    assert!(state.ready);
    assert!(matches!(
        pre.slot(FrameIndex(0)),
        Some(SlotState::Failed(FailReason::TimedOut))
    ));
    assert_eq!(state.failed, 1);
    assert_eq!(state.loaded, 3);
    assert!(pre.image_at(FrameIndex(3)).is_some());
}

#[test]
fn teardown_discards_in_flight_completions() {
    let src = SlowSource {
        inner: memory_source(4, &[]),
        slow: vec![0, 1, 2, 3],
        delay: Duration::from_millis(100),
    };
    let mut pre = FramePreloader::start(Arc::new(src), 4, PreloadOpts::default()).unwrap();
    pre.teardown();
    assert!(pre.is_torn_down());

    std::thread::sleep(Duration::from_millis(250));
    assert_eq!(pre.poll(), PollReport::default());
    assert_eq!(pre.load_state().settled, 0);
    assert!(!pre.is_ready());

    pre.teardown();
    assert!(pre.is_torn_down());
}

#[test]
fn zero_frames_and_zero_threads_are_rejected() {
    let src: Arc<dyn FrameSource> = Arc::new(MemoryFrameSource::new());
    assert!(FramePreloader::start(Arc::clone(&src), 0, PreloadOpts::default()).is_err());
    assert!(
        FramePreloader::start(
            src,
            3,
            PreloadOpts {
                threads: Some(0),
                timeout: None,
            },
        )
        .is_err()
    );
}
