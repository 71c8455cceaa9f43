use super::*;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Arc<DecodedFrame> {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        data.extend_from_slice(&premultiply_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    }
    Arc::new(DecodedFrame::from_premul_rgba8(w, h, &data).unwrap())
}

fn assert_rect_close(got: Rect, want: Rect) {
    let eps = 1e-9;
    assert!(
        (got.x0 - want.x0).abs() < eps
            && (got.y0 - want.y0).abs() < eps
            && (got.x1 - want.x1).abs() < eps
            && (got.y1 - want.y1).abs() < eps,
        "{got:?} != {want:?}"
    );
}

#[test]
fn wide_image_in_narrow_viewport_fits_height() {
    // 16:9 image, 4:3 viewport: scaled to viewport height, cropped left/right.
    let r = cover_fit(1920.0, 1080.0, 800.0, 600.0);
    let dw = 600.0 * (1920.0 / 1080.0);
    assert_rect_close(r, Rect::new((800.0 - dw) / 2.0, 0.0, (800.0 + dw) / 2.0, 600.0));
    assert!(r.x0 < 0.0 && r.x1 > 800.0);
    assert_eq!(r.height(), 600.0);
}

#[test]
fn narrow_image_in_wide_viewport_fits_width() {
    // 4:3 image, 16:9 viewport: scaled to viewport width, cropped top/bottom.
    let r = cover_fit(1024.0, 768.0, 1600.0, 900.0);
    assert_rect_close(r, Rect::new(0.0, -150.0, 1600.0, 1050.0));
}

#[test]
fn equal_ratio_fills_exactly() {
    let r = cover_fit(400.0, 300.0, 800.0, 600.0);
    assert_rect_close(r, Rect::new(0.0, 0.0, 800.0, 600.0));
}

#[test]
fn draw_fills_surface_at_device_resolution() {
    let mut c = CanvasCompositor::new(RenderSettings::default());
    let img = solid(4, 3, [0, 255, 0, 255]);
    let vp = Viewport::new(8.0, 6.0, 2.0);

    let out = c.draw(FrameIndex(0), Some(&img), vp).unwrap();
    let DrawOutcome::Drawn {
        placement,
        reallocated,
    } = out
    else {
        panic!("expected a draw");
    };
    assert!(reallocated);
    assert_rect_close(placement, Rect::new(0.0, 0.0, 8.0, 6.0));

    let frame = c.readback().unwrap();
    assert_eq!((frame.width, frame.height), (16, 12));
    assert_eq!(frame.pixel(8, 6), Some([0, 255, 0, 255]));
    assert_eq!(frame.pixel(0, 0).map(|p| p[3]), Some(255));
}

#[test]
fn buffer_is_reused_until_viewport_changes() {
    let mut c = CanvasCompositor::new(RenderSettings::default());
    let img = solid(4, 3, [255, 0, 0, 255]);
    let vp = Viewport::new(8.0, 6.0, 1.0);

    let first = c.draw(FrameIndex(0), Some(&img), vp).unwrap();
    let second = c.draw(FrameIndex(0), Some(&img), vp).unwrap();
    assert!(matches!(first, DrawOutcome::Drawn { reallocated: true, .. }));
    assert!(matches!(second, DrawOutcome::Drawn { reallocated: false, .. }));

    let resized = c
        .draw(FrameIndex(0), Some(&img), Viewport::new(8.0, 6.0, 1.5))
        .unwrap();
    assert!(matches!(resized, DrawOutcome::Drawn { reallocated: true, .. }));
    assert_eq!(c.surface().size(), (12, 9));
    assert_eq!(c.surface().allocations(), 2);
}

#[test]
fn missing_image_keeps_previous_pixels() {
    let mut c = CanvasCompositor::new(RenderSettings::default());
    let img = solid(2, 2, [0, 0, 255, 255]);
    let vp = Viewport::new(4.0, 4.0, 1.0);
    c.draw(FrameIndex(3), Some(&img), vp).unwrap();
    let before = c.readback().unwrap();

    assert_eq!(c.draw(FrameIndex(4), None, vp).unwrap(), DrawOutcome::Skipped);
    let after = c.readback().unwrap();
    assert_eq!(before.data, after.data);
}

#[test]
fn empty_viewport_is_skipped() {
    let mut c = CanvasCompositor::new(RenderSettings::default());
    let img = solid(2, 2, [0, 0, 255, 255]);
    let out = c
        .draw(FrameIndex(0), Some(&img), Viewport::new(10.0, 0.0, 1.0))
        .unwrap();
    assert_eq!(out, DrawOutcome::Skipped);
    assert!(c.readback().is_none());
}

#[test]
fn clear_color_shows_through_transparent_frames() {
    let mut c = CanvasCompositor::new(RenderSettings {
        clear_rgba: Some([18, 18, 18, 255]),
    });
    let opaque = solid(2, 2, [200, 0, 0, 255]);
    let clear = solid(2, 2, [0, 0, 0, 0]);
    let vp = Viewport::new(4.0, 4.0, 1.0);

    c.draw(FrameIndex(0), Some(&opaque), vp).unwrap();
    c.draw(FrameIndex(1), Some(&clear), vp).unwrap();
    let frame = c.readback().unwrap();
    assert_eq!(frame.pixel(2, 2), Some([18, 18, 18, 255]));
}

#[test]
fn draw_paints_straight_from_the_decoded_pixmap() {
    let mut c = CanvasCompositor::new(RenderSettings::default());
    let img = solid(4, 3, [0, 0, 255, 255]);
    let vp = Viewport::new(8.0, 6.0, 1.0);

    for _ in 0..3 {
        c.draw(FrameIndex(0), Some(&img), vp).unwrap();
    }
    // No per-frame copy is retained after drawing.
    assert_eq!(Arc::strong_count(img.pixmap()), 1);
    assert_eq!(c.readback().unwrap().pixel(4, 3), Some([0, 0, 255, 255]));
}
