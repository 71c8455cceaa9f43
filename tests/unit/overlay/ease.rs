use super::*;

#[test]
fn endpoints_are_fixed_for_every_curve() {
    for ease in [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
    ] {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
    }
}

#[test]
fn inputs_are_clamped() {
    assert_eq!(Ease::InQuad.apply(-1.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(3.0), 1.0);
}

#[test]
fn in_out_curves_are_symmetric_at_midpoint() {
    assert_eq!(Ease::InOutQuad.apply(0.5), 0.5);
    assert_eq!(Ease::InOutCubic.apply(0.5), 0.5);
    assert!(Ease::InQuad.apply(0.5) < 0.5);
    assert!(Ease::OutQuad.apply(0.5) > 0.5);
}
