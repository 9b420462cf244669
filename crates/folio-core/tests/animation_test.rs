//! Integration tests for the animation module.

use folio_core::Duration;
use folio_core::animation::*;
use proptest::prelude::*;

#[test]
fn monotonic_easings_never_decrease() {
    for easing in [linear, ease_out, ease_in_out] {
        let mut prev = 0.0f32;
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            let v = easing(t);
            assert!(v >= prev - 1e-6, "easing decreased at t={t}: {prev} -> {v}");
            prev = v;
        }
    }
}

#[test]
fn staggered_tweens_finish_in_order() {
    let base = Tween::new(Duration::from_millis(450)).easing(ease_out);
    let items: Vec<Tween> = (0..4)
        .map(|i| base.delay(Duration::from_millis(150 + i * 80)))
        .collect();
    let at = Duration::from_millis(700);
    let values: Vec<f32> = items.iter().map(|t| t.sample(at)).collect();
    for pair in values.windows(2) {
        assert!(pair[0] >= pair[1], "earlier item should lead: {values:?}");
    }
}

#[test]
fn spring_tracks_moving_target() {
    let mut spring = Spring::cursor(0.0);
    for step in 1..=20 {
        spring.set_target(f64::from(step) * 10.0);
        spring.advance(Duration::from_millis(16));
    }
    for _ in 0..120 {
        spring.advance(Duration::from_millis(16));
    }
    assert_eq!(spring.position(), 200.0);
}

proptest! {
    #[test]
    fn lerp_clamped_stays_in_range(x in -1e6f64..1e6, d1 in 1.0f64..5000.0) {
        let v = lerp_clamped(x, (0.0, d1), (1.0, 0.0));
        prop_assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn tween_sample_bounded(ms in 0u64..10_000, delay in 0u64..2_000) {
        let tween = Tween::new(Duration::from_millis(600))
            .delay(Duration::from_millis(delay))
            .easing(ease_out);
        let v = tween.sample(Duration::from_millis(ms));
        prop_assert!((0.0..=1.0).contains(&v));
    }
}
