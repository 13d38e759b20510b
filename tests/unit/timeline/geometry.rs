use super::*;

#[test]
fn progress_runs_from_zero_to_one_across_scroll_range() {
    // 3000px region in a 1000px viewport: 2000px of scroll.
    assert_eq!(scroll_progress(0.0, 2000.0), 0.0);
    assert_eq!(scroll_progress(250.0, 2000.0), 0.0);
    assert_eq!(scroll_progress(-500.0, 2000.0), 0.25);
    assert_eq!(scroll_progress(-2000.0, 2000.0), 1.0);
    assert_eq!(scroll_progress(-9000.0, 2000.0), 1.0);
}

#[test]
fn no_scroll_range_is_always_complete() {
    for top in [-500.0, 0.0, 10.0, 1e9] {
        assert_eq!(scroll_progress(top, 0.0), 1.0);
        assert_eq!(scroll_progress(top, -300.0), 1.0);
    }
}

#[test]
fn progress_is_rounded_to_micro_units() {
    let p = scroll_progress(-1.0, 3.0);
    assert_eq!(p, 0.333_333);
}

#[test]
fn geometry_measures_relative_to_scroll_port() {
    let g = ScrollGeometry::measure(
        Rect::new(0.0, -400.0, 800.0, 2600.0),
        Rect::new(0.0, 100.0, 800.0, 1100.0),
    );
    assert_eq!(g.tracked_height, 3000.0);
    assert_eq!(g.viewport_height, 1000.0);
    assert_eq!(g.viewport_offset, 100.0);
    assert_eq!(g.scroll_distance(), 2000.0);
    // Region top at -900 is 1000px above the port top.
    assert_eq!(g.progress_at(-900.0), 0.5);
}

#[test]
fn change_threshold_ignores_jitter() {
    assert!(!progress_changed(0.5, 0.5));
    assert!(!progress_changed(0.5, 0.50005));
    assert!(progress_changed(0.5, 0.5002));
    assert!(progress_changed(0.5, 0.4998));
}
