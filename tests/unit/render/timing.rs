use super::*;
use crate::scene::model::Waypoint;

fn line(id: &str, delay_ms: u64, duration_ms: u64) -> Route {
    Route::new(id, vec![Waypoint::new(0.0, 0.0), Waypoint::new(10.0, 0.0)])
        .with_timing(delay_ms, duration_ms)
}

#[test]
fn window_is_zero_before_one_after_linear_between() {
    let w = RouteWindow::for_animation(
        &RouteAnimation {
            delay_ms: 2_500,
            duration_ms: 5_000,
            easing: None,
        },
        10_000.0,
    );
    assert_eq!(w, RouteWindow { start: 0.25, end: 0.75 });
    assert_eq!(w.local_progress(0.0), 0.0);
    assert_eq!(w.local_progress(0.25), 0.0);
    assert_eq!(w.local_progress(0.375), 0.25);
    assert_eq!(w.local_progress(0.5), 0.5);
    assert_eq!(w.local_progress(0.75), 1.0);
    assert_eq!(w.local_progress(1.0), 1.0);
}

#[test]
fn zero_duration_route_jumps() {
    let w = RouteWindow::for_animation(
        &RouteAnimation {
            delay_ms: 5_000,
            duration_ms: 0,
            easing: None,
        },
        10_000.0,
    );
    assert_eq!(w.local_progress(0.5), 0.0);
    assert_eq!(w.local_progress(0.500_001), 1.0);
    assert_eq!(w.local_progress(0.499), 0.0);
}

#[test]
fn empty_timeline_collapses_windows() {
    let w = RouteWindow::for_animation(&RouteAnimation::default(), 0.0);
    assert_eq!(w, RouteWindow { start: 0.0, end: 0.0 });
    assert_eq!(w.local_progress(0.0), 0.0);
}

#[test]
fn two_sequential_routes_at_quarter_progress() {
    let routes = vec![line("r1", 0, 5_000), line("r2", 5_000, 5_000)];
    let resolved = resolve_routes(&routes, 0.25, 10_000.0, Ease::Linear);
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].route.id, "r1");
    assert_eq!(resolved[0].progress, 0.5);
    assert_eq!(resolved[1].route.id, "r2");
    assert_eq!(resolved[1].progress, 0.0);
}

#[test]
fn per_route_easing_overrides_global() {
    let mut eased = line("eased", 0, 10_000);
    eased.animation.easing = Some(Ease::InQuad);
    let plain = line("plain", 0, 10_000);
    let routes = vec![eased, plain];

    let resolved = resolve_routes(&routes, 0.5, 10_000.0, Ease::OutQuad);
    assert_eq!(resolved[0].progress, 0.25);
    assert_eq!(resolved[1].progress, 0.75);
}

#[test]
fn skips_hidden_and_short_routes() {
    let mut hidden = line("hidden", 0, 1_000);
    hidden.visible = false;
    let short = Route::new("short", vec![Waypoint::new(1.0, 1.0)]);
    let routes = vec![hidden, short, line("ok", 0, 1_000)];

    let resolved = resolve_routes(&routes, 1.0, 1_000.0, Ease::Linear);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].index, 2);
    assert_eq!(resolve_complete(&routes).len(), 1);
}

#[test]
fn equal_starts_keep_input_order() {
    let routes = vec![
        line("late", 3_000, 1_000),
        line("a", 0, 1_000),
        line("b", 0, 2_000),
        line("c", 0, 500),
    ];
    let ids: Vec<_> = resolve_routes(&routes, 0.5, 4_000.0, Ease::Linear)
        .iter()
        .map(|r| r.route.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "late"]);

    let complete = resolve_complete(&routes);
    assert!(complete.iter().all(|r| r.progress == 1.0));
    assert_eq!(complete[3].route.id, "late");
}
