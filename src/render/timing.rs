use crate::animation::ease::Ease;
use crate::scene::model::{Route, RouteAnimation};

/// A route's drawing window expressed as global progress fractions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteWindow {
    /// Global progress at which drawing starts.
    pub start: f64,
    /// Global progress at which drawing completes.
    pub end: f64,
}

impl RouteWindow {
    /// Window of `animation` on a timeline of `total_duration_ms`.
    ///
    /// An empty timeline collapses every window to `[0, 0]`.
    pub fn for_animation(animation: &RouteAnimation, total_duration_ms: f64) -> Self {
        if total_duration_ms <= 0.0 || !total_duration_ms.is_finite() {
            return Self {
                start: 0.0,
                end: 0.0,
            };
        }
        let start = animation.delay_ms as f64 / total_duration_ms;
        let end = start + animation.duration_ms as f64 / total_duration_ms;
        Self { start, end }
    }

    /// Linear local progress for global progress `p`.
    ///
    /// 0 at or before `start`, 1 at or after `end`, linear in between. A zero-length window
    /// jumps from 0 straight to 1.
    pub fn local_progress(self, p: f64) -> f64 {
        if p <= self.start {
            0.0
        } else if p >= self.end {
            1.0
        } else {
            ((p - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
        }
    }
}

/// A drawable route paired with the eased local progress to draw it at.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedRoute<'a> {
    /// Position of the route in the scene's route list.
    pub index: usize,
    /// The route itself.
    pub route: &'a Route,
    /// Eased local progress in `[0, 1]`.
    pub progress: f64,
}

/// Resolve every drawable route against eased global progress `p`.
///
/// Hidden routes and routes with fewer than two waypoints are skipped. The result is ordered by
/// window start; routes starting together keep their input order.
pub fn resolve_routes(
    routes: &[Route],
    p: f64,
    total_duration_ms: f64,
    global_easing: Ease,
) -> Vec<ResolvedRoute<'_>> {
    let mut out: Vec<ResolvedRoute<'_>> = routes
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_drawable())
        .map(|(index, route)| {
            let window = RouteWindow::for_animation(&route.animation, total_duration_ms);
            let easing = route.animation.easing.unwrap_or(global_easing);
            ResolvedRoute {
                index,
                route,
                progress: easing.apply(window.local_progress(p)),
            }
        })
        .collect();
    sort_by_start(&mut out);
    out
}

/// Every drawable route at full progress, in the same order as [`resolve_routes`].
pub fn resolve_complete(routes: &[Route]) -> Vec<ResolvedRoute<'_>> {
    let mut out: Vec<ResolvedRoute<'_>> = routes
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_drawable())
        .map(|(index, route)| ResolvedRoute {
            index,
            route,
            progress: 1.0,
        })
        .collect();
    sort_by_start(&mut out);
    out
}

fn sort_by_start(routes: &mut [ResolvedRoute<'_>]) {
    // `sort_by_key` is stable.
    routes.sort_by_key(|r| r.route.animation.delay_ms);
}

#[cfg(test)]
#[path = "../../tests/unit/render/timing.rs"]
mod tests;
