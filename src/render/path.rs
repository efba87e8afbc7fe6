//! Segment-accurate partial drawing of a polyline.
//!
//! Everything here is a pure function of waypoints and local progress; rasterization lives in
//! [`crate::render::cpu`].

use crate::foundation::core::{BezPath, Point};
use crate::scene::model::Waypoint;

/// Prefix-summed segment lengths of a polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteGeometry {
    points: Vec<Point>,
    /// `cumulative[i]` is the path length before segment `i`; one entry per segment.
    cumulative: Vec<f64>,
    segment_lengths: Vec<f64>,
    total_length: f64,
}

/// The visible part of a route at some local progress.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialRoute {
    /// Polyline to stroke: every fully drawn vertex plus the interpolated endpoint.
    pub drawn: Vec<Point>,
    /// Moving tip, present only while `0 < t < 1`.
    pub tip: Option<TipIndicator>,
    /// `t >= 1`: the whole route is drawn.
    pub complete: bool,
    /// Zero-length path: render a single dot at [`PartialRoute::dot`], no stroke.
    pub dot: Option<Point>,
}

/// Position and heading of the drawing tip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipIndicator {
    /// Exact end of the drawn stroke.
    pub position: Point,
    /// Direction of travel in radians, `atan2(dy, dx)` of the current segment.
    pub angle: f64,
}

/// Role of a waypoint marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// First waypoint.
    Start,
    /// Any intermediate waypoint.
    Waypoint,
    /// Last waypoint once the route is complete.
    End,
}

impl PartialRoute {
    fn nothing() -> Self {
        Self {
            drawn: Vec::new(),
            tip: None,
            complete: false,
            dot: None,
        }
    }

    /// `true` when nothing should be rendered.
    pub fn is_empty(&self) -> bool {
        self.drawn.len() < 2 && self.dot.is_none()
    }

    /// Where the drawn stroke ends.
    pub fn end_point(&self) -> Option<Point> {
        self.drawn.last().copied().or(self.dot)
    }

    /// Length of the drawn polyline.
    pub fn drawn_length(&self) -> f64 {
        self.drawn.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// The drawn polyline as a path, `None` if there is no stroke.
    pub fn to_bezpath(&self) -> Option<BezPath> {
        let (first, rest) = self.drawn.split_first()?;
        if rest.is_empty() {
            return None;
        }
        let mut path = BezPath::new();
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        Some(path)
    }
}

impl RouteGeometry {
    /// Measure `waypoints`.
    pub fn new(waypoints: &[Waypoint]) -> Self {
        let points: Vec<Point> = waypoints.iter().map(|w| w.to_point()).collect();
        let mut cumulative = Vec::with_capacity(points.len().saturating_sub(1));
        let mut segment_lengths = Vec::with_capacity(points.len().saturating_sub(1));
        let mut acc = 0.0;
        for seg in points.windows(2) {
            let len = seg[0].distance(seg[1]);
            cumulative.push(acc);
            segment_lengths.push(len);
            acc += len;
        }
        Self {
            points,
            cumulative,
            segment_lengths,
            total_length: acc,
        }
    }

    /// Vertices in image pixel space.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Per-segment Euclidean lengths.
    pub fn segment_lengths(&self) -> &[f64] {
        &self.segment_lengths
    }

    /// Sum of all segment lengths.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// The part of the polyline drawn at local progress `t`.
    ///
    /// Draws nothing for `t <= 0` or fewer than two waypoints. A zero-length path collapses to a
    /// single dot.
    pub fn trace(&self, t: f64) -> PartialRoute {
        if self.points.len() < 2 || t.is_nan() || t <= 0.0 {
            return PartialRoute::nothing();
        }
        if self.total_length <= 0.0 {
            return PartialRoute {
                dot: Some(self.points[0]),
                complete: t >= 1.0,
                ..PartialRoute::nothing()
            };
        }
        if t >= 1.0 {
            return PartialRoute {
                drawn: self.points.clone(),
                complete: true,
                ..PartialRoute::nothing()
            };
        }

        let target = self.total_length * t;
        let mut drawn = Vec::with_capacity(self.points.len());
        drawn.push(self.points[0]);
        for (i, (&start, &len)) in self.cumulative.iter().zip(&self.segment_lengths).enumerate() {
            let (from, to) = (self.points[i], self.points[i + 1]);
            if start + len > target {
                let ratio = (target - start) / len;
                let end = from + (to - from) * ratio;
                drawn.push(end);
                return PartialRoute {
                    drawn,
                    tip: Some(TipIndicator {
                        position: end,
                        angle: heading(from, to),
                    }),
                    complete: false,
                    dot: None,
                };
            }
            drawn.push(to);
        }

        // Rounding left `target` at (or past) the final vertex.
        let tip = self.last_heading().map(|angle| TipIndicator {
            position: self.points[self.points.len() - 1],
            angle,
        });
        PartialRoute {
            drawn,
            tip,
            complete: false,
            dot: None,
        }
    }

    /// Waypoint markers visible at local progress `t`.
    ///
    /// `floor(n * t) + 1` markers, capped at `n`; none for `t <= 0`. The first is the start
    /// marker, the last becomes the end marker once `t >= 1`.
    pub fn markers(&self, t: f64) -> Vec<(Point, MarkerKind)> {
        let n = self.points.len();
        let count = visible_marker_count(n, t);
        (0..count)
            .map(|i| {
                let kind = if i == 0 {
                    MarkerKind::Start
                } else if i == n - 1 && t >= 1.0 {
                    MarkerKind::End
                } else {
                    MarkerKind::Waypoint
                };
                (self.points[i], kind)
            })
            .collect()
    }

    fn last_heading(&self) -> Option<f64> {
        self.points
            .windows(2)
            .rev()
            .find(|w| w[0] != w[1])
            .map(|w| heading(w[0], w[1]))
    }
}

/// Number of waypoint markers shown for `total` waypoints at progress `t`.
pub fn visible_marker_count(total: usize, t: f64) -> usize {
    if total == 0 || t.is_nan() || t <= 0.0 {
        return 0;
    }
    let t = t.min(1.0);
    ((total as f64 * t).floor() as usize + 1).min(total)
}

fn heading(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

#[cfg(test)]
#[path = "../../tests/unit/render/path.rs"]
mod tests;
