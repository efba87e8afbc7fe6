use serde::{Deserialize, Serialize};

use crate::animation::ease::Ease;
use crate::foundation::core::Point;
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::scene::color::Color;

/// Delay added to a branch route relative to its parent's delay.
pub const BRANCH_DELAY_OFFSET_MS: u64 = 500;

/// A point in background-image pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

impl Waypoint {
    /// Create a waypoint.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// As a kurbo point.
    pub fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Waypoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Stroke appearance of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStyle {
    /// Stroke color.
    #[serde(default = "default_route_color")]
    pub color: Color,
    /// Stroke width in image pixels.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    /// Alternating dash/gap lengths in image pixels; empty means solid.
    #[serde(default)]
    pub dash_pattern: Vec<f64>,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: default_route_color(),
            stroke_width: default_stroke_width(),
            dash_pattern: Vec::new(),
        }
    }
}

impl RouteStyle {
    /// Dash pattern usable for stroking, or `None` for a solid line.
    ///
    /// Patterns with a non-finite or non-positive total length are treated as solid.
    pub fn effective_dashes(&self) -> Option<&[f64]> {
        if self.dash_pattern.is_empty()
            || self
                .dash_pattern
                .iter()
                .any(|d| !d.is_finite() || *d < 0.0)
        {
            return None;
        }
        let total: f64 = self.dash_pattern.iter().sum();
        (total > 0.0).then_some(self.dash_pattern.as_slice())
    }
}

/// When a route draws on the global timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnimation {
    /// Milliseconds before the route starts drawing.
    #[serde(default)]
    pub delay_ms: u64,
    /// Milliseconds the route takes to draw completely.
    #[serde(default)]
    pub duration_ms: u64,
    /// Per-route easing; the global easing applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Ease>,
}

impl RouteAnimation {
    /// Millisecond at which this route finishes drawing.
    pub fn end_ms(&self) -> u64 {
        self.delay_ms.saturating_add(self.duration_ms)
    }
}

/// An ordered polyline with style and timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Stable identifier, unique within a scene.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Ordered waypoints in image pixel space.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    /// Stroke appearance.
    #[serde(default)]
    pub style: RouteStyle,
    /// Hidden routes are never drawn or exported.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Timeline window.
    #[serde(default)]
    pub animation: RouteAnimation,
    /// Route this one branches from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_route_id: Option<String>,
    /// Index of the parent waypoint the branch starts at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_waypoint: Option<usize>,
}

impl Route {
    /// Create a visible route with default style and an empty timing window.
    pub fn new(id: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            waypoints,
            style: RouteStyle::default(),
            visible: true,
            animation: RouteAnimation::default(),
            parent_route_id: None,
            branch_waypoint: None,
        }
    }

    /// Builder-style timing setter.
    pub fn with_timing(mut self, delay_ms: u64, duration_ms: u64) -> Self {
        self.animation.delay_ms = delay_ms;
        self.animation.duration_ms = duration_ms;
        self
    }

    /// Builder-style style setter.
    pub fn with_style(mut self, style: RouteStyle) -> Self {
        self.style = style;
        self
    }

    /// A route can be drawn when visible and has at least two waypoints.
    pub fn is_drawable(&self) -> bool {
        self.visible && self.waypoints.len() >= 2
    }

    /// Start a branch at `parent.waypoints[waypoint_index]`.
    ///
    /// The branch copies the waypoint value and the parent's style; it holds no live reference
    /// to the parent. Its delay is always `parent.delay_ms + BRANCH_DELAY_OFFSET_MS`.
    pub fn branch_from(
        parent: &Route,
        waypoint_index: usize,
        id: impl Into<String>,
    ) -> PathreelResult<Self> {
        let start = parent.waypoints.get(waypoint_index).copied().ok_or_else(|| {
            PathreelError::validation(format!(
                "route '{}' has no waypoint {waypoint_index} to branch from",
                parent.id
            ))
        })?;
        let mut branch = Route::new(id, vec![start]);
        branch.style = parent.style.clone();
        branch.animation = RouteAnimation {
            delay_ms: parent
                .animation
                .delay_ms
                .saturating_add(BRANCH_DELAY_OFFSET_MS),
            duration_ms: parent.animation.duration_ms,
            easing: parent.animation.easing,
        };
        branch.parent_route_id = Some(parent.id.clone());
        branch.branch_waypoint = Some(waypoint_index);
        Ok(branch)
    }

    /// Check waypoint coordinates and style values.
    pub fn validate(&self) -> PathreelResult<()> {
        if let Some((i, _)) = self
            .waypoints
            .iter()
            .enumerate()
            .find(|(_, w)| !w.x.is_finite() || !w.y.is_finite())
        {
            return Err(PathreelError::validation(format!(
                "route '{}' waypoint {i} has a non-finite coordinate",
                self.id
            )));
        }
        if !self.style.stroke_width.is_finite() || self.style.stroke_width <= 0.0 {
            return Err(PathreelError::validation(format!(
                "route '{}' stroke width must be positive",
                self.id
            )));
        }
        Ok(())
    }
}

/// Read-only snapshot of everything the rendering core needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Routes in draw order.
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Length of the global timeline.
    #[serde(default)]
    pub total_duration_ms: u64,
    /// Global easing.
    #[serde(default)]
    pub easing: Ease,
}

impl Scene {
    /// Create a scene.
    pub fn new(routes: Vec<Route>, total_duration_ms: u64, easing: Ease) -> Self {
        Self {
            routes,
            total_duration_ms,
            easing,
        }
    }

    /// Parse a scene from JSON.
    pub fn from_json(json: &str) -> PathreelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Latest route end time; the smallest duration that shows every route completing.
    pub fn natural_duration_ms(&self) -> u64 {
        self.routes
            .iter()
            .map(|r| r.animation.end_ms())
            .max()
            .unwrap_or(0)
    }

    /// Visible routes, in input order.
    pub fn visible_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|r| r.visible)
    }

    /// Validate every route and id uniqueness.
    pub fn validate(&self) -> PathreelResult<()> {
        let mut seen = std::collections::HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.id.as_str()) {
                return Err(PathreelError::validation(format!(
                    "duplicate route id '{}'",
                    route.id
                )));
            }
            route.validate()?;
        }
        Ok(())
    }
}

fn default_route_color() -> Color {
    Color::rgb(0x3b, 0x82, 0xf6)
}

fn default_stroke_width() -> f64 {
    4.0
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
