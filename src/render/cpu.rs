use std::sync::Arc;

use kurbo::{Cap, Circle, Join, Shape, Stroke, StrokeOpts};

use crate::animation::ease::Ease;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rgba8};
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::background::BackgroundImage;
use crate::render::path::{MarkerKind, RouteGeometry, TipIndicator};
use crate::render::timing::{ResolvedRoute, resolve_complete, resolve_routes};
use crate::render::{FrameRGBA, RenderOptions};
use crate::scene::model::{Route, Scene};
use crate::timeline::progress_at;

const CURVE_TOLERANCE: f64 = 0.1;
const MIN_STROKE_WIDTH: f64 = 0.5;

const MARKER_START: Rgba8 = Rgba8::rgb(34, 197, 94);
const MARKER_WAYPOINT: Rgba8 = Rgba8::rgb(255, 255, 255);
const MARKER_END: Rgba8 = Rgba8::rgb(239, 68, 68);
const MARKER_OUTLINE: Rgba8 = Rgba8::rgb(30, 30, 30);
const ARROW_FILL: Rgba8 = Rgba8::rgb(255, 255, 255);

/// Rasterizes frames of one scene over one background with `vello_cpu`.
///
/// Immutable after construction, so a single instance is shared by every render worker.
pub struct FrameRasterizer {
    canvas: Canvas,
    width: u16,
    height: u16,
    background_color: Rgba8,
    background: Option<BackgroundPaint>,
    scene_transform: Affine,
    routes: Vec<Route>,
    geometry: Vec<RouteGeometry>,
    total_duration_ms: f64,
    easing: Ease,
}

struct BackgroundPaint {
    image: vello_cpu::Image,
    width: f64,
    height: f64,
}

impl FrameRasterizer {
    /// Prepare `scene` for rendering onto `canvas`.
    ///
    /// Waypoints are in background image pixels; without a background they are taken as canvas
    /// pixels.
    pub fn new(
        scene: &Scene,
        canvas: Canvas,
        background_color: Rgba8,
        background: Option<&BackgroundImage>,
    ) -> PathreelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| PathreelError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| PathreelError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(PathreelError::render("canvas width/height must be non-zero"));
        }

        let (background, scene_transform) = match background {
            Some(img) => (Some(BackgroundPaint::new(img)?), img.fit_transform(canvas)),
            None => (None, Affine::IDENTITY),
        };

        Ok(Self {
            canvas,
            width,
            height,
            background_color,
            background,
            scene_transform,
            geometry: scene
                .routes
                .iter()
                .map(|r| RouteGeometry::new(&r.waypoints))
                .collect(),
            routes: scene.routes.clone(),
            total_duration_ms: scene.total_duration_ms as f64,
            easing: scene.easing,
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Color painted under the background image.
    pub fn background_color(&self) -> Rgba8 {
        self.background_color
    }

    /// Render the scene at timeline position `time_ms`.
    pub fn render_at_time(&self, time_ms: f64, opts: RenderOptions) -> PathreelResult<FrameRGBA> {
        let p = self
            .easing
            .apply(progress_at(time_ms, self.total_duration_ms));
        let resolved = resolve_routes(&self.routes, p, self.total_duration_ms, self.easing);
        self.render_resolved(&resolved, opts)
    }

    /// Render every drawable route fully drawn.
    pub fn render_complete(&self, opts: RenderOptions) -> PathreelResult<FrameRGBA> {
        self.render_resolved(&resolve_complete(&self.routes), opts)
    }

    /// Render one frame and encode it as PNG.
    ///
    /// `None` renders the completed scene.
    pub fn render_preview_png(
        &self,
        time_ms: Option<f64>,
        opts: RenderOptions,
    ) -> PathreelResult<Vec<u8>> {
        let frame = match time_ms {
            Some(t) => self.render_at_time(t, opts.at_time(t))?,
            None => self.render_complete(opts)?,
        };
        crate::encode::png::encode_png(&frame, self.background_color)
    }

    fn render_resolved(
        &self,
        resolved: &[ResolvedRoute<'_>],
        opts: RenderOptions,
    ) -> PathreelResult<FrameRGBA> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(cpu_color(self.background_color));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        ctx.set_transform(affine_to_cpu(self.scene_transform));
        if let Some(bg) = &self.background {
            ctx.set_paint(bg.image.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bg.width, bg.height));
        }

        for r in resolved {
            let geometry = self.geometry.get(r.index).ok_or_else(|| {
                PathreelError::render(format!("route geometry {} missing", r.index))
            })?;
            draw_route(&mut ctx, r.route, geometry, r.progress, opts);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

impl BackgroundPaint {
    fn new(img: &BackgroundImage) -> PathreelResult<Self> {
        let pixmap = image_premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            image: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: f64::from(img.width),
            height: f64::from(img.height),
        })
    }
}

/// Render a tiny scene and check that the stroke actually lands on the canvas.
pub fn smoke_test() -> bool {
    use crate::scene::model::Waypoint;

    let route = Route::new("probe", vec![Waypoint::new(0.0, 2.0), Waypoint::new(8.0, 2.0)])
        .with_timing(0, 1);
    let scene = Scene::new(vec![route], 1, Ease::Linear);
    let Ok(canvas) = Canvas::new(8, 4) else {
        return false;
    };
    let Ok(rasterizer) = FrameRasterizer::new(&scene, canvas, Rgba8::rgb(0, 0, 0), None) else {
        return false;
    };
    match rasterizer.render_complete(RenderOptions::export()) {
        Ok(frame) => frame.data.chunks_exact(4).any(|px| px[..3] != [0, 0, 0]),
        Err(_) => false,
    }
}

fn draw_route(
    ctx: &mut vello_cpu::RenderContext,
    route: &Route,
    geometry: &RouteGeometry,
    t: f64,
    opts: RenderOptions,
) {
    let partial = geometry.trace(t);
    if partial.is_empty() {
        return;
    }
    let color = route.style.color.rgba8();
    let width = if route.style.stroke_width.is_finite() {
        route.style.stroke_width.max(MIN_STROKE_WIDTH)
    } else {
        MIN_STROKE_WIDTH
    };

    if let Some(dot) = partial.dot {
        fill_circle(ctx, dot, width / 2.0, color);
    }

    if let Some(path) = partial.to_bezpath() {
        let mut style = Stroke::new(width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        if let Some(dashes) = route.style.effective_dashes() {
            style = style.with_dashes(0.0, dashes.iter().copied());
        }
        let outline = kurbo::stroke(path.iter(), &style, &StrokeOpts::default(), CURVE_TOLERANCE);
        fill(ctx, &outline, color);
    }

    if opts.show_markers {
        for (p, kind) in geometry.markers(t) {
            draw_marker(ctx, p, kind, width);
        }
    }

    if let Some(tip) = partial.tip {
        draw_tip(ctx, tip, width, color, opts.pulse_phase);
    }

    if partial.complete
        && let Some(end) = geometry.points().last()
    {
        draw_completion_ring(ctx, *end, width, color);
    }
}

fn draw_marker(ctx: &mut vello_cpu::RenderContext, p: Point, kind: MarkerKind, width: f64) {
    let fill_color = match kind {
        MarkerKind::Start => MARKER_START,
        MarkerKind::Waypoint => MARKER_WAYPOINT,
        MarkerKind::End => MARKER_END,
    };
    let r = width * 1.25;
    fill_circle(ctx, p, r, fill_color);
    stroke_circle(ctx, p, r, width * 0.35, MARKER_OUTLINE);
}

fn draw_tip(
    ctx: &mut vello_cpu::RenderContext,
    tip: TipIndicator,
    width: f64,
    color: Rgba8,
    pulse_phase: f64,
) {
    let pulse = 0.5 - 0.5 * (std::f64::consts::TAU * pulse_phase).cos();
    let halo = width * (1.5 + 0.75 * pulse);
    fill_circle(ctx, tip.position, halo, color.with_alpha(90));
    fill_circle(ctx, tip.position, width * 0.9, color);

    let size = width * 1.6;
    let mut arrow = BezPath::new();
    arrow.move_to((size, 0.0));
    arrow.line_to((-size * 0.5, size * 0.6));
    arrow.line_to((-size * 0.5, -size * 0.6));
    arrow.close_path();
    let placed = Affine::translate(tip.position.to_vec2()) * Affine::rotate(tip.angle) * arrow;
    fill(ctx, &placed, ARROW_FILL);
}

fn draw_completion_ring(ctx: &mut vello_cpu::RenderContext, at: Point, width: f64, color: Rgba8) {
    stroke_circle(ctx, at, width * 2.0, width * 0.6, color);
    fill_circle(ctx, at, width * 0.9, color);
}

fn fill_circle(ctx: &mut vello_cpu::RenderContext, center: Point, radius: f64, color: Rgba8) {
    let path = Circle::new(center, radius).to_path(CURVE_TOLERANCE);
    fill(ctx, &path, color);
}

fn stroke_circle(
    ctx: &mut vello_cpu::RenderContext,
    center: Point,
    radius: f64,
    width: f64,
    color: Rgba8,
) {
    let circle = Circle::new(center, radius).to_path(CURVE_TOLERANCE);
    let outline = kurbo::stroke(
        circle.iter(),
        &Stroke::new(width),
        &StrokeOpts::default(),
        CURVE_TOLERANCE,
    );
    fill(ctx, &outline, color);
}

fn fill(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Rgba8) {
    ctx.set_paint(cpu_color(color));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PathreelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PathreelError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PathreelError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PathreelError::render("background image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
