use std::io::Cursor;

use super::*;
use crate::scene::color::Color;
use crate::scene::model::{RouteStyle, Waypoint};

const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

fn red_line(waypoints: Vec<Waypoint>) -> Route {
    Route::new("r", waypoints)
        .with_timing(0, 1_000)
        .with_style(RouteStyle {
            color: Color::rgb(255, 0, 0),
            stroke_width: 2.0,
            dash_pattern: Vec::new(),
        })
}

fn horizontal_scene() -> Scene {
    let route = red_line(vec![Waypoint::new(0.0, 10.0), Waypoint::new(40.0, 10.0)]);
    Scene::new(vec![route], 1_000, Ease::Linear)
}

fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn is_red(px: [u8; 4]) -> bool {
    px[0] > 200 && px[1] < 60 && px[2] < 60
}

fn rasterizer(scene: &Scene) -> FrameRasterizer {
    FrameRasterizer::new(scene, Canvas::new(40, 20).unwrap(), WHITE, None).unwrap()
}

#[test]
fn start_of_timeline_is_plain_background() {
    let r = rasterizer(&horizontal_scene());
    let frame = r.render_at_time(0.0, RenderOptions::export()).unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    assert_eq!(frame.data.len(), 40 * 20 * 4);
    assert!(frame.premultiplied);
    assert!(
        frame
            .data
            .chunks_exact(4)
            .all(|px| px == [255, 255, 255, 255])
    );
}

#[test]
fn half_way_draws_first_half_only() {
    let r = rasterizer(&horizontal_scene());
    let frame = r.render_at_time(500.0, RenderOptions::export()).unwrap();
    assert!(is_red(pixel(&frame, 5, 10)));
    assert_eq!(pixel(&frame, 35, 10), [255, 255, 255, 255]);
}

#[test]
fn complete_draws_whole_route() {
    let r = rasterizer(&horizontal_scene());
    let frame = r.render_complete(RenderOptions::export()).unwrap();
    assert!(is_red(pixel(&frame, 5, 10)));
    assert!(is_red(pixel(&frame, 30, 10)));
    assert_eq!(pixel(&frame, 20, 2), [255, 255, 255, 255]);

    let end = r.render_at_time(1_000.0, RenderOptions::export()).unwrap();
    assert_eq!(end.data, frame.data);
}

#[test]
fn markers_only_when_requested() {
    let route = red_line(vec![
        Waypoint::new(4.0, 10.0),
        Waypoint::new(20.0, 10.0),
        Waypoint::new(36.0, 10.0),
    ]);
    let scene = Scene::new(vec![route], 1_000, Ease::Linear);
    let r = rasterizer(&scene);
    let plain = r.render_at_time(500.0, RenderOptions::export()).unwrap();
    let marked = r.render_at_time(500.0, RenderOptions::preview()).unwrap();
    assert_ne!(plain.data, marked.data);
}

#[test]
fn hidden_routes_are_not_drawn() {
    let mut scene = horizontal_scene();
    scene.routes[0].visible = false;
    let frame = rasterizer(&scene)
        .render_complete(RenderOptions::export())
        .unwrap();
    assert!(
        frame
            .data
            .chunks_exact(4)
            .all(|px| px == [255, 255, 255, 255])
    );
}

#[test]
fn background_image_is_scaled_to_fit() {
    let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 255, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    let bg = BackgroundImage::decode(&buf).unwrap();

    let scene = Scene::new(Vec::new(), 1_000, Ease::Linear);
    let r = FrameRasterizer::new(&scene, Canvas::new(40, 20).unwrap(), WHITE, Some(&bg)).unwrap();
    let frame = r.render_complete(RenderOptions::export()).unwrap();
    let px = pixel(&frame, 20, 10);
    assert!(px[2] > 200 && px[0] < 60, "{px:?}");
}

#[test]
fn preview_png_decodes_back() {
    let r = rasterizer(&horizontal_scene());
    let bytes = r
        .render_preview_png(Some(500.0), RenderOptions::preview())
        .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (40, 20));
    assert!(is_red(decoded.get_pixel(5, 10).0));
}

#[test]
fn smoke_test_passes() {
    assert!(smoke_test());
}
