use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{PathreelError, PathreelResult};

/// Decoded background image, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct BackgroundImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl BackgroundImage {
    /// Decode any format the `image` crate recognizes.
    pub fn decode(bytes: &[u8]) -> PathreelResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode background image")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(PathreelError::validation("background image is empty"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(PathreelError::validation(format!(
                "background image {width}x{height} is too large to rasterize"
            )));
        }

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Read and decode an image file.
    pub fn open(path: &std::path::Path) -> PathreelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read background image '{}'", path.display()))?;
        Self::decode(&bytes)
    }

    /// Image-to-canvas transform: uniform scale to fit, centered.
    pub fn fit_transform(&self, canvas: Canvas) -> Affine {
        fit_transform(self.width, self.height, canvas)
    }
}

/// Uniform scale that fits an `image_w x image_h` image inside `canvas`, centered.
///
/// Waypoints live in image pixel space, so routes are drawn through the same transform.
pub fn fit_transform(image_w: u32, image_h: u32, canvas: Canvas) -> Affine {
    if image_w == 0 || image_h == 0 {
        return Affine::IDENTITY;
    }
    let (iw, ih) = (f64::from(image_w), f64::from(image_h));
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let scale = (cw / iw).min(ch / ih);
    let dx = (cw - iw * scale) / 2.0;
    let dy = (ch - ih * scale) / 2.0;
    Affine::translate((dx, dy)) * Affine::scale(scale)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
