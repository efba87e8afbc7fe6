use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Rgba8, mul_div255_u16};
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::FrameRGBA;

/// Composite premultiplied RGBA8 over an opaque background.
pub fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg: Rgba8,
) -> PathreelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(PathreelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Opaque straight RGBA8 pixels of `frame`, flattened over `bg` when premultiplied.
pub fn opaque_rgba8(frame: &FrameRGBA, bg: Rgba8) -> PathreelResult<Vec<u8>> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(PathreelError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    let mut out = vec![0u8; expected];
    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(&mut out, &frame.data, bg)?;
    } else {
        for (d, s) in out.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
            let premul = Rgba8::rgba(s[0], s[1], s[2], s[3]).to_premul_array();
            flatten_premul_over_bg_to_opaque_rgba8(d, &premul, bg)?;
        }
    }
    Ok(out)
}

/// Encode `frame` as an opaque PNG.
pub fn encode_png(frame: &FrameRGBA, bg: Rgba8) -> PathreelResult<Vec<u8>> {
    let rgba = opaque_rgba8(frame, bg)?;
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| PathreelError::render("frame buffer does not match its dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Write `frame` to `path` as an opaque PNG, creating parent directories.
pub fn write_png(frame: &FrameRGBA, bg: Rgba8, path: &Path) -> PathreelResult<()> {
    let rgba = opaque_rgba8(frame, bg)?;
    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
