use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::{FrameIndex, Rgba8};
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::FrameRGBA;

/// File name pattern of frames written by [`PngSequenceSink`], in `ffmpeg` image2 syntax.
pub const FRAME_FILE_PATTERN: &str = "frame_%06d.png";

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PathreelResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PathreelResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> PathreelResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` was called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PathreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PathreelResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> PathreelResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes each frame as an opaque PNG named after its index, ready for the encoder.
///
/// Frame indices must be contiguous from 0 so the file set matches [`FRAME_FILE_PATTERN`].
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    bg: Rgba8,
    cfg: Option<SinkConfig>,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Sink writing into `dir`, flattening alpha over `bg`.
    pub fn new(dir: impl Into<PathBuf>, bg: Rgba8) -> Self {
        Self {
            dir: dir.into(),
            bg: bg.opaque(),
            cfg: None,
            written: Vec::new(),
        }
    }

    /// Directory frames are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/frame_%06d.png`, the encoder input pattern.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(FRAME_FILE_PATTERN)
    }

    /// Path of the file for frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", idx.0))
    }

    /// Files written so far, in frame order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Delete every written frame and the directory itself.
    ///
    /// Best effort: failures are logged and counted, never returned.
    pub fn remove_files(&mut self) -> usize {
        let mut failures = 0;
        for path in self.written.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %e, "failed to delete temp frame");
            }
        }
        if let Err(e) = std::fs::remove_dir(&self.dir)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            failures += 1;
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to delete temp frame dir");
        }
        failures
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> PathreelResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PathreelError::validation(
                "png sequence width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create frame directory '{}'", self.dir.display()))?;
        self.cfg = Some(cfg);
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PathreelResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| PathreelError::render("png sequence sink not started"))?;
        if idx.0 != self.written.len() as u64 {
            return Err(PathreelError::render(format!(
                "png sequence sink expected frame {}, got {}",
                self.written.len(),
                idx.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PathreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let path = self.frame_path(idx);
        crate::encode::png::write_png(frame, self.bg, &path)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> PathreelResult<()> {
        if self.cfg.take().is_none() {
            return Err(PathreelError::render("png sequence sink not started"));
        }
        if self.written.is_empty() {
            return Err(PathreelError::render("png sequence sink received no frames"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
