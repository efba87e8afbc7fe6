use std::collections::VecDeque;

use rayon::prelude::*;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{PathreelError, PathreelResult};
use crate::render::cpu::FrameRasterizer;
use crate::render::{FrameRGBA, RenderOptions};

/// Frame count and per-frame timestamps of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    fps: u32,
    total_duration_ms: u64,
    frame_count: u64,
}

impl FramePlan {
    /// `ceil(fps * total_duration_ms / 1000)` frames at `fps`.
    pub fn new(fps: u32, total_duration_ms: u64) -> PathreelResult<Self> {
        if fps == 0 {
            return Err(PathreelError::validation("fps must be non-zero"));
        }
        let frame_count = (u64::from(fps) * total_duration_ms).div_ceil(1000);
        Ok(Self {
            fps,
            total_duration_ms,
            frame_count,
        })
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Timeline length in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// Number of frames.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timeline position of frame `idx`.
    ///
    /// `idx * 1000 / fps`, clamped to the duration. The last frame is pinned to the end so an
    /// export always finishes fully drawn.
    pub fn time_ms(&self, idx: FrameIndex) -> f64 {
        let total = self.total_duration_ms as f64;
        if idx.0 + 1 >= self.frame_count {
            return total;
        }
        (idx.0 as f64 * 1000.0 / f64::from(self.fps)).min(total)
    }
}

/// Render threading/chunking configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderThreading {
    /// Render chunks on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Frames rendered per chunk; also the most frames held in memory at once.
    pub chunk_size: usize,
    /// Worker count, rayon's default when `None`.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 16,
            threads: None,
        }
    }
}

/// Lazy, ordered, single-pass sequence of export frames.
///
/// Frames are rendered a chunk at a time (in parallel when enabled) and handed out in strict
/// index order. Rendering stops after the first error.
pub struct FrameProducer<'a> {
    rasterizer: &'a FrameRasterizer,
    plan: FramePlan,
    opts: RenderOptions,
    pool: Option<rayon::ThreadPool>,
    chunk_size: u64,
    next: u64,
    buffered: VecDeque<(FrameIndex, FrameRGBA)>,
    failed: bool,
}

impl<'a> FrameProducer<'a> {
    /// Produce every frame of `plan` from `rasterizer`.
    pub fn new(
        rasterizer: &'a FrameRasterizer,
        plan: FramePlan,
        opts: RenderOptions,
        threading: &RenderThreading,
    ) -> PathreelResult<Self> {
        let pool = if threading.parallel {
            Some(build_thread_pool(threading.threads)?)
        } else {
            None
        };
        Ok(Self {
            rasterizer,
            plan,
            opts,
            pool,
            chunk_size: normalized_chunk_size(threading.chunk_size),
            next: 0,
            buffered: VecDeque::new(),
            failed: false,
        })
    }

    /// The plan being rendered.
    pub fn plan(&self) -> FramePlan {
        self.plan
    }

    fn fill_chunk(&mut self) -> PathreelResult<()> {
        let start = self.next;
        let end = (start + self.chunk_size).min(self.plan.frame_count());
        self.next = end;

        let (rasterizer, plan, opts) = (self.rasterizer, self.plan, self.opts);
        let render = |idx: FrameIndex| {
            let t = plan.time_ms(idx);
            rasterizer.render_at_time(t, opts.at_time(t))
        };
        let indices: Vec<FrameIndex> = (start..end).map(FrameIndex).collect();
        let rendered: Vec<PathreelResult<FrameRGBA>> = match &self.pool {
            Some(pool) => pool.install(|| indices.par_iter().map(|&idx| render(idx)).collect()),
            None => indices.iter().map(|&idx| render(idx)).collect(),
        };

        for (idx, frame) in indices.into_iter().zip(rendered) {
            self.buffered.push_back((idx, frame?));
        }
        Ok(())
    }
}

impl Iterator for FrameProducer<'_> {
    type Item = PathreelResult<(FrameIndex, FrameRGBA)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.buffered.pop_front() {
            return Some(Ok(item));
        }
        if self.failed || self.next >= self.plan.frame_count() {
            return None;
        }
        if let Err(e) = self.fill_chunk() {
            self.failed = true;
            self.buffered.clear();
            return Some(Err(e));
        }
        self.buffered.pop_front().map(Ok)
    }
}

/// Drain `producer` into `sink`, checking `cancel` between frames.
///
/// `on_frame(done, total)` runs after each frame is accepted by the sink.
pub fn render_to_sink(
    producer: FrameProducer<'_>,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
    mut on_frame: impl FnMut(u64, u64),
) -> PathreelResult<u64> {
    let plan = producer.plan();
    let canvas = producer.rasterizer.canvas();
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps: plan.fps(),
    })?;

    let total = plan.frame_count();
    let mut done = 0u64;
    for item in producer {
        cancel.check()?;
        let (idx, frame) = item?;
        sink.push_frame(idx, &frame)?;
        done += 1;
        on_frame(done, total);
    }
    cancel.check()?;
    sink.end()?;
    Ok(done)
}

fn build_thread_pool(threads: Option<usize>) -> PathreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PathreelError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PathreelError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    chunk_size.max(1) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
