//! Playback timeline: current time, duration, speed and the stopped/playing/paused state machine.

/// Cooperative tick driver built on top of [`Timeline`].
pub mod player;

use crate::animation::ease::Ease;
use crate::foundation::error::{PathreelError, PathreelResult};

/// Playback state. Every state is reachable from every other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// At rest, time reset to zero.
    #[default]
    Stopped,
    /// Advancing with wall-clock time.
    Playing,
    /// Frozen at the current time.
    Paused,
}

/// Result of a [`Timeline::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Timeline was not playing; nothing changed.
    Idle,
    /// Time advanced and playback continues.
    Advanced,
    /// Time reached the end; playback auto-paused.
    Finished,
}

/// Global playback timeline.
///
/// Invariant: `0 <= current_time_ms <= total_duration_ms`.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    current_time_ms: f64,
    total_duration_ms: f64,
    playback_speed: f64,
    easing: Ease,
    state: PlaybackState,
    virtual_start_ms: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            current_time_ms: 0.0,
            total_duration_ms: 0.0,
            playback_speed: 1.0,
            easing: Ease::Linear,
            state: PlaybackState::Stopped,
            virtual_start_ms: 0.0,
        }
    }
}

impl Timeline {
    /// Create a stopped timeline of `total_duration_ms`.
    pub fn new(total_duration_ms: f64, easing: Ease) -> Self {
        Self {
            total_duration_ms: sanitize_duration(total_duration_ms),
            easing,
            ..Self::default()
        }
    }

    /// Current time in milliseconds.
    pub fn current_time_ms(&self) -> f64 {
        self.current_time_ms
    }

    /// Total duration in milliseconds.
    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    /// Playback speed multiplier.
    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    /// Global easing.
    pub fn easing(&self) -> Ease {
        self.easing
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Start or resume playback at `now_ms`.
    ///
    /// The virtual start reference is `now - current / speed`, so elapsed-time updates stay
    /// continuous across pause/resume. Playing from the very end restarts at zero.
    pub fn play(&mut self, now_ms: f64) {
        if self.total_duration_ms > 0.0 && self.current_time_ms >= self.total_duration_ms {
            self.current_time_ms = 0.0;
        }
        self.virtual_start_ms = now_ms - self.current_time_ms / self.playback_speed;
        self.state = PlaybackState::Playing;
    }

    /// Freeze at the current time.
    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Stop and rewind to zero.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.current_time_ms = 0.0;
    }

    /// Jump to `time_ms`, clamped to `[0, total_duration_ms]`. Valid in any state.
    ///
    /// While playing, `now_ms` rebases the virtual start so playback continues from the new time.
    pub fn seek(&mut self, time_ms: f64, now_ms: f64) {
        self.current_time_ms = self.clamp_time(time_ms);
        if self.is_playing() {
            self.virtual_start_ms = now_ms - self.current_time_ms / self.playback_speed;
        }
    }

    /// Advance while playing. Auto-pauses when the end is reached.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }
        let t = (now_ms - self.virtual_start_ms) * self.playback_speed;
        self.current_time_ms = self.clamp_time(t);
        if self.current_time_ms >= self.total_duration_ms {
            self.state = PlaybackState::Paused;
            return TickOutcome::Finished;
        }
        TickOutcome::Advanced
    }

    /// Change the total duration; the current time is re-clamped.
    pub fn set_total_duration(&mut self, total_duration_ms: f64) {
        self.total_duration_ms = sanitize_duration(total_duration_ms);
        self.current_time_ms = self.clamp_time(self.current_time_ms);
    }

    /// Change playback speed. Rejects non-positive and non-finite speeds.
    pub fn set_playback_speed(&mut self, speed: f64, now_ms: f64) -> PathreelResult<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PathreelError::validation(format!(
                "playback speed must be a positive finite number, got {speed}"
            )));
        }
        self.playback_speed = speed;
        if self.is_playing() {
            self.virtual_start_ms = now_ms - self.current_time_ms / speed;
        }
        Ok(())
    }

    /// Change the global easing.
    pub fn set_easing(&mut self, easing: Ease) {
        self.easing = easing;
    }

    /// Linear global progress `current / total`, defined as 0 when the duration is 0.
    pub fn progress(&self) -> f64 {
        progress_at(self.current_time_ms, self.total_duration_ms)
    }

    /// Global progress with the timeline easing applied.
    pub fn eased_progress(&self) -> f64 {
        self.easing.apply(self.progress())
    }

    fn clamp_time(&self, t: f64) -> f64 {
        if t.is_nan() {
            return 0.0;
        }
        t.clamp(0.0, self.total_duration_ms)
    }
}

/// Linear progress of `time_ms` through `total_ms`, clamped to `[0, 1]`; 0 for empty timelines.
pub fn progress_at(time_ms: f64, total_ms: f64) -> f64 {
    if total_ms <= 0.0 {
        return 0.0;
    }
    (time_ms / total_ms).clamp(0.0, 1.0)
}

fn sanitize_duration(ms: f64) -> f64 {
    if ms.is_finite() { ms.max(0.0) } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timeline.rs"]
mod tests;
