use crate::foundation::clock::Clock;
use crate::timeline::{TickOutcome, Timeline};

/// Handle for one scheduled tick.
///
/// Tokens are invalidated by `pause`, `stop` and `seek`, so a tick that was already scheduled
/// when playback changed never renders a stale frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

/// The single frame a valid tick asks the caller to render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRequest {
    /// Timeline time of the frame.
    pub time_ms: f64,
    /// Linear global progress.
    pub progress: f64,
    /// Global progress after the timeline easing.
    pub eased_progress: f64,
    /// Token for the next tick, `None` once playback stopped advancing.
    pub next: Option<TickToken>,
}

/// Single-threaded cooperative playback driver.
///
/// Each scheduled tick yields exactly one [`FrameRequest`] and hands back the token for the next
/// one; the caller's scheduler (animation frame callback, timer, test loop) re-invokes
/// [`Player::on_tick`] with it.
pub struct Player<C: Clock> {
    timeline: Timeline,
    clock: C,
    generation: u64,
}

impl<C: Clock> Player<C> {
    /// Wrap a timeline with the clock that drives it.
    pub fn new(timeline: Timeline, clock: C) -> Self {
        Self {
            timeline,
            clock,
            generation: 0,
        }
    }

    /// Borrow the underlying timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutably borrow the timeline for non-playback edits (duration, easing).
    ///
    /// Outstanding tokens are invalidated since the edit may change what the next frame shows.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        self.generation += 1;
        &mut self.timeline
    }

    /// Start playback and return the token for the first tick.
    pub fn play(&mut self) -> TickToken {
        self.timeline.play(self.now());
        self.next_token()
    }

    /// Pause playback; any scheduled tick becomes a no-op.
    pub fn pause(&mut self) {
        self.timeline.pause();
        self.generation += 1;
    }

    /// Stop and rewind; any scheduled tick becomes a no-op.
    pub fn stop(&mut self) {
        self.timeline.stop();
        self.generation += 1;
    }

    /// Seek to `time_ms`. While playing, a fresh token replaces the outstanding one.
    pub fn seek(&mut self, time_ms: f64) -> Option<TickToken> {
        let now = self.now();
        self.timeline.seek(time_ms, now);
        let token = self.next_token();
        self.timeline.is_playing().then_some(token)
    }

    /// Return `true` when `token` would still produce a frame.
    pub fn is_current(&self, token: TickToken) -> bool {
        token.generation == self.generation && self.timeline.is_playing()
    }

    /// Run one scheduled tick.
    ///
    /// Returns `None` for stale tokens or when playback is no longer running.
    pub fn on_tick(&mut self, token: TickToken) -> Option<FrameRequest> {
        if !self.is_current(token) {
            tracing::trace!(
                token = token.generation,
                current = self.generation,
                "dropping stale tick"
            );
            return None;
        }
        let outcome = self.timeline.tick(self.now());
        let next = match outcome {
            TickOutcome::Advanced => Some(self.next_token()),
            TickOutcome::Finished | TickOutcome::Idle => None,
        };
        Some(FrameRequest {
            time_ms: self.timeline.current_time_ms(),
            progress: self.timeline.progress(),
            eased_progress: self.timeline.eased_progress(),
            next,
        })
    }

    fn next_token(&mut self) -> TickToken {
        self.generation += 1;
        TickToken {
            generation: self.generation,
        }
    }

    fn now(&self) -> f64 {
        self.clock.now_ms() as f64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/player.rs"]
mod tests;
