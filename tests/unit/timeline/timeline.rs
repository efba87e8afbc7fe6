use super::*;

#[test]
fn play_pause_resume_is_continuous() {
    let mut tl = Timeline::new(10_000.0, Ease::Linear);
    tl.play(1_000.0);
    assert_eq!(tl.tick(3_000.0), TickOutcome::Advanced);
    assert_eq!(tl.current_time_ms(), 2_000.0);

    tl.pause();
    assert_eq!(tl.tick(9_000.0), TickOutcome::Idle);
    assert_eq!(tl.current_time_ms(), 2_000.0);

    // Resume much later: time continues from 2000, not from wall time.
    tl.play(50_000.0);
    tl.tick(50_500.0);
    assert_eq!(tl.current_time_ms(), 2_500.0);
}

#[test]
fn playback_speed_scales_elapsed_time() {
    let mut tl = Timeline::new(10_000.0, Ease::Linear);
    tl.set_playback_speed(2.0, 0.0).unwrap();
    tl.play(0.0);
    tl.tick(1_000.0);
    assert_eq!(tl.current_time_ms(), 2_000.0);

    // Speed change mid-play keeps the current time continuous.
    tl.set_playback_speed(0.5, 1_000.0).unwrap();
    tl.tick(1_000.0);
    assert_eq!(tl.current_time_ms(), 2_000.0);
    tl.tick(3_000.0);
    assert_eq!(tl.current_time_ms(), 3_000.0);

    assert!(tl.set_playback_speed(0.0, 0.0).is_err());
    assert!(tl.set_playback_speed(f64::INFINITY, 0.0).is_err());
}

#[test]
fn reaching_end_auto_pauses() {
    let mut tl = Timeline::new(1_000.0, Ease::Linear);
    tl.play(0.0);
    assert_eq!(tl.tick(5_000.0), TickOutcome::Finished);
    assert_eq!(tl.current_time_ms(), 1_000.0);
    assert_eq!(tl.state(), PlaybackState::Paused);
    assert_eq!(tl.progress(), 1.0);

    // Playing again from the end restarts.
    tl.play(6_000.0);
    tl.tick(6_100.0);
    assert_eq!(tl.current_time_ms(), 100.0);
}

#[test]
fn stop_resets_and_seek_clamps() {
    let mut tl = Timeline::new(2_000.0, Ease::Linear);
    tl.seek(5_000.0, 0.0);
    assert_eq!(tl.current_time_ms(), 2_000.0);
    tl.seek(-10.0, 0.0);
    assert_eq!(tl.current_time_ms(), 0.0);
    tl.seek(750.0, 0.0);
    assert_eq!(tl.state(), PlaybackState::Stopped);
    assert_eq!(tl.current_time_ms(), 750.0);

    tl.play(0.0);
    tl.stop();
    assert_eq!(tl.state(), PlaybackState::Stopped);
    assert_eq!(tl.current_time_ms(), 0.0);
}

#[test]
fn seek_while_playing_rebases() {
    let mut tl = Timeline::new(10_000.0, Ease::Linear);
    tl.play(0.0);
    tl.tick(1_000.0);
    tl.seek(8_000.0, 1_000.0);
    tl.tick(1_500.0);
    assert_eq!(tl.current_time_ms(), 8_500.0);
}

#[test]
fn zero_duration_progress_is_zero() {
    let tl = Timeline::new(0.0, Ease::InCubic);
    assert_eq!(tl.progress(), 0.0);
    assert_eq!(tl.eased_progress(), 0.0);
    assert_eq!(progress_at(10.0, 0.0), 0.0);
}

#[test]
fn shrinking_duration_reclamps_current_time() {
    let mut tl = Timeline::new(10_000.0, Ease::Linear);
    tl.seek(9_000.0, 0.0);
    tl.set_total_duration(4_000.0);
    assert_eq!(tl.current_time_ms(), 4_000.0);
    tl.set_total_duration(f64::NAN);
    assert_eq!(tl.total_duration_ms(), 0.0);
    assert_eq!(tl.current_time_ms(), 0.0);
}

#[test]
fn eased_progress_uses_timeline_easing() {
    let mut tl = Timeline::new(1_000.0, Ease::InQuad);
    tl.seek(500.0, 0.0);
    assert_eq!(tl.progress(), 0.5);
    assert_eq!(tl.eased_progress(), 0.25);
    tl.set_easing(Ease::Linear);
    assert_eq!(tl.eased_progress(), 0.5);
}

#[test]
fn play_resumes_mid_timeline_but_restarts_from_the_end() {
    let mut tl = Timeline::new(1_000.0, Ease::Linear);
    tl.seek(400.0, 0.0);
    tl.play(10_000.0);
    assert_eq!(tl.current_time_ms(), 400.0);
    tl.tick(10_100.0);
    assert_eq!(tl.current_time_ms(), 500.0);

    tl.pause();
    tl.seek(1_000.0, 20_000.0);
    tl.play(20_000.0);
    assert_eq!(tl.current_time_ms(), 0.0);
    assert!(tl.is_playing());
    tl.tick(20_250.0);
    assert_eq!(tl.current_time_ms(), 250.0);
}
