use std::time::Duration;

use ffmpeg_types::Clock;

use crate::config::PlayerConfig;

/**
    Memory the synchronizer carries from one display tick to the next.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    /// Video clock reading at the previous tick.
    pub previous_clock: f64,
    /// Base delay used at the previous tick.
    pub previous_delay: f64,
    /// Frame-to-frame delays at or above this are discontinuities.
    pub max_frame_delay: f64,
}

impl SyncState {
    pub fn new(initial_delay: f64, max_frame_delay: f64) -> Self {
        Self {
            previous_clock: 0.0,
            previous_delay: initial_delay,
            max_frame_delay,
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new(0.04, 1.0)
    }
}

/**
    Compute the delay in seconds before the next display tick.

    The base delay is how far the video clock moved since the previous tick;
    a non-positive or oversized step is a timestamp discontinuity and the
    previous base delay is reused instead. The base delay is then corrected
    toward the audio clock: when video is ahead of audio by at least one
    frame the next tick fires immediately, and when it lags by at least one
    frame the wait is doubled.

    Without an audio clock the base delay is returned unchanged.
*/
pub fn frame_delay(video_now: f64, audio_now: Option<f64>, state: &mut SyncState) -> f64 {
    let mut delay = video_now - state.previous_clock;
    if delay <= 0.0 || delay >= state.max_frame_delay {
        delay = state.previous_delay;
    }

    state.previous_clock = video_now;
    state.previous_delay = delay;

    let Some(audio_now) = audio_now else {
        return delay;
    };

    let drift = video_now - audio_now;
    if drift <= -delay {
        0.0
    } else if drift >= delay {
        2.0 * delay
    } else {
        delay
    }
}

/**
    Display-tick scheduler comparing the video clock against the audio clock.
*/
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    state: SyncState,
}

impl Synchronizer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            state: SyncState::new(config.initial_frame_delay, config.max_frame_delay),
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /**
        Read both clocks and return the wait before the next tick.
    */
    pub fn next_delay(&mut self, video: &dyn Clock, audio: Option<&dyn Clock>) -> Duration {
        let video_now = video.seconds();
        let audio_now = audio.map(|clock| clock.seconds());
        let delay = frame_delay(video_now, audio_now, &mut self.state);
        log::trace!("[sync] video {video_now:.3} audio {audio_now:?} next tick in {delay:.3}s");
        Duration::from_secs_f64(delay.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn state(previous_clock: f64, previous_delay: f64) -> SyncState {
        SyncState {
            previous_clock,
            previous_delay,
            max_frame_delay: 1.0,
        }
    }

    struct Fixed(f64);

    impl Clock for Fixed {
        fn seconds(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn in_sync_keeps_base_delay() {
        let mut s = state(10.45, 0.033);
        let delay = frame_delay(10.50, Some(10.50), &mut s);
        assert!(approx(delay, 0.05));
        assert_eq!(s.previous_clock, 10.50);
        assert!(approx(s.previous_delay, 0.05));
    }

    #[test]
    fn backwards_step_reuses_previous_delay() {
        let mut s = state(11.00, 0.04);
        let delay = frame_delay(10.50, Some(10.50), &mut s);
        assert_eq!(delay, 0.04);
        assert_eq!(s.previous_delay, 0.04);
        assert_eq!(s.previous_clock, 10.50);
    }

    #[test]
    fn oversized_step_reuses_previous_delay() {
        let mut s = state(2.0, 0.04);
        assert_eq!(frame_delay(3.0, None, &mut s), 0.04);
        assert_eq!(frame_delay(3.0, None, &mut s), 0.04);
    }

    #[test]
    fn video_ahead_catches_up_immediately() {
        let mut s = state(1.00, 0.04);
        // base 0.04, drift -0.05
        assert_eq!(frame_delay(1.04, Some(1.09), &mut s), 0.0);
    }

    #[test]
    fn video_behind_doubles_wait() {
        let mut s = state(1.00, 0.04);
        // base 0.04, drift +0.05
        let delay = frame_delay(1.04, Some(0.99), &mut s);
        assert!(approx(delay, 0.08));
        assert!(approx(s.previous_delay, 0.04));
    }

    #[test]
    fn without_audio_returns_base_delay() {
        let mut s = SyncState::default();
        assert!(approx(frame_delay(0.04, None, &mut s), 0.04));
        assert!(approx(frame_delay(0.04, None, &mut s), 0.04));
        assert!(approx(frame_delay(0.10, None, &mut s), 0.06));
    }

    #[test]
    fn synchronizer_reads_clocks() {
        let mut sync = Synchronizer::new(&PlayerConfig::default());
        let audio = Fixed(0.10);
        let first = sync.next_delay(&Fixed(0.04), Some(&audio));
        // drift of -0.06 is more than one frame
        assert_eq!(first, Duration::ZERO);
        assert!(approx(sync.state().previous_clock, 0.04));

        let second = sync.next_delay(&Fixed(0.08), None);
        assert!((second.as_secs_f64() - 0.04).abs() < 1e-6);
    }
}
