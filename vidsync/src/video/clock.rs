use std::sync::atomic::Ordering;

use ffmpeg_types::{AtomicF64, Clock, VideoFrame};

/**
    Video presentation clock.

    Written by the decode thread once per decoded frame, read by the display
    thread on every tick.
*/
#[derive(Debug)]
pub struct VideoClock {
    seconds: AtomicF64,
    frame_duration: f64,
}

impl VideoClock {
    /**
        Create a clock at zero advancing by `frame_duration` seconds per frame.
    */
    pub fn new(frame_duration: f64) -> Self {
        Self {
            seconds: AtomicF64::new(0.0),
            frame_duration,
        }
    }

    pub fn frame_duration(&self) -> f64 {
        self.frame_duration
    }

    /**
        Account for a newly decoded frame.

        The clock jumps to the frame's decode timestamp, or its presentation
        timestamp, when either is known, and then always advances by the
        nominal frame duration plus half of it for each repeated field.
    */
    pub fn update(&self, frame: &VideoFrame) {
        let base = frame
            .decode_seconds()
            .or_else(|| frame.presentation_seconds())
            .unwrap_or_else(|| self.seconds());

        let delay = self.frame_duration + frame.repeat_fields as f64 * self.frame_duration * 0.5;
        self.seconds.store(base + delay, Ordering::Release);
    }
}

impl Clock for VideoClock {
    fn seconds(&self) -> f64 {
        self.seconds.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::{PixelFormat, Pts, Rational};

    const TB: Rational = Rational { num: 1, den: 100 };

    fn frame(pts: Option<i64>, dts: Option<i64>) -> VideoFrame {
        VideoFrame::new(vec![], 2, 2, PixelFormat::Yuv420p, pts.map(Pts), TB)
            .with_dts(dts.map(Pts))
    }

    #[test]
    fn prefers_decode_timestamp() {
        let clock = VideoClock::new(0.25);
        clock.update(&frame(Some(300), Some(200)));
        assert_eq!(clock.seconds(), 2.25);
    }

    #[test]
    fn falls_back_to_presentation_timestamp() {
        let clock = VideoClock::new(0.25);
        clock.update(&frame(Some(300), None));
        assert_eq!(clock.seconds(), 3.25);
    }

    #[test]
    fn extrapolates_without_timestamps() {
        let clock = VideoClock::new(0.25);
        clock.update(&frame(None, Some(100)));
        clock.update(&frame(None, None));
        clock.update(&frame(None, None));
        assert_eq!(clock.seconds(), 1.75);
    }

    #[test]
    fn repeated_fields_add_half_frames() {
        let clock = VideoClock::new(0.5);
        clock.update(&frame(None, None).with_repeat_fields(2));
        assert_eq!(clock.seconds(), 1.0);
    }
}
