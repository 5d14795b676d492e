use ffmpeg_types::Clock;
use parking_lot::Mutex;

use super::convert::OUTPUT_BYTES_PER_SAMPLE;

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    decoded: f64,
    buffered_bytes: usize,
}

/**
    Audio presentation clock.

    The callback thread records the media time of the most recently decoded
    data and how many decoded bytes are still waiting to be emitted. Readers
    get the decoded time minus that backlog, i.e. the time actually reaching
    the speaker rather than the time already decoded.

    Both values live behind one lock, so a reader never pairs a new
    timestamp with the backlog of the previous chunk.
*/
pub struct AudioClock {
    position: Mutex<Position>,
    bytes_per_second: usize,
}

impl AudioClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position: Mutex::new(Position::default()),
            bytes_per_second: sample_rate as usize * channels as usize * OUTPUT_BYTES_PER_SAMPLE,
        }
    }

    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_second
    }

    /**
        Media time of the most recently decoded data.
    */
    pub fn decoded_seconds(&self) -> f64 {
        self.position.lock().decoded
    }

    /**
        Set the decoded time from a timestamp.
    */
    pub fn set_decoded(&self, seconds: f64) {
        self.position.lock().decoded = seconds;
    }

    /**
        Move the decoded time forward by the duration of `bytes` of output.
    */
    pub fn advance_by_bytes(&self, bytes: usize) {
        let mut position = self.position.lock();
        position.decoded += self.duration_of(bytes);
    }

    /**
        Record how many decoded bytes have not been emitted yet.
    */
    pub fn set_buffered(&self, bytes: usize) {
        self.position.lock().buffered_bytes = bytes;
    }

    /**
        Record a freshly refilled scratch buffer holding `bytes` of output.

        The decoded time becomes `timestamp`, or advances by the duration of
        `bytes` without one, and the backlog becomes `bytes`, in one step.
    */
    pub fn refilled(&self, timestamp: Option<f64>, bytes: usize) {
        let mut position = self.position.lock();
        position.decoded = match timestamp {
            Some(seconds) => seconds,
            None => position.decoded + self.duration_of(bytes),
        };
        position.buffered_bytes = bytes;
    }

    fn duration_of(&self, bytes: usize) -> f64 {
        if self.bytes_per_second == 0 {
            return 0.0;
        }
        bytes as f64 / self.bytes_per_second as f64
    }
}

impl Clock for AudioClock {
    fn seconds(&self) -> f64 {
        let position = *self.position.lock();
        position.decoded - self.duration_of(position.buffered_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = AudioClock::new(48000, 2);
        assert_eq!(clock.seconds(), 0.0);
        assert_eq!(clock.bytes_per_second(), 48000 * 2 * 2);
    }

    #[test]
    fn subtracts_unplayed_backlog() {
        let clock = AudioClock::new(48000, 2);
        clock.set_decoded(10.0);
        // A quarter second of stereo S16 still waiting in the scratch buffer
        clock.set_buffered(48000);
        assert_eq!(clock.seconds(), 9.75);
    }

    #[test]
    fn extrapolates_from_bytes() {
        let clock = AudioClock::new(8000, 1);
        clock.set_decoded(1.0);
        clock.advance_by_bytes(8000);
        assert_eq!(clock.decoded_seconds(), 1.5);
    }

    #[test]
    fn refill_moves_time_and_backlog_together() {
        let clock = AudioClock::new(8000, 1);
        clock.set_decoded(1.0);
        clock.set_buffered(4000);

        clock.refilled(Some(2.0), 8000);
        assert_eq!(clock.decoded_seconds(), 2.0);
        assert_eq!(clock.seconds(), 1.5);

        clock.refilled(None, 4000);
        assert_eq!(clock.decoded_seconds(), 2.25);
        assert_eq!(clock.seconds(), 2.0);
    }

    #[test]
    fn readers_never_see_a_torn_position() {
        use std::sync::Arc;
        use std::thread;

        // Every refill puts the speaker at exactly 1.0 s; only a reader that
        // mixes two refills could see anything else.
        let clock = Arc::new(AudioClock::new(8000, 1));
        clock.refilled(Some(1.5), 8000);

        let writer = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                for i in 0..20_000usize {
                    let bytes = 8000 + (i % 7) * 1600;
                    clock.refilled(Some(1.0 + bytes as f64 / 16000.0), bytes);
                }
            })
        };
        for _ in 0..20_000 {
            assert!((clock.seconds() - 1.0).abs() < 1e-9);
        }
        writer.join().unwrap();
    }

    #[test]
    fn zero_rate_does_not_divide() {
        let clock = AudioClock::new(0, 2);
        clock.set_decoded(3.0);
        clock.set_buffered(1000);
        clock.advance_by_bytes(1000);
        assert_eq!(clock.seconds(), 3.0);
    }
}
