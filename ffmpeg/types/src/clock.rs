/*!
    Clock and synchronization types.
*/

use std::sync::atomic::{AtomicU64, Ordering};

/**
    Atomic f64 wrapper.

    Clock readings are written by one thread (a decode thread or the audio
    callback) and read by the display thread, so they are published as raw
    bits through an `AtomicU64` rather than behind a lock.
*/
#[derive(Debug, Default)]
pub struct AtomicF64 {
    inner: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            inner: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.inner.load(ordering))
    }

    pub fn store(&self, value: f64, ordering: Ordering) {
        self.inner.store(value.to_bits(), ordering);
    }
}

/**
    Trait for presentation clocks.

    A clock reports the media time, in seconds, that its engine considers
    "now". The synchronizer compares the video clock against the audio clock
    on every display tick.
*/
pub trait Clock: Send + Sync {
    /// Current media time in seconds.
    fn seconds(&self) -> f64;
}

static_assertions::assert_impl_all!(AtomicF64: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl Clock for Fixed {
        fn seconds(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn atomic_f64_default_is_zero() {
        let value = AtomicF64::default();
        assert_eq!(value.load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn atomic_f64_store_load() {
        let value = AtomicF64::new(1.5);
        assert_eq!(value.load(Ordering::Relaxed), 1.5);

        value.store(-0.25, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), -0.25);
    }

    #[test]
    fn clock_is_object_safe() {
        let clock: Box<dyn Clock> = Box::new(Fixed(10.5));
        assert_eq!(clock.seconds(), 10.5);
    }
}
