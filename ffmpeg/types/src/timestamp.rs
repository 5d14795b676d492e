/*!
    Timestamp types for media timing.
*/

use crate::Rational;

/**
    Presentation or decode timestamp in time_base units.

    This is the raw timestamp value from the media stream. To convert to
    seconds, you need the stream's time base.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert this timestamp to seconds using the given time base.

        Negative timestamps (common at stream start with B-frames) are kept
        negative; clocks derived from them are allowed to start below zero.
    */
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        if time_base.den == 0 {
            return 0.0;
        }
        (self.0 as f64 * time_base.num as f64) / time_base.den as f64
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/**
    Duration in time_base units.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    /**
        Convert this duration to seconds using the given time base.

        Negative values are clamped to zero.
    */
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        if self.0 <= 0 {
            return 0.0;
        }
        Pts(self.0).to_seconds(time_base)
    }
}

impl From<i64> for MediaDuration {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
