/*!
    Rational number type for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for time bases (e.g., 1/90000 for MPEG-TS) and frame rates
    (e.g., 24000/1001 for 23.976 fps). Containers routinely report `0/0` or
    `0/1` for unknown rates, so zero components are representable and
    [`Rational::checked_to_f64`] is the way to ask "is this usable?".
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Convert to f64, or None if the value is zero or undefined.
    */
    #[inline]
    pub fn checked_to_f64(self) -> Option<f64> {
        if self.num == 0 || self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }

    /**
        Invert the rational (swap numerator and denominator).

        Returns None for a zero or undefined value.
    */
    #[inline]
    pub const fn invert(self) -> Option<Self> {
        if self.num == 0 || self.den == 0 {
            None
        } else {
            Some(Self {
                num: self.den,
                den: self.num,
            })
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}
