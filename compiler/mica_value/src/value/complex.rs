use std::fmt;
use std::ops::{Add, Mul, Sub};

macro_rules! complex_type {
    ($name:ident, $float:ty) => {
        /// Complex number with real and imaginary parts.
        #[derive(Copy, Clone, Debug, Default, PartialEq)]
        pub struct $name {
            pub re: $float,
            pub im: $float,
        }

        impl $name {
            #[inline]
            pub const fn new(re: $float, im: $float) -> Self {
                $name { re, im }
            }
        }

        impl Add for $name {
            type Output = $name;

            #[inline]
            fn add(self, rhs: $name) -> $name {
                $name::new(self.re + rhs.re, self.im + rhs.im)
            }
        }

        impl Sub for $name {
            type Output = $name;

            #[inline]
            fn sub(self, rhs: $name) -> $name {
                $name::new(self.re - rhs.re, self.im - rhs.im)
            }
        }

        impl Mul for $name {
            type Output = $name;

            #[inline]
            fn mul(self, rhs: $name) -> $name {
                $name::new(
                    self.re * rhs.re - self.im * rhs.im,
                    self.re * rhs.im + self.im * rhs.re,
                )
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "({}{:+}i)", self.re, self.im)
            }
        }
    };
}

complex_type!(Complex64, f32);
complex_type!(Complex128, f64);

impl Complex64 {
    #[inline]
    pub fn widen(self) -> Complex128 {
        Complex128::new(f64::from(self.re), f64::from(self.im))
    }
}

impl Complex128 {
    /// Narrow both parts to `f32`, rounding to nearest.
    #[inline]
    pub fn narrow(self) -> Complex64 {
        Complex64::new(self.re as f32, self.im as f32)
    }
}
