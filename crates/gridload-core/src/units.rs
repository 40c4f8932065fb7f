//! Unit newtypes for load and line quantities.
//!
//! Grid records mix volts (as published in the raw datasets), kilovolts (as
//! the optimization model expects), ohms, metres and MVA. Keeping them as
//! distinct types stops a raw voltage from being written where a kV value is
//! expected.
//!
//! All types are `#[repr(transparent)]` over `f64` and serialize as bare
//! numbers.
//!
//! ```
//! use gridload_core::units::{Ohms, Volts};
//!
//! let kv = Volts(220_000.0).to_kilovolts();
//! assert_eq!(kv.value(), 220.0);
//!
//! let r = Ohms(2.0).parallel(Ohms(2.0));
//! assert_eq!(r, Ohms(1.0));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Apparent power in megavolt-amperes (MVA); line thermal capacity
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);

impl_unit_ops!(MegavoltAmperes, "MVA");

/// Voltage in volts, as published by the raw grid extracts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Volts(pub f64);

impl_unit_ops!(Volts, "V");

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl Volts {
    #[inline]
    pub fn to_kilovolts(self) -> Kilovolts {
        Kilovolts(self.0 / 1000.0)
    }
}

/// Resistance in ohms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ohms(pub f64);

impl_unit_ops!(Ohms, "Ω");

impl Ohms {
    /// Equivalent resistance of two resistors in parallel: 1 / (1/a + 1/b).
    ///
    /// A zero resistance short-circuits the pair and yields zero.
    #[inline]
    pub fn parallel(self, other: Ohms) -> Ohms {
        if self.0 == 0.0 || other.0 == 0.0 {
            Ohms(0.0)
        } else {
            Ohms(1.0 / (1.0 / self.0 + 1.0 / other.0))
        }
    }
}

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volts_convert_to_kilovolts() {
        assert_eq!(Volts(380_000.0).to_kilovolts(), Kilovolts(380.0));
        assert_eq!(Volts(0.0).to_kilovolts(), Kilovolts(0.0));
    }

    #[test]
    fn parallel_resistance_is_associative() {
        let a = Ohms(3.0);
        let b = Ohms(6.0);
        let c = Ohms(2.0);
        let left = a.parallel(b).parallel(c);
        let right = a.parallel(b.parallel(c));
        assert!((left.value() - right.value()).abs() < 1e-12);
        assert!((left.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_with_short_is_zero() {
        assert_eq!(Ohms(5.0).parallel(Ohms(0.0)), Ohms(0.0));
    }

    #[test]
    fn sums_and_ratios() {
        let total: Meters = vec![Meters(100.0), Meters(250.0)].into_iter().sum();
        assert_eq!(total, Meters(350.0));
        assert_eq!(MegavoltAmperes(300.0) / MegavoltAmperes(150.0), 2.0);
        assert_eq!(format!("{}", Kilovolts(220.0)), "220.0000 kV");
    }
}
