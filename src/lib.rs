// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Bit-exact software emulation of low-precision binary floating-point
//! formats.
//!
//! A format is described at run time by a [`FloatProperties`] and converted
//! to and from any other format by [`convert_bits`], which supports the
//! deterministic IEEE 754 rounding modes plus several stochastic ones.
//! [`Float`] wraps a bit pattern together with its format and provides
//! arithmetic, comparisons and conversions.

use num_traits::PrimInt;
use num_traits::Unsigned;
use std::fmt;
use std::hash::Hash;
use std::ops::Mul;
use std::ops::MulAssign;
use std::ops::Neg;

pub mod convert;
mod float;
mod limits;
mod properties;
pub mod random;
pub mod rounding;
pub mod status;
#[cfg(test)]
mod test_cases;

pub use crate::convert::convert_bits;
pub use crate::convert::convert_bits_with_rng;
pub use crate::float::*;
pub use crate::limits::NumericLimits;
pub use crate::properties::*;
pub use crate::random::set_seed;
pub use crate::rounding::RoundingMode;
pub use crate::status::FPState;
pub use crate::status::StatusFlags;
pub use crate::status::TrapHandler;

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Sign {
    Positive = 0,
    Negative = 1,
}

impl Neg for Sign {
    type Output = Self;
    fn neg(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

impl Mul for Sign {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        match self {
            Self::Positive => rhs,
            Self::Negative => -rhs,
        }
    }
}

impl MulAssign for Sign {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Storage for a [`Float`]'s bit pattern.
pub trait FloatBitsType:
    PrimInt
    + Unsigned
    + Default
    + Hash
    + fmt::Debug
    + fmt::UpperHex
    + fmt::LowerHex
    + fmt::Binary
    + Into<u64>
    + Send
    + Sync
    + 'static
{
    /// keep the low bits of `v` that fit in `Self`
    fn truncate_from_u64(v: u64) -> Self;
}

macro_rules! impl_float_bits_type {
    ($t:ty) => {
        impl FloatBitsType for $t {
            #[inline]
            fn truncate_from_u64(v: u64) -> Self {
                v as $t
            }
        }
    };
}

impl_float_bits_type!(u8);
impl_float_bits_type!(u16);
impl_float_bits_type!(u32);
impl_float_bits_type!(u64);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FloatClass {
    NegativeInfinity,
    NegativeNormal,
    NegativeSubnormal,
    NegativeZero,
    PositiveInfinity,
    PositiveNormal,
    PositiveSubnormal,
    PositiveZero,
    QuietNaN,
    SignalingNaN,
}

impl FloatClass {
    #[inline]
    pub fn sign(self) -> Option<Sign> {
        match self {
            FloatClass::NegativeInfinity
            | FloatClass::NegativeNormal
            | FloatClass::NegativeSubnormal
            | FloatClass::NegativeZero => Some(Sign::Negative),
            FloatClass::PositiveInfinity
            | FloatClass::PositiveNormal
            | FloatClass::PositiveSubnormal
            | FloatClass::PositiveZero => Some(Sign::Positive),
            FloatClass::QuietNaN | FloatClass::SignalingNaN => None,
        }
    }
    #[inline]
    pub fn abs(self) -> Self {
        match self.sign() {
            Some(Sign::Negative) => -self,
            _ => self,
        }
    }
    #[inline]
    pub fn is_quiet_nan(self) -> bool {
        self == FloatClass::QuietNaN
    }
    #[inline]
    pub fn is_signaling_nan(self) -> bool {
        self == FloatClass::SignalingNaN
    }
    #[inline]
    pub fn is_infinity(self) -> bool {
        self == FloatClass::NegativeInfinity || self == FloatClass::PositiveInfinity
    }
    #[inline]
    pub fn is_normal(self) -> bool {
        self == FloatClass::NegativeNormal || self == FloatClass::PositiveNormal
    }
    #[inline]
    pub fn is_subnormal(self) -> bool {
        self == FloatClass::NegativeSubnormal || self == FloatClass::PositiveSubnormal
    }
    #[inline]
    pub fn is_zero(self) -> bool {
        self == FloatClass::NegativeZero || self == FloatClass::PositiveZero
    }
    #[inline]
    pub fn is_nan(self) -> bool {
        self == FloatClass::QuietNaN || self == FloatClass::SignalingNaN
    }
    #[inline]
    pub fn is_finite(self) -> bool {
        self.is_zero() || self.is_subnormal() || self.is_normal()
    }
    #[inline]
    pub fn is_subnormal_or_zero(self) -> bool {
        self.is_zero() || self.is_subnormal()
    }
}

impl Neg for FloatClass {
    type Output = Self;
    fn neg(self) -> Self {
        use FloatClass::*;
        match self {
            NegativeInfinity => PositiveInfinity,
            NegativeNormal => PositiveNormal,
            NegativeSubnormal => PositiveSubnormal,
            NegativeZero => PositiveZero,
            PositiveInfinity => NegativeInfinity,
            PositiveNormal => NegativeNormal,
            PositiveSubnormal => NegativeSubnormal,
            PositiveZero => NegativeZero,
            QuietNaN => QuietNaN,
            SignalingNaN => SignalingNaN,
        }
    }
}


macro_rules! doctest {
    ($x:expr) => {
        #[doc = $x]
        extern {}
    };
}

doctest!(include_str!("../README.md"));
