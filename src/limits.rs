// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Numeric limits derived from a format descriptor.

use crate::convert::convert_bits;
use crate::float::Float;
use crate::float::FloatTraits;
use crate::properties::FloatProperties;
use crate::properties::NaNBehavior;
use crate::rounding::RoundingMode;
use crate::status::FPState;
use crate::FloatBitsType;

/// Canonical bit patterns and scalar facts for one format.
///
/// Mirrors what the converter produces: `max` is the largest magnitude it
/// never turns into an overflow, and `infinity` is `max` for formats that
/// saturate or have no infinity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NumericLimits {
    /// smallest positive normal
    pub min: u64,
    pub max: u64,
    pub lowest: u64,
    /// distance from 1.0 to the next larger value
    pub epsilon: u64,
    pub round_error: u64,
    pub infinity: u64,
    pub quiet_nan: Option<u64>,
    pub signaling_nan: Option<u64>,
    pub denorm_min: u64,
    /// bits of precision, counting the implicit leading bit
    pub digits: u32,
    pub min_exponent: i32,
    pub max_exponent: i32,
    pub has_infinity: bool,
    pub has_quiet_nan: bool,
    pub has_signaling_nan: bool,
    pub is_signed: bool,
}

fn exact_from_f64(value: f64, properties: FloatProperties) -> u64 {
    convert_bits(
        value.to_bits(),
        FloatProperties::F64,
        properties,
        Some(RoundingMode::TiesToEven),
        Some(&mut FPState::default()),
    )
}

impl NumericLimits {
    pub fn of(properties: FloatProperties) -> Self {
        let max = properties.max_finite_magnitude();
        let lowest = if properties.has_sign_bit() {
            max | properties.sign_field_mask()
        } else {
            0
        };
        let infinity = if properties.has_infinity() {
            properties.signed_infinity_bits(false).unwrap_or(max)
        } else {
            max
        };
        let nan_checker = properties.nan_checker();
        let (quiet_nan, signaling_nan) = match properties.nan_behavior() {
            NaNBehavior::NoNaN => (None, None),
            NaNBehavior::QuietNaN | NaNBehavior::SignalingNaN => {
                (nan_checker.quiet_nan(), nan_checker.signaling_nan())
            }
        };
        let round_error = match properties.rounding_mode() {
            RoundingMode::TiesToEven => 0.5,
            _ => 1.0,
        };
        let mantissa_width = properties.mantissa_width() as i32;
        Self {
            min: 1 << properties.mantissa_width(),
            max,
            lowest,
            epsilon: exact_from_f64(2f64.powi(-mantissa_width), properties),
            round_error: exact_from_f64(round_error, properties),
            infinity,
            quiet_nan,
            signaling_nan,
            denorm_min: 1,
            digits: properties.mantissa_width() + 1,
            min_exponent: properties.min_normal_exponent() + 1,
            max_exponent: properties.max_finite_exponent() + 1,
            has_infinity: properties.has_infinity(),
            has_quiet_nan: quiet_nan.is_some(),
            has_signaling_nan: signaling_nan.is_some(),
            is_signed: properties.has_sign_bit(),
        }
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> Float<FT> {
    pub fn numeric_limits(&self) -> NumericLimits {
        NumericLimits::of(self.properties())
    }
    fn limit_with_traits(traits: FT, pick: impl FnOnce(&NumericLimits) -> u64) -> Self {
        let bits = pick(&NumericLimits::of(traits.properties()));
        Self::from_bits_and_traits(Bits::truncate_from_u64(bits), traits)
    }
    pub fn min_positive_normal_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.min)
    }
    pub fn min_positive_normal() -> Self
    where
        FT: Default,
    {
        Self::min_positive_normal_with_traits(FT::default())
    }
    pub fn max_value_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.max)
    }
    pub fn max_value() -> Self
    where
        FT: Default,
    {
        Self::max_value_with_traits(FT::default())
    }
    pub fn lowest_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.lowest)
    }
    pub fn lowest() -> Self
    where
        FT: Default,
    {
        Self::lowest_with_traits(FT::default())
    }
    pub fn epsilon_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.epsilon)
    }
    pub fn epsilon() -> Self
    where
        FT: Default,
    {
        Self::epsilon_with_traits(FT::default())
    }
    pub fn round_error_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.round_error)
    }
    pub fn round_error() -> Self
    where
        FT: Default,
    {
        Self::round_error_with_traits(FT::default())
    }
    pub fn infinity_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.infinity)
    }
    /// positive infinity, or the largest finite value when there is none
    pub fn infinity() -> Self
    where
        FT: Default,
    {
        Self::infinity_with_traits(FT::default())
    }
    pub fn denorm_min_with_traits(traits: FT) -> Self {
        Self::limit_with_traits(traits, |limits| limits.denorm_min)
    }
    pub fn denorm_min() -> Self
    where
        FT: Default,
    {
        Self::denorm_min_with_traits(FT::default())
    }
}
