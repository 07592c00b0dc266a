// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Bit-level conversion between any two [`FloatProperties`] formats.

use crate::properties::FloatProperties;
use crate::properties::NaNBehavior;
use crate::properties::OverflowBehavior;
use crate::properties::UnsignedBehavior;
use crate::random::with_thread_rng;
use crate::rounding::shift_right_rounded;
use crate::rounding::RoundingMode;
use crate::status::with_fp_state;
use crate::status::FPState;
use crate::status::StatusFlags;
use rand::Rng;

/// Convert the bit pattern `bits` of format `from` to format `to`.
///
/// `rounding_mode` defaults to `to`'s rounding mode. Exceptions are raised
/// into `fp_state`, or into the calling thread's exception environment
/// when `fp_state` is `None`. Stochastic modes draw from the thread's
/// generator, see [`set_seed`](crate::set_seed).
pub fn convert_bits(
    bits: u64,
    from: FloatProperties,
    to: FloatProperties,
    rounding_mode: Option<RoundingMode>,
    fp_state: Option<&mut FPState>,
) -> u64 {
    with_thread_rng(|rng| convert_bits_with_rng(bits, from, to, rounding_mode, fp_state, rng))
}

/// [`convert_bits`] drawing stochastic rounding entropy from `rng`
pub fn convert_bits_with_rng<R: Rng + ?Sized>(
    bits: u64,
    from: FloatProperties,
    to: FloatProperties,
    rounding_mode: Option<RoundingMode>,
    fp_state: Option<&mut FPState>,
    rng: &mut R,
) -> u64 {
    let rounding_mode = rounding_mode.unwrap_or_else(|| to.rounding_mode());
    with_fp_state(fp_state, |fp_state| {
        Conversion {
            from,
            to,
            rounding_mode,
        }
        .run(bits & from.overall_mask(), fp_state, rng)
    })
}

/// NaN for a format; formats without one get a fallback and `INVALID_OPERATION`
pub(crate) fn nan_result(to: &FloatProperties, signaling: bool, fp_state: &mut FPState) -> u64 {
    let nan = match to.nan_behavior() {
        NaNBehavior::NoNaN => None,
        NaNBehavior::QuietNaN | NaNBehavior::SignalingNaN => to.nan_bits(signaling),
    };
    match nan {
        Some(nan) => nan,
        None => {
            fp_state.raise(StatusFlags::INVALID_OPERATION);
            to.nan_bits(true)
                .unwrap_or_else(|| to.max_finite_magnitude())
        }
    }
}

/// result of storing a negative nonzero value in an unsigned format
pub(crate) fn unsigned_negative_result(to: &FloatProperties, fp_state: &mut FPState) -> u64 {
    fp_state.raise(StatusFlags::UNDERFLOW);
    match to.unsigned_behavior() {
        UnsignedBehavior::ClampToZero => 0,
        UnsignedBehavior::MapToNaN => nan_result(
            to,
            to.nan_behavior() == NaNBehavior::SignalingNaN,
            fp_state,
        ),
    }
}

/// put the sign back unless that would spell a NaN, as `-0` does in some formats
pub(crate) fn with_sign(to: &FloatProperties, magnitude: u64, negative: bool) -> u64 {
    if !negative {
        return magnitude;
    }
    let signed = magnitude | to.sign_field_mask();
    if to.is_nan(signed) && !to.is_nan(magnitude) {
        magnitude
    } else {
        signed
    }
}

fn overflow_result(to: &FloatProperties, negative: bool, fp_state: &mut FPState) -> u64 {
    fp_state.raise(StatusFlags::OVERFLOW | StatusFlags::INEXACT);
    if to.has_infinity() {
        if let Some(infinity) = to.signed_infinity_bits(negative) {
            return infinity;
        }
    }
    with_sign(to, to.max_finite_magnitude(), negative)
}

/// significand with its leading one at bit `mantissa_width`, and the
/// unbiased exponent of that leading one
fn normalize(properties: &FloatProperties, magnitude: u64) -> (u64, i64) {
    let mantissa_width = properties.mantissa_width();
    let biased_exponent = (magnitude >> mantissa_width) as i64;
    let fraction = magnitude & properties.mantissa_field_mask();
    let bias = i64::from(properties.exponent_bias());
    if biased_exponent == 0 {
        let msb = 63 - fraction.leading_zeros();
        let normalization_shift = mantissa_width - msb;
        (
            fraction << normalization_shift,
            1 - bias - i64::from(normalization_shift),
        )
    } else {
        (fraction | 1 << mantissa_width, biased_exponent - bias)
    }
}

struct Conversion {
    from: FloatProperties,
    to: FloatProperties,
    rounding_mode: RoundingMode,
}

impl Conversion {
    fn run<R: Rng + ?Sized>(&self, bits: u64, fp_state: &mut FPState, rng: &mut R) -> u64 {
        let Self { from, to, .. } = self;
        let negative = bits & from.sign_field_mask() != 0;
        let magnitude = bits & from.magnitude_mask();
        let is_nan = from.is_nan(bits);
        // negative NaNs count as negative; NaN at the `-0` pattern has no magnitude
        if negative && !to.has_sign_bit() && (magnitude != 0 || is_nan) {
            return unsigned_negative_result(to, fp_state);
        }
        if is_nan {
            if from.nan_checker().is_signaling_nan(bits) {
                fp_state.raise(StatusFlags::INVALID_OPERATION);
            }
            return nan_result(to, false, fp_state);
        }
        if magnitude == 0 {
            return with_sign(to, 0, negative && to.has_sign_bit());
        }
        if from.is_infinity(bits) {
            if to.overflow_behavior() == OverflowBehavior::Extended {
                if let Some(infinity) = to.signed_infinity_bits(negative) {
                    return infinity;
                }
            }
            return overflow_result(to, negative, fp_state);
        }
        let (significand, exponent) = normalize(from, magnitude);
        let biased_to_exponent = exponent + i64::from(to.exponent_bias());
        let result = if biased_to_exponent >= 1 {
            self.round_normal(significand, biased_to_exponent, negative, fp_state, rng)
        } else {
            self.round_subnormal(significand, biased_to_exponent, negative, fp_state, rng)
        };
        if result > u128::from(to.max_finite_magnitude()) {
            return overflow_result(to, negative, fp_state);
        }
        with_sign(to, result as u64, negative)
    }

    fn shift_right<R: Rng + ?Sized>(
        &self,
        significand: u64,
        shift: i64,
        negative: bool,
        rng: &mut R,
    ) -> (u128, bool) {
        if shift <= 0 {
            return (u128::from(significand) << -shift, false);
        }
        let shift = shift.min(i64::from(u32::max_value())) as u32;
        shift_right_rounded(
            self.rounding_mode,
            u128::from(significand),
            shift,
            !negative,
            self.to.stochastic_rounding_bits(),
            rng,
        )
    }

    /// Result is normal in the destination before rounding. Returns the
    /// wide magnitude so that exponent overflow stays visible.
    fn round_normal<R: Rng + ?Sized>(
        &self,
        significand: u64,
        mut biased_exponent: i64,
        negative: bool,
        fp_state: &mut FPState,
        rng: &mut R,
    ) -> u128 {
        let from_mantissa_width = i64::from(self.from.mantissa_width());
        let to_mantissa_width = self.to.mantissa_width();
        let (mut significand, inexact) = self.shift_right(
            significand,
            from_mantissa_width - i64::from(to_mantissa_width),
            negative,
            rng,
        );
        if inexact {
            fp_state.raise(StatusFlags::INEXACT);
        }
        if significand >> (to_mantissa_width + 1) != 0 {
            // rounding carried out of the mantissa
            significand >>= 1;
            biased_exponent += 1;
        }
        let mantissa = significand & u128::from(self.to.mantissa_field_mask());
        (biased_exponent as u128) << to_mantissa_width | mantissa
    }

    /// Result is subnormal or zero in the destination before rounding.
    fn round_subnormal<R: Rng + ?Sized>(
        &self,
        significand: u64,
        biased_exponent: i64,
        negative: bool,
        fp_state: &mut FPState,
        rng: &mut R,
    ) -> u128 {
        let from_mantissa_width = i64::from(self.from.mantissa_width());
        let to_mantissa_width = i64::from(self.to.mantissa_width());
        let shift = from_mantissa_width - to_mantissa_width + 1 - biased_exponent;
        let (fraction, inexact) = self.shift_right(significand, shift, negative, rng);
        if inexact {
            fp_state.raise(StatusFlags::INEXACT | StatusFlags::UNDERFLOW);
        }
        // a carry into bit `to_mantissa_width` is exactly the smallest normal
        fraction
    }
}
