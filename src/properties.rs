// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Format descriptors: bit layout, bias, rounding, overflow and special-value encoding.

use crate::RoundingMode;
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OverflowBehavior {
    /// out-of-range magnitudes become infinity when the format encodes one
    Extended,
    /// out-of-range magnitudes clamp to the largest finite value
    Saturating,
}

impl Default for OverflowBehavior {
    fn default() -> Self {
        OverflowBehavior::Extended
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NaNBehavior {
    QuietNaN,
    NoNaN,
    SignalingNaN,
}

impl Default for NaNBehavior {
    fn default() -> Self {
        NaNBehavior::QuietNaN
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Signedness {
    Signed,
    Unsigned,
}

impl Default for Signedness {
    fn default() -> Self {
        Signedness::Signed
    }
}

/// what an unsigned format does with a negative nonzero input
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnsignedBehavior {
    ClampToZero,
    MapToNaN,
}

impl Default for UnsignedBehavior {
    fn default() -> Self {
        UnsignedBehavior::ClampToZero
    }
}

/// Recognizes the bit patterns a format reserves for infinity.
///
/// Bit patterns are passed with the sign bit (if any) in place.
pub trait InfChecker: fmt::Debug + Sync {
    fn is_infinity(&self, bits: u64) -> bool;
    fn positive_infinity(&self) -> Option<u64>;
    fn negative_infinity(&self) -> Option<u64>;
    /// the smallest positive magnitude reserved for infinity, if any
    fn lowest_infinity_magnitude(&self) -> Option<u64>;
}

/// Recognizes the bit patterns a format reserves for NaN.
pub trait NaNChecker: fmt::Debug + Sync {
    fn is_nan(&self, bits: u64) -> bool;
    fn quiet_nan(&self) -> Option<u64>;
    fn signaling_nan(&self) -> Option<u64> {
        None
    }
    fn is_signaling_nan(&self, bits: u64) -> bool {
        let _ = bits;
        false
    }
    /// the smallest positive magnitude reserved for NaN, if any
    fn lowest_nan_magnitude(&self) -> Option<u64>;
}

/// IEEE 754 style specials: an all-ones exponent field is infinity
/// when the mantissa is zero and NaN otherwise.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct IeeeSpecials {
    pub exponent_width: u32,
    pub mantissa_width: u32,
    pub has_sign_bit: bool,
}

impl IeeeSpecials {
    pub const fn new(exponent_width: u32, mantissa_width: u32) -> Self {
        Self {
            exponent_width,
            mantissa_width,
            has_sign_bit: true,
        }
    }
    const fn exponent_mask(&self) -> u64 {
        ((1 << self.exponent_width) - 1) << self.mantissa_width
    }
    const fn mantissa_mask(&self) -> u64 {
        (1 << self.mantissa_width) - 1
    }
    const fn sign_mask(&self) -> u64 {
        if self.has_sign_bit {
            1 << (self.exponent_width + self.mantissa_width)
        } else {
            0
        }
    }
    fn magnitude(&self, bits: u64) -> u64 {
        bits & (self.exponent_mask() | self.mantissa_mask())
    }
}

impl InfChecker for IeeeSpecials {
    fn is_infinity(&self, bits: u64) -> bool {
        self.magnitude(bits) == self.exponent_mask()
    }
    fn positive_infinity(&self) -> Option<u64> {
        Some(self.exponent_mask())
    }
    fn negative_infinity(&self) -> Option<u64> {
        if self.has_sign_bit {
            Some(self.sign_mask() | self.exponent_mask())
        } else {
            None
        }
    }
    fn lowest_infinity_magnitude(&self) -> Option<u64> {
        Some(self.exponent_mask())
    }
}

impl NaNChecker for IeeeSpecials {
    fn is_nan(&self, bits: u64) -> bool {
        let magnitude = self.magnitude(bits);
        magnitude & self.exponent_mask() == self.exponent_mask()
            && magnitude & self.mantissa_mask() != 0
    }
    fn quiet_nan(&self) -> Option<u64> {
        if self.mantissa_width == 0 {
            None
        } else {
            Some(self.exponent_mask() | 1 << (self.mantissa_width - 1))
        }
    }
    fn signaling_nan(&self) -> Option<u64> {
        if self.mantissa_width < 2 {
            None
        } else {
            Some(self.exponent_mask() | 1)
        }
    }
    fn is_signaling_nan(&self, bits: u64) -> bool {
        self.is_nan(bits) && bits & (1 << (self.mantissa_width - 1)) == 0
    }
    fn lowest_nan_magnitude(&self) -> Option<u64> {
        if self.mantissa_width == 0 {
            None
        } else {
            Some(self.exponent_mask() | 1)
        }
    }
}

/// The single largest magnitude is reserved, for either sign.
///
/// Used for P3109 infinities and for the OCP E4M3 NaN.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MagnitudeAllOnes {
    pub magnitude_mask: u64,
    pub sign_mask: u64,
}

impl MagnitudeAllOnes {
    pub const fn new(width: u32, has_sign_bit: bool) -> Self {
        if has_sign_bit {
            Self {
                magnitude_mask: (1 << (width - 1)) - 1,
                sign_mask: 1 << (width - 1),
            }
        } else {
            Self {
                magnitude_mask: (1 << width) - 1,
                sign_mask: 0,
            }
        }
    }
}

impl InfChecker for MagnitudeAllOnes {
    fn is_infinity(&self, bits: u64) -> bool {
        bits & self.magnitude_mask == self.magnitude_mask
    }
    fn positive_infinity(&self) -> Option<u64> {
        Some(self.magnitude_mask)
    }
    fn negative_infinity(&self) -> Option<u64> {
        if self.sign_mask == 0 {
            None
        } else {
            Some(self.sign_mask | self.magnitude_mask)
        }
    }
    fn lowest_infinity_magnitude(&self) -> Option<u64> {
        Some(self.magnitude_mask)
    }
}

impl NaNChecker for MagnitudeAllOnes {
    fn is_nan(&self, bits: u64) -> bool {
        bits & self.magnitude_mask == self.magnitude_mask
    }
    fn quiet_nan(&self) -> Option<u64> {
        Some(self.magnitude_mask)
    }
    fn lowest_nan_magnitude(&self) -> Option<u64> {
        Some(self.magnitude_mask)
    }
}

/// NaN is the pattern that would otherwise be negative zero.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NegativeZeroNaN {
    pub sign_mask: u64,
}

impl NaNChecker for NegativeZeroNaN {
    fn is_nan(&self, bits: u64) -> bool {
        bits == self.sign_mask
    }
    fn quiet_nan(&self) -> Option<u64> {
        Some(self.sign_mask)
    }
    fn lowest_nan_magnitude(&self) -> Option<u64> {
        None
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NoInfinity;

impl InfChecker for NoInfinity {
    fn is_infinity(&self, _bits: u64) -> bool {
        false
    }
    fn positive_infinity(&self) -> Option<u64> {
        None
    }
    fn negative_infinity(&self) -> Option<u64> {
        None
    }
    fn lowest_infinity_magnitude(&self) -> Option<u64> {
        None
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NoNaN;

impl NaNChecker for NoNaN {
    fn is_nan(&self, _bits: u64) -> bool {
        false
    }
    fn quiet_nan(&self) -> Option<u64> {
        None
    }
    fn lowest_nan_magnitude(&self) -> Option<u64> {
        None
    }
}

const IEEE_64_SPECIALS: IeeeSpecials = IeeeSpecials::new(11, 52);
const IEEE_32_SPECIALS: IeeeSpecials = IeeeSpecials::new(8, 23);
const IEEE_16_SPECIALS: IeeeSpecials = IeeeSpecials::new(5, 10);
const BFLOAT16_SPECIALS: IeeeSpecials = IeeeSpecials::new(8, 7);
const TF32_SPECIALS: IeeeSpecials = IeeeSpecials::new(8, 10);
const E5M2_SPECIALS: IeeeSpecials = IeeeSpecials::new(5, 2);
const F8_MAGNITUDE_ALL_ONES: MagnitudeAllOnes = MagnitudeAllOnes::new(8, true);
const UNSIGNED_F8_ALL_ONES: MagnitudeAllOnes = MagnitudeAllOnes::new(8, false);
const F8_NEGATIVE_ZERO_NAN: NegativeZeroNaN = NegativeZeroNaN { sign_mask: 0x80 };
const NO_INFINITY: NoInfinity = NoInfinity;
const NO_NAN: NoNaN = NoNaN;

/// Immutable description of a binary floating-point format.
///
/// Layout from most to least significant bit: optional sign bit,
/// exponent field, mantissa field (no explicit leading bit).
#[derive(Copy, Clone)]
pub struct FloatProperties {
    width: u32,
    mantissa_width: u32,
    exponent_bias: i32,
    signedness: Signedness,
    rounding_mode: RoundingMode,
    overflow_behavior: OverflowBehavior,
    nan_behavior: NaNBehavior,
    unsigned_behavior: UnsignedBehavior,
    stochastic_rounding_bits: u32,
    inf_checker: &'static dyn InfChecker,
    nan_checker: &'static dyn NaNChecker,
}

impl FloatProperties {
    #[inline]
    pub const fn new(
        width: u32,
        mantissa_width: u32,
        exponent_bias: i32,
        signedness: Signedness,
        inf_checker: &'static dyn InfChecker,
        nan_checker: &'static dyn NaNChecker,
    ) -> Self {
        assert!(width >= 2 && width <= 64, "width out of range");
        assert!(mantissa_width < width, "mantissa doesn't fit");
        let sign_width = match signedness {
            Signedness::Signed => 1,
            Signedness::Unsigned => 0,
        };
        assert!(
            mantissa_width + sign_width < width,
            "format needs at least one exponent bit"
        );
        Self {
            width,
            mantissa_width,
            exponent_bias,
            signedness,
            rounding_mode: RoundingMode::TiesToEven,
            overflow_behavior: OverflowBehavior::Extended,
            nan_behavior: NaNBehavior::QuietNaN,
            unsigned_behavior: UnsignedBehavior::ClampToZero,
            stochastic_rounding_bits: 0,
            inf_checker,
            nan_checker,
        }
    }
    /// signed format with IEEE 754 style infinities and NaNs and the standard bias
    pub const fn ieee_like(specials: &'static IeeeSpecials) -> Self {
        Self::new(
            specials.exponent_width + specials.mantissa_width + 1,
            specials.mantissa_width,
            (1 << (specials.exponent_width - 1)) - 1,
            Signedness::Signed,
            specials,
            specials,
        )
    }
    pub const fn with_checkers(
        mut self,
        inf_checker: &'static dyn InfChecker,
        nan_checker: &'static dyn NaNChecker,
    ) -> Self {
        self.inf_checker = inf_checker;
        self.nan_checker = nan_checker;
        self
    }
    pub const fn with_rounding_mode(mut self, rounding_mode: RoundingMode) -> Self {
        self.rounding_mode = rounding_mode;
        self
    }
    pub const fn with_overflow_behavior(mut self, overflow_behavior: OverflowBehavior) -> Self {
        self.overflow_behavior = overflow_behavior;
        self
    }
    pub const fn with_nan_behavior(mut self, nan_behavior: NaNBehavior) -> Self {
        self.nan_behavior = nan_behavior;
        self
    }
    pub const fn with_signedness(mut self, signedness: Signedness) -> Self {
        let sign_width = match signedness {
            Signedness::Signed => 1,
            Signedness::Unsigned => 0,
        };
        assert!(
            self.mantissa_width + sign_width < self.width,
            "format needs at least one exponent bit"
        );
        self.signedness = signedness;
        self
    }
    pub const fn with_unsigned_behavior(mut self, unsigned_behavior: UnsignedBehavior) -> Self {
        self.unsigned_behavior = unsigned_behavior;
        self
    }
    pub const fn with_stochastic_rounding_bits(mut self, stochastic_rounding_bits: u32) -> Self {
        self.stochastic_rounding_bits = stochastic_rounding_bits;
        self
    }

    /// [__binary64__](https://en.wikipedia.org/wiki/Double-precision_floating-point_format)
    pub const F64: Self = Self::ieee_like(&IEEE_64_SPECIALS);
    /// [__binary32__](https://en.wikipedia.org/wiki/Single-precision_floating-point_format)
    pub const F32: Self = Self::ieee_like(&IEEE_32_SPECIALS);
    /// [__binary16__](https://en.wikipedia.org/wiki/Half-precision_floating-point_format)
    pub const HALF: Self = Self::ieee_like(&IEEE_16_SPECIALS);
    pub const BFLOAT16: Self = Self::ieee_like(&BFLOAT16_SPECIALS);
    /// 19-bit TensorFloat-32
    pub const TF32: Self = Self::ieee_like(&TF32_SPECIALS);

    /// OCP E4M3: no infinities, NaN at `S.1111.111`, saturating, max 448
    pub const F8E4M3FN: Self = Self::new(
        8,
        3,
        7,
        Signedness::Signed,
        &NO_INFINITY,
        &F8_MAGNITUDE_ALL_ONES,
    )
    .with_overflow_behavior(OverflowBehavior::Saturating);
    /// E4M3 with NaN at `0x80` and no negative zero
    pub const F8E4M3FNUZ: Self = Self::new(
        8,
        3,
        8,
        Signedness::Signed,
        &NO_INFINITY,
        &F8_NEGATIVE_ZERO_NAN,
    )
    .with_overflow_behavior(OverflowBehavior::Saturating);
    pub const F8E4M3B11FNUZ: Self = Self::new(
        8,
        3,
        11,
        Signedness::Signed,
        &NO_INFINITY,
        &F8_NEGATIVE_ZERO_NAN,
    )
    .with_overflow_behavior(OverflowBehavior::Saturating);
    /// OCP E5M2: IEEE 754 style infinities and NaNs, max 57344
    pub const F8E5M2: Self = Self::ieee_like(&E5M2_SPECIALS);
    pub const F8E5M2FNUZ: Self = Self::new(
        8,
        2,
        16,
        Signedness::Signed,
        &NO_INFINITY,
        &F8_NEGATIVE_ZERO_NAN,
    )
    .with_overflow_behavior(OverflowBehavior::Saturating);
    /// unsigned, 5 exponent bits, NaN at `0xFF`, saturating
    pub const F8UE5M3: Self = Self::new(
        8,
        3,
        15,
        Signedness::Unsigned,
        &NO_INFINITY,
        &UNSIGNED_F8_ALL_ONES,
    )
    .with_overflow_behavior(OverflowBehavior::Saturating);
    /// OCP MX FP6 E3M2, max 28
    pub const F6E3M2: Self = Self::f6_p(3);
    /// OCP MX FP6 E2M3, max 7.5
    pub const F6E2M3: Self = Self::f6_p(4);
    /// OCP MX FP4 E2M1, max 6
    pub const F4E2M1: Self = Self::f4_p(2);

    /// IEEE P3109 `binary8pP`: `P` bits of precision, bias `2^(7-P)`,
    /// infinities at `0x7F`/`0xFF`, the single NaN at `0x80`
    pub const fn f8_ieee_p(precision: u32) -> Self {
        assert!(precision >= 1 && precision <= 7, "precision out of range");
        Self::new(
            8,
            precision - 1,
            1 << (7 - precision),
            Signedness::Signed,
            &F8_MAGNITUDE_ALL_ONES,
            &F8_NEGATIVE_ZERO_NAN,
        )
    }
    const fn no_specials(width: u32, precision: u32) -> Self {
        assert!(precision >= 1 && precision + 1 < width, "precision out of range");
        let exponent_width = width - precision;
        Self::new(
            width,
            precision - 1,
            (1 << (exponent_width - 1)) - 1,
            Signedness::Signed,
            &NO_INFINITY,
            &NO_NAN,
        )
        .with_overflow_behavior(OverflowBehavior::Saturating)
        .with_nan_behavior(NaNBehavior::NoNaN)
    }
    /// 6-bit format with `P` bits of precision, no infinities or NaNs
    pub const fn f6_p(precision: u32) -> Self {
        Self::no_specials(6, precision)
    }
    /// 4-bit format with `P` bits of precision, no infinities or NaNs
    pub const fn f4_p(precision: u32) -> Self {
        Self::no_specials(4, precision)
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }
    /// the number of bits in the mantissa field (excludes the implicit leading bit)
    #[inline]
    pub const fn mantissa_width(&self) -> u32 {
        self.mantissa_width
    }
    #[inline]
    pub const fn exponent_width(&self) -> u32 {
        self.width - self.mantissa_width - self.has_sign_bit() as u32
    }
    #[inline]
    pub const fn exponent_bias(&self) -> i32 {
        self.exponent_bias
    }
    #[inline]
    pub const fn signedness(&self) -> Signedness {
        self.signedness
    }
    #[inline]
    pub const fn has_sign_bit(&self) -> bool {
        match self.signedness {
            Signedness::Signed => true,
            Signedness::Unsigned => false,
        }
    }
    #[inline]
    pub const fn rounding_mode(&self) -> RoundingMode {
        self.rounding_mode
    }
    #[inline]
    pub const fn overflow_behavior(&self) -> OverflowBehavior {
        self.overflow_behavior
    }
    #[inline]
    pub const fn nan_behavior(&self) -> NaNBehavior {
        self.nan_behavior
    }
    #[inline]
    pub const fn unsigned_behavior(&self) -> UnsignedBehavior {
        self.unsigned_behavior
    }
    #[inline]
    pub const fn stochastic_rounding_bits(&self) -> u32 {
        self.stochastic_rounding_bits
    }
    pub fn inf_checker(&self) -> &'static dyn InfChecker {
        self.inf_checker
    }
    pub fn nan_checker(&self) -> &'static dyn NaNChecker {
        self.nan_checker
    }
    pub const fn overall_mask(&self) -> u64 {
        if self.width == 64 {
            !0
        } else {
            (1 << self.width) - 1
        }
    }
    pub const fn sign_field_mask(&self) -> u64 {
        if self.has_sign_bit() {
            1 << (self.width - 1)
        } else {
            0
        }
    }
    pub const fn magnitude_mask(&self) -> u64 {
        self.overall_mask() & !self.sign_field_mask()
    }
    pub const fn exponent_field_mask(&self) -> u64 {
        ((1 << self.exponent_width()) - 1) << self.mantissa_width
    }
    pub const fn mantissa_field_mask(&self) -> u64 {
        (1 << self.mantissa_width) - 1
    }
    pub fn is_infinity(&self, bits: u64) -> bool {
        self.inf_checker.is_infinity(bits)
    }
    pub fn is_nan(&self, bits: u64) -> bool {
        self.nan_checker.is_nan(bits)
    }
    /// the largest magnitude that is neither infinity nor NaN
    pub fn max_finite_magnitude(&self) -> u64 {
        let reserved = match (
            self.inf_checker.lowest_infinity_magnitude(),
            self.nan_checker.lowest_nan_magnitude(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        match reserved {
            Some(reserved) => reserved - 1,
            None => self.magnitude_mask(),
        }
    }
    /// unbiased exponent of the smallest normal value
    pub fn min_normal_exponent(&self) -> i32 {
        1 - self.exponent_bias
    }
    /// unbiased exponent of the largest finite value
    pub fn max_finite_exponent(&self) -> i32 {
        (self.max_finite_magnitude() >> self.mantissa_width) as i32 - self.exponent_bias
    }
    /// true when overflow can produce an infinity
    pub fn has_infinity(&self) -> bool {
        self.overflow_behavior == OverflowBehavior::Extended
            && self.inf_checker.positive_infinity().is_some()
    }
    pub fn signed_infinity_bits(&self, negative: bool) -> Option<u64> {
        if negative {
            self.inf_checker.negative_infinity()
        } else {
            self.inf_checker.positive_infinity()
        }
    }
    /// NaN pattern this format produces, preferring a signaling NaN when asked to
    pub fn nan_bits(&self, signaling: bool) -> Option<u64> {
        if signaling {
            self.nan_checker
                .signaling_nan()
                .or_else(|| self.nan_checker.quiet_nan())
        } else {
            self.nan_checker.quiet_nan()
        }
    }
}

impl PartialEq for FloatProperties {
    fn eq(&self, rhs: &Self) -> bool {
        self.width == rhs.width
            && self.mantissa_width == rhs.mantissa_width
            && self.exponent_bias == rhs.exponent_bias
            && self.signedness == rhs.signedness
            && self.rounding_mode == rhs.rounding_mode
            && self.overflow_behavior == rhs.overflow_behavior
            && self.nan_behavior == rhs.nan_behavior
            && self.unsigned_behavior == rhs.unsigned_behavior
            && self.stochastic_rounding_bits == rhs.stochastic_rounding_bits
            && self.inf_checker.positive_infinity() == rhs.inf_checker.positive_infinity()
            && self.inf_checker.negative_infinity() == rhs.inf_checker.negative_infinity()
            && self.nan_checker.quiet_nan() == rhs.nan_checker.quiet_nan()
            && self.nan_checker.signaling_nan() == rhs.nan_checker.signaling_nan()
            && self.max_finite_magnitude() == rhs.max_finite_magnitude()
    }
}

impl fmt::Debug for FloatProperties {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FloatProperties")
            .field("width", &self.width)
            .field("mantissa_width", &self.mantissa_width)
            .field("exponent_width", &self.exponent_width())
            .field("exponent_bias", &self.exponent_bias)
            .field("signedness", &self.signedness)
            .field("rounding_mode", &self.rounding_mode)
            .field("overflow_behavior", &self.overflow_behavior)
            .field("nan_behavior", &self.nan_behavior)
            .field("unsigned_behavior", &self.unsigned_behavior)
            .field("stochastic_rounding_bits", &self.stochastic_rounding_bits)
            .field("inf_checker", &self.inf_checker)
            .field("nan_checker", &self.nan_checker)
            .finish()
    }
}
