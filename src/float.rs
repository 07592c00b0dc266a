// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! The value type wrapper [`Float`] and the predefined format types.

use crate::convert::convert_bits;
use crate::convert::unsigned_negative_result;
use crate::convert::with_sign;
use crate::properties::FloatProperties;
use crate::properties::NaNBehavior;
use crate::properties::OverflowBehavior;
use crate::random::with_thread_rng;
use crate::rounding::RoundingMode;
use crate::status::with_fp_state;
use crate::status::FPState;
use crate::status::StatusFlags;
use crate::FloatBitsType;
use crate::FloatClass;
use crate::Sign;
use num_bigint::BigInt;
use num_rational::Ratio;
use num_traits::Float as NativeFloat;
use num_traits::FromPrimitive;
use num_traits::One;
use num_traits::ToPrimitive;
use num_traits::Zero;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;
use std::num::ParseFloatError;
use std::ops::Add;
use std::ops::AddAssign;
use std::ops::Div;
use std::ops::DivAssign;
use std::ops::Mul;
use std::ops::MulAssign;
use std::ops::Neg;
use std::ops::Sub;
use std::ops::SubAssign;
use std::str::FromStr;

pub trait FloatTraits: Copy + fmt::Debug + PartialEq {
    type Bits: FloatBitsType;
    fn properties(&self) -> FloatProperties;
}

/// a descriptor chosen at run time, stored in a `u64`
impl FloatTraits for FloatProperties {
    type Bits = u64;
    fn properties(&self) -> FloatProperties {
        *self
    }
}

macro_rules! float_traits {
    ($($(#[$meta:meta])* $traits:ident, $alias:ident, $bits:ty, $properties:expr;)*) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
            pub struct $traits;

            impl FloatTraits for $traits {
                type Bits = $bits;
                fn properties(&self) -> FloatProperties {
                    $properties
                }
            }

            $(#[$meta])*
            pub type $alias = Float<$traits>;
        )*
    };
}

float_traits! {
    F64Traits, F64, u64, FloatProperties::F64;
    F32Traits, F32, u32, FloatProperties::F32;
    F16Traits, F16, u16, FloatProperties::HALF;
    BFloat16Traits, BFloat16, u16, FloatProperties::BFLOAT16;
    Tf32Traits, Tf32, u32, FloatProperties::TF32;
    /// OCP 8-bit E4M3
    F8E4M3FnTraits, F8E4M3Fn, u8, FloatProperties::F8E4M3FN;
    F8E4M3FnuzTraits, F8E4M3Fnuz, u8, FloatProperties::F8E4M3FNUZ;
    F8E4M3B11FnuzTraits, F8E4M3B11Fnuz, u8, FloatProperties::F8E4M3B11FNUZ;
    /// OCP 8-bit E5M2
    F8E5M2Traits, F8E5M2, u8, FloatProperties::F8E5M2;
    F8E5M2FnuzTraits, F8E5M2Fnuz, u8, FloatProperties::F8E5M2FNUZ;
    F8UE5M3Traits, F8UE5M3, u8, FloatProperties::F8UE5M3;
    F6E3M2Traits, F6E3M2, u8, FloatProperties::F6E3M2;
    F6E2M3Traits, F6E2M3, u8, FloatProperties::F6E2M3;
    F4E2M1Traits, F4E2M1, u8, FloatProperties::F4E2M1;
}

/// IEEE P3109 `binary8pP`
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct F8IeeePTraits<const P: u32>;

impl<const P: u32> FloatTraits for F8IeeePTraits<P> {
    type Bits = u8;
    fn properties(&self) -> FloatProperties {
        FloatProperties::f8_ieee_p(P)
    }
}

pub type F8IeeeP<const P: u32> = Float<F8IeeePTraits<P>>;

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct F6PTraits<const P: u32>;

impl<const P: u32> FloatTraits for F6PTraits<P> {
    type Bits = u8;
    fn properties(&self) -> FloatProperties {
        FloatProperties::f6_p(P)
    }
}

pub type F6P<const P: u32> = Float<F6PTraits<P>>;

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct F4PTraits<const P: u32>;

impl<const P: u32> FloatTraits for F4PTraits<P> {
    type Bits = u8;
    fn properties(&self) -> FloatProperties {
        FloatProperties::f4_p(P)
    }
}

pub type F4P<const P: u32> = Float<F4PTraits<P>>;

/// Overrides the rounding mode and stochastic entropy width of `FT`.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct WithRounding<FT> {
    pub traits: FT,
    pub rounding_mode: RoundingMode,
    pub stochastic_rounding_bits: u32,
}

impl<FT> WithRounding<FT> {
    pub const fn new(traits: FT, rounding_mode: RoundingMode, stochastic_rounding_bits: u32) -> Self {
        Self {
            traits,
            rounding_mode,
            stochastic_rounding_bits,
        }
    }
}

impl<FT: FloatTraits> FloatTraits for WithRounding<FT> {
    type Bits = FT::Bits;
    fn properties(&self) -> FloatProperties {
        self.traits
            .properties()
            .with_rounding_mode(self.rounding_mode)
            .with_stochastic_rounding_bits(self.stochastic_rounding_bits)
    }
}

pub type DynamicFloat = Float<FloatProperties>;

/// native type the arithmetic operators compute in
trait SimulationType: NativeFloat {
    const PROPERTIES: FloatProperties;
    fn from_u64_bits(bits: u64) -> Self;
    fn into_u64_bits(self) -> u64;
}

impl SimulationType for f32 {
    const PROPERTIES: FloatProperties = FloatProperties::F32;
    fn from_u64_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
    fn into_u64_bits(self) -> u64 {
        u64::from(self.to_bits())
    }
}

impl SimulationType for f64 {
    const PROPERTIES: FloatProperties = FloatProperties::F64;
    fn from_u64_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
    fn into_u64_bits(self) -> u64 {
        self.to_bits()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Sqrt,
}

impl Operation {
    fn apply<S: NativeFloat>(self, lhs: S, rhs: S) -> S {
        match self {
            Operation::Add => lhs + rhs,
            Operation::Sub => lhs - rhs,
            Operation::Mul => lhs * rhs,
            Operation::Div => lhs / rhs,
            Operation::Sqrt => lhs.sqrt(),
        }
    }
    /// Error of the native `result`: its sign is the direction of the exact
    /// value from `result`, and it is zero when `result` is exact.
    fn residual<S: NativeFloat>(self, lhs: S, rhs: S, result: S) -> S {
        match self {
            Operation::Add => two_sum_error(lhs, rhs, result),
            Operation::Sub => two_sum_error(lhs, -rhs, result),
            Operation::Mul => lhs.mul_add(rhs, -result),
            Operation::Div => {
                let remainder = (-result).mul_add(rhs, lhs);
                if rhs.is_sign_negative() {
                    -remainder
                } else {
                    remainder
                }
            }
            Operation::Sqrt => (-result).mul_add(result, lhs),
        }
    }
    /// Whether `binary32` is wide enough in range and precision that a
    /// round-to-odd result can be rounded again to `properties`.
    fn fits_f32(self, properties: &FloatProperties) -> bool {
        let mantissa_width = properties.mantissa_width();
        let guard_bits = if self == Operation::Sqrt { 2 } else { 1 };
        2 * mantissa_width + guard_bits <= 24
            && 2 * (properties.max_finite_exponent() + 1) <= 127
            && 2 * (properties.min_normal_exponent() - mantissa_width as i32) >= -149
    }
}

fn two_sum_error<S: NativeFloat>(lhs: S, rhs: S, sum: S) -> S {
    let rhs_part = sum - lhs;
    let lhs_part = sum - rhs_part;
    (lhs - lhs_part) + (rhs - rhs_part)
}

/// the neighbor of `result` in the direction of `residual`
fn step_toward<S: SimulationType>(result: S, residual: S) -> S {
    if result.is_zero() {
        let smallest = S::from_u64_bits(1);
        return if residual.is_sign_negative() {
            -smallest
        } else {
            smallest
        };
    }
    let bits = result.into_u64_bits();
    if result.is_sign_negative() == residual.is_sign_negative() {
        S::from_u64_bits(bits + 1)
    } else {
        S::from_u64_bits(bits - 1)
    }
}

/// Make an inexact native result sticky: an even last bit moves one ulp
/// toward the exact value, so later rounding to a narrower format sees
/// the discarded tail.
fn round_to_odd<S: SimulationType>(result: S, residual: S) -> S {
    if result.into_u64_bits() & 1 == 0 {
        step_toward(result, residual)
    } else {
        result
    }
}

/// Round the exact value `result + residual` to the precision of `S`,
/// given that `result` is its nearest-even rounding.
fn round_same_precision<S: SimulationType>(
    result: S,
    residual: S,
    rounding_mode: RoundingMode,
) -> S {
    let neighbor = step_toward(result, residual);
    let gap = neighbor - result;
    let tie = residual + residual == gap;
    let away = neighbor.abs() > result.abs();
    let take_neighbor = match rounding_mode {
        RoundingMode::TiesToEven => false,
        // the nearest-even result of a tie is even, so its neighbor is odd
        RoundingMode::TiesToOdd => tie,
        RoundingMode::TiesToAway => tie && away,
        RoundingMode::TowardZero => !away,
        RoundingMode::AwayFromZero => away,
        RoundingMode::TowardPositive => neighbor > result,
        RoundingMode::TowardNegative => neighbor < result,
        RoundingMode::Probabilistic => with_thread_rng(|rng| rng.random_bool(0.5)),
        RoundingMode::StochasticA
        | RoundingMode::StochasticB
        | RoundingMode::StochasticC
        | RoundingMode::TrueStochastic => {
            let probability = (residual / gap).to_f64().unwrap_or(0.0);
            with_thread_rng(|rng| rng.random::<f64>() < probability)
        }
    };
    if take_neighbor {
        neighbor
    } else {
        result
    }
}

#[derive(Copy, Clone)]
pub struct Float<FT: FloatTraits> {
    traits: FT,
    bits: FT::Bits,
}

impl<FT: FloatTraits + Default> Default for Float<FT> {
    fn default() -> Self {
        Self::positive_zero()
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> Float<FT> {
    /// Wrap a raw bit pattern. Only a debug assertion checks that the
    /// pattern fits the format.
    pub fn from_bits_and_traits(bits: Bits, traits: FT) -> Self {
        debug_assert!(
            Into::<u64>::into(bits) & !traits.properties().overall_mask() == 0,
            "bits out of range"
        );
        Self { traits, bits }
    }
    pub fn from_bits(bits: Bits) -> Self
    where
        FT: Default,
    {
        Self::from_bits_and_traits(bits, FT::default())
    }
    fn from_u64_and_traits(bits: u64, traits: FT) -> Self {
        Self::from_bits_and_traits(Bits::truncate_from_u64(bits), traits)
    }
    fn with_raw(&self, bits: u64) -> Self {
        Self::from_u64_and_traits(bits, self.traits)
    }
    fn raw(&self) -> u64 {
        self.bits.into()
    }
    pub fn bits(&self) -> Bits {
        self.bits
    }
    pub fn traits(&self) -> &FT {
        &self.traits
    }
    pub fn into_bits_and_traits(self) -> (Bits, FT) {
        (self.bits, self.traits)
    }
    pub fn properties(&self) -> FloatProperties {
        self.traits.properties()
    }
    pub fn sign(&self) -> Sign {
        if self.raw() & self.properties().sign_field_mask() == 0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
    pub fn exponent_field(&self) -> Bits {
        let properties = self.properties();
        Bits::truncate_from_u64(
            (self.raw() & properties.exponent_field_mask()) >> properties.mantissa_width(),
        )
    }
    pub fn mantissa_field(&self) -> Bits {
        Bits::truncate_from_u64(self.raw() & self.properties().mantissa_field_mask())
    }
    pub fn class(&self) -> FloatClass {
        let properties = self.properties();
        let bits = self.raw();
        if properties.is_nan(bits) {
            return if properties.nan_checker().is_signaling_nan(bits) {
                FloatClass::SignalingNaN
            } else {
                FloatClass::QuietNaN
            };
        }
        let magnitude = bits & properties.magnitude_mask();
        let retval = if properties.is_infinity(bits) {
            FloatClass::PositiveInfinity
        } else if magnitude == 0 {
            FloatClass::PositiveZero
        } else if magnitude & properties.exponent_field_mask() == 0 {
            FloatClass::PositiveSubnormal
        } else {
            FloatClass::PositiveNormal
        };
        match self.sign() {
            Sign::Positive => retval,
            Sign::Negative => -retval,
        }
    }
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.class().is_nan()
    }
    #[inline]
    pub fn is_signaling_nan(&self) -> bool {
        self.class().is_signaling_nan()
    }
    #[inline]
    pub fn is_infinity(&self) -> bool {
        self.class().is_infinity()
    }
    #[inline]
    pub fn is_normal(&self) -> bool {
        self.class().is_normal()
    }
    #[inline]
    pub fn is_subnormal(&self) -> bool {
        self.class().is_subnormal()
    }
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.class().is_zero()
    }
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.class().is_finite()
    }
    #[inline]
    pub fn is_subnormal_or_zero(&self) -> bool {
        self.class().is_subnormal_or_zero()
    }
    /// true unless every non-sign bit is clear
    pub fn to_bool(&self) -> bool {
        self.raw() & self.properties().magnitude_mask() != 0
    }
    /// the exact value, or `None` for infinities and NaNs
    pub fn to_ratio(&self) -> Option<Ratio<BigInt>> {
        if !self.is_finite() {
            return None;
        }
        let properties = self.properties();
        let mut mantissa = BigInt::from(Into::<u64>::into(self.mantissa_field()));
        let exponent_field: u64 = self.exponent_field().into();
        let mut exponent = if exponent_field == 0 {
            i64::from(properties.min_normal_exponent())
        } else {
            mantissa += BigInt::one() << properties.mantissa_width() as usize;
            exponent_field as i64 - i64::from(properties.exponent_bias())
        };
        exponent -= i64::from(properties.mantissa_width());
        let mut retval = if exponent < 0 {
            Ratio::new(mantissa, BigInt::one() << (-exponent) as usize)
        } else {
            Ratio::from(mantissa << exponent as usize)
        };
        if self.sign() == Sign::Negative {
            retval = -retval;
        }
        Some(retval)
    }
    pub fn positive_zero_with_traits(traits: FT) -> Self {
        Self::from_u64_and_traits(0, traits)
    }
    pub fn positive_zero() -> Self
    where
        FT: Default,
    {
        Self::positive_zero_with_traits(FT::default())
    }
    /// `-0` is `+0` in formats without a sign bit or that spend `-0` on NaN
    pub fn signed_zero_with_traits(sign: Sign, traits: FT) -> Self {
        let properties = traits.properties();
        let negative = sign == Sign::Negative && properties.has_sign_bit();
        Self::from_u64_and_traits(with_sign(&properties, 0, negative), traits)
    }
    pub fn signed_zero(sign: Sign) -> Self
    where
        FT: Default,
    {
        Self::signed_zero_with_traits(sign, FT::default())
    }
    pub fn signed_infinity_with_traits(sign: Sign, traits: FT) -> Option<Self> {
        traits
            .properties()
            .signed_infinity_bits(sign == Sign::Negative)
            .map(|bits| Self::from_u64_and_traits(bits, traits))
    }
    pub fn signed_infinity(sign: Sign) -> Option<Self>
    where
        FT: Default,
    {
        Self::signed_infinity_with_traits(sign, FT::default())
    }
    pub fn quiet_nan_with_traits(traits: FT) -> Option<Self> {
        let properties = traits.properties();
        if properties.nan_behavior() == NaNBehavior::NoNaN {
            return None;
        }
        properties
            .nan_checker()
            .quiet_nan()
            .map(|bits| Self::from_u64_and_traits(bits, traits))
    }
    pub fn quiet_nan() -> Option<Self>
    where
        FT: Default,
    {
        Self::quiet_nan_with_traits(FT::default())
    }
    pub fn signaling_nan_with_traits(traits: FT) -> Option<Self> {
        let properties = traits.properties();
        if properties.nan_behavior() == NaNBehavior::NoNaN {
            return None;
        }
        properties
            .nan_checker()
            .signaling_nan()
            .map(|bits| Self::from_u64_and_traits(bits, traits))
    }
    pub fn signaling_nan() -> Option<Self>
    where
        FT: Default,
    {
        Self::signaling_nan_with_traits(FT::default())
    }
    pub fn signed_max_finite_with_traits(sign: Sign, traits: FT) -> Self {
        let properties = traits.properties();
        let negative = sign == Sign::Negative && properties.has_sign_bit();
        let bits = with_sign(&properties, properties.max_finite_magnitude(), negative);
        Self::from_u64_and_traits(bits, traits)
    }
    pub fn signed_max_finite(sign: Sign) -> Self
    where
        FT: Default,
    {
        Self::signed_max_finite_with_traits(sign, FT::default())
    }
    pub fn signed_min_subnormal_with_traits(sign: Sign, traits: FT) -> Self {
        let properties = traits.properties();
        let negative = sign == Sign::Negative && properties.has_sign_bit();
        Self::from_u64_and_traits(with_sign(&properties, 1, negative), traits)
    }
    pub fn signed_min_subnormal(sign: Sign) -> Self
    where
        FT: Default,
    {
        Self::signed_min_subnormal_with_traits(sign, FT::default())
    }
    pub fn from_f64_with_traits(
        value: f64,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        traits: FT,
    ) -> Self {
        let bits = convert_bits(
            value.to_bits(),
            FloatProperties::F64,
            traits.properties(),
            rounding_mode,
            fp_state,
        );
        Self::from_u64_and_traits(bits, traits)
    }
    pub fn from_f64(
        value: f64,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self
    where
        FT: Default,
    {
        Self::from_f64_with_traits(value, rounding_mode, fp_state, FT::default())
    }
    pub fn from_f32_with_traits(
        value: f32,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        traits: FT,
    ) -> Self {
        let bits = convert_bits(
            u64::from(value.to_bits()),
            FloatProperties::F32,
            traits.properties(),
            rounding_mode,
            fp_state,
        );
        Self::from_u64_and_traits(bits, traits)
    }
    pub fn from_f32(
        value: f32,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self
    where
        FT: Default,
    {
        Self::from_f32_with_traits(value, rounding_mode, fp_state, FT::default())
    }
    /// Convert any primitive number by way of `f64`. Returns `None` when
    /// `value` has no `f64` approximation.
    pub fn from_primitive_with_traits<T: ToPrimitive>(
        value: T,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        traits: FT,
    ) -> Option<Self> {
        let value = value.to_f64()?;
        Some(Self::from_f64_with_traits(
            value,
            rounding_mode,
            fp_state,
            traits,
        ))
    }
    pub fn from_primitive<T: ToPrimitive>(
        value: T,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Option<Self>
    where
        FT: Default,
    {
        Self::from_primitive_with_traits(value, rounding_mode, fp_state, FT::default())
    }
    pub fn convert_from_float_with_traits<SrcFT: FloatTraits>(
        src: &Float<SrcFT>,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        traits: FT,
    ) -> Self {
        let bits = convert_bits(
            src.bits.into(),
            src.properties(),
            traits.properties(),
            rounding_mode,
            fp_state,
        );
        Self::from_u64_and_traits(bits, traits)
    }
    pub fn convert_from_float<SrcFT: FloatTraits>(
        src: &Float<SrcFT>,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self
    where
        FT: Default,
    {
        Self::convert_from_float_with_traits(src, rounding_mode, fp_state, FT::default())
    }
    pub fn convert_to_float_with_traits<DestFT: FloatTraits>(
        &self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        traits: DestFT,
    ) -> Float<DestFT> {
        Float::convert_from_float_with_traits(self, rounding_mode, fp_state, traits)
    }
    pub fn convert_to_float<DestFT: FloatTraits + Default>(
        &self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Float<DestFT> {
        Float::convert_from_float(self, rounding_mode, fp_state)
    }
    pub fn to_f64_with(
        &self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> f64 {
        F64::convert_from_float(self, rounding_mode, fp_state).to_native()
    }
    /// exceptions go to the calling thread's environment
    pub fn to_f64(&self) -> f64 {
        self.to_f64_with(None, None)
    }
    pub fn to_f32_with(
        &self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> f32 {
        F32::convert_from_float(self, rounding_mode, fp_state).to_native()
    }
    pub fn to_f32(&self) -> f32 {
        self.to_f32_with(None, None)
    }
    fn compute<S: SimulationType>(
        &self,
        rhs: Option<&Self>,
        operation: Operation,
        rounding_mode: Option<RoundingMode>,
        fp_state: &mut FPState,
    ) -> Self {
        let properties = self.properties();
        let widen = |value: &Self, fp_state: &mut FPState| {
            S::from_u64_bits(convert_bits(
                value.raw(),
                properties,
                S::PROPERTIES,
                None,
                Some(fp_state),
            ))
        };
        let lhs = widen(self, fp_state);
        let rhs = match rhs {
            Some(rhs) => widen(rhs, fp_state),
            None => lhs,
        };
        let mut result = operation.apply(lhs, rhs);
        let operands_are_nan = lhs.is_nan() || (operation != Operation::Sqrt && rhs.is_nan());
        let division_by_zero = operation == Operation::Div && rhs.is_zero() && !lhs.is_nan();
        if result.is_nan() && !operands_are_nan {
            fp_state.raise(StatusFlags::INVALID_OPERATION);
        }
        if lhs.is_finite() && rhs.is_finite() && result.is_finite() {
            let residual = operation.residual(lhs, rhs, result);
            if !residual.is_zero() && !residual.is_nan() {
                fp_state.raise(StatusFlags::INEXACT);
                result = if S::PROPERTIES.mantissa_width() >= properties.mantissa_width() + 2 {
                    round_to_odd(result, residual)
                } else {
                    let mode = rounding_mode.unwrap_or_else(|| properties.rounding_mode());
                    round_same_precision(result, residual, mode)
                };
            }
        }
        if division_by_zero {
            fp_state.raise(StatusFlags::DIVISION_BY_ZERO);
        } else if result.is_infinite() && lhs.is_finite() && rhs.is_finite() {
            fp_state.raise(StatusFlags::OVERFLOW | StatusFlags::INEXACT);
        }
        let bits = convert_bits(
            result.into_u64_bits(),
            S::PROPERTIES,
            properties,
            rounding_mode,
            Some(fp_state),
        );
        self.with_raw(bits)
    }
    fn arithmetic(
        &self,
        rhs: Option<&Self>,
        operation: Operation,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        if let Some(rhs) = rhs {
            assert_eq!(self.traits, rhs.traits, "operands have different formats");
        }
        let properties = self.properties();
        with_fp_state(fp_state, |fp_state| {
            if operation.fits_f32(&properties) {
                self.compute::<f32>(rhs, operation, rounding_mode, fp_state)
            } else {
                self.compute::<f64>(rhs, operation, rounding_mode, fp_state)
            }
        })
    }
    pub fn add(
        self,
        rhs: &Self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        self.arithmetic(Some(rhs), Operation::Add, rounding_mode, fp_state)
    }
    pub fn sub(
        self,
        rhs: &Self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        self.arithmetic(Some(rhs), Operation::Sub, rounding_mode, fp_state)
    }
    pub fn mul(
        self,
        rhs: &Self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        self.arithmetic(Some(rhs), Operation::Mul, rounding_mode, fp_state)
    }
    pub fn div(
        self,
        rhs: &Self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        self.arithmetic(Some(rhs), Operation::Div, rounding_mode, fp_state)
    }
    pub fn sqrt(self, rounding_mode: Option<RoundingMode>, fp_state: Option<&mut FPState>) -> Self {
        self.arithmetic(None, Operation::Sqrt, rounding_mode, fp_state)
    }
    /// Flip the sign. Zeros and NaNs whose negation would be a different
    /// kind of value are returned unchanged; negating a nonzero value of
    /// an unsigned format follows its [`UnsignedBehavior`](crate::UnsignedBehavior).
    pub fn neg(self, fp_state: Option<&mut FPState>) -> Self {
        let properties = self.properties();
        let bits = self.raw();
        if properties.is_nan(bits) {
            return self;
        }
        if properties.has_sign_bit() {
            let negated = bits ^ properties.sign_field_mask();
            if properties.is_nan(negated) {
                return self;
            }
            return self.with_raw(negated);
        }
        if bits & properties.magnitude_mask() == 0 {
            return self;
        }
        with_fp_state(fp_state, |fp_state| {
            self.with_raw(unsigned_negative_result(&properties, fp_state))
        })
    }
    pub fn abs(&self) -> Self {
        if self.is_nan() {
            return *self;
        }
        self.with_raw(self.raw() & self.properties().magnitude_mask())
    }
    /// sign-magnitude folded into a two's complement key; `-0` and `+0` share 0
    fn ordering_key(&self) -> Option<i128> {
        if self.is_nan() {
            return None;
        }
        let magnitude = i128::from(self.raw() & self.properties().magnitude_mask());
        match self.sign() {
            Sign::Positive => Some(magnitude),
            Sign::Negative => Some(-magnitude),
        }
    }
    /// `None` when either side is NaN
    pub fn compare(&self, rhs: &Self) -> Option<Ordering> {
        assert_eq!(self.traits, rhs.traits, "operands have different formats");
        Some(self.ordering_key()?.cmp(&rhs.ordering_key()?))
    }
    /// Evaluate `f` on the exact `f64` value and round the result back into
    /// this format.
    fn map_f64(
        self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
        f: impl FnOnce(f64, &mut FPState) -> f64,
    ) -> Self {
        with_fp_state(fp_state, |fp_state| {
            let value = self.to_f64_with(None, Some(&mut *fp_state));
            let result = f(value, fp_state);
            Self::from_f64_with_traits(result, rounding_mode, Some(fp_state), self.traits)
        })
    }
    pub fn ceil(self, rounding_mode: Option<RoundingMode>, fp_state: Option<&mut FPState>) -> Self {
        self.map_f64(rounding_mode, fp_state, |value, _| value.ceil())
    }
    pub fn floor(self, rounding_mode: Option<RoundingMode>, fp_state: Option<&mut FPState>) -> Self {
        self.map_f64(rounding_mode, fp_state, |value, _| value.floor())
    }
    /// Base-2 logarithm, computed in `f64` and rounded once more into this
    /// format. Negative operands raise `INVALID_OPERATION` and zeros raise
    /// `DIVISION_BY_ZERO`.
    pub fn log2(self, rounding_mode: Option<RoundingMode>, fp_state: Option<&mut FPState>) -> Self {
        self.map_f64(rounding_mode, fp_state, |value, fp_state| {
            if value == 0.0 {
                fp_state.raise(StatusFlags::DIVISION_BY_ZERO);
            } else if value < 0.0 {
                fp_state.raise(StatusFlags::INVALID_OPERATION);
            }
            value.log2()
        })
    }
    /// `base` raised to `exponent`, rounded into the format of `exponent`
    pub fn int_pow(
        base: i32,
        exponent: Self,
        rounding_mode: Option<RoundingMode>,
        fp_state: Option<&mut FPState>,
    ) -> Self {
        exponent.map_f64(rounding_mode, fp_state, |exponent, fp_state| {
            let base = f64::from(base);
            let result = base.powf(exponent);
            if base == 0.0 && exponent < 0.0 {
                fp_state.raise(StatusFlags::DIVISION_BY_ZERO);
            } else if result.is_nan() && !exponent.is_nan() {
                fp_state.raise(StatusFlags::INVALID_OPERATION);
            }
            result
        })
    }
    /// The larger operand; a NaN operand yields the other one.
    pub fn max(self, rhs: Self) -> Self {
        match self.compare(&rhs) {
            Some(Ordering::Greater) => self,
            None if rhs.is_nan() => self,
            _ => rhs,
        }
    }
    /// The smaller operand; a NaN operand yields the other one.
    pub fn min(self, rhs: Self) -> Self {
        match self.compare(&rhs) {
            Some(Ordering::Greater) => rhs,
            None if self.is_nan() => rhs,
            _ => self,
        }
    }
}

impl F64 {
    fn to_native(self) -> f64 {
        f64::from_bits(self.bits)
    }
}

impl F32 {
    fn to_native(self) -> f32 {
        f32::from_bits(self.bits)
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> PartialEq for Float<FT> {
    fn eq(&self, rhs: &Self) -> bool {
        self.compare(rhs) == Some(Ordering::Equal)
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> PartialOrd for Float<FT> {
    fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
        self.compare(rhs)
    }
}

macro_rules! impl_binary_operator {
    ($op_trait:ident, $op:ident, $op_assign_trait:ident, $op_assign:ident) => {
        impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> $op_trait for Float<FT> {
            type Output = Self;
            fn $op(self, rhs: Self) -> Self {
                Float::$op(self, &rhs, None, None)
            }
        }

        impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> $op_assign_trait for Float<FT> {
            fn $op_assign(&mut self, rhs: Self) {
                *self = Float::$op(*self, &rhs, None, None);
            }
        }
    };
}

impl_binary_operator!(Add, add, AddAssign, add_assign);
impl_binary_operator!(Sub, sub, SubAssign, sub_assign);
impl_binary_operator!(Mul, mul, MulAssign, mul_assign);
impl_binary_operator!(Div, div, DivAssign, div_assign);

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> Neg for Float<FT> {
    type Output = Self;
    fn neg(self) -> Self {
        Float::neg(self, None)
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits> + Default> Zero for Float<FT> {
    fn zero() -> Self {
        Self::positive_zero()
    }
    fn is_zero(&self) -> bool {
        Float::is_zero(self)
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits> + Default> One for Float<FT> {
    fn one() -> Self {
        Self::from_f64(1.0, None, None)
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> ToPrimitive for Float<FT> {
    fn to_i64(&self) -> Option<i64> {
        Float::to_f64(self).to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        Float::to_f64(self).to_u64()
    }
    fn to_f32(&self) -> Option<f32> {
        Some(Float::to_f32(self))
    }
    fn to_f64(&self) -> Option<f64> {
        Some(Float::to_f64(self))
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits> + Default> FromPrimitive for Float<FT> {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::from_f64(n as f64, None, None))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::from_f64(n as f64, None, None))
    }
    fn from_f32(n: f32) -> Option<Self> {
        Some(Float::from_f32(n, None, None))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Float::from_f64(n, None, None))
    }
}

impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> fmt::Debug for Float<FT> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let properties = self.properties();
        let mut debug_struct = f.debug_struct("Float");
        debug_struct.field("traits", &self.traits);
        debug_struct.field(
            "bits",
            &format_args!(
                "0x{value:0width$X}",
                value = self.bits(),
                width = ((properties.width() + 3) / 4) as usize
            ),
        );
        if properties.has_sign_bit() {
            debug_struct.field("sign", &self.sign());
        }
        debug_struct.field(
            "exponent_field",
            &format_args!(
                "0x{value:0width$X}",
                value = self.exponent_field(),
                width = ((properties.exponent_width() + 3) / 4) as usize
            ),
        );
        if properties.mantissa_width() != 0 {
            debug_struct.field(
                "mantissa_field",
                &format_args!(
                    "0x{value:0width$X}",
                    value = self.mantissa_field(),
                    width = ((properties.mantissa_width() + 3) / 4) as usize
                ),
            );
        }
        debug_struct.field("class", &self.class());
        debug_struct.finish()
    }
}

/// parses an `f64` and rounds it into the format with the default rounding mode
impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits> + Default> FromStr for Float<FT> {
    type Err = ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_f64(s.trim().parse()?, None, None))
    }
}

/// formats the `f64` value; conversion exceptions are discarded
impl<Bits: FloatBitsType, FT: FloatTraits<Bits = Bits>> fmt::Display for Float<FT> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = self.to_f64_with(None, Some(&mut FPState::default()));
        fmt::Display::fmt(&value, f)
    }
}

pub fn isnan<FT: FloatTraits>(value: Float<FT>) -> bool {
    value.is_nan()
}

/// saturating formats never report an infinity
pub fn isinf<FT: FloatTraits>(value: Float<FT>) -> bool {
    value.properties().overflow_behavior() != OverflowBehavior::Saturating && value.is_infinity()
}

pub fn abs<FT: FloatTraits>(value: Float<FT>) -> Float<FT> {
    value.abs()
}

pub fn ceil<FT: FloatTraits>(value: Float<FT>) -> Float<FT> {
    value.ceil(None, None)
}

pub fn floor<FT: FloatTraits>(value: Float<FT>) -> Float<FT> {
    value.floor(None, None)
}

pub fn log2<FT: FloatTraits>(value: Float<FT>) -> Float<FT> {
    value.log2(None, None)
}

pub fn max<FT: FloatTraits>(lhs: Float<FT>, rhs: Float<FT>) -> Float<FT> {
    lhs.max(rhs)
}

pub fn min<FT: FloatTraits>(lhs: Float<FT>, rhs: Float<FT>) -> Float<FT> {
    lhs.min(rhs)
}

pub fn pow<FT: FloatTraits>(base: i32, exponent: Float<FT>) -> Float<FT> {
    Float::int_pow(base, exponent, None, None)
}
