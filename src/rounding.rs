// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Rounding policies.
//!
//! Every policy takes an intermediate bit pattern whose low `roundoff` bits
//! are about to be discarded and returns the pattern rounded at that
//! position, with the low `roundoff` bits cleared. The caller shifts the
//! result down and handles any carry out of the retained bits.

use num_integer::Integer;
use rand::Rng;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u32)]
pub enum RoundingMode {
    TiesToEven = 0,
    TiesToOdd = 1,
    TowardZero = 2,
    AwayFromZero = 3,
    TowardPositive = 4,
    TowardNegative = 5,
    TiesToAway = 6,
    /// add `len` random bits below the retained LSB, then truncate
    StochasticA = 7,
    /// like `StochasticA`, also adding one when any discarded bit is set
    StochasticB = 8,
    /// like `StochasticA`, also adding a coin flip when any discarded bit is set
    StochasticC = 9,
    /// round up with probability equal to the exact discarded fraction
    TrueStochastic = 10,
    /// round up with probability 1/2 whenever the value is inexact
    Probabilistic = 11,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::TiesToEven
    }
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 12] = [
        RoundingMode::TiesToEven,
        RoundingMode::TiesToOdd,
        RoundingMode::TowardZero,
        RoundingMode::AwayFromZero,
        RoundingMode::TowardPositive,
        RoundingMode::TowardNegative,
        RoundingMode::TiesToAway,
        RoundingMode::StochasticA,
        RoundingMode::StochasticB,
        RoundingMode::StochasticC,
        RoundingMode::TrueStochastic,
        RoundingMode::Probabilistic,
    ];
    pub fn is_stochastic(self) -> bool {
        match self {
            RoundingMode::StochasticA
            | RoundingMode::StochasticB
            | RoundingMode::StochasticC
            | RoundingMode::TrueStochastic
            | RoundingMode::Probabilistic => true,
            _ => false,
        }
    }
    /// true for the modes whose result depends on the operand's sign
    pub fn uses_sign(self) -> bool {
        match self {
            RoundingMode::TowardPositive | RoundingMode::TowardNegative => true,
            _ => false,
        }
    }
}

#[inline]
fn low_mask(roundoff: u32) -> u128 {
    debug_assert!(roundoff < 128);
    (1u128 << roundoff) - 1
}

#[inline]
fn truncate(bits: u128, roundoff: u32) -> u128 {
    bits & !low_mask(roundoff)
}

#[inline]
fn discarded(bits: u128, roundoff: u32) -> u128 {
    bits & low_mask(roundoff)
}

#[inline]
fn ulp(roundoff: u32) -> u128 {
    1u128 << roundoff
}

pub fn round_ties_to_even(bits: u128, roundoff: u32) -> u128 {
    if roundoff == 0 {
        return bits;
    }
    // Given FFF...FLRTT...T, carry into L exactly when R is set and
    // either L or any T is set.
    let retained_odd = (bits >> roundoff).is_odd() as u128;
    let bias = retained_odd + (1u128 << (roundoff - 1)) - 1;
    truncate(bits + bias, roundoff)
}

pub fn round_ties_to_odd(bits: u128, roundoff: u32) -> u128 {
    if roundoff == 0 {
        return bits;
    }
    let retained_even = (bits >> roundoff).is_even() as u128;
    let bias = retained_even + (1u128 << (roundoff - 1)) - 1;
    truncate(bits + bias, roundoff)
}

pub fn round_toward_zero(bits: u128, roundoff: u32) -> u128 {
    if roundoff == 0 {
        return bits;
    }
    truncate(bits, roundoff)
}

pub fn round_away_from_zero(bits: u128, roundoff: u32) -> u128 {
    if roundoff == 0 || discarded(bits, roundoff) == 0 {
        return bits;
    }
    truncate(bits, roundoff) + ulp(roundoff)
}

/// round toward positive infinity; `bits` is a magnitude with sign `positive`
pub fn round_up(bits: u128, roundoff: u32, positive: bool) -> u128 {
    if positive {
        round_away_from_zero(bits, roundoff)
    } else {
        round_toward_zero(bits, roundoff)
    }
}

/// round toward negative infinity; `bits` is a magnitude with sign `positive`
pub fn round_down(bits: u128, roundoff: u32, positive: bool) -> u128 {
    round_up(bits, roundoff, !positive)
}

pub fn round_ties_to_away(bits: u128, roundoff: u32) -> u128 {
    if roundoff == 0 {
        return bits;
    }
    let round_bit = (bits >> (roundoff - 1)) & 1;
    truncate(bits, roundoff) + (round_bit << roundoff)
}

/// entropy width actually drawn: zero selects the full round-off width
fn entropy_len(roundoff: u32, len: u32) -> u32 {
    if len == 0 || len > roundoff {
        roundoff
    } else {
        len
    }
}

fn random_bits<R: Rng + ?Sized>(rng: &mut R, len: u32) -> u128 {
    debug_assert!(len >= 1 && len <= 128);
    rng.random::<u128>() >> (128 - len)
}

fn stochastic_round<R: Rng + ?Sized>(
    bits: u128,
    roundoff: u32,
    len: u32,
    rng: &mut R,
    extra: impl FnOnce(&mut R) -> bool,
) -> u128 {
    if roundoff == 0 || discarded(bits, roundoff) == 0 {
        return bits;
    }
    let len = entropy_len(roundoff, len);
    let mut sample = random_bits(rng, len);
    if extra(rng) {
        sample += 1;
    }
    truncate(bits + (sample << (roundoff - len)), roundoff)
}

pub fn stochastic_round_a<R: Rng + ?Sized>(
    bits: u128,
    roundoff: u32,
    len: u32,
    rng: &mut R,
) -> u128 {
    stochastic_round(bits, roundoff, len, rng, |_| false)
}

pub fn stochastic_round_b<R: Rng + ?Sized>(
    bits: u128,
    roundoff: u32,
    len: u32,
    rng: &mut R,
) -> u128 {
    stochastic_round(bits, roundoff, len, rng, |_| true)
}

pub fn stochastic_round_c<R: Rng + ?Sized>(
    bits: u128,
    roundoff: u32,
    len: u32,
    rng: &mut R,
) -> u128 {
    stochastic_round(bits, roundoff, len, rng, |rng| rng.random_bool(0.5))
}

pub fn true_stochastic_round<R: Rng + ?Sized>(bits: u128, roundoff: u32, rng: &mut R) -> u128 {
    let tail = discarded(bits, roundoff);
    if roundoff == 0 || tail == 0 {
        return bits;
    }
    let probability = tail as f64 / 2f64.powi(roundoff as i32);
    let truncated = truncate(bits, roundoff);
    if rng.random::<f64>() < probability {
        truncated + ulp(roundoff)
    } else {
        truncated
    }
}

pub fn probabilistic_round<R: Rng + ?Sized>(bits: u128, roundoff: u32, rng: &mut R) -> u128 {
    if roundoff == 0 || discarded(bits, roundoff) == 0 {
        return bits;
    }
    let truncated = truncate(bits, roundoff);
    if rng.random_bool(0.5) {
        truncated + ulp(roundoff)
    } else {
        truncated
    }
}

/// Dispatch on `rounding_mode`.
///
/// `positive` is the sign of the value `bits` is the magnitude of and
/// `len` is the entropy width for the stochastic modes.
pub fn round_bits<R: Rng + ?Sized>(
    rounding_mode: RoundingMode,
    bits: u128,
    roundoff: u32,
    positive: bool,
    len: u32,
    rng: &mut R,
) -> u128 {
    match rounding_mode {
        RoundingMode::TiesToEven => round_ties_to_even(bits, roundoff),
        RoundingMode::TiesToOdd => round_ties_to_odd(bits, roundoff),
        RoundingMode::TowardZero => round_toward_zero(bits, roundoff),
        RoundingMode::AwayFromZero => round_away_from_zero(bits, roundoff),
        RoundingMode::TowardPositive => round_up(bits, roundoff, positive),
        RoundingMode::TowardNegative => round_down(bits, roundoff, positive),
        RoundingMode::TiesToAway => round_ties_to_away(bits, roundoff),
        RoundingMode::StochasticA => stochastic_round_a(bits, roundoff, len, rng),
        RoundingMode::StochasticB => stochastic_round_b(bits, roundoff, len, rng),
        RoundingMode::StochasticC => stochastic_round_c(bits, roundoff, len, rng),
        RoundingMode::TrueStochastic => true_stochastic_round(bits, roundoff, rng),
        RoundingMode::Probabilistic => probabilistic_round(bits, roundoff, rng),
    }
}

/// Shift `bits` right by `shift`, rounding the discarded bits.
///
/// Returns the shifted value and whether any nonzero bit was discarded.
/// Shifts of 128 or more leave less than one ULP: only the directed modes
/// pointing away from zero produce a nonzero result there.
pub fn shift_right_rounded<R: Rng + ?Sized>(
    rounding_mode: RoundingMode,
    bits: u128,
    shift: u32,
    positive: bool,
    len: u32,
    rng: &mut R,
) -> (u128, bool) {
    if shift == 0 {
        return (bits, false);
    }
    if shift >= 128 {
        if bits == 0 {
            return (0, false);
        }
        let away = match rounding_mode {
            RoundingMode::AwayFromZero => true,
            RoundingMode::TowardPositive => positive,
            RoundingMode::TowardNegative => !positive,
            _ => false,
        };
        return (away as u128, true);
    }
    let inexact = discarded(bits, shift) != 0;
    let rounded = round_bits(rounding_mode, bits, shift, positive, len, rng);
    (rounded >> shift, inexact)
}
