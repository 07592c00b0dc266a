// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Random source for the stochastic rounding modes.
//!
//! Each thread owns its own generator. It is seeded from the wall clock on
//! first use unless [`set_seed`] was called first, so results are only
//! reproducible within one thread after an explicit seed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

thread_local! {
    static STOCHASTIC_RNG: RefCell<Option<StdRng>> = RefCell::new(None);
}

fn seed_from_clock() -> StdRng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    log::debug!("seeding stochastic rounding generator from clock: {}", seed);
    StdRng::seed_from_u64(seed)
}

/// reseed the calling thread's stochastic rounding generator
pub fn set_seed(seed: u64) {
    log::debug!("seeding stochastic rounding generator: {}", seed);
    STOCHASTIC_RNG.with(|rng| *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed)));
}

/// Run `f` with the calling thread's generator.
///
/// A nested call (for instance from a trap handler that converts values)
/// gets a fresh clock-seeded generator instead.
pub fn with_thread_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    STOCHASTIC_RNG.with(|cell| match cell.try_borrow_mut() {
        Ok(mut rng) => f(rng.get_or_insert_with(seed_from_clock)),
        Err(_) => f(&mut seed_from_clock()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_set_seed_is_reproducible() {
        set_seed(42);
        let first: Vec<u64> = (0..16).map(|_| with_thread_rng(|rng| rng.random())).collect();
        set_seed(42);
        let second: Vec<u64> = (0..16).map(|_| with_thread_rng(|rng| rng.random())).collect();
        assert_eq!(first, second);
        set_seed(43);
        let third: Vec<u64> = (0..16).map(|_| with_thread_rng(|rng| rng.random())).collect();
        assert_ne!(first, third);
    }

    #[test]
    fn test_nested_use_leaves_outer_sequence_alone() {
        set_seed(7);
        let expected: Vec<u32> = (0..4).map(|_| with_thread_rng(|rng| rng.random())).collect();
        set_seed(7);
        let observed = with_thread_rng(|outer| {
            let mut observed = vec![outer.random::<u32>()];
            let _inner: u32 = with_thread_rng(|inner| inner.random());
            observed.extend((0..3).map(|_| outer.random::<u32>()));
            observed
        });
        assert_eq!(observed, expected);
    }
}
