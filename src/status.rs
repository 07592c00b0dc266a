// SPDX-License-Identifier: LGPL-2.1-or-later
// See Notices.txt for copyright information

//! Sticky exception flags, trap handlers and the per-thread exception environment.

use bitflags::bitflags;
use std::cell::Cell;
use std::fmt;

bitflags! {
    pub struct StatusFlags: u32 {
        const INVALID_OPERATION = 0b00001;
        const DIVISION_BY_ZERO = 0b00010;
        const OVERFLOW = 0b00100;
        const UNDERFLOW = 0b01000;
        const INEXACT = 0b10000;
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        StatusFlags::empty()
    }
}

const FLAG_NAMES: [(StatusFlags, &str); 5] = [
    (StatusFlags::DIVISION_BY_ZERO, "DivisionByZero"),
    (StatusFlags::OVERFLOW, "Overflow"),
    (StatusFlags::UNDERFLOW, "Underflow"),
    (StatusFlags::INVALID_OPERATION, "InvalidOperation"),
    (StatusFlags::INEXACT, "Inexact"),
];

impl StatusFlags {
    /// human-readable names of the set flags
    pub fn names(self) -> Vec<&'static str> {
        FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        f.write_str(&self.names().join(", "))
    }
}

/// Called with the subset of just-raised flags that are enabled for trapping.
///
/// A handler may return, in which case the operation that raised the flags
/// completes with its default result.
pub type TrapHandler = fn(StatusFlags);

/// logs the trapped exceptions and aborts the process
pub fn default_trap_handler(flags: StatusFlags) {
    log::error!("floating-point exception trapped: {}", flags);
    eprintln!("floating-point exception trapped: {}", flags);
    std::process::abort();
}

#[derive(Copy, Clone, Debug)]
pub struct FPState {
    pub status_flags: StatusFlags,
    pub trapping_flags: StatusFlags,
    pub trap_handler: TrapHandler,
}

impl Default for FPState {
    fn default() -> Self {
        Self {
            status_flags: StatusFlags::empty(),
            trapping_flags: StatusFlags::empty(),
            trap_handler: default_trap_handler,
        }
    }
}

impl FPState {
    /// sticky-OR `flags`, then trap on the enabled subset
    pub fn raise(&mut self, flags: StatusFlags) {
        self.status_flags |= flags;
        let trapped = flags & self.trapping_flags;
        if !trapped.is_empty() {
            (self.trap_handler)(trapped);
        }
    }
    pub fn flags(&self) -> StatusFlags {
        self.status_flags
    }
    pub fn test_flags(&self, flags: StatusFlags) -> bool {
        self.status_flags.intersects(flags)
    }
    pub fn clear_flags(&mut self, flags: StatusFlags) {
        self.status_flags.remove(flags);
    }
    pub fn reset_flags(&mut self) {
        self.status_flags = StatusFlags::empty();
    }
    pub fn set_trapping_flags(&mut self, flags: StatusFlags) {
        self.trapping_flags = flags;
    }
    pub fn set_trap_handler(&mut self, trap_handler: TrapHandler) {
        self.trap_handler = trap_handler;
    }
    pub fn reset_trap_handler(&mut self) {
        self.trap_handler = default_trap_handler;
    }
}

thread_local! {
    static FP_ENV: Cell<FPState> = Cell::new(FPState::default());
}

fn update_env(f: impl FnOnce(&mut FPState)) -> FPState {
    FP_ENV.with(|env| {
        let mut state = env.get();
        f(&mut state);
        env.set(state);
        state
    })
}

/// snapshot of the calling thread's exception environment
pub fn fp_env() -> FPState {
    FP_ENV.with(Cell::get)
}

/// Raise `flags` in the calling thread's exception environment.
///
/// The flags are recorded before the trap handler runs, so a handler that
/// returns sees them through `get_flags`.
pub fn set_flags(flags: StatusFlags) {
    let state = update_env(|state| state.status_flags |= flags);
    let trapped = flags & state.trapping_flags;
    if !trapped.is_empty() {
        (state.trap_handler)(trapped);
    }
}

pub fn get_flags() -> StatusFlags {
    fp_env().status_flags
}

pub fn test_flags(flags: StatusFlags) -> bool {
    get_flags().intersects(flags)
}

pub fn clear_flags(flags: StatusFlags) {
    update_env(|state| state.clear_flags(flags));
}

pub fn reset_flags() {
    update_env(FPState::reset_flags);
}

pub fn set_trapping_flags(flags: StatusFlags) {
    update_env(|state| state.set_trapping_flags(flags));
}

pub fn get_trapping_flags() -> StatusFlags {
    fp_env().trapping_flags
}

pub fn set_trap_handler(trap_handler: TrapHandler) {
    update_env(|state| state.set_trap_handler(trap_handler));
}

pub fn reset_trap_handler() {
    update_env(FPState::reset_trap_handler);
}

/// Run `f` against `fp_state`, or against a scratch state whose flags are
/// raised into the thread's environment afterwards when `fp_state` is `None`.
pub fn with_fp_state<R>(
    fp_state: Option<&mut FPState>,
    f: impl FnOnce(&mut FPState) -> R,
) -> R {
    if let Some(fp_state) = fp_state {
        return f(fp_state);
    }
    let mut scratch = FPState::default();
    let retval = f(&mut scratch);
    if !scratch.status_flags.is_empty() {
        set_flags(scratch.status_flags);
    }
    retval
}
