// mcp-tools-core/src/runtime/clock.rs
// ============================================================================
// Module: Clocks
// Description: Wall clock and manually driven clock implementations.
// Purpose: Let window arithmetic run against real or simulated time.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads the wall clock. [`ManualClock`] holds an atomic
//! second counter that tests set and advance, so window rollover and audit
//! timestamps can be driven deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::interfaces::Clock;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }

    fn now_unix_millis(&self) -> u128 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
    }
}

/// Clock whose time only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current unix seconds.
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock starting at `now` unix seconds.
    #[must_use]
    pub const fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advances the current time by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
