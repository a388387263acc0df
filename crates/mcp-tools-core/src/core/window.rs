// mcp-tools-core/src/core/window.rs
// ============================================================================
// Module: Fixed Windows
// Description: Fixed-window counter arithmetic shared by every state store.
// Purpose: Keep check-then-increment semantics identical across backends.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A counter is a `(count, window_start)` pair per client. Stores load the
//! current state for every applicable counter, call [`plan_acquire`], and
//! persist the returned states in the same critical section.
//!
//! ## Invariants
//! - A window resets when `now - window_start >= window`.
//! - A denied acquisition changes no counter.
//! - Counters are never decremented.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the longest window; older states are expired for every size.
pub const MAX_WINDOW_SECS: u64 = WindowSize::Hour.secs();

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fixed window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSize {
    /// 60 seconds.
    Minute,
    /// 3600 seconds.
    Hour,
}

impl WindowSize {
    /// Returns the window length in seconds.
    #[must_use]
    pub const fn secs(self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
        }
    }

    /// Returns the window label used in counter names and messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
        }
    }
}

/// One counter that an acquisition must pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLimit {
    /// Counter family (`write`, `delete`, `structure`, or a read quota name).
    pub operation: String,
    /// Window length.
    pub window: WindowSize,
    /// Maximum permitted count per window (`None` is unlimited).
    pub limit: Option<u64>,
}

impl WindowLimit {
    /// Builds a limited counter.
    #[must_use]
    pub fn new(operation: impl Into<String>, window: WindowSize, limit: Option<u64>) -> Self {
        Self {
            operation: operation.into(),
            window,
            limit,
        }
    }

    /// Returns the storage name of the counter (`<operation>.<window>`).
    #[must_use]
    pub fn counter(&self) -> String {
        counter_name(&self.operation, self.window)
    }
}

/// Persisted counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    /// Permitted actions recorded in this window.
    pub count: u64,
    /// Window start in unix seconds.
    pub window_start: u64,
}

impl WindowState {
    /// Returns the count visible at `now`, treating expired windows as zero.
    #[must_use]
    pub const fn live_count(&self, window: WindowSize, now: u64) -> u64 {
        if now.saturating_sub(self.window_start) >= window.secs() { 0 } else { self.count }
    }

    /// Returns true when the state is expired for every window size.
    #[must_use]
    pub const fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.window_start) >= MAX_WINDOW_SECS
    }
}

/// Reason an acquisition was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDenial {
    /// Index of the exhausted limit in the input slice.
    pub index: usize,
    /// Seconds until the exhausted window rolls over.
    pub retry_after: u64,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the storage name for an operation/window pair.
#[must_use]
pub fn counter_name(operation: &str, window: WindowSize) -> String {
    format!("{operation}.{}", window.label())
}

/// Plans an acquisition against the current counter states.
///
/// `current` must be parallel to `limits`. Every limit is checked first, in
/// order; on success the returned states are the incremented counters to
/// persist.
///
/// # Errors
///
/// Returns [`WindowDenial`] for the first exhausted counter; callers must
/// then leave every counter untouched.
pub fn plan_acquire(
    current: &[Option<WindowState>],
    limits: &[WindowLimit],
    now: u64,
) -> Result<Vec<WindowState>, WindowDenial> {
    let fresh: Vec<WindowState> = limits
        .iter()
        .enumerate()
        .map(|(index, limit)| match current.get(index).copied().flatten() {
            Some(state) if now.saturating_sub(state.window_start) < limit.window.secs() => state,
            _ => WindowState {
                count: 0,
                window_start: now,
            },
        })
        .collect();
    for (index, (limit, state)) in limits.iter().zip(&fresh).enumerate() {
        if let Some(max) = limit.limit
            && state.count >= max
        {
            let elapsed = now.saturating_sub(state.window_start);
            return Err(WindowDenial {
                index,
                retry_after: limit.window.secs().saturating_sub(elapsed),
            });
        }
    }
    Ok(fresh
        .into_iter()
        .map(|state| WindowState {
            count: state.count.saturating_add(1),
            window_start: state.window_start,
        })
        .collect())
}

/// Returns the states after recording one action without checking limits.
#[must_use]
pub fn plan_record(
    current: &[Option<WindowState>],
    limits: &[WindowLimit],
    now: u64,
) -> Vec<WindowState> {
    let unlimited: Vec<WindowLimit> = limits
        .iter()
        .map(|limit| WindowLimit::new(limit.operation.clone(), limit.window, None))
        .collect();
    plan_acquire(current, &unlimited, now).unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unwrap_in_result,
        reason = "Test-only assertions."
    )]

    use super::WindowLimit;
    use super::WindowSize;
    use super::WindowState;
    use super::plan_acquire;
    use super::plan_record;

    fn writes(minute: u64, hour: u64) -> Vec<WindowLimit> {
        vec![
            WindowLimit::new("write", WindowSize::Minute, Some(minute)),
            WindowLimit::new("write", WindowSize::Hour, Some(hour)),
        ]
    }

    #[test]
    fn first_acquisition_opens_windows() {
        let planned = plan_acquire(&[None, None], &writes(2, 5), 1_000).unwrap();
        assert_eq!(
            planned,
            vec![
                WindowState {
                    count: 1,
                    window_start: 1_000
                };
                2
            ]
        );
    }

    #[test]
    fn exhausted_counter_reports_retry_after() {
        let current = [
            Some(WindowState {
                count: 2,
                window_start: 1_000,
            }),
            Some(WindowState {
                count: 2,
                window_start: 1_000,
            }),
        ];
        let denial = plan_acquire(&current, &writes(2, 5), 1_015).unwrap_err();
        assert_eq!(denial.index, 0);
        assert_eq!(denial.retry_after, 45);
    }

    #[test]
    fn window_rolls_over_at_boundary() {
        let current = [
            Some(WindowState {
                count: 2,
                window_start: 1_000,
            }),
            Some(WindowState {
                count: 2,
                window_start: 1_000,
            }),
        ];
        let planned = plan_acquire(&current, &writes(2, 5), 1_060).unwrap();
        assert_eq!(planned[0], WindowState {
            count: 1,
            window_start: 1_060
        });
        assert_eq!(planned[1], WindowState {
            count: 3,
            window_start: 1_000
        });
    }

    #[test]
    fn hour_counter_denies_after_minute_passes() {
        let current = [
            None,
            Some(WindowState {
                count: 5,
                window_start: 1_000,
            }),
        ];
        let denial = plan_acquire(&current, &writes(2, 5), 1_100).unwrap_err();
        assert_eq!(denial.index, 1);
        assert_eq!(denial.retry_after, 3_500);
    }

    #[test]
    fn record_ignores_limits() {
        let current = [Some(WindowState {
            count: 9,
            window_start: 10,
        })];
        let limits = [WindowLimit::new("delete", WindowSize::Hour, Some(1))];
        let planned = plan_record(&current, &limits, 20);
        assert_eq!(planned[0].count, 10);
    }

    #[test]
    fn live_count_hides_expired_windows() {
        let state = WindowState {
            count: 4,
            window_start: 0,
        };
        assert_eq!(state.live_count(WindowSize::Minute, 59), 4);
        assert_eq!(state.live_count(WindowSize::Minute, 60), 0);
        assert!(!state.is_stale(3_599));
        assert!(state.is_stale(3_600));
    }

    #[test]
    fn counter_names_join_operation_and_window() {
        let limit = WindowLimit::new("content_search", WindowSize::Minute, None);
        assert_eq!(limit.counter(), "content_search.minute");
    }
}
