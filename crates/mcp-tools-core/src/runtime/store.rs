// mcp-tools-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory State Store
// Description: Mutex-guarded state store for tests and single-process use.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryStateStore`] keeps rate-limit windows in a map guarded by one
//! mutex, so each acquisition is checked and applied under a single lock.
//! Windows older than [`MAX_WINDOW_SECS`](crate::core::window::MAX_WINDOW_SECS) are swept at most once per
//! [`SWEEP_INTERVAL_SECS`]. State is lost on restart. [`SharedStateStore`] wraps any store behind an
//! `Arc` so services can share it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::import_status::ImportStatus;
use crate::core::window::WindowLimit;
use crate::core::window::WindowState;
use crate::core::window::plan_acquire;
use crate::core::window::plan_record;
use crate::interfaces::AcquireOutcome;
use crate::interfaces::StateStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum seconds between sweeps of expired windows.
pub const SWEEP_INTERVAL_SECS: u64 = 60;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Window map keyed by `(client_key, counter)`.
type WindowMap = BTreeMap<(String, String), WindowState>;

/// Window map plus the time of its last sweep.
#[derive(Debug, Default)]
struct Windows {
    /// Counter states.
    map: WindowMap,
    /// Unix seconds of the last expiry sweep.
    swept_at: u64,
}

impl Windows {
    /// Drops windows that are expired for every window size.
    fn sweep(&mut self, now: u64) {
        if now.saturating_sub(self.swept_at) < SWEEP_INTERVAL_SECS {
            return;
        }
        self.map.retain(|_, state| !state.is_stale(now));
        self.swept_at = now;
    }
}

/// In-memory state store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    /// Rate-limit windows protected by a mutex.
    windows: Arc<Mutex<Windows>>,
    /// Most recent import status.
    import_status: Arc<Mutex<Option<ImportStatus>>>,
}

impl InMemoryStateStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies planned states to the window map.
    fn apply(
        guard: &mut WindowMap,
        client_key: &str,
        limits: &[WindowLimit],
        states: Vec<WindowState>,
    ) {
        for (limit, state) in limits.iter().zip(states) {
            guard.insert((client_key.to_string(), limit.counter()), state);
        }
    }

    /// Loads current states for every limit.
    fn current(guard: &WindowMap, client_key: &str, limits: &[WindowLimit]) -> Vec<Option<WindowState>> {
        limits
            .iter()
            .map(|limit| guard.get(&(client_key.to_string(), limit.counter())).copied())
            .collect()
    }
}

/// Maps a poisoned mutex to a store error.
fn poisoned<T>(_: T) -> StoreError {
    StoreError::Store("state store mutex poisoned".to_string())
}

impl StateStore for InMemoryStateStore {
    fn acquire(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, StoreError> {
        let mut guard = self.windows.lock().map_err(poisoned)?;
        guard.sweep(now);
        let current = Self::current(&guard.map, client_key, limits);
        match plan_acquire(&current, limits, now) {
            Ok(states) => {
                Self::apply(&mut guard.map, client_key, limits, states);
                Ok(AcquireOutcome::Granted)
            }
            Err(denial) => Ok(AcquireOutcome::Denied(denial)),
        }
    }

    fn record(&self, client_key: &str, limits: &[WindowLimit], now: u64) -> Result<(), StoreError> {
        let mut guard = self.windows.lock().map_err(poisoned)?;
        guard.sweep(now);
        let current = Self::current(&guard.map, client_key, limits);
        let states = plan_record(&current, limits, now);
        Self::apply(&mut guard.map, client_key, limits, states);
        Ok(())
    }

    fn load_window(
        &self,
        client_key: &str,
        counter: &str,
    ) -> Result<Option<WindowState>, StoreError> {
        let guard = self.windows.lock().map_err(poisoned)?;
        Ok(guard.map.get(&(client_key.to_string(), counter.to_string())).copied())
    }

    fn reset_counters(&self, client_key: &str, counters: &[String]) -> Result<(), StoreError> {
        let mut guard = self.windows.lock().map_err(poisoned)?;
        guard.map.retain(|(key, counter), _| key != client_key || !counters.contains(counter));
        Ok(())
    }

    fn load_import_status(&self) -> Result<Option<ImportStatus>, StoreError> {
        let guard = self.import_status.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    fn save_import_status(&self, status: &ImportStatus) -> Result<(), StoreError> {
        *self.import_status.lock().map_err(poisoned)? = Some(status.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared state store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedStateStore {
    /// Inner store implementation.
    inner: Arc<dyn StateStore + Send + Sync>,
}

impl SharedStateStore {
    /// Wraps a state store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl StateStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn StateStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl StateStore for SharedStateStore {
    fn acquire(
        &self,
        client_key: &str,
        limits: &[WindowLimit],
        now: u64,
    ) -> Result<AcquireOutcome, StoreError> {
        self.inner.acquire(client_key, limits, now)
    }

    fn record(&self, client_key: &str, limits: &[WindowLimit], now: u64) -> Result<(), StoreError> {
        self.inner.record(client_key, limits, now)
    }

    fn load_window(
        &self,
        client_key: &str,
        counter: &str,
    ) -> Result<Option<WindowState>, StoreError> {
        self.inner.load_window(client_key, counter)
    }

    fn reset_counters(&self, client_key: &str, counters: &[String]) -> Result<(), StoreError> {
        self.inner.reset_counters(client_key, counters)
    }

    fn load_import_status(&self) -> Result<Option<ImportStatus>, StoreError> {
        self.inner.load_import_status()
    }

    fn save_import_status(&self, status: &ImportStatus) -> Result<(), StoreError> {
        self.inner.save_import_status(status)
    }
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
        reason = "Test-only assertions."
    )]

    use super::InMemoryStateStore;
    use crate::core::import_status::ImportStatus;
    use crate::core::window::WindowLimit;
    use crate::core::window::WindowSize;
    use crate::interfaces::AcquireOutcome;
    use crate::interfaces::StateStore;

    #[test]
    fn denied_acquire_leaves_counters_untouched() {
        let store = InMemoryStateStore::new();
        let limits = [
            WindowLimit::new("write", WindowSize::Minute, Some(5)),
            WindowLimit::new("delete", WindowSize::Hour, Some(1)),
        ];
        assert_eq!(store.acquire("c", &limits, 100).unwrap(), AcquireOutcome::Granted);
        assert!(matches!(store.acquire("c", &limits, 101).unwrap(), AcquireOutcome::Denied(_)));
        let write = store.load_window("c", "write.minute").unwrap().unwrap();
        assert_eq!(write.count, 1);
    }

    #[test]
    fn reset_only_clears_one_client() {
        let store = InMemoryStateStore::new();
        let limits = [WindowLimit::new("write", WindowSize::Minute, None)];
        store.record("a", &limits, 0).unwrap();
        store.record("b", &limits, 0).unwrap();
        store.reset_counters("a", &["write.minute".to_string()]).unwrap();
        assert!(store.load_window("a", "write.minute").unwrap().is_none());
        assert!(store.load_window("b", "write.minute").unwrap().is_some());
    }

    #[test]
    fn reset_keeps_unnamed_counters() {
        let store = InMemoryStateStore::new();
        let limits = [
            WindowLimit::new("write", WindowSize::Minute, None),
            WindowLimit::new("content_search", WindowSize::Minute, None),
        ];
        store.record("a", &limits, 0).unwrap();
        store.reset_counters("a", &["write.minute".to_string()]).unwrap();
        assert!(store.load_window("a", "write.minute").unwrap().is_none());
        assert!(store.load_window("a", "content_search.minute").unwrap().is_some());
    }

    #[test]
    fn expired_windows_are_evicted() {
        let store = InMemoryStateStore::new();
        let limits = [WindowLimit::new("write", WindowSize::Hour, Some(5))];
        for now in 0 .. 1_000 {
            let client = format!("client-{now}");
            assert_eq!(store.acquire(&client, &limits, now).unwrap(), AcquireOutcome::Granted);
        }
        assert_eq!(store.acquire("late", &limits, 8_200).unwrap(), AcquireOutcome::Granted);
        let windows = store.windows.lock().unwrap();
        assert_eq!(windows.map.len(), 1);
        assert!(windows.map.contains_key(&("late".to_string(), "write.hour".to_string())));
    }

    #[test]
    fn live_windows_survive_a_sweep() {
        let store = InMemoryStateStore::new();
        let limits = [WindowLimit::new("write", WindowSize::Hour, Some(5))];
        store.acquire("early", &limits, 1_000).unwrap();
        store.acquire("late", &limits, 4_000).unwrap();
        let early = store.load_window("early", "write.hour").unwrap().unwrap();
        assert_eq!(early.count, 1);
    }

    #[test]
    fn import_status_slot_is_overwritten() {
        let store = InMemoryStateStore::new();
        store.save_import_status(&ImportStatus::start("first", 3, 10)).unwrap();
        store.save_import_status(&ImportStatus::start("second", 1, 20)).unwrap();
        assert_eq!(store.load_import_status().unwrap().unwrap().import_id, "second");
    }
}
