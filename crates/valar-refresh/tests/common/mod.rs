/*
[INPUT]:  Test scenarios for the refresh pipeline
[OUTPUT]: Shared callback counters and storage fixtures
[POS]:    Test infrastructure - shared across integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for valar-refresh tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use valar_refresh::error::{Result, StorageError};
use valar_refresh::{RefreshCallback, SettingsStore};

/// Counts invocations of the callbacks it hands out.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fire-and-forget callback that keeps working for `latency` after it starts.
    pub fn detached(&self, latency: Duration) -> RefreshCallback {
        let calls = self.calls.clone();
        RefreshCallback::detached(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(latency)
        })
    }

    /// Callback whose future resolves after `latency`.
    pub fn tracked(&self, latency: Duration) -> RefreshCallback {
        let calls = self.calls.clone();
        RefreshCallback::tracked(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(latency)
        })
    }
}

/// Store that refuses every operation, like a full or disabled browser storage.
#[allow(dead_code)]
pub struct UnavailableStore;

impl SettingsStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

/// A small offset past timer deadlines so assertions never sit on a boundary.
#[allow(dead_code)]
pub const EPSILON: Duration = Duration::from_millis(10);
