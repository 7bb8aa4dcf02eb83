//! Time sources for rebalance gating and flash boost expiry
//!
//! The vault only needs second resolution. [`SystemClock`] reads wall time;
//! [`ManualClock`] is a shared atomic counter that tests and simulations
//! advance explicitly, so interval gates can be crossed without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of unix timestamps in seconds
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock. Clones share the same underlying counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    current_secs: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_secs: u64) -> Self {
        Self {
            current_secs: Arc::new(AtomicU64::new(start_secs)),
        }
    }

    pub fn set(&self, secs: u64) {
        self.current_secs.store(secs, Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u64) {
        self.current_secs.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.current_secs.load(Ordering::Relaxed)
    }
}
