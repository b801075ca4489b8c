//! Injectable millisecond time source
//!
//! Detectors read the time through [`Clock`] so tests and replays can drive
//! them with a [`ManualClock`] instead of the wall clock.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

impl<F> Clock for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn now_ms(&self) -> f64 {
        self()
    }
}

/// Wall-clock milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

static SYSTEM_CLOCK: Lazy<Arc<dyn Clock>> = Lazy::new(|| Arc::new(SystemClock));

/// Shared handle to the system clock
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::clone(&SYSTEM_CLOCK)
}

/// Settable clock; clones share the same reading
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: f64) {
        self.set(self.now_ms() + ms);
    }

    /// Boxed handle for `with_clock` constructors
    pub fn handle(&self) -> Arc<dyn Clock> {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
