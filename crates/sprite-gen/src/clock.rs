//! Time and cancellation seams for the polling and batch loops

use sprite_core::{Result, SpriteError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of elapsed time and suspension
pub trait Clock {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Suspend for `duration`
    fn sleep(&self, duration: Duration);
}

const SLEEP_SLICE: Duration = Duration::from_millis(200);

/// Wall clock backed by `Instant` and `thread::sleep`
pub struct SystemClock {
    origin: Instant,
    cancel: Option<CancelFlag>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            cancel: None,
        }
    }

    /// A clock whose sleeps return early once `cancel` is set
    pub fn interruptible(cancel: &CancelFlag) -> Self {
        Self {
            origin: Instant::now(),
            cancel: Some(cancel.clone()),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        let flag = match &self.cancel {
            Some(flag) => flag,
            None => {
                std::thread::sleep(duration);
                return;
            }
        };

        let deadline = Instant::now() + duration;
        while !flag.is_cancelled() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

/// Shared interrupt flag, set from a signal handler and read by the loops
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the flag has been set
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SpriteError::Cancelled)
        } else {
            Ok(())
        }
    }
}
