//! Cooperative cancellation for long-running enumeration.
//!
//! Nothing in the core suspends or cancels on its own; operations that walk
//! every row (distinct-value enumeration, selector evaluation) call
//! [`Interrupt::checkpoint`] at a fixed stride and stop with
//! [`AnonError::Interrupted`] once a cancel was requested.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fanon_error::{AnonError, Result};

/// Clonable cancellation token. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    cancel_requested: Arc<AtomicBool>,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    /// Withdraw a previous cancellation request.
    pub fn reset(&self) {
        self.cancel_requested.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Fail with [`AnonError::Interrupted`] if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancel_requested() {
            return Err(AnonError::Interrupted);
        }
        Ok(())
    }

    /// Poll every `interval` steps; `step` is the zero-based loop counter.
    pub fn poll(&self, step: usize, interval: usize) -> Result<()> {
        if interval == 0 || step % interval == 0 {
            self.checkpoint()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_passes_until_cancelled() {
        let interrupt = Interrupt::new();
        interrupt.checkpoint().expect("not cancelled");

        let shared = interrupt.clone();
        shared.cancel();
        assert!(interrupt.is_cancel_requested());
        assert!(matches!(interrupt.checkpoint(), Err(AnonError::Interrupted)));

        interrupt.reset();
        interrupt.checkpoint().expect("reset clears the request");
    }

    #[test]
    fn poll_only_checks_on_stride() {
        let interrupt = Interrupt::new();
        interrupt.cancel();
        assert!(interrupt.poll(3, 4).is_ok());
        assert!(interrupt.poll(4, 4).is_err());
        assert!(interrupt.poll(5, 0).is_err());
    }
}
