//! Pollable progress counter and cooperative stop flag.
//!
//! Engines reset the counter at the start of a calculation and advance it
//! by whole sources. Callers on other threads may poll or request a stop;
//! the stop flag is only checked between sources.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CalcProgress {
    current: AtomicUsize,
    total: AtomicUsize,
    stop: AtomicBool,
}

impl CalcProgress {
    pub const fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        }
    }

    /// Start a new calculation over `total` ruptures. A pending stop
    /// request survives, so a stop issued before the start still cancels.
    pub fn reset(&self, total: usize) {
        self.current.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Record `n` more processed (or skipped) ruptures.
    pub fn advance(&self, n: usize) {
        self.current.fetch_add(n, Ordering::Relaxed);
    }

    /// Index of the current rupture, monotonically increasing.
    pub fn current_rupture(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn total_ruptures(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn fraction_complete(&self) -> f64 {
        let total = self.total_ruptures();
        if total == 0 {
            return 0.0;
        }
        (self.current_rupture() as f64 / total as f64).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.current_rupture() >= self.total_ruptures()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_poll() {
        let progress = CalcProgress::new();
        progress.reset(10);
        assert_eq!(progress.fraction_complete(), 0.0);
        progress.advance(4);
        progress.advance(6);
        assert_eq!(progress.current_rupture(), 10);
        assert!(progress.is_done());
        assert!((progress.fraction_complete() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stop_survives_reset() {
        let progress = CalcProgress::new();
        progress.advance(2);
        progress.request_stop();
        progress.reset(3);
        assert!(progress.is_stop_requested());
        assert_eq!(progress.current_rupture(), 0);
        progress.clear_stop();
        assert!(!progress.is_stop_requested());
    }
}
