//! Progress reporting for long save and load batches.

use alloc::string::String;

// -----------------------------------------------------------------------------
// ProgressObserver

/// Receives progress of a batch operation.
///
/// Observers are called on the thread running the operation. Cancellation
/// is checked between top-level objects only.
pub trait ProgressObserver {
    /// Starts a batch of `steps` steps.
    fn initialize(&mut self, steps: usize);

    fn set_status(&mut self, status: &str);

    /// Completes one step.
    fn advance(&mut self);

    /// Asks the running operation to stop.
    fn cancel(&mut self) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

// -----------------------------------------------------------------------------
// ProgressCounter

/// A [`ProgressObserver`] that only records what it is told.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    steps: usize,
    done: usize,
    status: String,
    cancelled: bool,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn done(&self) -> usize {
        self.done
    }

    #[inline]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Completed fraction, `1.0` for an empty batch.
    pub fn progress(&self) -> f32 {
        if self.steps == 0 {
            1.0
        } else {
            self.done.min(self.steps) as f32 / self.steps as f32
        }
    }
}

impl ProgressObserver for ProgressCounter {
    fn initialize(&mut self, steps: usize) {
        self.steps = steps;
        self.done = 0;
        self.cancelled = false;
    }

    fn set_status(&mut self, status: &str) {
        self.status.clear();
        self.status.push_str(status);
    }

    fn advance(&mut self) {
        self.done += 1;
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_steps() {
        let mut counter = ProgressCounter::new();
        assert_eq!(counter.progress(), 1.0);

        counter.initialize(4);
        counter.set_status("Saving objects");
        counter.advance();
        assert_eq!(counter.progress(), 0.25);
        assert_eq!(counter.status(), "Saving objects");

        counter.cancel();
        assert!(counter.is_cancelled());
        counter.initialize(2);
        assert!(!counter.is_cancelled());
        assert_eq!(counter.done(), 0);
    }
}
