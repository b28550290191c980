//! Progress monitoring.
//!
//! The monitor polls the queue at a fixed interval and derives
//! `processed = total - remaining`. The sample races against the workers
//! (a claimed job leaves the queue before its files exist), so the display
//! counter only ever advances by the non-negative delta. Purely advisory:
//! nothing here affects scheduling.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::queue::TaskQueue;
use super::worker::WorkerPool;

/// Poll interval for queue length and worker liveness.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded monotonic display counter.
///
/// Raw samples may jitter in either direction; the displayed value never
/// decreases and never exceeds the total.
#[derive(Debug)]
pub struct ProgressCounter {
    total: u64,
    displayed: u64,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            displayed: 0,
        }
    }

    /// Fold in one queue-length sample; returns how far the display advances.
    pub fn observe(&mut self, remaining: u64) -> u64 {
        let processed = self.total.saturating_sub(remaining).min(self.total);
        let delta = processed.saturating_sub(self.displayed);
        self.displayed += delta;
        delta
    }

    /// Current displayed value.
    pub fn displayed(&self) -> u64 {
        self.displayed
    }
}

fn make_bar(total: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("static progress template is valid")
            .progress_chars("█▓▒░  "),
    );
    bar.enable_steady_tick(POLL_INTERVAL);
    bar
}

/// Poll until every worker handle has resolved, driving the display bar.
pub fn monitor_progress(queue: &TaskQueue, pool: &WorkerPool, total_jobs: usize, show: bool) {
    let bar = make_bar(total_jobs as u64, show);
    let mut counter = ProgressCounter::new(total_jobs as u64);

    loop {
        let delta = counter.observe(queue.remaining() as u64);
        if delta > 0 {
            bar.inc(delta);
        }
        if pool.all_finished() {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    // One last sample; anything still in the queue was abandoned by failed
    // workers and stays unprocessed, so the bar may finish short of total.
    let delta = counter.observe(queue.remaining() as u64);
    if delta > 0 {
        bar.inc(delta);
    }
    bar.abandon();

    tracing::debug!(
        displayed = counter.displayed(),
        total = total_jobs,
        "progress monitor finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_advances_with_processing() {
        let mut counter = ProgressCounter::new(10);
        assert_eq!(counter.observe(10), 0); // nothing processed yet
        assert_eq!(counter.observe(7), 3);
        assert_eq!(counter.observe(4), 3);
        assert_eq!(counter.observe(0), 4);
        assert_eq!(counter.displayed(), 10);
    }

    #[test]
    fn test_counter_clamps_backwards_samples() {
        let mut counter = ProgressCounter::new(10);
        assert_eq!(counter.observe(5), 5);
        // A racy sample claims fewer processed than before: clamp to zero
        assert_eq!(counter.observe(8), 0);
        assert_eq!(counter.displayed(), 5);
        // Progress resumes from the high-water mark
        assert_eq!(counter.observe(2), 3);
    }

    #[test]
    fn test_counter_is_monotonic_under_any_interleaving() {
        let samples = [10u64, 9, 11, 3, 7, 0, 5, 0];
        let mut counter = ProgressCounter::new(10);
        let mut last = 0;
        for s in samples {
            counter.observe(s);
            assert!(counter.displayed() >= last);
            last = counter.displayed();
        }
        assert!(last <= 10);
    }

    #[test]
    fn test_counter_never_exceeds_total() {
        let mut counter = ProgressCounter::new(3);
        // remaining of 0 on an oversized sample still caps at total
        counter.observe(0);
        assert_eq!(counter.displayed(), 3);
        counter.observe(0);
        assert_eq!(counter.displayed(), 3);
    }

    #[test]
    fn test_zero_total_stays_at_zero() {
        let mut counter = ProgressCounter::new(0);
        assert_eq!(counter.observe(0), 0);
        assert_eq!(counter.displayed(), 0);
    }
}
