//! Debounce timer for background backend calls.
//!
//! Rapid text changes must not issue one synthesis call each; work is
//! scheduled after a quiet period and superseded by any newer trigger.
//! Already-running work is never aborted — completions carry their
//! generation so the consumer can drop stale results.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Generation-counted quiet-period timer.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedules `work` to run after the quiet period.
    ///
    /// Returns the generation assigned to this trigger. If another trigger
    /// arrives before the quiet period elapses, the scheduled work is
    /// skipped entirely; work that already started keeps running and must
    /// be filtered by generation at the consumer.
    pub fn schedule<F, Fut>(&self, work: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) == generation {
                work(generation).await;
            }
        });

        generation
    }

    /// The most recently assigned generation.
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns true if `generation` is still the latest trigger.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Invalidates any scheduled-but-not-started work.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_work_runs_after_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        let (tx, mut rx) = mpsc::unbounded_channel();

        debouncer.schedule(move |generation| async move {
            let _ = tx.send(generation);
        });

        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_supersedes_scheduled_work() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let tx1 = tx.clone();
        debouncer.schedule(move |_| async move {
            let _ = tx1.send("first");
        });
        // Retrigger immediately: the first scheduled call must be skipped
        debouncer.schedule(move |_| async move {
            let _ = tx.send("second");
        });

        assert_eq!(rx.recv().await, Some("second"));
        assert!(rx.try_recv().is_err(), "superseded work must not run");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generations_increment() {
        let debouncer = Debouncer::new(Duration::from_millis(10));

        let g1 = debouncer.schedule(|_| async {});
        let g2 = debouncer.schedule(|_| async {});

        assert_eq!(g1, 1);
        assert_eq!(g2, 2);
        assert!(debouncer.is_current(g2));
        assert!(!debouncer.is_current(g1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_invalidates_pending_work() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let (tx, mut rx) = mpsc::unbounded_channel::<&str>();

        debouncer.schedule(move |_| async move {
            let _ = tx.send("ran");
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err(), "cancelled work must not run");
    }
}
