//! Timer abstraction for backoff sleeps and deferred cooldown expiry.
//!
//! Production code uses [`TokioTimer`]. Tests run on tokio's paused clock
//! (`#[tokio::test(start_paused = true)]`) and advance time explicitly, so
//! nothing sleeps in real time.

use std::time::Duration;

use futures::future::BoxFuture;

/// Deferred work that can be cancelled before it fires
#[must_use = "dropping the handle leaves the task running; call cancel() to stop it"]
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl ScheduledTask {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the task if it has not fired yet
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub trait Timer: Send + Sync {
    /// Non-blocking wait
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;

    /// Run `task` once after `delay`
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> ScheduledTask;
}

/// Timer backed by the tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> ScheduledTask {
        // Deadline is fixed now, not when the spawned task is first polled
        let deadline = tokio::time::sleep(delay);
        let handle = tokio::spawn(async move {
            deadline.await;
            task();
        });
        let abort = handle.abort_handle();
        ScheduledTask::new(move || abort.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_scheduled_task_is_send_sync() {
        assert_send_sync::<ScheduledTask>();
    }
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let _task = TokioTimer.schedule(
            Duration::from_secs(10),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        tokio::time::advance(Duration::from_secs(9)).await;
        settle().await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let task = TokioTimer.schedule(
            Duration::from_secs(5),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        task.cancel();

        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
