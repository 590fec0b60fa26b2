//! Reference-counted loading indicator
//!
//! Concurrent gateway calls each hold a [`LoadingGuard`]; the indicator is
//! switched on when the first guard is taken and off when the last one drops.
//! Dropping covers every exit path, including unwinding out of a panicking
//! operation, so the indicator cannot get stuck on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// UI busy indicator
pub trait LoadingIndicator: Send + Sync {
    fn set_loading(&self, active: bool);
}

/// Indicator that only tracks state (no UI attached)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndicator;

impl LoadingIndicator for NoopIndicator {
    fn set_loading(&self, _active: bool) {}
}

/// Shared counter in front of a [`LoadingIndicator`]
pub struct LoadingFlag {
    active: AtomicUsize,
    indicator: Arc<dyn LoadingIndicator>,
}

impl std::fmt::Debug for LoadingFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingFlag")
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for LoadingFlag {
    fn default() -> Self {
        Self::new(Arc::new(NoopIndicator))
    }
}

impl LoadingFlag {
    pub fn new(indicator: Arc<dyn LoadingIndicator>) -> Self {
        Self {
            active: AtomicUsize::new(0),
            indicator,
        }
    }

    /// Mark one operation as in flight
    pub fn begin(self: &Arc<Self>) -> LoadingGuard {
        if self.active.fetch_add(1, Ordering::SeqCst) == 0 {
            self.indicator.set_loading(true);
        }
        LoadingGuard {
            flag: Arc::clone(self),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Number of operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Keeps the loading flag raised until dropped
#[must_use = "the loading flag drops as soon as the guard is dropped"]
pub struct LoadingGuard {
    flag: Arc<LoadingFlag>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.flag.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.flag.indicator.set_loading(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<bool>>);

    impl LoadingIndicator for Recorder {
        fn set_loading(&self, active: bool) {
            self.0.lock().unwrap().push(active);
        }
    }

    #[test]
    fn test_nested_guards_toggle_once() {
        let recorder = Arc::new(Recorder::default());
        let flag = Arc::new(LoadingFlag::new(recorder.clone()));

        let first = flag.begin();
        let second = flag.begin();
        assert_eq!(flag.in_flight(), 2);

        drop(first);
        assert!(flag.is_loading());

        drop(second);
        assert!(!flag.is_loading());
        assert_eq!(*recorder.0.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let flag = Arc::new(LoadingFlag::default());
        let cloned = Arc::clone(&flag);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.begin();
            panic!("operation blew up");
        }));

        assert!(result.is_err());
        assert!(!flag.is_loading());
    }
}
