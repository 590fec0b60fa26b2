//! Quota Cooldown Controller
//!
//! A debounced circuit breaker over the generative-language service. Once the
//! service reports quota exhaustion, every request is refused locally until a
//! fixed cooldown elapses.
//!
//! ## States
//!
//! - **Closed**: Normal operation, requests flow through
//! - **Open**: Quota exhausted, requests are rejected without a network call
//!
//! ## Transitions
//!
//! ```text
//! Closed --[trip]--> Open            (error notification)
//! Open   --[trip]--> Open            (no-op, timer untouched)
//! Open   --[cooldown elapsed]--> Closed   (info notification)
//! ```
//!
//! Expiry is a deferred task scheduled on the injected [`Timer`], never polled.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::notify::{NotifyLevel, SharedNotifier};
use super::timer::{ScheduledTask, Timer};
use crate::types::FeatureName;

/// Cooldown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    /// Requests flow through
    Closed,
    /// Quota exhausted - requests rejected immediately
    Open,
}

impl std::fmt::Display for CooldownState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}

/// Observable quota state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub exhausted: bool,
    pub cooldown_ends_at: Option<DateTime<Utc>>,
}

/// All mutable state in one struct so transitions stay consistent
#[derive(Debug, Default)]
struct CooldownInner {
    quota: QuotaState,
    opened_at: Option<Instant>,
    /// Incremented on every Closed -> Open transition
    generation: u64,
    blocked_count: u64,
    pending: Option<ScheduledTask>,
}

struct Shared {
    inner: RwLock<CooldownInner>,
    notifier: SharedNotifier,
}

impl Shared {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, CooldownInner> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CooldownInner> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expire(&self, generation: u64) {
        {
            let mut inner = self.write();
            if !inner.quota.exhausted || inner.generation != generation {
                return;
            }
            inner.quota = QuotaState::default();
            inner.opened_at = None;
            inner.pending = None;
        }

        info!("Quota cooldown: Closed (cooldown elapsed)");
        self.notifier.notify(
            "AI cooldown finished. AI features are available again.",
            NotifyLevel::Info,
        );
    }
}

/// Quota cooldown owned by one gateway instance
pub struct QuotaCooldown {
    duration: Duration,
    timer: Arc<dyn Timer>,
    shared: Arc<Shared>,
}

impl QuotaCooldown {
    pub fn new(duration: Duration, timer: Arc<dyn Timer>, notifier: SharedNotifier) -> Self {
        Self {
            duration,
            timer,
            shared: Arc::new(Shared {
                inner: RwLock::new(CooldownInner::default()),
                notifier,
            }),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn state(&self) -> CooldownState {
        if self.shared.read().quota.exhausted {
            CooldownState::Open
        } else {
            CooldownState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == CooldownState::Open
    }

    pub fn quota_state(&self) -> QuotaState {
        self.shared.read().quota.clone()
    }

    /// Check whether a request may contact the service.
    ///
    /// Returns `false` while open and counts the rejection.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.shared.write();
        if inner.quota.exhausted {
            inner.blocked_count += 1;
            debug!("Quota cooldown: Request blocked (cooldown OPEN)");
            false
        } else {
            true
        }
    }

    /// Open the cooldown after a quota-exhaustion failure.
    ///
    /// Returns `true` if this call opened it, `false` if it was already open.
    pub fn trip(&self, feature: Option<&FeatureName>) -> bool {
        let generation = {
            let mut inner = self.shared.write();
            if inner.quota.exhausted {
                debug!("Quota cooldown: already OPEN, timer unchanged");
                return false;
            }
            inner.generation += 1;
            inner.quota.exhausted = true;
            inner.quota.cooldown_ends_at = TimeDelta::from_std(self.duration)
                .ok()
                .map(|delta| Utc::now() + delta);
            inner.opened_at = Some(Instant::now());
            inner.generation
        };

        warn!(
            feature = feature.map(FeatureName::as_str).unwrap_or("-"),
            cooldown_secs = self.duration.as_secs(),
            "Quota cooldown: Opened (quota exhausted)"
        );

        let during = feature
            .map(|f| format!(" while loading {}", f))
            .unwrap_or_default();
        self.shared.notifier.notify(
            &format!(
                "AI quota exhausted{}. AI features are paused for {}.",
                during,
                human_duration(self.duration)
            ),
            NotifyLevel::Error,
        );

        let shared = Arc::clone(&self.shared);
        let task = self
            .timer
            .schedule(self.duration, Box::new(move || shared.expire(generation)));

        let mut inner = self.shared.write();
        if inner.quota.exhausted && inner.generation == generation {
            inner.pending = Some(task);
        }

        true
    }

    /// Time left until the cooldown closes
    pub fn remaining(&self) -> Option<Duration> {
        let inner = self.shared.read();
        inner
            .opened_at
            .map(|opened| self.duration.saturating_sub(opened.elapsed()))
    }

    /// Statistics for monitoring
    pub fn stats(&self) -> CooldownStats {
        let inner = self.shared.read();
        CooldownStats {
            state: if inner.quota.exhausted {
                CooldownState::Open
            } else {
                CooldownState::Closed
            },
            trip_count: inner.generation,
            blocked_count: inner.blocked_count,
            cooldown_ends_at: inner.quota.cooldown_ends_at,
        }
    }
}

impl Drop for QuotaCooldown {
    fn drop(&mut self) {
        if let Some(task) = self.shared.write().pending.take() {
            task.cancel();
        }
    }
}

/// Statistics for monitoring cooldown state
#[derive(Debug, Clone)]
pub struct CooldownStats {
    pub state: CooldownState,
    pub trip_count: u64,
    pub blocked_count: u64,
    pub cooldown_ends_at: Option<DateTime<Utc>>,
}

impl CooldownStats {
    /// Format as human-readable summary
    pub fn summary(&self) -> String {
        let until = self
            .cooldown_ends_at
            .map(|t| format!(" until {}", t.format("%H:%M:%S UTC")))
            .unwrap_or_default();

        format!(
            "{}{} | trips={} blocked={}",
            self.state, until, self.trip_count, self.blocked_count
        )
    }
}

pub(crate) fn human_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}
