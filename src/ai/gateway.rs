//! AI Request Gateway
//!
//! Runs one logical operation against the generative-language service with
//! classification-aware retry, and turns every failure into a notification
//! plus an [`RequestOutcome`] the caller can branch on. Nothing is thrown
//! across this boundary.
//!
//! ## Strategy
//!
//! 1. Refuse immediately while the quota cooldown is open
//! 2. Invoke the operation (one network call)
//! 3. Classify any failure; quota exhaustion opens the cooldown and stops
//! 4. Otherwise warn, back off `initial_delay * multiplier^attempt`, retry
//! 5. After the last attempt, notify once and return the terminal outcome

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::cooldown::{QuotaCooldown, human_duration};
use super::loading::{LoadingFlag, LoadingGuard, LoadingIndicator, NoopIndicator};
use super::notify::{NotifyLevel, SharedNotifier, TracingNotifier};
use super::timer::{Timer, TokioTimer};
use crate::constants::{cooldown as cooldown_constants, retry as retry_constants};
use crate::types::{ErrorCategory, ErrorClassifier, FeatureName, ServiceError};

// =============================================================================
// Retry Policy
// =============================================================================

/// Per-call-site retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Growth factor per attempt
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry_constants::WORD_DETAILS_MAX_RETRIES,
            initial_delay_ms: retry_constants::WORD_DETAILS_INITIAL_DELAY_MS,
            backoff_multiplier: retry_constants::BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay_ms: u64::try_from(initial_delay.as_millis()).unwrap_or(u64::MAX),
            backoff_multiplier: retry_constants::BACKOFF_MULTIPLIER,
        }
    }

    /// Policy used by the word detail lookup
    pub fn word_details() -> Self {
        Self::default()
    }

    /// Policy used by the image lookup
    pub fn image() -> Self {
        Self {
            max_retries: retry_constants::IMAGE_MAX_RETRIES,
            initial_delay_ms: retry_constants::IMAGE_INITIAL_DELAY_MS,
            backoff_multiplier: retry_constants::BACKOFF_MULTIPLIER,
        }
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retrying after attempt `attempt` (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.backoff_multiplier).saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome<T> {
    /// Complete payload
    Success(T),
    /// Degraded payload returned after incomplete responses used up the budget
    Partial(T),
    /// Refused or stopped because the quota is exhausted
    QuotaExhausted,
    /// Retry budget exhausted
    PermanentFailure(String),
}

impl<T> RequestOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Payload if any was produced (complete or partial)
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Success(value) | Self::Partial(value) => Some(value),
            Self::QuotaExhausted | Self::PermanentFailure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestOutcome<U> {
        match self {
            Self::Success(value) => RequestOutcome::Success(f(value)),
            Self::Partial(value) => RequestOutcome::Partial(f(value)),
            Self::QuotaExhausted => RequestOutcome::QuotaExhausted,
            Self::PermanentFailure(reason) => RequestOutcome::PermanentFailure(reason),
        }
    }
}

/// What to hand back when every attempt produced an incomplete payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteFallback {
    /// Return the last partial payload ("return what we have")
    ReturnPartial,
    /// Treat as a permanent failure
    Discard,
}

/// Failure of a single attempt
enum AttemptFailure {
    Service(ServiceError, ErrorCategory),
    Incomplete,
}

impl AttemptFailure {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Service(_, category) => *category,
            Self::Incomplete => ErrorCategory::IncompletePayload,
        }
    }

    fn reason(&self) -> String {
        match self {
            Self::Service(err, _) => err.to_string(),
            Self::Incomplete => "response was missing required fields".to_string(),
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway in front of the generative-language service.
///
/// Owns the quota cooldown; independent gateways never share quota state.
pub struct Gateway {
    cooldown: QuotaCooldown,
    loading: Arc<LoadingFlag>,
    notifier: SharedNotifier,
    timer: Arc<dyn Timer>,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    pub fn cooldown(&self) -> &QuotaCooldown {
        &self.cooldown
    }

    pub fn loading(&self) -> &LoadingFlag {
        &self.loading
    }

    pub fn notifier(&self) -> &SharedNotifier {
        &self.notifier
    }

    /// Run `operation` with retry. Every `Ok` payload counts as complete.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: F,
        policy: &RetryPolicy,
        context: impl Into<FeatureName>,
    ) -> RequestOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        self.run(
            operation,
            policy,
            context.into(),
            |_| true,
            IncompleteFallback::Discard,
        )
        .await
    }

    /// Run `operation` with retry, also retrying payloads that fail `is_complete`.
    pub async fn execute_checked<T, F, Fut>(
        &self,
        operation: F,
        policy: &RetryPolicy,
        context: impl Into<FeatureName>,
        is_complete: impl Fn(&T) -> bool,
        fallback: IncompleteFallback,
    ) -> RequestOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        self.run(operation, policy, context.into(), is_complete, fallback)
            .await
    }

    /// Refuse a call because the cooldown is open
    pub(crate) fn reject_cooling_down(&self, context: &FeatureName) {
        let wait = self
            .cooldown
            .remaining()
            .map(|d| format!(" for another {}", human_duration(round_up_to_minute(d))))
            .unwrap_or_default();
        self.notifier.notify(
            &format!(
                "{} is unavailable: AI features are paused{} after the quota ran out.",
                context, wait
            ),
            NotifyLevel::Warning,
        );
    }

    /// Mark a call that bypasses `execute` as in flight
    pub(crate) fn begin_loading(&self) -> LoadingGuard {
        self.loading.begin()
    }

    #[instrument(
        skip_all,
        fields(feature = %context, max_retries = policy.max_retries)
    )]
    async fn run<T, F, Fut>(
        &self,
        mut operation: F,
        policy: &RetryPolicy,
        context: FeatureName,
        is_complete: impl Fn(&T) -> bool,
        fallback: IncompleteFallback,
    ) -> RequestOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let _loading = self.loading.begin();
        let total = policy.total_attempts();
        let mut partial: Option<T> = None;

        for attempt in 0..=policy.max_retries {
            if !self.cooldown.try_acquire() {
                debug!(attempt, "Cooldown open, request refused");
                self.reject_cooling_down(&context);
                return RequestOutcome::QuotaExhausted;
            }

            let attempt_no = attempt.saturating_add(1);
            debug!(attempt = attempt_no, total, "Gateway attempt");

            let failure = match operation().await {
                Ok(payload) if is_complete(&payload) => {
                    debug!(attempt = attempt_no, "Gateway attempt succeeded");
                    return RequestOutcome::Success(payload);
                }
                Ok(payload) => {
                    partial = Some(payload);
                    AttemptFailure::Incomplete
                }
                Err(err) => {
                    let category = ErrorClassifier::classify(&err);
                    if category.trips_cooldown() {
                        warn!(error = %err, "Quota exhausted, stopping retries");
                        self.cooldown.trip(Some(&context));
                        return RequestOutcome::QuotaExhausted;
                    }
                    AttemptFailure::Service(err, category)
                }
            };

            warn!(
                attempt = attempt_no,
                total,
                category = %failure.category(),
                reason = %failure.reason(),
                "Gateway attempt failed"
            );

            if attempt < policy.max_retries {
                let delay = policy.delay_for_attempt(attempt);
                self.notifier.notify(
                    &retry_message(&context, &failure, delay, attempt_no.saturating_add(1), total),
                    NotifyLevel::Warning,
                );
                self.timer.sleep(delay).await;
                continue;
            }

            if fallback == IncompleteFallback::ReturnPartial
                && let Some(payload) = partial.take()
            {
                self.notifier.notify(
                    &format!(
                        "{}: the AI returned incomplete data after {} attempts. Showing what we have.",
                        context, total
                    ),
                    NotifyLevel::Warning,
                );
                return RequestOutcome::Partial(payload);
            }

            let reason = failure.reason();
            self.notifier.notify(
                &format!(
                    "{} failed after {} attempts: {}",
                    context,
                    total,
                    terminal_reason(&failure)
                ),
                NotifyLevel::Error,
            );
            return RequestOutcome::PermanentFailure(reason);
        }

        // 0..=max_retries is never empty
        RequestOutcome::PermanentFailure("no attempts were made".to_string())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("cooldown", &self.cooldown.state())
            .field("loading", &self.loading)
            .finish()
    }
}

fn retry_message(
    context: &FeatureName,
    failure: &AttemptFailure,
    delay: Duration,
    next_attempt: u32,
    total: u32,
) -> String {
    let what = match failure {
        AttemptFailure::Service(_, ErrorCategory::RateLimited) => {
            "the AI service is rate limiting requests".to_string()
        }
        AttemptFailure::Service(err, _) => format!("request failed ({})", err.message),
        AttemptFailure::Incomplete => "the AI response was incomplete".to_string(),
    };
    format!(
        "{}: {}. Retrying in {} (attempt {} of {})...",
        context,
        what,
        format_delay(delay),
        next_attempt,
        total
    )
}

fn terminal_reason(failure: &AttemptFailure) -> String {
    match failure {
        AttemptFailure::Service(_, ErrorCategory::RateLimited) => {
            "the AI service is still rate limiting requests. Please try again later.".to_string()
        }
        AttemptFailure::Service(err, _) => err.message.clone(),
        AttemptFailure::Incomplete => "the AI response was incomplete".to_string(),
    }
}

fn format_delay(delay: Duration) -> String {
    let ms = delay.as_millis();
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else if ms > 1000 {
        format!("{:.1}s", delay.as_secs_f64())
    } else {
        format!("{}ms", ms)
    }
}

fn round_up_to_minute(d: Duration) -> Duration {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    Duration::from_secs(secs.div_ceil(60).max(1) * 60)
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Gateway`]
pub struct GatewayBuilder {
    cooldown: Duration,
    timer: Arc<dyn Timer>,
    notifier: SharedNotifier,
    indicator: Arc<dyn LoadingIndicator>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            cooldown: Duration::from_secs(cooldown_constants::DEFAULT_COOLDOWN_SECS),
            timer: Arc::new(TokioTimer),
            notifier: Arc::new(TracingNotifier),
            indicator: Arc::new(NoopIndicator),
        }
    }

    pub fn cooldown(mut self, duration: Duration) -> Self {
        self.cooldown = duration;
        self
    }

    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn loading_indicator(mut self, indicator: Arc<dyn LoadingIndicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn build(self) -> Gateway {
        Gateway {
            cooldown: QuotaCooldown::new(
                self.cooldown,
                Arc::clone(&self.timer),
                Arc::clone(&self.notifier),
            ),
            loading: Arc::new(LoadingFlag::new(self.indicator)),
            notifier: self.notifier,
            timer: self.timer,
        }
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
