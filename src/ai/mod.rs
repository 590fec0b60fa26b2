//! AI Integration Layer
//!
//! Resilient access to the generative-language service: retry with
//! exponential backoff, a shared quota cooldown, user-facing notifications,
//! and the vocabulary call sites built on top of them.

pub mod cooldown;
pub mod gateway;
pub mod json;
pub mod loading;
pub mod notify;
pub mod provider;
pub mod timer;
pub mod vocab;

pub use cooldown::{CooldownState, CooldownStats, QuotaCooldown, QuotaState};
pub use gateway::{Gateway, GatewayBuilder, IncompleteFallback, RequestOutcome, RetryPolicy};
pub use json::extract_json;
pub use loading::{LoadingFlag, LoadingGuard, LoadingIndicator, NoopIndicator};
pub use notify::{
    Notification, NotificationLog, Notifier, NotifyLevel, SharedNotifier, TracingNotifier,
};
pub use provider::{AiProvider, ChatStream, GeminiProvider, SharedProvider, create_provider};
pub use timer::{ScheduledTask, Timer, TokioTimer};
pub use vocab::VocabAssistant;
