//! Ordered model fallback with bounded per-model retries.
//!
//! Candidates are tried strictly in list order. Within one candidate,
//! transient and rate-limit failures are retried with exponential backoff;
//! a rejection moves straight on to the next candidate; an auth failure
//! aborts the whole loop.

use std::sync::Arc;
use std::time::Duration;

use bmo_core::config::OpenRouterConfig;

use crate::backend::ChatBackend;
use crate::error::{BackendError, BackendErrorKind, ChatError, ModelFailure};
use crate::types::Turn;

/// Ordered, deduplicated list of model identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates(Arc<[String]>);

impl ModelCandidates {
    /// Build the list with `preferred` (if any) at position 0, followed by
    /// `models` in order. Blank entries and repeats are dropped.
    pub fn new(preferred: Option<&str>, models: &[String]) -> Self {
        let mut ordered: Vec<String> = Vec::with_capacity(models.len() + 1);
        let head = preferred.into_iter();
        let tail = models.iter().map(String::as_str);
        for model in head.chain(tail).map(str::trim) {
            if !model.is_empty() && !ordered.iter().any(|m| m == model) {
                ordered.push(model.to_string());
            }
        }
        Self(ordered.into())
    }

    pub fn from_config(config: &OpenRouterConfig) -> Self {
        Self::new(Some(config.model.as_str()), &config.models)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-model retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles for each later retry.
    pub initial_backoff: Duration,
    /// Upper bound on a single backend call.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &OpenRouterConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            attempt_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// A successful completion and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub model: String,
    pub content: String,
}

/// Drives sequential attempts over the candidate list.
pub struct ModelFallback {
    backend: Arc<dyn ChatBackend>,
    candidates: ModelCandidates,
    policy: RetryPolicy,
}

/// Why a single candidate gave up.
enum CandidateOutcome {
    Failed(String),
    Abort(String),
}

impl ModelFallback {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        candidates: ModelCandidates,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            candidates,
            policy,
        }
    }

    /// Obtain a completion from the first candidate that succeeds.
    pub async fn complete(&self, messages: &[Turn]) -> Result<Completion, ChatError> {
        let mut failures = Vec::new();

        for model in self.candidates.as_slice() {
            match self.try_model(messages, model).await {
                Ok(content) => {
                    tracing::info!(model = %model, "Model produced a completion");
                    return Ok(Completion {
                        model: model.clone(),
                        content,
                    });
                }
                Err(CandidateOutcome::Abort(reason)) => {
                    tracing::error!(model = %model, reason = %reason, "Backend rejected credentials, aborting fallback");
                    return Err(ChatError::AuthConfiguration(format!("{model}: {reason}")));
                }
                Err(CandidateOutcome::Failed(reason)) => {
                    tracing::warn!(model = %model, reason = %reason, "Model failed, trying next candidate");
                    failures.push(ModelFailure {
                        model: model.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::error!(
            candidates = self.candidates.len(),
            "All candidate models failed"
        );
        Err(ChatError::UpstreamUnavailable(failures))
    }

    async fn try_model(&self, messages: &[Turn], model: &str) -> Result<String, CandidateOutcome> {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_backoff;

        for attempt in 1..=attempts {
            let err = match self.call_once(messages, model).await {
                Ok(content) => return Ok(content),
                Err(err) => err,
            };
            let is_last = attempt == attempts;

            match err.kind {
                BackendErrorKind::Auth => return Err(CandidateOutcome::Abort(err.message)),
                BackendErrorKind::Rejected => {
                    return Err(CandidateOutcome::Failed(format!(
                        "request rejected ({})",
                        err.message
                    )))
                }
                BackendErrorKind::RateLimited if is_last => {
                    return Err(CandidateOutcome::Failed(format!(
                        "rate limit reached ({})",
                        err.message
                    )))
                }
                BackendErrorKind::Transient if is_last => {
                    return Err(CandidateOutcome::Failed(format!(
                        "unreachable ({})",
                        err.message
                    )))
                }
                BackendErrorKind::RateLimited | BackendErrorKind::Transient => {
                    tracing::debug!(
                        model = %model,
                        attempt,
                        kind = %err.kind,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying chat call after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }

        // `attempts >= 1` and the last attempt always returns above.
        Err(CandidateOutcome::Failed("no attempts made".to_string()))
    }

    async fn call_once(&self, messages: &[Turn], model: &str) -> Result<String, BackendError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.backend.chat(messages, model))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::transient(format!(
                "timed out after {}ms",
                self.policy.attempt_timeout.as_millis()
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
