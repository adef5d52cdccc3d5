//! Error types for the conversation core.

use std::fmt;

use uuid::Uuid;

/// Errors surfaced by the conversation core to its callers.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    UnknownSession(Uuid),
    #[error("session already exists: {0}")]
    DuplicateSession(Uuid),
    #[error("backend rejected credentials: {0}")]
    AuthConfiguration(String),
    #[error("all models failed: {}", join_failures(.0))]
    UpstreamUnavailable(Vec<ModelFailure>),
    #[error("model returned an invalid response: {0}")]
    UpstreamContract(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("session store lock poisoned: {0}")]
    Lock(String),
}

/// The last recorded failure of one candidate model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFailure {
    pub model: String,
    pub reason: String,
}

impl fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.model, self.reason)
    }
}

fn join_failures(failures: &[ModelFailure]) -> String {
    if failures.is_empty() {
        return "no models configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Status classification of a failed chat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Credentials rejected. Aborts the whole fallback loop.
    Auth,
    /// Backend asked us to slow down. Retried with backoff.
    RateLimited,
    /// Connection failure or timeout. Retried with backoff.
    Transient,
    /// Any other non-success answer. Moves on to the next model.
    Rejected,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendErrorKind::Auth => "auth",
            BackendErrorKind::RateLimited => "rate limited",
            BackendErrorKind::Transient => "transient",
            BackendErrorKind::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A typed failure from one chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Auth, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::RateLimited, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transient, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, message)
    }
}

/// Opaque failure of the speech-synthesis collaborator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SpeechError(pub String);

impl From<SpeechError> for ChatError {
    fn from(err: SpeechError) -> Self {
        ChatError::Synthesis(err.0)
    }
}
