//! Conversation core for the BMO voice assistant.
//!
//! Keeps per-session dialogue history, obtains a structured answer from an
//! ordered list of chat models (with retries and fallback), validates it,
//! and hands the narration to a speech synthesizer.

pub mod backend;
pub mod contract;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod session;
pub mod speech;
pub mod types;

#[cfg(test)]
mod testing;

pub use backend::{ChatBackend, OpenRouterClient};
pub use contract::{parse_turn_response, RawTurnResponse};
pub use error::{BackendError, BackendErrorKind, ChatError, ModelFailure, SpeechError};
pub use fallback::{Completion, ModelCandidates, ModelFallback, RetryPolicy};
pub use orchestrator::ConversationOrchestrator;
pub use session::{EvictionPolicy, SessionStore};
pub use speech::{OpenAiSpeechClient, SpeechSynthesizer};
pub use types::{Mode, Role, SessionStart, SpeechPayload, Turn, TurnResponse, TurnResult};
