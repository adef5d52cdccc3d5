//! Conversation orchestrator: the turn-taking entry point.
//!
//! Wires the session store, model fallback, response contract, and speech
//! synthesizer into `start_session` and `generate_response`.

use std::sync::Arc;

use uuid::Uuid;

use bmo_core::config::ConversationConfig;

use crate::contract::parse_turn_response;
use crate::error::ChatError;
use crate::fallback::ModelFallback;
use crate::session::SessionStore;
use crate::speech::SpeechSynthesizer;
use crate::types::{Role, SessionStart, Turn, TurnResult};

/// Top-level coordinator for conversational turns.
pub struct ConversationOrchestrator {
    store: Arc<SessionStore>,
    models: ModelFallback,
    speech: Arc<dyn SpeechSynthesizer>,
    greeting: String,
    system_prompt: String,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        models: ModelFallback,
        speech: Arc<dyn SpeechSynthesizer>,
        config: &ConversationConfig,
    ) -> Self {
        Self {
            store,
            models,
            speech,
            greeting: config.greeting.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Create a session and record the greeting as its first turn.
    pub fn start_session(&self) -> Result<SessionStart, ChatError> {
        let session_id = Uuid::new_v4();
        self.store.create(session_id)?;
        self.store
            .append(session_id, Role::Assistant, self.greeting.as_str())?;
        tracing::info!(session_id = %session_id, "Session started");
        Ok(SessionStart {
            session_id,
            message: self.greeting.clone(),
        })
    }

    /// Run one conversational turn for `transcript`.
    ///
    /// Turns on the same session are serialized. Any failure before the
    /// model's answer is validated leaves no assistant turn behind; a
    /// synthesis failure is reported after the narration is recorded.
    pub async fn generate_response(
        &self,
        session_id: Uuid,
        transcript: &str,
    ) -> Result<TurnResult, ChatError> {
        let turn_lock = self.store.turn_lock(session_id)?;
        let guard = turn_lock.lock_owned().await;

        self.store.append(session_id, Role::User, transcript)?;
        let history = self.store.history(session_id)?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Turn::system(self.system_prompt.as_str()));
        messages.extend(history);

        let completion = self.models.complete(&messages).await?;
        let response = parse_turn_response(&completion.content).map_err(|e| {
            tracing::warn!(
                session_id = %session_id,
                model = %completion.model,
                error = %e,
                "Model response violated the contract"
            );
            e
        })?;

        self.store
            .append(session_id, Role::Assistant, response.narration.as_str())?;
        drop(guard);

        tracing::debug!(
            session_id = %session_id,
            model = %completion.model,
            destination = %response.destination,
            mode = %response.mode,
            "Assistant turn recorded"
        );

        let speech = self.speech.synthesize(&response.narration).await.map_err(|e| {
            tracing::warn!(session_id = %session_id, error = %e, "Speech synthesis failed");
            ChatError::from(e)
        })?;

        Ok(TurnResult {
            session_id,
            transcript: transcript.to_string(),
            narration: response.narration,
            destination: response.destination,
            directions: response.directions,
            mode: response.mode,
            speech,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
