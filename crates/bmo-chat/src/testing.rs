//! Scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::ChatBackend;
use crate::error::{BackendError, SpeechError};
use crate::speech::SpeechSynthesizer;
use crate::types::{SpeechPayload, Turn};

/// Chat backend that replays queued responses per model.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, BackendError>>>>,
    calls: Mutex<HashMap<String, usize>>,
    last_messages: Mutex<Vec<Turn>>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `model`.
    pub fn respond(self, model: &str, response: Result<String, BackendError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, model: &str) -> usize {
        self.calls.lock().unwrap().get(model).copied().unwrap_or(0)
    }

    pub fn last_messages(&self) -> Vec<Turn> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, messages: &[Turn], model: &str) -> Result<String, BackendError> {
        *self.calls.lock().unwrap().entry(model.to_string()).or_default() += 1;
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.scripts
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(BackendError::rejected(format!("no script for {model}"))))
    }
}

/// Speech synthesizer that records what it was asked to say.
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub fail: bool,
    spoken: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts synthesized successfully, in call order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpeechPayload, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SpeechError("voice service unavailable".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(SpeechPayload {
            mime_type: "audio/mpeg".to_string(),
            base64: format!("spoken:{text}"),
        })
    }
}
