//! In-memory session store.
//!
//! Holds the ordered turn history of every live session. Each session sits
//! behind its own mutex so appends to one session are totally ordered while
//! different sessions never contend beyond the map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::{Role, Turn};

/// Limits on how many sessions are kept and for how long.
///
/// The default keeps every session until the process exits.
#[derive(Debug, Clone, Default)]
pub struct EvictionPolicy {
    /// Maximum number of live sessions.
    pub max_sessions: Option<usize>,
    /// Maximum time a session may go without activity.
    pub max_idle: Option<Duration>,
}

impl EvictionPolicy {
    pub fn from_config(config: &bmo_core::config::SessionsConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            max_idle: config
                .max_idle_minutes
                .map(|m| Duration::minutes(i64::from(m))),
        }
    }
}

struct Session {
    turns: Vec<Turn>,
    /// Epoch milliseconds of the last create/append.
    last_active_ms: i64,
}

struct SessionSlot {
    state: Mutex<Session>,
    /// Held by the conversation orchestrator for the duration of a turn.
    turn_lock: Arc<tokio::sync::Mutex<()>>,
}

/// Process-local store of per-session turn histories.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
    policy: EvictionPolicy,
}

impl SessionStore {
    /// Create a store that never evicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given eviction policy.
    pub fn with_policy(policy: EvictionPolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Register an empty history for `session_id`.
    pub fn create(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| ChatError::Lock(e.to_string()))?;

        if sessions.contains_key(&session_id) {
            return Err(ChatError::DuplicateSession(session_id));
        }

        let now = now_ms();
        self.evict_idle(&mut sessions, now);
        if let Some(max) = self.policy.max_sessions {
            while max > 0 && sessions.len() >= max {
                match least_recently_active(&sessions) {
                    Some(oldest) => {
                        sessions.remove(&oldest);
                        tracing::debug!(session_id = %oldest, "Evicted session over capacity");
                    }
                    None => break,
                }
            }
        }

        sessions.insert(
            session_id,
            Arc::new(SessionSlot {
                state: Mutex::new(Session {
                    turns: Vec::new(),
                    last_active_ms: now,
                }),
                turn_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        );
        Ok(())
    }

    /// Append a turn to the end of a session's history.
    pub fn append(
        &self,
        session_id: Uuid,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), ChatError> {
        let slot = self.slot(session_id)?;
        let mut session = slot
            .state
            .lock()
            .map_err(|e| ChatError::Lock(e.to_string()))?;
        session.turns.push(Turn::new(role, content));
        session.last_active_ms = now_ms();
        Ok(())
    }

    /// Snapshot of a session's history in append order.
    pub fn history(&self, session_id: Uuid) -> Result<Vec<Turn>, ChatError> {
        let slot = self.slot(session_id)?;
        let session = slot
            .state
            .lock()
            .map_err(|e| ChatError::Lock(e.to_string()))?;
        Ok(session.turns.clone())
    }

    /// The per-session lock that serializes whole turns.
    pub fn turn_lock(&self, session_id: Uuid) -> Result<Arc<tokio::sync::Mutex<()>>, ChatError> {
        Ok(Arc::clone(&self.slot(session_id)?.turn_lock))
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions
            .read()
            .map(|s| s.contains_key(&session_id))
            .unwrap_or(false)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle for longer than the policy allows.
    ///
    /// Returns the number of sessions removed. No-op without `max_idle`.
    pub fn purge_idle(&self) -> Result<usize, ChatError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| ChatError::Lock(e.to_string()))?;
        Ok(self.evict_idle(&mut sessions, now_ms()))
    }

    fn slot(&self, session_id: Uuid) -> Result<Arc<SessionSlot>, ChatError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| ChatError::Lock(e.to_string()))?;
        sessions
            .get(&session_id)
            .cloned()
            .ok_or(ChatError::UnknownSession(session_id))
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Arc<SessionSlot>>, now: i64) -> usize {
        let Some(max_idle) = self.policy.max_idle else {
            return 0;
        };
        let max_idle_ms = max_idle.num_milliseconds();
        let before = sessions.len();
        sessions.retain(|_, slot| match slot.state.lock() {
            Ok(session) => now - session.last_active_ms <= max_idle_ms,
            Err(_) => false,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "Purged idle sessions");
        }
        removed
    }
}

fn least_recently_active(sessions: &HashMap<Uuid, Arc<SessionSlot>>) -> Option<Uuid> {
    sessions
        .iter()
        .filter_map(|(id, slot)| {
            slot.state
                .lock()
                .ok()
                .map(|session| (session.last_active_ms, *id))
        })
        .min()
        .map(|(_, id)| id)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// Tests
// =============================================================================
