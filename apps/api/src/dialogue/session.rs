use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{error, info};
use uuid::Uuid;

use crate::dialogue::orchestrator::Orchestrator;
use crate::store::{ConversationMemory, StoreError};

/// One async mutex per session so turns of the same session run one at a time.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn lock_for(&self, session_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop entries nobody is waiting on.
        locks.retain(|id, lock| *id == session_id || Arc::strong_count(lock) > 1);
        locks.entry(session_id).or_default().clone()
    }
}

/// Runs turns end to end: load, orchestrate, commit.
pub struct ChatService {
    orchestrator: Orchestrator,
    memory: Arc<dyn ConversationMemory>,
    locks: SessionLocks,
}

impl ChatService {
    pub fn new(orchestrator: Orchestrator, memory: Arc<dyn ConversationMemory>) -> Self {
        Self {
            orchestrator,
            memory,
            locks: SessionLocks::default(),
        }
    }

    pub async fn start_session(&self, user_id: &str) -> Result<Uuid, StoreError> {
        let session_id = self.memory.start_session(user_id).await?;
        info!(%session_id, user_id, "session started");
        Ok(session_id)
    }

    /// Handles one utterance and returns the reply. State and the turn's writes
    /// are committed together, or not at all.
    pub async fn run_turn(&self, session_id: Uuid, utterance: &str) -> Result<String, StoreError> {
        let lock = self.locks.lock_for(session_id);
        let _guard = lock.lock().await;

        let record = self.memory.load(session_id).await?;
        let outcome = self
            .orchestrator
            .handle_turn(&record.key, record.state, utterance)
            .await;

        if outcome.status.commits() {
            self.memory
                .commit_turn(&record.key, &outcome.state, &outcome.writes)
                .await
                .map_err(|err| {
                    error!(%session_id, error = %err, "turn commit failed");
                    err
                })?;
        }
        info!(
            %session_id,
            status = ?outcome.status,
            writes = outcome.writes.len(),
            "turn finished"
        );
        Ok(outcome.response)
    }
}
