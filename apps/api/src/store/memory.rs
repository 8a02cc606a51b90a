//! In-memory store used by the orchestrator and session tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::conversation::ConversationState;
use crate::models::job::JobPosting;
use crate::store::{
    ConversationMemory, JobRepository, PendingWrite, SessionKey, SessionRecord, StoreError,
    StoredCoverLetter, StoredQuestion, ViewedPosting,
};

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, (String, ConversationState)>,
    session_results: HashMap<Uuid, Vec<i64>>,
    viewed: Vec<(String, ViewedPosting)>,
    letters: Vec<(String, StoredCoverLetter)>,
    questions: Vec<(String, StoredQuestion)>,
}

#[derive(Default)]
pub struct MemoryStore {
    /// Full postings, details included.
    catalogue: Vec<JobPosting>,
    inner: Mutex<Inner>,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn with_postings(catalogue: Vec<JobPosting>) -> Self {
        Self {
            catalogue,
            ..Self::default()
        }
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn session_results(&self, session_id: Uuid) -> Vec<i64> {
        self.lock()
            .session_results
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn viewed_count(&self, user_id: &str) -> usize {
        self.lock().viewed.iter().filter(|(u, _)| u == user_id).count()
    }

    pub fn letter_count(&self, user_id: &str) -> usize {
        self.lock().letters.iter().filter(|(u, _)| u == user_id).count()
    }

    pub fn question_count(&self, user_id: &str) -> usize {
        self.lock().questions.iter().filter(|(u, _)| u == user_id).count()
    }

    pub fn seed_cover_letter(&self, user_id: &str, text: &str) {
        self.lock().letters.push((
            user_id.to_string(),
            StoredCoverLetter {
                job_ref: None,
                text: text.to_string(),
                created_at: Utc::now(),
            },
        ));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn search(&self, keywords: &[String]) -> Result<Vec<JobPosting>, StoreError> {
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(self
            .catalogue
            .iter()
            .filter(|p| {
                let title = p.title.to_lowercase();
                let skills = p.skills.to_lowercase();
                needles
                    .iter()
                    .any(|n| title.contains(n.as_str()) || skills.contains(n.as_str()))
            })
            .map(|p| JobPosting {
                details: None,
                ..p.clone()
            })
            .collect())
    }

    async fn get_by_ordinal(
        &self,
        session_id: Uuid,
        ordinal: u32,
    ) -> Result<Option<JobPosting>, StoreError> {
        let id = self
            .lock()
            .session_results
            .get(&session_id)
            .and_then(|ids| ids.get((ordinal as usize).checked_sub(1)?).copied());
        Ok(id.and_then(|id| self.catalogue.iter().find(|p| p.id == id).cloned()))
    }

    async fn viewed_postings(&self, user_id: &str) -> Result<Vec<ViewedPosting>, StoreError> {
        Ok(self
            .lock()
            .viewed
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

#[async_trait]
impl ConversationMemory for MemoryStore {
    async fn start_session(&self, user_id: &str) -> Result<Uuid, StoreError> {
        let session_id = Uuid::new_v4();
        self.lock()
            .sessions
            .insert(session_id, (user_id.to_string(), ConversationState::default()));
        Ok(session_id)
    }

    async fn load(&self, session_id: Uuid) -> Result<SessionRecord, StoreError> {
        let inner = self.lock();
        let (user_id, state) = inner
            .sessions
            .get(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        Ok(SessionRecord {
            key: SessionKey {
                session_id,
                user_id: user_id.clone(),
            },
            state: state.clone(),
        })
    }

    async fn latest_cover_letter(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredCoverLetter>, StoreError> {
        Ok(self
            .lock()
            .letters
            .iter()
            .rev()
            .find(|(u, _)| u == user_id)
            .map(|(_, l)| l.clone()))
    }

    async fn cover_letters(&self, user_id: &str) -> Result<Vec<StoredCoverLetter>, StoreError> {
        Ok(self
            .lock()
            .letters
            .iter()
            .rev()
            .filter(|(u, _)| u == user_id)
            .map(|(_, l)| l.clone())
            .collect())
    }

    async fn interview_questions(&self, user_id: &str) -> Result<Vec<StoredQuestion>, StoreError> {
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, q)| q.clone())
            .collect())
    }

    async fn commit_turn(
        &self,
        key: &SessionKey,
        state: &ConversationState,
        writes: &[PendingWrite],
    ) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&key.session_id) {
            return Err(StoreError::SessionNotFound(key.session_id));
        }
        let user = key.user_id.clone();
        let now = Utc::now();
        for write in writes {
            match write {
                PendingWrite::ReplaceSessionResults(postings) => {
                    inner
                        .session_results
                        .insert(key.session_id, postings.iter().map(|p| p.id).collect());
                }
                PendingWrite::SaveViewed(posting) => {
                    let seen = inner.viewed.iter().any(|(u, v)| {
                        *u == user && v.title == posting.title && v.company == posting.company
                    });
                    if !seen {
                        inner.viewed.push((
                            user.clone(),
                            ViewedPosting {
                                posting_id: posting.id,
                                title: posting.title.clone(),
                                company: posting.company.clone(),
                                viewed_at: now,
                            },
                        ));
                    }
                }
                PendingWrite::SaveCoverLetter { job_ref, text } => {
                    inner.letters.push((
                        user.clone(),
                        StoredCoverLetter {
                            job_ref: job_ref.clone(),
                            text: text.clone(),
                            created_at: now,
                        },
                    ));
                }
                PendingWrite::AppendInterviewQuestion { question, mode } => {
                    inner.questions.push((
                        user.clone(),
                        StoredQuestion {
                            question: question.clone(),
                            mode: mode.as_str().to_string(),
                            created_at: now,
                        },
                    ));
                }
            }
        }
        inner
            .sessions
            .insert(key.session_id, (user, state.clone()));
        Ok(())
    }
}
