//! Persistence seams for the dialogue core.
//!
//! Branch handlers only read through these traits. Writes are collected as
//! [`PendingWrite`]s and applied with the new state in one transaction by
//! [`ConversationMemory::commit_turn`], so a failed turn leaves nothing behind.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::conversation::{ConversationState, InterviewMode};
use crate::models::job::JobPosting;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),
}

/// Identifies the session a turn runs in and the user who owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub session_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub key: SessionKey,
    pub state: ConversationState,
}

/// A write produced by a turn, applied only when the whole turn commits.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Replaces the session's ordinal list wholesale (ordinal = index + 1).
    ReplaceSessionResults(Vec<JobPosting>),
    /// Idempotent on (user, title, company).
    SaveViewed(JobPosting),
    SaveCoverLetter {
        job_ref: Option<String>,
        text: String,
    },
    AppendInterviewQuestion {
        question: String,
        mode: InterviewMode,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredCoverLetter {
    pub job_ref: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredQuestion {
    pub question: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewedPosting {
    pub posting_id: i64,
    pub title: String,
    pub company: String,
    pub viewed_at: DateTime<Utc>,
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Postings whose title or skills contain any keyword, case-insensitively.
    /// An empty keyword list matches nothing.
    async fn search(&self, keywords: &[String]) -> Result<Vec<JobPosting>, StoreError>;

    /// Posting at `ordinal` in the session's latest results, with details loaded.
    async fn get_by_ordinal(
        &self,
        session_id: Uuid,
        ordinal: u32,
    ) -> Result<Option<JobPosting>, StoreError>;

    async fn viewed_postings(&self, user_id: &str) -> Result<Vec<ViewedPosting>, StoreError>;
}

#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Opens a new session with a default state.
    async fn start_session(&self, user_id: &str) -> Result<Uuid, StoreError>;

    async fn load(&self, session_id: Uuid) -> Result<SessionRecord, StoreError>;

    async fn latest_cover_letter(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredCoverLetter>, StoreError>;

    async fn cover_letters(&self, user_id: &str) -> Result<Vec<StoredCoverLetter>, StoreError>;

    async fn interview_questions(&self, user_id: &str) -> Result<Vec<StoredQuestion>, StoreError>;

    /// Applies `writes` in order, then saves `state`. All or nothing.
    async fn commit_turn(
        &self,
        key: &SessionKey,
        state: &ConversationState,
        writes: &[PendingWrite],
    ) -> Result<(), StoreError>;
}
