//! Postgres-backed repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::models::conversation::{ConversationState, InterviewMode};
use crate::models::job::{JobPosting, JobPostingRow};
use crate::store::{
    ConversationMemory, JobRepository, PendingWrite, SessionKey, SessionRecord, StoreError,
    StoredCoverLetter, StoredQuestion, ViewedPosting,
};

const SUMMARY_COLUMNS: &str =
    "id, title, company, skills, location, employment_terms, application_window, link";

#[derive(Debug, FromRow)]
struct JobSummaryRow {
    id: i64,
    title: String,
    company: String,
    skills: String,
    location: String,
    employment_terms: String,
    application_window: String,
    link: String,
}

impl From<JobSummaryRow> for JobPosting {
    fn from(row: JobSummaryRow) -> Self {
        JobPosting {
            id: row.id,
            title: row.title,
            company: row.company,
            skills: row.skills,
            location: row.location,
            employment_terms: row.employment_terms,
            application_window: row.application_window,
            link: row.link,
            details: None,
        }
    }
}

#[derive(Debug, FromRow)]
struct CoverLetterRow {
    job_ref: Option<String>,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CoverLetterRow> for StoredCoverLetter {
    fn from(row: CoverLetterRow) -> Self {
        StoredCoverLetter {
            job_ref: row.job_ref,
            text: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    question: String,
    mode: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ViewedRow {
    posting_id: i64,
    title: String,
    company: String,
    viewed_at: DateTime<Utc>,
}

/// Single store over one pool; implements both repository traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `LIKE` metacharacters so keywords match literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn build_search_query(keywords: &[String]) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM job_postings WHERE "));
    for (i, keyword) in keywords.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        let pattern = like_pattern(keyword);
        query.push("(title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR skills ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    query.push(" ORDER BY id");
    query
}

#[async_trait]
impl JobRepository for PgStore {
    async fn search(&self, keywords: &[String]) -> Result<Vec<JobPosting>, StoreError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let rows = build_search_query(keywords)
            .build_query_as::<JobSummaryRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(JobPosting::from).collect())
    }

    async fn get_by_ordinal(
        &self,
        session_id: Uuid,
        ordinal: u32,
    ) -> Result<Option<JobPosting>, StoreError> {
        let row = sqlx::query_as::<_, JobPostingRow>(
            r#"
            SELECT p.id, p.title, p.company, p.skills, p.location, p.employment_terms,
                   p.application_window, p.link, p.responsibilities, p.qualifications,
                   p.preferences, p.benefits, p.hiring_process, p.education,
                   p.location_detail, p.deadline
            FROM session_job_results r
            JOIN job_postings p ON p.id = r.posting_id
            WHERE r.session_id = $1 AND r.ordinal = $2
            "#,
        )
        .bind(session_id)
        .bind(ordinal as i32)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobPostingRow::into_detailed))
    }

    async fn viewed_postings(&self, user_id: &str) -> Result<Vec<ViewedPosting>, StoreError> {
        let rows = sqlx::query_as::<_, ViewedRow>(
            "SELECT posting_id, title, company, viewed_at FROM viewed_job_postings \
             WHERE user_id = $1 ORDER BY viewed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ViewedPosting {
                posting_id: r.posting_id,
                title: r.title,
                company: r.company,
                viewed_at: r.viewed_at,
            })
            .collect())
    }
}

#[async_trait]
impl ConversationMemory for PgStore {
    async fn start_session(&self, user_id: &str) -> Result<Uuid, StoreError> {
        let session_id = Uuid::new_v4();
        sqlx::query("INSERT INTO chat_sessions (session_id, user_id, state) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(Json(ConversationState::default()))
            .execute(&self.pool)
            .await?;
        debug!(%session_id, "session row inserted");
        Ok(session_id)
    }

    async fn load(&self, session_id: Uuid) -> Result<SessionRecord, StoreError> {
        let row: Option<(String, Json<ConversationState>)> =
            sqlx::query_as("SELECT user_id, state FROM chat_sessions WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        let (user_id, Json(state)) = row.ok_or(StoreError::SessionNotFound(session_id))?;
        Ok(SessionRecord {
            key: SessionKey {
                session_id,
                user_id,
            },
            state,
        })
    }

    async fn latest_cover_letter(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredCoverLetter>, StoreError> {
        let row = sqlx::query_as::<_, CoverLetterRow>(
            "SELECT job_ref, body, created_at FROM cover_letters \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredCoverLetter::from))
    }

    async fn cover_letters(&self, user_id: &str) -> Result<Vec<StoredCoverLetter>, StoreError> {
        let rows = sqlx::query_as::<_, CoverLetterRow>(
            "SELECT job_ref, body, created_at FROM cover_letters \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StoredCoverLetter::from).collect())
    }

    async fn interview_questions(&self, user_id: &str) -> Result<Vec<StoredQuestion>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT question, mode, created_at FROM interview_questions \
             WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| StoredQuestion {
                question: r.question,
                mode: r.mode,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn commit_turn(
        &self,
        key: &SessionKey,
        state: &ConversationState,
        writes: &[PendingWrite],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            match write {
                PendingWrite::ReplaceSessionResults(postings) => {
                    replace_session_results(&mut *tx, key.session_id, postings).await?
                }
                PendingWrite::SaveViewed(posting) => {
                    save_viewed(&mut *tx, &key.user_id, posting).await?
                }
                PendingWrite::SaveCoverLetter { job_ref, text } => {
                    save_cover_letter(&mut *tx, &key.user_id, job_ref.as_deref(), text).await?
                }
                PendingWrite::AppendInterviewQuestion { question, mode } => {
                    append_interview_question(&mut *tx, key, question, *mode).await?
                }
            }
        }
        save_state(&mut *tx, key.session_id, state).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Delete-then-insert of the session's ordinal list. Runs inside the turn's
/// transaction, so readers never see the empty intermediate state.
async fn replace_session_results(
    conn: &mut PgConnection,
    session_id: Uuid,
    postings: &[JobPosting],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM session_job_results WHERE session_id = $1")
        .bind(session_id)
        .execute(&mut *conn)
        .await?;

    if postings.is_empty() {
        return Ok(());
    }

    let mut insert =
        QueryBuilder::<Postgres>::new("INSERT INTO session_job_results (session_id, ordinal, posting_id) ");
    insert.push_values(postings.iter().enumerate(), |mut row, (i, posting)| {
        row.push_bind(session_id)
            .push_bind(i as i32 + 1)
            .push_bind(posting.id);
    });
    insert.build().execute(&mut *conn).await?;
    Ok(())
}

async fn save_viewed(
    conn: &mut PgConnection,
    user_id: &str,
    posting: &JobPosting,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO viewed_job_postings (user_id, posting_id, title, company)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, title, company) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(posting.id)
    .bind(&posting.title)
    .bind(&posting.company)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_cover_letter(
    conn: &mut PgConnection,
    user_id: &str,
    job_ref: Option<&str>,
    text: &str,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO cover_letters (user_id, job_ref, body) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(job_ref)
        .bind(text)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn append_interview_question(
    conn: &mut PgConnection,
    key: &SessionKey,
    question: &str,
    mode: InterviewMode,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO interview_questions (user_id, session_id, question, mode) VALUES ($1, $2, $3, $4)",
    )
    .bind(&key.user_id)
    .bind(key.session_id)
    .bind(question)
    .bind(mode.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_state(
    conn: &mut PgConnection,
    session_id: Uuid,
    state: &ConversationState,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE chat_sessions SET state = $2, updated_at = now() WHERE session_id = $1",
    )
    .bind(session_id)
    .bind(Json(state))
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::SessionNotFound(session_id));
    }
    Ok(())
}
