use tracing::info;

use crate::assistant::classifier::classify_as;
use crate::assistant::generator::{TemplateId, TemplateVars};
use crate::assistant::labels::{InterviewRoute, PastedLetter, Termination};
use crate::dialogue::job_search::unrecognized;
use crate::dialogue::orchestrator::{Branch, BranchReply, Orchestrator, TurnError};
use crate::dialogue::responses;
use crate::models::conversation::{ConversationState, InterviewMode};
use crate::store::{PendingWrite, SessionKey};

/// `job_ref` recorded for a letter pasted into the chat.
pub const SELF_PROVIDED_LETTER: &str = "self-provided";

const NO_HISTORY: &str = "(없음)";

impl Orchestrator {
    pub(super) async fn interview(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
    ) -> Result<Branch, TurnError> {
        if let Some(mode) = state.interview_mode.filter(|_| state.interview_is_sticky()) {
            let (termination, _) =
                classify_as::<Termination>(self.classifier.as_ref(), &state.user_input).await?;
            return match termination {
                Termination::End => Ok(end_interview(state).into()),
                Termination::Continue => self.next_question(key, state, mode, Vec::new()).await,
                Termination::Unrecognized => Err(unrecognized::<Termination>()),
            };
        }

        let (route, _) =
            classify_as::<InterviewRoute>(self.classifier.as_ref(), &state.user_input).await?;
        info!(session_id = %key.session_id, route = ?route, "interview route");
        if state.interview_mode == Some(InterviewMode::Ended) {
            state.interview_mode = Some(InterviewMode::None);
        }

        match route {
            InterviewRoute::Behavioral => {
                self.open(key, state, InterviewMode::Behavioral, Vec::new())
                    .await
            }
            InterviewRoute::Technical => self.open_technical(key, state).await,
            InterviewRoute::End => Ok(end_interview(state).into()),
            InterviewRoute::Simple => {
                state.interview_mode.get_or_insert(InterviewMode::None);
                Ok(BranchReply::new(state, responses::CHOOSE_INTERVIEW_TYPE).into())
            }
            InterviewRoute::Unrelated => Ok(Branch::Unrelated),
            InterviewRoute::Unrecognized => Err(unrecognized::<InterviewRoute>()),
        }
    }

    /// Starts a technical interview, taking a pasted letter when none is saved.
    async fn open_technical(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
    ) -> Result<Branch, TurnError> {
        if self.saved_letter(key, &state).await?.is_some() {
            return self
                .open(key, state, InterviewMode::Technical, Vec::new())
                .await;
        }

        let (pasted, extraction) =
            classify_as::<PastedLetter>(self.classifier.as_ref(), &state.user_input).await?;
        let letter = match pasted {
            PastedLetter::Found => extraction
                .text("cover_letter")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            PastedLetter::Absent => None,
            PastedLetter::Unrecognized => return Err(unrecognized::<PastedLetter>()),
        };
        let Some(letter) = letter else {
            return Ok(letter_required(state).into());
        };

        info!(session_id = %key.session_id, "pasted cover letter saved for technical interview");
        state.cover_letter_text = Some(letter.clone());
        state.cover_letter_saved = true;
        let write = PendingWrite::SaveCoverLetter {
            job_ref: Some(SELF_PROVIDED_LETTER.to_string()),
            text: letter,
        };
        self.open(key, state, InterviewMode::Technical, vec![write])
            .await
    }

    async fn open(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
        mode: InterviewMode,
        writes: Vec<PendingWrite>,
    ) -> Result<Branch, TurnError> {
        state.interview_mode = Some(mode);
        state.interview_active = true;
        self.next_question(key, state, mode, writes).await
    }

    /// Asks exactly one question in `mode` and records it.
    async fn next_question(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
        mode: InterviewMode,
        mut writes: Vec<PendingWrite>,
    ) -> Result<Branch, TurnError> {
        let history = if state.prior_interview_questions.is_empty() {
            NO_HISTORY.to_string()
        } else {
            state.prior_interview_questions.join("\n")
        };
        let mut vars = TemplateVars::from([
            ("answer", state.user_input.clone()),
            ("history", history),
        ]);

        let template = if mode == InterviewMode::Technical {
            let letter = match state.cover_letter_text.clone() {
                Some(text) if state.cover_letter_saved => Some(text),
                _ => self.saved_letter(key, &state).await?,
            };
            let Some(letter) = letter else {
                return Ok(letter_required(state).into());
            };
            vars.insert("cover_letter", letter);
            vars.insert("postings", surfaced_postings(&state));
            TemplateId::TechnicalQuestion
        } else {
            TemplateId::BehavioralQuestion
        };

        let raw = self.generator.generate(template, &vars).await?;
        let question = single_question(&raw);
        info!(
            session_id = %key.session_id,
            mode = mode.as_str(),
            asked = state.prior_interview_questions.len() + 1,
            "interview question generated"
        );

        state.prior_interview_questions.push(question.clone());
        writes.push(PendingWrite::AppendInterviewQuestion {
            question: question.clone(),
            mode,
        });
        let mut reply = BranchReply::new(state, question);
        reply.writes = writes;
        Ok(reply.into())
    }

    /// The user's most recent letter: the persisted one first, then the state copy.
    async fn saved_letter(
        &self,
        key: &SessionKey,
        state: &ConversationState,
    ) -> Result<Option<String>, TurnError> {
        if let Some(stored) = self.memory.latest_cover_letter(&key.user_id).await? {
            return Ok(Some(stored.text));
        }
        Ok(state
            .cover_letter_text
            .clone()
            .filter(|_| state.cover_letter_saved))
    }
}

fn end_interview(mut state: ConversationState) -> BranchReply {
    state.interview_mode = Some(InterviewMode::Ended);
    state.interview_active = false;
    BranchReply::new(state, responses::INTERVIEW_CLOSED)
}

fn letter_required(mut state: ConversationState) -> BranchReply {
    state.interview_mode = Some(InterviewMode::Ended);
    state.interview_active = false;
    BranchReply::new(state, responses::COVER_LETTER_REQUIRED)
}

/// Postings the user has already been shown, for grounding technical questions.
fn surfaced_postings(state: &ConversationState) -> String {
    let shown = state.result_cursor.min(state.last_search_results.len());
    if shown == 0 {
        return NO_HISTORY.to_string();
    }
    state.last_search_results[..shown]
        .iter()
        .map(|p| format!("- {} ({}): {}", p.title, p.company, p.skills))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps only the first question when the model asked several.
fn single_question(raw: &str) -> String {
    let text = raw.trim().trim_matches('"').trim();
    let Some(index) = text.find(['?', '？']) else {
        return text.to_string();
    };
    let end = index + text[index..].chars().next().map_or(1, char::len_utf8);
    if text[end..].contains(['?', '？']) {
        text[..end].to_string()
    } else {
        text.to_string()
    }
}
