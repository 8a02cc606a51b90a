use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::assistant::classifier::{classify_as, Classifier};
use crate::assistant::generator::Generator;
use crate::assistant::AssistError;
use crate::dialogue::responses;
use crate::models::conversation::{ConversationState, TopIntent};
use crate::models::cover_letter::LetterShapeError;
use crate::store::{ConversationMemory, JobRepository, PendingWrite, SessionKey, StoreError};

/// Why a turn could not be completed. Every variant leaves the session untouched.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Assist(#[from] AssistError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{task} returned a label outside its label set")]
    Unrecognized { task: &'static str },

    #[error("generated cover letter kept the wrong shape: {0}")]
    LetterShape(#[from] LetterShapeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// A branch ran to completion; state and writes are committed.
    Completed,
    /// Nothing in the turn mapped to a supported task; only `user_input` moves
    /// and `top_intent` reads `Unknown`.
    Unrelated,
    /// A classifier, generator or read failed; nothing is committed.
    Failed,
}

impl TurnStatus {
    pub fn commits(self) -> bool {
        !matches!(self, TurnStatus::Failed)
    }
}

#[derive(Debug)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub response: String,
    pub writes: Vec<PendingWrite>,
    pub status: TurnStatus,
}

/// Result of one branch handler.
#[derive(Debug)]
pub(super) enum Branch {
    Done(BranchReply),
    Unrelated,
}

#[derive(Debug)]
pub(super) struct BranchReply {
    pub state: ConversationState,
    pub response: String,
    pub writes: Vec<PendingWrite>,
}

impl BranchReply {
    pub fn new(state: ConversationState, response: impl Into<String>) -> Self {
        Self {
            state,
            response: response.into(),
            writes: Vec::new(),
        }
    }

    pub fn write(mut self, write: PendingWrite) -> Self {
        self.writes.push(write);
        self
    }
}

impl From<BranchReply> for Branch {
    fn from(reply: BranchReply) -> Self {
        Branch::Done(reply)
    }
}

/// Routes one utterance through intent classification and the matching task
/// branch. Holds no per-session data; everything comes in through the state.
#[derive(Clone)]
pub struct Orchestrator {
    pub(super) classifier: Arc<dyn Classifier>,
    pub(super) generator: Arc<dyn Generator>,
    pub(super) jobs: Arc<dyn JobRepository>,
    pub(super) memory: Arc<dyn ConversationMemory>,
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        generator: Arc<dyn Generator>,
        jobs: Arc<dyn JobRepository>,
        memory: Arc<dyn ConversationMemory>,
    ) -> Self {
        Self {
            classifier,
            generator,
            jobs,
            memory,
        }
    }

    /// Runs one turn against `prior`. The returned state and writes are only
    /// meant to be persisted when the status commits.
    pub async fn handle_turn(
        &self,
        key: &SessionKey,
        prior: ConversationState,
        utterance: &str,
    ) -> TurnOutcome {
        let mut working = prior.clone();
        working.user_input = utterance.to_string();

        // An open interview captures the turn; its own termination check decides
        // whether it ends.
        let intent = if working.interview_is_sticky() {
            TopIntent::Interview
        } else {
            match classify_as::<TopIntent>(self.classifier.as_ref(), utterance).await {
                Ok((intent, _)) => intent,
                Err(err) => {
                    error!(session_id = %key.session_id, error = %err, "intent classification failed");
                    return TurnOutcome::failed(prior, responses::TURN_FAILED);
                }
            }
        };
        working.top_intent = intent;
        info!(session_id = %key.session_id, intent = ?intent, "turn routed");

        let branch = match intent {
            TopIntent::JobSearch => self.job_search(key, working).await,
            TopIntent::CoverLetter => self.cover_letter(key, working).await,
            TopIntent::Interview => self.interview(key, working).await,
            TopIntent::Unknown => Ok(Branch::Unrelated),
        };

        match branch {
            Ok(Branch::Done(reply)) => TurnOutcome {
                state: reply.state,
                response: reply.response,
                writes: reply.writes,
                status: TurnStatus::Completed,
            },
            Ok(Branch::Unrelated) => {
                let mut state = prior;
                state.user_input = utterance.to_string();
                state.top_intent = TopIntent::Unknown;
                TurnOutcome {
                    state,
                    response: responses::APOLOGY.to_string(),
                    writes: Vec::new(),
                    status: TurnStatus::Unrelated,
                }
            }
            Err(err) => {
                error!(session_id = %key.session_id, intent = ?intent, error = %err, "turn failed");
                TurnOutcome::failed(prior, responses::COULD_NOT_PROCESS)
            }
        }
    }
}

impl TurnOutcome {
    fn failed(prior: ConversationState, response: &str) -> Self {
        Self {
            state: prior,
            response: response.to_string(),
            writes: Vec::new(),
            status: TurnStatus::Failed,
        }
    }
}
