use serde::{Deserialize, Serialize};

use crate::models::job::JobPosting;

/// Listing page size for search results and "show more".
pub const PAGE_SIZE: usize = 10;

/// Top-level task flow chosen for a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopIntent {
    JobSearch,
    CoverLetter,
    Interview,
    #[default]
    Unknown,
}

/// Interview sub-flow. `None -> {Behavioral, Technical} -> Ended`; a new
/// interview request after `Ended` starts again from `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewMode {
    #[default]
    None,
    Behavioral,
    Technical,
    Ended,
}

impl InterviewMode {
    pub fn is_open(self) -> bool {
        matches!(self, InterviewMode::Behavioral | InterviewMode::Technical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterviewMode::None => "none",
            InterviewMode::Behavioral => "behavioral",
            InterviewMode::Technical => "technical",
            InterviewMode::Ended => "ended",
        }
    }
}

/// Per-session dialogue state. Persisted as JSON after every committed turn and
/// reset only when a new session starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    pub user_input: String,
    pub top_intent: TopIntent,
    pub job_search_active: bool,
    /// 1-based ordinal into `last_search_results`. Only positive values are stored.
    pub selected_job_ordinal: Option<u32>,
    pub last_search_results: Vec<JobPosting>,
    /// Number of results from `last_search_results` already shown.
    pub result_cursor: usize,
    pub cover_letter_text: Option<String>,
    pub cover_letter_saved: bool,
    pub interview_mode: Option<InterviewMode>,
    pub interview_active: bool,
    pub prior_interview_questions: Vec<String>,
    /// Job description supplied while drafting a letter without a search.
    pub pending_job: Option<String>,
    /// Experience supplied before the letter could be generated.
    pub pending_experience: Option<String>,
}

impl ConversationState {
    /// True when an interview sub-flow is open and must capture the turn.
    pub fn interview_is_sticky(&self) -> bool {
        self.interview_active && self.interview_mode.is_some_and(InterviewMode::is_open)
    }

    pub fn has_more_results(&self) -> bool {
        self.result_cursor < self.last_search_results.len()
    }
}

/// Reference to a job posting number extracted from an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalRef {
    /// An explicit posting number.
    Explicit(u32),
    /// "this posting": reuse the current selection.
    Current,
    /// No posting referenced.
    Absent,
}

impl OrdinalRef {
    /// Decodes the classifier convention: positive = explicit, 0 = current, else absent.
    pub fn from_raw(raw: i64) -> OrdinalRef {
        match raw {
            0 => OrdinalRef::Current,
            n if n > 0 => u32::try_from(n)
                .map(OrdinalRef::Explicit)
                .unwrap_or(OrdinalRef::Absent),
            _ => OrdinalRef::Absent,
        }
    }

    /// Applies this reference to the current selection.
    pub fn resolve(self, selected: Option<u32>) -> Option<u32> {
        match self {
            OrdinalRef::Explicit(n) => Some(n),
            OrdinalRef::Current | OrdinalRef::Absent => selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state = ConversationState::default();
        assert_eq!(state.top_intent, TopIntent::Unknown);
        assert!(!state.job_search_active);
        assert!(state.selected_job_ordinal.is_none());
        assert_eq!(state.result_cursor, 0);
        assert!(!state.interview_is_sticky());
    }

    #[test]
    fn test_sticky_only_for_open_sub_flow() {
        let mut state = ConversationState {
            interview_active: true,
            interview_mode: Some(InterviewMode::Technical),
            ..ConversationState::default()
        };
        assert!(state.interview_is_sticky());

        state.interview_mode = Some(InterviewMode::Ended);
        assert!(!state.interview_is_sticky());

        state.interview_mode = Some(InterviewMode::Behavioral);
        state.interview_active = false;
        assert!(!state.interview_is_sticky());
    }

    #[test]
    fn test_ordinal_ref_decoding() {
        assert_eq!(OrdinalRef::from_raw(3), OrdinalRef::Explicit(3));
        assert_eq!(OrdinalRef::from_raw(0), OrdinalRef::Current);
        assert_eq!(OrdinalRef::from_raw(-1), OrdinalRef::Absent);
        assert_eq!(OrdinalRef::from_raw(-7), OrdinalRef::Absent);
    }

    #[test]
    fn test_ordinal_ref_resolution() {
        assert_eq!(OrdinalRef::Explicit(5).resolve(Some(3)), Some(5));
        assert_eq!(OrdinalRef::Current.resolve(Some(3)), Some(3));
        assert_eq!(OrdinalRef::Absent.resolve(None), None);
    }

    #[test]
    fn test_state_deserializes_from_partial_json() {
        let state: ConversationState =
            serde_json::from_str(r#"{"top_intent": "INTERVIEW", "interview_mode": "TECHNICAL"}"#)
                .unwrap();
        assert_eq!(state.top_intent, TopIntent::Interview);
        assert_eq!(state.interview_mode, Some(InterviewMode::Technical));
        assert!(state.last_search_results.is_empty());
    }
}
