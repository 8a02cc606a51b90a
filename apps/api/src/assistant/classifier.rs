//! Text Classifier: maps an utterance to one label of a fixed set, plus
//! auxiliary extracted fields (keyword lists, ordinals, field names).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::assistant::labels::Label;
use crate::assistant::prompts::{task_instructions, CLASSIFY_PROMPT_TEMPLATE};
use crate::assistant::AssistError;
use crate::llm_client::prompts::CLASSIFIER_SYSTEM;
use crate::llm_client::LlmClient;

/// Sentinel for "no posting number in this utterance".
pub const NO_ORDINAL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifyTask {
    TopIntent,
    JobSearchRoute,
    KeywordPresence,
    KeywordExtraction,
    DetailFields,
    CoverLetterRoute,
    ExperiencePresence,
    JobExperienceMix,
    RefineTargets,
    InterviewRoute,
    InterviewTermination,
    PastedCoverLetter,
}

impl ClassifyTask {
    pub fn name(self) -> &'static str {
        match self {
            ClassifyTask::TopIntent => "top_intent",
            ClassifyTask::JobSearchRoute => "job_search_route",
            ClassifyTask::KeywordPresence => "keyword_presence",
            ClassifyTask::KeywordExtraction => "keyword_extraction",
            ClassifyTask::DetailFields => "detail_fields",
            ClassifyTask::CoverLetterRoute => "cover_letter_route",
            ClassifyTask::ExperiencePresence => "experience_presence",
            ClassifyTask::JobExperienceMix => "job_experience_mix",
            ClassifyTask::RefineTargets => "refine_targets",
            ClassifyTask::InterviewRoute => "interview_route",
            ClassifyTask::InterviewTermination => "interview_termination",
            ClassifyTask::PastedCoverLetter => "pasted_cover_letter",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifyRequest<'a> {
    pub task: ClassifyTask,
    pub text: &'a str,
    pub labels: Vec<&'static str>,
}

/// Raw classifier output. `label` is still a provider string here; callers go
/// through [`classify_as`] to get a typed label.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Classification {
    pub label: String,
    #[serde(default)]
    pub extracted: Map<String, Value>,
}

impl Classification {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            extracted: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.extracted.insert(key.to_string(), value);
        self
    }

    /// `extracted.ordinal` as an integer; [`NO_ORDINAL`] when absent or unparsable.
    pub fn ordinal(&self) -> i64 {
        match self.extracted.get("ordinal") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(NO_ORDINAL),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(NO_ORDINAL),
            _ => NO_ORDINAL,
        }
    }

    /// A list of strings, accepting either a JSON array or a comma-separated string.
    /// Blank entries are dropped.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        let items: Vec<String> = match self.extracted.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extracted
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Classification, AssistError>;
}

/// Classifies `text` for the task bound to `L` and decodes the label.
pub async fn classify_as<L: Label>(
    classifier: &dyn Classifier,
    text: &str,
) -> Result<(L, Classification), AssistError> {
    let request = ClassifyRequest {
        task: L::TASK,
        text,
        labels: L::wire_labels(),
    };
    let classification = classifier.classify(request).await?;
    let label = L::decode(&classification.label);
    debug!(
        task = L::TASK.name(),
        raw_label = %classification.label,
        decoded = ?label,
        extracted = ?classification.extracted,
        "utterance classified"
    );
    Ok((label, classification))
}

/// Classifier backed by the shared [`LlmClient`].
pub struct LlmClassifier {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmClassifier {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Classification, AssistError> {
        let task = request.task.name();
        let prompt = build_classify_prompt(&request);

        let call = self.llm.call_json::<Classification>(&prompt, CLASSIFIER_SYSTEM);
        let classification = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AssistError::Timeout {
                task,
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| AssistError::Provider { task, source })?;

        if classification.label.trim().is_empty() {
            return Err(AssistError::Malformed {
                task,
                detail: "empty label".to_string(),
            });
        }
        Ok(classification)
    }
}

fn build_classify_prompt(request: &ClassifyRequest<'_>) -> String {
    CLASSIFY_PROMPT_TEMPLATE
        .replace("{instructions}", task_instructions(request.task))
        .replace("{labels}", &request.labels.join(", "))
        .replace("{user_input}", request.text)
}
