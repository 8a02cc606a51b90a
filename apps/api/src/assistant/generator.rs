//! Generator: fills a named template with variables and asks the model for text.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::assistant::prompts::template_text;
use crate::assistant::AssistError;
use crate::llm_client::prompts::{GENERATOR_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Natural-language restatement of requested posting fields.
    DetailSummary,
    /// Four-section letter grounded in a selected posting.
    CoverLetterForPosting,
    /// Four-section letter from a free-text job and experience description.
    CoverLetterFreeform,
    /// Revision of an existing letter.
    CoverLetterRefine,
    BehavioralQuestion,
    TechnicalQuestion,
}

impl TemplateId {
    pub fn name(self) -> &'static str {
        match self {
            TemplateId::DetailSummary => "detail_summary",
            TemplateId::CoverLetterForPosting => "cover_letter_for_posting",
            TemplateId::CoverLetterFreeform => "cover_letter_freeform",
            TemplateId::CoverLetterRefine => "cover_letter_refine",
            TemplateId::BehavioralQuestion => "behavioral_question",
            TemplateId::TechnicalQuestion => "technical_question",
        }
    }

    /// Variables the template requires.
    pub fn variables(self) -> &'static [&'static str] {
        match self {
            TemplateId::DetailSummary => &["extracted_info"],
            TemplateId::CoverLetterForPosting => &[
                "job_name",
                "tech_stack",
                "job_desc",
                "requirements",
                "preferences",
                "experience",
            ],
            TemplateId::CoverLetterFreeform => &["job_description", "experience"],
            TemplateId::CoverLetterRefine => &["previous_letter", "request"],
            TemplateId::BehavioralQuestion => &["answer", "history"],
            TemplateId::TechnicalQuestion => &["answer", "history", "cover_letter", "postings"],
        }
    }
}

pub type TemplateVars = BTreeMap<&'static str, String>;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, template: TemplateId, vars: &TemplateVars)
        -> Result<String, AssistError>;
}

/// Substitutes `{name}` placeholders. Every declared variable must be supplied.
pub fn render_template(template: TemplateId, vars: &TemplateVars) -> Result<String, AssistError> {
    let mut text = template_text(template).replace("{no_invention}", NO_INVENTION_INSTRUCTION);
    for name in template.variables() {
        let value = vars.get(name).ok_or_else(|| AssistError::Malformed {
            task: template.name(),
            detail: format!("missing template variable `{name}`"),
        })?;
        text = text.replace(&format!("{{{name}}}"), value);
    }
    Ok(text)
}

/// Generator backed by the shared [`LlmClient`].
pub struct LlmGenerator {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmGenerator {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(
        &self,
        template: TemplateId,
        vars: &TemplateVars,
    ) -> Result<String, AssistError> {
        let task = template.name();
        let prompt = render_template(template, vars)?;

        tokio::time::timeout(self.timeout, self.llm.complete(&prompt, GENERATOR_SYSTEM))
            .await
            .map_err(|_| AssistError::Timeout {
                task,
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| AssistError::Provider { task, source })
    }
}
