// Language-model adapters used by the dialogue orchestrator.
// Classification labels are decoded into closed enums here, so nothing
// downstream matches on raw provider strings.

pub mod classifier;
pub mod generator;
pub mod labels;
pub mod prompts;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Failure of a single classifier or generator call.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("{task} call failed: {source}")]
    Provider {
        task: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("{task} call timed out after {secs}s")]
    Timeout { task: &'static str, secs: u64 },

    #[error("malformed {task} output: {detail}")]
    Malformed { task: &'static str, detail: String },
}
