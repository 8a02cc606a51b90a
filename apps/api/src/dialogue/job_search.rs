use tracing::info;

use crate::assistant::classifier::classify_as;
use crate::assistant::generator::{TemplateId, TemplateVars};
use crate::assistant::labels::{DetailScope, JobSearchRoute, KeywordList, KeywordPresence, Label};
use crate::dialogue::orchestrator::{Branch, BranchReply, Orchestrator, TurnError};
use crate::dialogue::responses;
use crate::models::conversation::{ConversationState, OrdinalRef, PAGE_SIZE};
use crate::models::job::{JobField, JobPosting};
use crate::store::{PendingWrite, SessionKey};

const MISSING_FIELD: &str = "정보 없음";

impl Orchestrator {
    pub(super) async fn job_search(
        &self,
        key: &SessionKey,
        state: ConversationState,
    ) -> Result<Branch, TurnError> {
        let (route, classification) =
            classify_as::<JobSearchRoute>(self.classifier.as_ref(), &state.user_input).await?;
        info!(session_id = %key.session_id, route = ?route, "job search route");

        match route {
            JobSearchRoute::ProvideListings => self.provide_listings(state).await,
            JobSearchRoute::ProvideMore => Ok(provide_more(state).into()),
            JobSearchRoute::DetailRequest => {
                let ordinal = OrdinalRef::from_raw(classification.ordinal());
                self.detail_request(key, state, ordinal).await
            }
            JobSearchRoute::Unrelated => Ok(Branch::Unrelated),
            JobSearchRoute::Unrecognized => Err(unrecognized::<JobSearchRoute>()),
        }
    }

    async fn provide_listings(&self, mut state: ConversationState) -> Result<Branch, TurnError> {
        let classifier = self.classifier.as_ref();
        let ((presence, _), (list, extraction)) = tokio::try_join!(
            classify_as::<KeywordPresence>(classifier, &state.user_input),
            classify_as::<KeywordList>(classifier, &state.user_input),
        )?;

        match presence {
            KeywordPresence::Include => {}
            KeywordPresence::NotInclude => return Ok(BranchReply::new(state, responses::ASK_ROLE).into()),
            KeywordPresence::Unrecognized => return Err(unrecognized::<KeywordPresence>()),
        }
        let keywords = match list {
            KeywordList::Found => extraction.string_list("keywords"),
            KeywordList::None => Vec::new(),
            KeywordList::Unrecognized => return Err(unrecognized::<KeywordList>()),
        };
        if keywords.is_empty() {
            return Ok(BranchReply::new(state, responses::ASK_ROLE).into());
        }

        let results = self.jobs.search(&keywords).await?;
        info!(keywords = ?keywords, results = results.len(), "job search ran");
        if results.is_empty() {
            return Ok(BranchReply::new(state, responses::NO_MATCHING_POSTINGS).into());
        }

        let shown = results.len().min(PAGE_SIZE);
        let response = responses::render_listing(&results[..shown], 1, shown < results.len());
        state.job_search_active = true;
        state.selected_job_ordinal = None;
        state.pending_experience = None;
        state.result_cursor = shown;
        state.last_search_results = results.clone();
        Ok(BranchReply::new(state, response)
            .write(PendingWrite::ReplaceSessionResults(results))
            .into())
    }

    async fn detail_request(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
        ordinal: OrdinalRef,
    ) -> Result<Branch, TurnError> {
        let Some(ordinal) = ordinal.resolve(state.selected_job_ordinal) else {
            return Ok(BranchReply::new(state, responses::ASK_DETAIL_ORDINAL).into());
        };

        let ((scope, fields), posting) = tokio::try_join!(
            async {
                classify_as::<DetailScope>(self.classifier.as_ref(), &state.user_input)
                    .await
                    .map_err(TurnError::from)
            },
            async {
                self.jobs
                    .get_by_ordinal(key.session_id, ordinal)
                    .await
                    .map_err(TurnError::from)
            },
        )?;
        let Some(posting) = posting else {
            return Ok(BranchReply::new(state, responses::DETAIL_NOT_FOUND).into());
        };

        let requested = match scope {
            DetailScope::All => JobField::ALL.to_vec(),
            DetailScope::Selected => selected_fields(&fields.string_list("fields")),
            DetailScope::Unrecognized => return Err(unrecognized::<DetailScope>()),
        };

        let vars = TemplateVars::from([("extracted_info", describe_fields(&posting, &requested))]);
        let summary = self.generator.generate(TemplateId::DetailSummary, &vars).await?;
        info!(session_id = %key.session_id, ordinal, fields = requested.len(), "posting details shown");

        state.selected_job_ordinal = Some(ordinal);
        state.job_search_active = true;
        Ok(
            BranchReply::new(state, responses::with_trailer(&summary, responses::DETAIL_TRAILER))
                .write(PendingWrite::SaveViewed(posting))
                .into(),
        )
    }
}

/// Next page of the stored results, numbered from the cursor.
fn provide_more(mut state: ConversationState) -> BranchReply {
    if state.last_search_results.is_empty() {
        return BranchReply::new(state, responses::NO_PREVIOUS_SEARCH);
    }
    if !state.has_more_results() {
        return BranchReply::new(state, responses::NO_MORE_POSTINGS);
    }
    let start = state.result_cursor;
    let end = (start + PAGE_SIZE).min(state.last_search_results.len());
    let response = responses::render_listing(
        &state.last_search_results[start..end],
        start + 1,
        end < state.last_search_results.len(),
    );
    state.result_cursor = end;
    BranchReply::new(state, response)
}

/// Fields named by the classifier, in canonical order. Nothing recognisable
/// means the whole posting.
fn selected_fields(raw: &[String]) -> Vec<JobField> {
    let named: Vec<JobField> = raw.iter().filter_map(|r| JobField::parse(r)).collect();
    if named.is_empty() {
        return JobField::ALL.to_vec();
    }
    JobField::ALL
        .into_iter()
        .filter(|f| named.contains(f))
        .collect()
}

fn describe_fields(posting: &JobPosting, fields: &[JobField]) -> String {
    fields
        .iter()
        .map(|f| {
            let value = posting
                .field(*f)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(MISSING_FIELD);
            format!("{}: {}", f.display_name(), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn unrecognized<L: Label>() -> TurnError {
    TurnError::Unrecognized {
        task: L::TASK.name(),
    }
}
