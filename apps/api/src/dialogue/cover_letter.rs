use tracing::{info, warn};

use crate::assistant::classifier::classify_as;
use crate::assistant::generator::{TemplateId, TemplateVars};
use crate::assistant::labels::{CoverLetterRoute, ExperiencePresence, JobExperienceMix, RefineScope};
use crate::dialogue::job_search::unrecognized;
use crate::dialogue::orchestrator::{Branch, BranchReply, Orchestrator, TurnError};
use crate::dialogue::responses;
use crate::models::conversation::{ConversationState, OrdinalRef};
use crate::models::cover_letter::{CoverLetter, LetterSection, LetterShapeError};
use crate::store::{PendingWrite, SessionKey};

/// Extra attempts when a generated letter is missing a section.
const MAX_GENERATION_RETRIES: u32 = 2;

impl Orchestrator {
    pub(super) async fn cover_letter(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
    ) -> Result<Branch, TurnError> {
        let (route, classification) =
            classify_as::<CoverLetterRoute>(self.classifier.as_ref(), &state.user_input).await?;
        info!(session_id = %key.session_id, route = ?route, "cover letter route");

        if matches!(route, CoverLetterRoute::Unrelated) {
            return Ok(Branch::Unrelated);
        }
        let requested = OrdinalRef::from_raw(classification.ordinal())
            .resolve(state.selected_job_ordinal);
        if matches!(route, CoverLetterRoute::Write) && state.job_search_active {
            return self.write_for_posting(key, state, requested).await;
        }
        state.selected_job_ordinal = requested;

        match route {
            CoverLetterRoute::Write => self.write_freeform(state).await,
            CoverLetterRoute::Refine => self.refine(key, state).await,
            CoverLetterRoute::Unrelated => Ok(Branch::Unrelated),
            CoverLetterRoute::Unrecognized => Err(unrecognized::<CoverLetterRoute>()),
        }
    }

    async fn write_for_posting(
        &self,
        key: &SessionKey,
        mut state: ConversationState,
        requested: Option<u32>,
    ) -> Result<Branch, TurnError> {
        let experience = append_fragment(state.pending_experience.as_deref(), &state.user_input);
        let Some(ordinal) = requested else {
            state.pending_experience = Some(experience);
            return Ok(BranchReply::new(state, responses::ASK_LETTER_ORDINAL).into());
        };

        let ((presence, _), posting) = tokio::try_join!(
            async {
                classify_as::<ExperiencePresence>(self.classifier.as_ref(), &experience)
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

        // The selection only moves to an ordinal that exists.
        let Some(posting) = posting else {
            return Ok(BranchReply::new(state, responses::POSTING_NOT_FOUND).into());
        };
        state.selected_job_ordinal = Some(ordinal);
        match presence {
            ExperiencePresence::Include => {}
            ExperiencePresence::Exclude => {
                state.pending_experience = None;
                return Ok(BranchReply::new(state, responses::ASK_EXPERIENCE).into());
            }
            ExperiencePresence::Unrecognized => return Err(unrecognized::<ExperiencePresence>()),
        }

        let details = posting.details.clone().unwrap_or_default();
        let vars = TemplateVars::from([
            ("job_name", posting.title.clone()),
            ("tech_stack", posting.skills.clone()),
            ("job_desc", details.responsibilities),
            ("requirements", details.qualifications),
            ("preferences", details.preferences),
            ("experience", experience),
        ]);
        let letter = self
            .generate_letter(TemplateId::CoverLetterForPosting, &vars)
            .await?
            .render();
        info!(session_id = %key.session_id, ordinal, "cover letter written for posting");

        let job_ref = posting.title.clone();
        state.pending_experience = None;
        Ok(self
            .letter_reply(state, letter, Some(job_ref))
            .write(PendingWrite::SaveViewed(posting))
            .into())
    }

    async fn write_freeform(&self, mut state: ConversationState) -> Result<Branch, TurnError> {
        let (mix, _) =
            classify_as::<JobExperienceMix>(self.classifier.as_ref(), &state.user_input).await?;
        if matches!(mix, JobExperienceMix::Unrecognized) {
            return Err(unrecognized::<JobExperienceMix>());
        }
        if mix.has_job() {
            state.pending_job = Some(append_fragment(state.pending_job.as_deref(), &state.user_input));
        }
        if mix.has_experience() && !mix.has_job() {
            state.pending_experience = Some(append_fragment(
                state.pending_experience.as_deref(),
                &state.user_input,
            ));
        }

        // One utterance carrying both parts serves as both.
        let job = state.pending_job.clone();
        let experience = state
            .pending_experience
            .clone()
            .or_else(|| mix.has_experience().then(|| state.user_input.clone()));
        let (job, experience) = match (job, experience) {
            (Some(job), Some(experience)) => (job, experience),
            (None, None) => {
                return Ok(BranchReply::new(state, responses::ASK_JOB_AND_EXPERIENCE).into())
            }
            (None, Some(_)) => return Ok(BranchReply::new(state, responses::ASK_JOB).into()),
            (Some(_), None) => return Ok(BranchReply::new(state, responses::ASK_EXPERIENCE).into()),
        };

        let vars = TemplateVars::from([("job_description", job), ("experience", experience)]);
        let letter = self
            .generate_letter(TemplateId::CoverLetterFreeform, &vars)
            .await?
            .render();
        state.pending_job = None;
        state.pending_experience = None;
        Ok(self.letter_reply(state, letter, None).into())
    }

    async fn refine(&self, key: &SessionKey, state: ConversationState) -> Result<Branch, TurnError> {
        if !state.cover_letter_saved {
            return Ok(BranchReply::new(state, responses::NO_LETTER_TO_REFINE).into());
        }
        let ((scope, targets), latest) = tokio::try_join!(
            async {
                classify_as::<RefineScope>(self.classifier.as_ref(), &state.user_input)
                    .await
                    .map_err(TurnError::from)
            },
            async {
                self.memory
                    .latest_cover_letter(&key.user_id)
                    .await
                    .map_err(TurnError::from)
            },
        )?;

        let (previous, job_ref) = match latest {
            Some(stored) => (stored.text, stored.job_ref),
            None => match state.cover_letter_text.clone() {
                Some(text) => (text, None),
                None => return Ok(BranchReply::new(state, responses::NO_LETTER_TO_REFINE).into()),
            },
        };
        let sections: Vec<LetterSection> = match scope {
            RefineScope::Whole => Vec::new(),
            RefineScope::Sections => {
                let named = targets.string_list("sections");
                let parsed: Vec<LetterSection> =
                    named.iter().filter_map(|raw| LetterSection::parse(raw)).collect();
                // An unreadable target must never widen into a whole-letter rewrite.
                if parsed.is_empty() {
                    warn!(sections = ?named, "refine targets not recognised");
                    return Err(unrecognized::<RefineScope>());
                }
                parsed
            }
            RefineScope::Unrecognized => return Err(unrecognized::<RefineScope>()),
        };

        let vars = TemplateVars::from([
            ("previous_letter", previous.clone()),
            ("request", state.user_input.clone()),
        ]);
        let revised = self.generate_letter(TemplateId::CoverLetterRefine, &vars).await?;
        let letter = match CoverLetter::parse(&previous) {
            Ok(current) => current.refined_with(&revised, &sections),
            Err(err) => {
                warn!(error = %err, "stored letter does not parse; taking the full revision");
                revised
            }
        };
        info!(session_id = %key.session_id, sections = ?sections, "cover letter refined");
        Ok(self.letter_reply(state, letter.render(), job_ref).into())
    }

    /// Generates a letter and retries while it lacks one of the four sections.
    async fn generate_letter(
        &self,
        template: TemplateId,
        vars: &TemplateVars,
    ) -> Result<CoverLetter, TurnError> {
        let mut last_error = LetterShapeError::MissingSections(LetterSection::ALL.to_vec());
        for attempt in 0..=MAX_GENERATION_RETRIES {
            let text = self.generator.generate(template, vars).await?;
            match CoverLetter::parse(&text) {
                Ok(letter) => return Ok(letter),
                Err(err) => {
                    warn!(template = template.name(), attempt, error = %err, "letter shape rejected");
                    last_error = err;
                }
            }
        }
        Err(TurnError::LetterShape(last_error))
    }

    fn letter_reply(
        &self,
        mut state: ConversationState,
        letter: String,
        job_ref: Option<String>,
    ) -> BranchReply {
        state.cover_letter_text = Some(letter.clone());
        state.cover_letter_saved = true;
        let response = responses::with_trailer(&letter, responses::LETTER_TRAILER);
        BranchReply::new(state, response).write(PendingWrite::SaveCoverLetter {
            job_ref,
            text: letter,
        })
    }
}

fn append_fragment(existing: Option<&str>, fragment: &str) -> String {
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{fragment}"),
        _ => fragment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::assistant::classifier::{Classification, ClassifyTask};
    use crate::dialogue::orchestrator::TurnStatus;
    use crate::dialogue::testing::{sample_letter, Fixture, USER};

    fn route_to(fx: &Fixture, route: Classification) {
        fx.classifier
            .push(ClassifyTask::TopIntent, Classification::new("COVER_LETTER"))
            .push(ClassifyTask::CoverLetterRoute, route);
    }

    #[tokio::test]
    async fn test_write_for_current_selection_uses_that_posting() {
        let fx = Fixture::new(5).await;
        let mut prior = fx.searched_state().await;
        prior.selected_job_ordinal = Some(3);
        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(0)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_INCLUDE"));

        let outcome = fx
            .turn(prior, "이 공고로 자소서 써줘. 결제 서버를 Rust로 다시 만든 경험이 있어")
            .await;

        assert_eq!(outcome.status, TurnStatus::Completed);
        let calls = fx.generator.calls_for(TemplateId::CoverLetterForPosting);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["job_name"], "백엔드 개발자 3");
        assert_eq!(calls[0]["job_desc"], "결제 시스템 3 개발");
        assert!(outcome.state.cover_letter_saved);
        assert_eq!(outcome.state.selected_job_ordinal, Some(3));
        assert!(outcome.response.ends_with(responses::LETTER_TRAILER));
        assert!(outcome.writes.iter().any(|w| matches!(
            w,
            PendingWrite::SaveCoverLetter { job_ref: Some(r), .. } if r == "백엔드 개발자 3"
        )));
        assert!(outcome
            .writes
            .iter()
            .any(|w| matches!(w, PendingWrite::SaveViewed(p) if p.id == 3)));
    }

    #[tokio::test]
    async fn test_explicit_ordinal_overrides_selection() {
        let fx = Fixture::new(5).await;
        let mut prior = fx.searched_state().await;
        prior.selected_job_ordinal = Some(1);
        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(3)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_INCLUDE"));

        let outcome = fx
            .turn(prior, "3번 공고로 자기소개서 써줘. SQL 프로젝트 경험이 있어")
            .await;

        assert_eq!(outcome.state.selected_job_ordinal, Some(3));
        assert!(outcome.state.cover_letter_saved);
        let letter = CoverLetter::parse(&outcome.response).expect("four sections");
        assert!(letter.motivation.contains("백엔드 개발자 3"));
    }

    #[tokio::test]
    async fn test_write_without_ordinal_asks_then_keeps_experience() {
        let fx = Fixture::new(5).await;
        let prior = fx.searched_state().await;
        route_to(&fx, Classification::new("WRITE"));

        let first = fx.turn(prior, "Kafka로 로그 파이프라인을 만든 경험이 있어").await;
        assert_eq!(first.response, responses::ASK_LETTER_ORDINAL);
        assert!(first.writes.is_empty());
        assert_eq!(fx.generator.call_count(), 0);

        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(2)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_INCLUDE"));
        let second = fx.turn(first.state, "2번 공고로 써줘").await;

        assert_eq!(second.status, TurnStatus::Completed);
        assert_eq!(
            fx.classifier.texts_for(ClassifyTask::ExperiencePresence),
            vec!["Kafka로 로그 파이프라인을 만든 경험이 있어\n2번 공고로 써줘".to_string()]
        );
        let experience = &fx.generator.calls_for(TemplateId::CoverLetterForPosting)[0]["experience"];
        assert!(experience.contains("Kafka로 로그 파이프라인"));
        assert!(experience.contains("2번 공고로 써줘"));
        assert!(second.state.pending_experience.is_none());
    }

    #[tokio::test]
    async fn test_write_without_experience_asks_for_it() {
        let fx = Fixture::new(5).await;
        let prior = fx.searched_state().await;
        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(1)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_EXCLUDE"));

        let outcome = fx.turn(prior, "1번 공고로 자소서 써줘").await;

        assert_eq!(outcome.response, responses::ASK_EXPERIENCE);
        assert_eq!(outcome.state.selected_job_ordinal, Some(1));
        assert!(outcome.writes.is_empty());
        assert_eq!(fx.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_freeform_collects_job_then_experience() {
        let fx = Fixture::new(0).await;
        route_to(&fx, Classification::new("WRITE"));
        fx.classifier
            .push(ClassifyTask::JobExperienceMix, Classification::new("JOB_INCLUDE"));

        let first = fx.turn(ConversationState::default(), "데이터 엔지니어 자소서 써줘").await;
        assert_eq!(first.response, responses::ASK_EXPERIENCE);
        assert_eq!(first.state.pending_job.as_deref(), Some("데이터 엔지니어 자소서 써줘"));

        route_to(&fx, Classification::new("WRITE"));
        fx.classifier
            .push(ClassifyTask::JobExperienceMix, Classification::new("EXPERIENCE_INCLUDE"));
        let second = fx.turn(first.state, "Spark 배치 작업을 운영했어").await;

        assert_eq!(second.status, TurnStatus::Completed);
        let calls = fx.generator.calls_for(TemplateId::CoverLetterFreeform);
        assert_eq!(calls[0]["job_description"], "데이터 엔지니어 자소서 써줘");
        assert_eq!(calls[0]["experience"], "Spark 배치 작업을 운영했어");
        assert!(second.state.pending_job.is_none());
        assert!(matches!(
            second.writes.as_slice(),
            [PendingWrite::SaveCoverLetter { job_ref: None, .. }]
        ));
    }

    #[tokio::test]
    async fn test_freeform_with_nothing_asks_for_both() {
        let fx = Fixture::new(0).await;
        route_to(&fx, Classification::new("WRITE"));
        fx.classifier
            .push(ClassifyTask::JobExperienceMix, Classification::new("NOT_INCLUDE"));

        let outcome = fx.turn(ConversationState::default(), "자소서 써줘").await;

        assert_eq!(outcome.response, responses::ASK_JOB_AND_EXPERIENCE);
        assert!(outcome.writes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_letter_is_retried() {
        let fx = Fixture::new(0).await;
        route_to(&fx, Classification::new("WRITE"));
        fx.classifier
            .push(ClassifyTask::JobExperienceMix, Classification::new("ALL_INCLUDE"));
        fx.generator
            .push(TemplateId::CoverLetterFreeform, "[지원 동기]\n한 섹션뿐");

        let outcome = fx
            .turn(ConversationState::default(), "백엔드 직무, Go 서버 개발 경험")
            .await;

        assert_eq!(outcome.status, TurnStatus::Completed);
        assert_eq!(fx.generator.calls_for(TemplateId::CoverLetterFreeform).len(), 2);
        assert!(CoverLetter::parse(outcome.state.cover_letter_text.as_deref().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_letter_that_never_validates_fails_turn() {
        let fx = Fixture::new(0).await;
        route_to(&fx, Classification::new("WRITE"));
        fx.classifier
            .push(ClassifyTask::JobExperienceMix, Classification::new("ALL_INCLUDE"));
        for _ in 0..=MAX_GENERATION_RETRIES {
            fx.generator.push(TemplateId::CoverLetterFreeform, "제목 없는 글");
        }

        let outcome = fx.turn(ConversationState::default(), "백엔드, Go 경험").await;

        assert_eq!(outcome.status, TurnStatus::Failed);
        assert!(!outcome.state.cover_letter_saved);
        assert!(outcome.writes.is_empty());
    }

    #[tokio::test]
    async fn test_refine_without_letter_is_refused() {
        let fx = Fixture::new(0).await;
        route_to(&fx, Classification::new("REFINE"));

        let outcome = fx.turn(ConversationState::default(), "더 간결하게 고쳐줘").await;

        assert_eq!(outcome.response, responses::NO_LETTER_TO_REFINE);
        assert!(outcome.writes.is_empty());
        assert_eq!(fx.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refine_one_section_keeps_others_verbatim() {
        let fx = Fixture::new(0).await;
        let original = sample_letter("원본");
        fx.store.seed_cover_letter(USER, &original.render());
        let prior = ConversationState {
            cover_letter_saved: true,
            cover_letter_text: Some(original.render()),
            ..ConversationState::default()
        };
        route_to(&fx, Classification::new("REFINE"));
        fx.classifier.push(
            ClassifyTask::RefineTargets,
            Classification::new("SECTIONS").with("sections", json!(["입사 후 포부"])),
        );

        let outcome = fx.turn(prior, "입사 후 포부를 좀 더 구체적으로 바꿔줘").await;

        let refined = CoverLetter::parse(outcome.state.cover_letter_text.as_deref().unwrap())
            .expect("refined letter parses");
        assert_eq!(refined.motivation, original.motivation);
        assert_eq!(refined.strengths_weaknesses, original.strengths_weaknesses);
        assert_eq!(refined.competency, original.competency);
        assert_eq!(refined.future_commitment, "수정본 포부 본문");
        assert_eq!(
            fx.generator.calls_for(TemplateId::CoverLetterRefine)[0]["previous_letter"],
            original.render()
        );
        assert!(matches!(
            outcome.writes.as_slice(),
            [PendingWrite::SaveCoverLetter { .. }]
        ));
    }

    #[tokio::test]
    async fn test_refine_with_snake_case_section_keeps_others_verbatim() {
        let fx = Fixture::new(0).await;
        let original = sample_letter("원본");
        fx.store.seed_cover_letter(USER, &original.render());
        let prior = ConversationState {
            cover_letter_saved: true,
            cover_letter_text: Some(original.render()),
            ..ConversationState::default()
        };
        route_to(&fx, Classification::new("REFINE"));
        fx.classifier.push(
            ClassifyTask::RefineTargets,
            Classification::new("SECTIONS").with("sections", json!(["relevant_competency"])),
        );

        let outcome = fx.turn(prior, "직무 역량 부분만 다듬어줘").await;

        let refined = CoverLetter::parse(outcome.state.cover_letter_text.as_deref().unwrap())
            .expect("refined letter parses");
        assert_eq!(refined.motivation, original.motivation);
        assert_eq!(refined.strengths_weaknesses, original.strengths_weaknesses);
        assert_eq!(refined.future_commitment, original.future_commitment);
        assert_eq!(refined.competency, "수정본 역량 본문");
    }

    #[tokio::test]
    async fn test_refine_with_unreadable_sections_rewrites_nothing() {
        let fx = Fixture::new(0).await;
        let original = sample_letter("원본");
        fx.store.seed_cover_letter(USER, &original.render());
        let prior = ConversationState {
            cover_letter_saved: true,
            cover_letter_text: Some(original.render()),
            ..ConversationState::default()
        };
        route_to(&fx, Classification::new("REFINE"));
        fx.classifier.push(
            ClassifyTask::RefineTargets,
            Classification::new("SECTIONS").with("sections", json!(["결론"])),
        );

        let outcome = fx.turn(prior.clone(), "결론 부분만 바꿔줘").await;

        assert_eq!(outcome.status, TurnStatus::Failed);
        assert_eq!(outcome.response, responses::COULD_NOT_PROCESS);
        assert_eq!(outcome.state, prior);
        assert!(outcome.writes.is_empty());
        assert_eq!(fx.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_letter_generator_failure_fails_turn() {
        let fx = Fixture::new(5).await;
        let mut prior = fx.searched_state().await;
        prior.selected_job_ordinal = Some(2);
        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(0)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_INCLUDE"));
        fx.generator.fail(TemplateId::CoverLetterForPosting);

        let outcome = fx.turn(prior.clone(), "이 공고로 써줘. Rust 서버 경험이 있어").await;

        assert_eq!(outcome.status, TurnStatus::Failed);
        assert_eq!(outcome.response, responses::COULD_NOT_PROCESS);
        assert_eq!(outcome.state, prior);
        assert!(outcome.writes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_posting_keeps_prior_selection() {
        let fx = Fixture::new(3).await;
        let mut prior = fx.searched_state().await;
        prior.selected_job_ordinal = Some(2);
        route_to(&fx, Classification::new("WRITE").with("ordinal", json!(9)));
        fx.classifier
            .push(ClassifyTask::ExperiencePresence, Classification::new("EXPERIENCE_INCLUDE"));

        let outcome = fx.turn(prior, "9번 공고로 써줘. Go 경험이 있어").await;

        assert_eq!(outcome.response, responses::POSTING_NOT_FOUND);
        assert_eq!(outcome.state.selected_job_ordinal, Some(2));
        assert!(outcome.writes.is_empty());
        assert_eq!(fx.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unrelated_route_ignores_ordinal() {
        let fx = Fixture::new(3).await;
        let prior = fx.searched_state().await;
        route_to(&fx, Classification::new("UNRELATED").with("ordinal", json!(2)));

        let outcome = fx.turn(prior.clone(), "2번이 뭐였지").await;

        assert_eq!(outcome.status, TurnStatus::Unrelated);
        assert_eq!(outcome.state.selected_job_ordinal, prior.selected_job_ordinal);
    }

    #[test]
    fn test_append_fragment_joins_lines() {
        assert_eq!(append_fragment(None, "b"), "b");
        assert_eq!(append_fragment(Some(""), "b"), "b");
        assert_eq!(append_fragment(Some("a"), "b"), "a\nb");
    }
}
