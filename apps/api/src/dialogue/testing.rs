//! Scripted stand-ins for the language-model adapters, plus a fixture wiring
//! them to the in-memory store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::assistant::classifier::{Classification, ClassifyRequest, ClassifyTask, Classifier};
use crate::assistant::generator::{render_template, Generator, TemplateId, TemplateVars};
use crate::assistant::AssistError;
use crate::dialogue::orchestrator::{Orchestrator, TurnOutcome};
use crate::models::conversation::{ConversationState, TopIntent, PAGE_SIZE};
use crate::models::cover_letter::CoverLetter;
use crate::models::job::{JobDetails, JobPosting};
use crate::store::memory::MemoryStore;
use crate::store::{ConversationMemory, JobRepository, PendingWrite, SessionKey};

pub const USER: &str = "user-1";

/// Classifier that replays queued answers per task. A task with nothing queued
/// fails, so unexpected calls surface in tests.
#[derive(Default)]
pub struct ScriptedClassifier {
    scripts: Mutex<HashMap<ClassifyTask, VecDeque<Option<Classification>>>>,
    calls: Mutex<Vec<(ClassifyTask, String)>>,
}

impl ScriptedClassifier {
    pub fn push(&self, task: ClassifyTask, answer: Classification) -> &Self {
        self.queue(task, Some(answer));
        self
    }

    /// Queues a timeout for the next call of `task`.
    pub fn fail(&self, task: ClassifyTask) -> &Self {
        self.queue(task, None);
        self
    }

    pub fn called(&self, task: ClassifyTask) -> bool {
        self.calls.lock().unwrap().iter().any(|(t, _)| *t == task)
    }

    /// Texts the classifier saw for `task`, in call order.
    pub fn texts_for(&self, task: ClassifyTask) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == task)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn queue(&self, task: ClassifyTask, answer: Option<Classification>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(task)
            .or_default()
            .push_back(answer);
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, request: ClassifyRequest<'_>) -> Result<Classification, AssistError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.task, request.text.to_string()));
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.task)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Some(answer)) => Ok(answer),
            Some(None) => Err(AssistError::Timeout {
                task: request.task.name(),
                secs: 0,
            }),
            None => Err(AssistError::Malformed {
                task: request.task.name(),
                detail: "no scripted answer".to_string(),
            }),
        }
    }
}

/// Generator that checks template variables, then replays queued output or
/// falls back to a canned answer per template.
#[derive(Default)]
pub struct FakeGenerator {
    scripts: Mutex<HashMap<TemplateId, VecDeque<Option<String>>>>,
    calls: Mutex<Vec<(TemplateId, TemplateVars)>>,
}

impl FakeGenerator {
    pub fn push(&self, template: TemplateId, output: &str) -> &Self {
        self.queue(template, Some(output.to_string()));
        self
    }

    pub fn fail(&self, template: TemplateId) -> &Self {
        self.queue(template, None);
        self
    }

    pub fn calls_for(&self, template: TemplateId) -> Vec<TemplateVars> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == template)
            .map(|(_, vars)| vars.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn queue(&self, template: TemplateId, output: Option<String>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(template)
            .or_default()
            .push_back(output);
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(
        &self,
        template: TemplateId,
        vars: &TemplateVars,
    ) -> Result<String, AssistError> {
        render_template(template, vars)?;
        self.calls.lock().unwrap().push((template, vars.clone()));
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&template)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Some(output)) => Ok(output),
            Some(None) => Err(AssistError::Timeout {
                task: template.name(),
                secs: 0,
            }),
            None => Ok(canned_output(template, vars)),
        }
    }
}

fn canned_output(template: TemplateId, vars: &TemplateVars) -> String {
    let var = |name: &str| vars.get(name).cloned().unwrap_or_default();
    match template {
        TemplateId::DetailSummary => format!("요약\n{}", var("extracted_info")),
        TemplateId::CoverLetterForPosting => sample_letter(&var("job_name")).render(),
        TemplateId::CoverLetterFreeform => sample_letter(&var("job_description")).render(),
        TemplateId::CoverLetterRefine => sample_letter("수정본").render(),
        TemplateId::BehavioralQuestion => "가장 어려웠던 협업 경험은 무엇이었나요?".to_string(),
        TemplateId::TechnicalQuestion => "Rust의 소유권 모델을 설명해 주시겠어요?".to_string(),
    }
}

/// A well-formed letter whose every section mentions `tag`.
pub fn sample_letter(tag: &str) -> CoverLetter {
    CoverLetter {
        motivation: format!("{tag} 지원 동기 본문"),
        strengths_weaknesses: format!("{tag} 장단점 본문"),
        competency: format!("{tag} 역량 본문"),
        future_commitment: format!("{tag} 포부 본문"),
    }
}

pub fn posting(id: i64) -> JobPosting {
    JobPosting {
        id,
        title: format!("백엔드 개발자 {id}"),
        company: format!("회사 {id}"),
        skills: "Rust, PostgreSQL".to_string(),
        location: "서울".to_string(),
        employment_terms: "정규직".to_string(),
        application_window: "상시 채용".to_string(),
        link: format!("https://jobs.example.com/{id}"),
        details: Some(JobDetails {
            responsibilities: format!("결제 시스템 {id} 개발"),
            qualifications: "경력 3년 이상".to_string(),
            preferences: "대용량 트래픽 경험".to_string(),
            benefits: "유연 근무".to_string(),
            hiring_process: "서류 - 면접".to_string(),
            education: "학력 무관".to_string(),
            location_detail: "서울 강남구".to_string(),
            deadline: "2026-12-31".to_string(),
        }),
    }
}

/// Orchestrator wired to scripted adapters and an in-memory store holding
/// `postings` backend postings and one open session.
pub struct Fixture {
    pub classifier: Arc<ScriptedClassifier>,
    pub generator: Arc<FakeGenerator>,
    pub store: Arc<MemoryStore>,
    pub orchestrator: Orchestrator,
    pub key: SessionKey,
}

impl Fixture {
    pub async fn new(postings: usize) -> Self {
        let catalogue = (1..=postings as i64).map(posting).collect();
        let store = Arc::new(MemoryStore::with_postings(catalogue));
        let session_id = store.start_session(USER).await.expect("session starts");
        let classifier = Arc::new(ScriptedClassifier::default());
        let generator = Arc::new(FakeGenerator::default());
        let orchestrator = Orchestrator::new(
            classifier.clone(),
            generator.clone(),
            store.clone(),
            store.clone(),
        );
        Self {
            classifier,
            generator,
            store,
            orchestrator,
            key: SessionKey {
                session_id,
                user_id: USER.to_string(),
            },
        }
    }

    pub async fn turn(&self, state: ConversationState, utterance: &str) -> TurnOutcome {
        self.orchestrator
            .handle_turn(&self.key, state, utterance)
            .await
    }

    /// Persists an outcome the way the session service does.
    pub async fn commit(&self, outcome: &TurnOutcome) {
        self.store
            .commit_turn(&self.key, &outcome.state, &outcome.writes)
            .await
            .expect("commit succeeds");
    }

    /// Committed state right after a search that listed the whole catalogue.
    pub async fn searched_state(&self) -> ConversationState {
        let results = self
            .store
            .search(&["백엔드".to_string()])
            .await
            .expect("search succeeds");
        let state = ConversationState {
            top_intent: TopIntent::JobSearch,
            job_search_active: true,
            result_cursor: results.len().min(PAGE_SIZE),
            last_search_results: results.clone(),
            ..ConversationState::default()
        };
        self.store
            .commit_turn(
                &self.key,
                &state,
                &[PendingWrite::ReplaceSessionResults(results)],
            )
            .await
            .expect("commit succeeds");
        state
    }
}
