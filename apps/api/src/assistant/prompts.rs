// Prompt text for every classification task and generation template.
// Users write in Korean; instructions are English with Korean examples.

use crate::assistant::classifier::ClassifyTask;
use crate::assistant::generator::TemplateId;

/// Shared frame for classification. `{instructions}`, `{labels}` and
/// `{user_input}` are replaced before sending.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"{instructions}

Allowed labels: {labels}

Return a JSON object with this EXACT shape:
{"label": "<one allowed label>", "extracted": {}}
Put any extracted values described above inside "extracted". Leave it empty otherwise.

User input: {user_input}"#;

const TOP_INTENT: &str = r#"Classify what the user of a job-seeking assistant wants.
- JOB_SEARCH: asks for job postings, names a role or skill to search (백엔드, 프론트, AI, 로봇),
  asks for more postings (더 보여줘), or asks for details of a numbered posting
  (주요업무, 자격요건, 우대사항, 복지, 채용절차, 학력, 근무지역 상세, 마감일자).
- COVER_LETTER: asks to write or revise a cover letter (자기소개서), gives only a posting
  number (4번), or describes their own experience, internships, certificates or projects.
- INTERVIEW: asks to practise an interview, or pastes a cover letter to practise with.
- UNKNOWN: anything unrelated to the service.
Examples: "백엔드 개발자 공고 알려줘" -> JOB_SEARCH, "공고 더 보여줘" -> JOB_SEARCH,
"4번 공고" -> COVER_LETTER, "면접 연습하고 싶어" -> INTERVIEW, "오늘 날씨 어때" -> UNKNOWN."#;

const JOB_SEARCH_ROUTE: &str = r#"The user is in the job-posting search flow. Decide what they want.
- PROVIDE_LISTINGS: asks for postings or names a role or skill.
- PROVIDE_MORE: asks for more results from the previous search (더 보여줘, 다음, 추가).
- DETAIL_REQUEST: asks for details of a specific posting.
- UNRELATED: not about searching postings.
For DETAIL_REQUEST put the posting number in extracted.ordinal ("첫 번째 공고" -> 1).
Use -1 when no number is given.
Examples: "첫 번째 공고 우대사항 알려줘" -> DETAIL_REQUEST, ordinal 1;
"프론트엔드 개발자 공고 알려줘" -> PROVIDE_LISTINGS, ordinal -1;
"다음 공고도 보여줘" -> PROVIDE_MORE, ordinal -1."#;

const KEYWORD_PRESENCE: &str = r#"Decide whether the input names any role, job field or technology keyword
(AI, 백엔드, 프론트엔드, 개발자, 데이터, 로봇, 반도체, ...).
- INCLUDE: at least one such keyword is present.
- NOT_INCLUDE: none is present ("공고 알려줘").
Examples: "백엔드 공고 보여줘" -> INCLUDE, "공고 알려줘" -> NOT_INCLUDE."#;

const KEYWORD_EXTRACTION: &str = r#"Extract every role, job field or technology keyword from the input into
extracted.keywords as a JSON array of strings. Exclude request words such as 공고, 보여줘, 알려줘.
A generic word like 개발자 or 엔지니어 is returned alone only when it stands alone; with a field,
return the field and the combined phrase.
- FOUND: at least one keyword extracted.
- NONE: nothing to extract.
Examples: "프론트 개발자 공고 알려줘" -> FOUND, ["프론트", "프론트 개발자"];
"데이터 분석 공고 알려줘" -> FOUND, ["데이터 분석"]."#;

const DETAIL_FIELDS: &str = r#"The user asks for details of a job posting. Decide which fields they want.
Field names: title, company, skills, location, terms, window, link, responsibilities,
qualifications, preferences, benefits, process, education, detailed_location, deadline.
- ALL: they want every detail (상세 정보, 모든 정보, 전부).
- SELECTED: they want specific fields; list them in extracted.fields as a JSON array.
Examples: "첫 번째 공고의 주요 업무와 자격요건 알려줘" -> SELECTED, ["responsibilities", "qualifications"];
"3번 상세 정보" -> ALL."#;

const COVER_LETTER_ROUTE: &str = r#"The user is in the cover-letter flow. Decide what they want.
- WRITE: asks to write a letter, names a role, describes their experience, or gives a posting number.
- REFINE: asks to change an existing letter or a sentence in it.
- UNRELATED: not about cover letters.
Also put a posting reference in extracted.ordinal:
- the explicit number when a posting is named ("3번 공고로", "네 번째 공고", "공고 5번");
- 0 when they refer to the current posting ("이 공고로", "해당 공고로", or just "자기소개서 작성해줘");
- -1 otherwise.
Numbers used while describing experience are NOT posting numbers
("프로젝트를 네 번 진행했어" -> WRITE, -1).
Examples: "첫 번째 공고로 자기소개서 작성해줘" -> WRITE, 1; "5번 공고" -> WRITE, 5;
"직무 역량 부분에서 Python을 Java로 바꿔줘" -> REFINE, -1."#;

const EXPERIENCE_PRESENCE: &str = r#"Decide whether the input describes the user's own experience
(projects, work, internships, certificates, coursework). Short descriptions still count
when they would help a job application.
- EXPERIENCE_INCLUDE: experience is present.
- EXPERIENCE_EXCLUDE: no experience is present."#;

const JOB_EXPERIENCE_MIX: &str = r#"Decide whether the input names a target job and/or describes the user's experience.
- JOB_INCLUDE: only a job or role ("AI 개발자").
- EXPERIENCE_INCLUDE: only experience.
- ALL_INCLUDE: both a job and experience.
- NOT_INCLUDE: neither."#;

const REFINE_TARGETS: &str = r#"The user asks to revise a four-section cover letter. Sections:
motivation (지원 동기), strengths_weaknesses (성격의 장단점), competency (직무 역량),
future_commitment (입사 후 포부).
- SECTIONS: the request targets specific sections; list them in extracted.sections as a JSON array.
- WHOLE: the request applies to the whole letter or no section can be identified.
Example: "입사 후 포부를 더 구체적으로 써줘" -> SECTIONS, ["future_commitment"]."#;

const INTERVIEW_ROUTE: &str = r#"The user is in the mock-interview flow. Decide what they want.
- BEHAVIORAL: a personality or behavioural interview (인성 면접).
- TECHNICAL: a technical interview (기술 면접), or practice based on their cover letter.
- END: wants to stop (종료할게, 그만할게).
- SIMPLE: wants interview practice without saying which kind.
- UNRELATED: not about interviews.
Examples: "기술 면접 하고싶어" -> TECHNICAL, "이 자기소개서로 면접 연습하고 싶어" -> TECHNICAL,
"면접 연습하자" -> SIMPLE."#;

const INTERVIEW_TERMINATION: &str = r#"The user is answering interview questions. Decide whether they want to stop.
- END: they ask to stop or finish the interview (이제 그만할게, 종료, 끝낼래).
- CONTINUE: anything else, including answers to the question."#;

const PASTED_COVER_LETTER: &str = r#"Decide whether the input contains a cover letter the user pasted.
- FOUND: put the letter text, verbatim, in extracted.cover_letter.
- NONE: no cover letter is present."#;

pub fn task_instructions(task: ClassifyTask) -> &'static str {
    match task {
        ClassifyTask::TopIntent => TOP_INTENT,
        ClassifyTask::JobSearchRoute => JOB_SEARCH_ROUTE,
        ClassifyTask::KeywordPresence => KEYWORD_PRESENCE,
        ClassifyTask::KeywordExtraction => KEYWORD_EXTRACTION,
        ClassifyTask::DetailFields => DETAIL_FIELDS,
        ClassifyTask::CoverLetterRoute => COVER_LETTER_ROUTE,
        ClassifyTask::ExperiencePresence => EXPERIENCE_PRESENCE,
        ClassifyTask::JobExperienceMix => JOB_EXPERIENCE_MIX,
        ClassifyTask::RefineTargets => REFINE_TARGETS,
        ClassifyTask::InterviewRoute => INTERVIEW_ROUTE,
        ClassifyTask::InterviewTermination => INTERVIEW_TERMINATION,
        ClassifyTask::PastedCoverLetter => PASTED_COVER_LETTER,
    }
}

const LETTER_SHAPE: &str = "The letter MUST contain exactly these four sections, each starting with its heading \
on its own line, in this order:
[지원 동기]
[성격의 장단점]
[직무 역량]
[입사 후 포부]
Write at least 300 characters per section.";

const DETAIL_SUMMARY: &str = r#"Tell the user about a job posting in natural Korean.
Use one block per field in the form "[field heading]\ncontent". Do not add facts.

Posting details:
{extracted_info}"#;

const COVER_LETTER_FOR_POSTING: &str = r#"Write a Korean cover letter for the following job posting.

[Posting]
- Title: {job_name}
- Tech stack: {tech_stack}
- Responsibilities: {job_desc}
- Qualifications: {requirements}
- Preferred: {preferences}

[Candidate experience]
{experience}

{shape}

{no_invention}"#;

const COVER_LETTER_FREEFORM: &str = r#"Write a Korean cover letter.

[Target job]
{job_description}

[Candidate experience]
{experience}

{shape}

{no_invention}"#;

const COVER_LETTER_REFINE: &str = r#"Revise the cover letter below according to the user's request.
If the request targets particular sections, change only those sections and copy every other
section exactly as it is.

[Current letter]
{previous_letter}

[Revision request]
{request}

{shape}

{no_invention}"#;

const BEHAVIORAL_QUESTION: &str = r#"You are a behavioural interviewer.
1. Read the candidate's latest answer and ask a natural follow-up.
2. Ask exactly ONE question. Output only the question.
3. Never ask about experience the candidate has not mentioned.
4. Do not repeat a question from the history. If the candidate asks for a different
   question, start a new topic.
Example: answer "프로젝트 리더 경험이 있습니다." ->
"프로젝트 리더 경험이 인상적이네요. 팀 내 갈등은 어떻게 해결하셨나요?"

Candidate answer: {answer}
Questions asked so far:
{history}

{no_invention}"#;

const TECHNICAL_QUESTION: &str = r#"You are a technical interviewer.
1. Read the candidate's latest answer and cover letter and ask a technical follow-up.
2. Ask exactly ONE question. Output only the question.
3. Ask only about technologies and work present in the cover letter or in the postings below.
4. Do not repeat a question from the history.
Example: answer "저는 async/await를 사용합니다." ->
"async/await에 익숙하시군요. Promise 체이닝과 비교했을 때의 차이는 무엇인가요?"

Candidate answer: {answer}
Questions asked so far:
{history}

Cover letter:
{cover_letter}

Postings the candidate looked at:
{postings}

{no_invention}"#;

pub fn template_text(template: TemplateId) -> String {
    let text = match template {
        TemplateId::DetailSummary => DETAIL_SUMMARY,
        TemplateId::CoverLetterForPosting => COVER_LETTER_FOR_POSTING,
        TemplateId::CoverLetterFreeform => COVER_LETTER_FREEFORM,
        TemplateId::CoverLetterRefine => COVER_LETTER_REFINE,
        TemplateId::BehavioralQuestion => BEHAVIORAL_QUESTION,
        TemplateId::TechnicalQuestion => TECHNICAL_QUESTION,
    };
    text.replace("{shape}", LETTER_SHAPE)
}
