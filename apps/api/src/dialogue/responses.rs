//! Fixed user-facing replies and listing rendering.

use crate::models::job::JobPosting;

pub const APOLOGY: &str = "시스템과 관련 없는 질문입니다. 다른 질문을 입력해주세요.";
pub const TURN_FAILED: &str =
    "죄송합니다. 요청을 처리하는 중 문제가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const COULD_NOT_PROCESS: &str = "요청을 처리하지 못했습니다. 다시 한 번 입력해주세요.";

// Job search
pub const ASK_ROLE: &str = "탐색을 원하는 직무를 입력해주세요.";
pub const NO_MATCHING_POSTINGS: &str = "관련된 채용 공고를 찾지 못했습니다.";
pub const NO_PREVIOUS_SEARCH: &str = "이전에 검색된 채용 공고가 없습니다. 먼저 직무를 입력해주세요.";
pub const NO_MORE_POSTINGS: &str = "더 이상 공고가 없습니다.";
pub const ASK_DETAIL_ORDINAL: &str = "상세 정보를 확인할 공고 번호를 입력해주세요.";
pub const DETAIL_NOT_FOUND: &str = "선택하신 번호의 공고가 없습니다. 공고 번호를 다시 확인해주세요.";

// Cover letter
pub const ASK_LETTER_ORDINAL: &str = "자기소개서 작성에 참고할 공고 번호를 입력해주세요.";
pub const ASK_EXPERIENCE: &str = "자기소개서 작성을 위해 경험을 입력해주세요.";
pub const ASK_JOB: &str = "자기소개서에 반영할 직무를 입력해주세요.";
pub const ASK_JOB_AND_EXPERIENCE: &str = "자기소개서에 반영할 직무와 경험을 입력해주세요.";
pub const POSTING_NOT_FOUND: &str = "선택한 공고를 찾을 수 없습니다. 공고 번호를 다시 확인해주세요.";
pub const NO_LETTER_TO_REFINE: &str = "작성된 자기소개서가 없습니다. 먼저 작성해주세요.";

// Interview
pub const COVER_LETTER_REQUIRED: &str = "기술 면접을 위해서는 먼저 자기소개서가 필요합니다.";
pub const CHOOSE_INTERVIEW_TYPE: &str = "인성 면접과 기술 면접 중 선택해주세요.";
pub const INTERVIEW_CLOSED: &str = "면접 연습을 종료합니다.";

const LISTING_GUIDE: &str = "✅ 다른 직무의 공고 검색을 원하시면, 직무 이름을 입력해주세요.\n\
    ✅ 상세 정보를 원하시면, 공고 번호와 함께 상세 정보를 요청해주세요.\n\
    ✅ 열람 가능한 상세 정보에는 주요업무, 자격요건, 우대사항, 복지 및 혜택, 채용절차, 학력, 근무지역 상세, 마감일자가 있습니다.\n\
    🧾 자기소개서 작성을 원하시면, 공고 번호와 함께 자기소개서 작성을 요청해주세요.\n\
    🗨️ 면접 연습을 원하시면, 면접 연습을 요청해주세요.";

pub const DETAIL_TRAILER: &str = "✅ 다른 직무의 공고 검색을 원하시면, 직무 이름을 입력해주세요.\n\
    🧾 해당 공고로 자기소개서 작성을 원하시면, 자기소개서 작성을 요청해주세요.\n\
    🗨️ 면접 연습을 원하시면, 면접 연습을 요청해주세요.";

pub const LETTER_TRAILER: &str = "🔮 추가 수정을 원하시면 수정 요청 사항을 입력해주세요.\n\
    ❣️ 출력된 자기소개서 내용에 실제 사실과 다른 내용이 입력되었을 수 있으니 확인 바랍니다.\n\
    🗨️ 면접 연습을 원하시면 면접 연습을 요청해주세요.";

/// Numbered listing starting at `first_ordinal`, followed by the guidance trailer.
pub fn render_listing(postings: &[JobPosting], first_ordinal: usize, has_more: bool) -> String {
    let mut out = String::new();
    for (offset, job) in postings.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n회사명: {}\n기술스택: {}\n근무지: {}\n조건: {}\n모집기간: {}\n[지원 링크] {}\n\n",
            first_ordinal + offset,
            job.title,
            job.company,
            job.skills,
            job.location,
            job.employment_terms,
            job.application_window,
            job.link,
        ));
    }
    if has_more {
        out.push_str("✅ 더 많은 공고를 원하시면 추가 공고를 요청해주세요.\n");
    } else {
        out.push_str(&format!("❌ {NO_MORE_POSTINGS}\n"));
    }
    out.push_str(LISTING_GUIDE);
    out
}

/// Appends a trailer block after a blank line.
pub fn with_trailer(body: &str, trailer: &str) -> String {
    format!("{}\n\n{trailer}", body.trim_end())
}
