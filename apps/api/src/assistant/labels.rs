//! Closed label sets for every routing decision.
//!
//! Each enum carries its wire labels and the task that produces it. Labels
//! outside the set decode to the enum's fallback (`Unrecognized`, or
//! `Unknown` for the top-level intent).

use std::fmt::Debug;

use crate::assistant::classifier::ClassifyTask;
use crate::models::conversation::TopIntent;

pub trait Label: Copy + Debug + PartialEq + 'static {
    const TASK: ClassifyTask;
    const CHOICES: &'static [(&'static str, Self)];
    const FALLBACK: Self;

    fn decode(raw: &str) -> Self {
        let normalized = normalize(raw);
        Self::CHOICES
            .iter()
            .find(|(label, _)| *label == normalized)
            .map(|(_, value)| *value)
            .unwrap_or(Self::FALLBACK)
    }

    fn wire_labels() -> Vec<&'static str> {
        Self::CHOICES.iter().map(|(label, _)| *label).collect()
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '.')
        .trim()
        .to_uppercase()
        .replace([' ', '-'], "_")
}

impl Label for TopIntent {
    const TASK: ClassifyTask = ClassifyTask::TopIntent;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("JOB_SEARCH", TopIntent::JobSearch),
        ("COVER_LETTER", TopIntent::CoverLetter),
        ("INTERVIEW", TopIntent::Interview),
        ("UNKNOWN", TopIntent::Unknown),
    ];
    const FALLBACK: Self = TopIntent::Unknown;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSearchRoute {
    ProvideListings,
    ProvideMore,
    DetailRequest,
    Unrelated,
    Unrecognized,
}

impl Label for JobSearchRoute {
    const TASK: ClassifyTask = ClassifyTask::JobSearchRoute;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("PROVIDE_LISTINGS", JobSearchRoute::ProvideListings),
        ("PROVIDE_MORE", JobSearchRoute::ProvideMore),
        ("DETAIL_REQUEST", JobSearchRoute::DetailRequest),
        ("UNRELATED", JobSearchRoute::Unrelated),
    ];
    const FALLBACK: Self = JobSearchRoute::Unrecognized;
}

/// Whether the utterance names a role or skill to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordPresence {
    Include,
    NotInclude,
    Unrecognized,
}

impl Label for KeywordPresence {
    const TASK: ClassifyTask = ClassifyTask::KeywordPresence;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("INCLUDE", KeywordPresence::Include),
        ("NOT_INCLUDE", KeywordPresence::NotInclude),
    ];
    const FALLBACK: Self = KeywordPresence::Unrecognized;
}

/// Outcome of keyword extraction; the list itself is in `extracted.keywords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordList {
    Found,
    None,
    Unrecognized,
}

impl Label for KeywordList {
    const TASK: ClassifyTask = ClassifyTask::KeywordExtraction;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("FOUND", KeywordList::Found),
        ("NONE", KeywordList::None),
    ];
    const FALLBACK: Self = KeywordList::Unrecognized;
}

/// Which posting fields a detail request asks for; `Selected` lists them in
/// `extracted.fields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailScope {
    All,
    Selected,
    Unrecognized,
}

impl Label for DetailScope {
    const TASK: ClassifyTask = ClassifyTask::DetailFields;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("ALL", DetailScope::All),
        ("SELECTED", DetailScope::Selected),
    ];
    const FALLBACK: Self = DetailScope::Unrecognized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverLetterRoute {
    Write,
    Refine,
    Unrelated,
    Unrecognized,
}

impl Label for CoverLetterRoute {
    const TASK: ClassifyTask = ClassifyTask::CoverLetterRoute;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("WRITE", CoverLetterRoute::Write),
        ("REFINE", CoverLetterRoute::Refine),
        ("UNRELATED", CoverLetterRoute::Unrelated),
    ];
    const FALLBACK: Self = CoverLetterRoute::Unrecognized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperiencePresence {
    Include,
    Exclude,
    Unrecognized,
}

impl Label for ExperiencePresence {
    const TASK: ClassifyTask = ClassifyTask::ExperiencePresence;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("EXPERIENCE_INCLUDE", ExperiencePresence::Include),
        ("EXPERIENCE_EXCLUDE", ExperiencePresence::Exclude),
    ];
    const FALLBACK: Self = ExperiencePresence::Unrecognized;
}

/// What a letter request without a prior search supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobExperienceMix {
    JobOnly,
    ExperienceOnly,
    Both,
    Neither,
    Unrecognized,
}

impl JobExperienceMix {
    pub fn has_job(self) -> bool {
        matches!(self, JobExperienceMix::JobOnly | JobExperienceMix::Both)
    }

    pub fn has_experience(self) -> bool {
        matches!(self, JobExperienceMix::ExperienceOnly | JobExperienceMix::Both)
    }
}

impl Label for JobExperienceMix {
    const TASK: ClassifyTask = ClassifyTask::JobExperienceMix;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("JOB_INCLUDE", JobExperienceMix::JobOnly),
        ("EXPERIENCE_INCLUDE", JobExperienceMix::ExperienceOnly),
        ("ALL_INCLUDE", JobExperienceMix::Both),
        ("NOT_INCLUDE", JobExperienceMix::Neither),
    ];
    const FALLBACK: Self = JobExperienceMix::Unrecognized;
}

/// Which section(s) a refine request targets; `Sections` lists them in
/// `extracted.sections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineScope {
    Whole,
    Sections,
    Unrecognized,
}

impl Label for RefineScope {
    const TASK: ClassifyTask = ClassifyTask::RefineTargets;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("WHOLE", RefineScope::Whole),
        ("SECTIONS", RefineScope::Sections),
    ];
    const FALLBACK: Self = RefineScope::Unrecognized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewRoute {
    Behavioral,
    Technical,
    End,
    Simple,
    Unrelated,
    Unrecognized,
}

impl Label for InterviewRoute {
    const TASK: ClassifyTask = ClassifyTask::InterviewRoute;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("BEHAVIORAL", InterviewRoute::Behavioral),
        ("TECHNICAL", InterviewRoute::Technical),
        ("END", InterviewRoute::End),
        ("SIMPLE", InterviewRoute::Simple),
        ("UNRELATED", InterviewRoute::Unrelated),
    ];
    const FALLBACK: Self = InterviewRoute::Unrecognized;
}

/// Termination check run on every turn of an open interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    End,
    Continue,
    Unrecognized,
}

impl Label for Termination {
    const TASK: ClassifyTask = ClassifyTask::InterviewTermination;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("END", Termination::End),
        ("CONTINUE", Termination::Continue),
    ];
    const FALLBACK: Self = Termination::Unrecognized;
}

/// Whether the utterance itself contains a pasted cover letter
/// (in `extracted.cover_letter`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PastedLetter {
    Found,
    Absent,
    Unrecognized,
}

impl Label for PastedLetter {
    const TASK: ClassifyTask = ClassifyTask::PastedCoverLetter;
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("FOUND", PastedLetter::Found),
        ("NONE", PastedLetter::Absent),
    ];
    const FALLBACK: Self = PastedLetter::Unrecognized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_intent_decodes_known_labels() {
        assert_eq!(TopIntent::decode("JOB_SEARCH"), TopIntent::JobSearch);
        assert_eq!(TopIntent::decode(" \"cover letter\" "), TopIntent::CoverLetter);
        assert_eq!(TopIntent::decode("interview."), TopIntent::Interview);
    }

    #[test]
    fn test_top_intent_collapses_unknown_labels() {
        assert_eq!(TopIntent::decode("JOBNAME"), TopIntent::Unknown);
        assert_eq!(TopIntent::decode(""), TopIntent::Unknown);
    }

    #[test]
    fn test_sub_labels_decode_to_unrecognized() {
        assert_eq!(
            JobSearchRoute::decode("provide-more"),
            JobSearchRoute::ProvideMore
        );
        assert_eq!(
            JobSearchRoute::decode("채용 공고 제공"),
            JobSearchRoute::Unrecognized
        );
        assert_eq!(InterviewRoute::decode("maybe"), InterviewRoute::Unrecognized);
        assert_eq!(Termination::decode("end"), Termination::End);
    }

    #[test]
    fn test_wire_labels_exclude_fallback() {
        assert_eq!(
            CoverLetterRoute::wire_labels(),
            vec!["WRITE", "REFINE", "UNRELATED"]
        );
        assert!(!InterviewRoute::wire_labels().contains(&"UNRECOGNIZED"));
    }

    #[test]
    fn test_job_experience_mix_flags() {
        assert!(JobExperienceMix::Both.has_job());
        assert!(JobExperienceMix::Both.has_experience());
        assert!(!JobExperienceMix::JobOnly.has_experience());
        assert!(!JobExperienceMix::Neither.has_job());
        assert!(!JobExperienceMix::Unrecognized.has_experience());
    }
}
