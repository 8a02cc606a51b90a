use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A scraped job posting as shown in a listing.
///
/// Postings are addressed by their 1-based ordinal in the session's most recent
/// search, never by `id`. `details` is only populated by an ordinal lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub skills: String,
    pub location: String,
    pub employment_terms: String,
    pub application_window: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JobDetails>,
}

/// Extended fields of a posting, fetched lazily for detail views and cover letters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub responsibilities: String,
    pub qualifications: String,
    pub preferences: String,
    pub benefits: String,
    pub hiring_process: String,
    pub education: String,
    pub location_detail: String,
    pub deadline: String,
}

/// Row shape of `job_postings` joined for a detail lookup.
#[derive(Debug, Clone, FromRow)]
pub struct JobPostingRow {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub skills: String,
    pub location: String,
    pub employment_terms: String,
    pub application_window: String,
    pub link: String,
    pub responsibilities: Option<String>,
    pub qualifications: Option<String>,
    pub preferences: Option<String>,
    pub benefits: Option<String>,
    pub hiring_process: Option<String>,
    pub education: Option<String>,
    pub location_detail: Option<String>,
    pub deadline: Option<String>,
}

impl JobPostingRow {
    pub fn into_summary(self) -> JobPosting {
        JobPosting {
            id: self.id,
            title: self.title,
            company: self.company,
            skills: self.skills,
            location: self.location,
            employment_terms: self.employment_terms,
            application_window: self.application_window,
            link: self.link,
            details: None,
        }
    }

    pub fn into_detailed(self) -> JobPosting {
        let JobPostingRow {
            id,
            title,
            company,
            skills,
            location,
            employment_terms,
            application_window,
            link,
            responsibilities,
            qualifications,
            preferences,
            benefits,
            hiring_process,
            education,
            location_detail,
            deadline,
        } = self;
        JobPosting {
            id,
            title,
            company,
            skills,
            location,
            employment_terms,
            application_window,
            link,
            details: Some(JobDetails {
                responsibilities: responsibilities.unwrap_or_default(),
                qualifications: qualifications.unwrap_or_default(),
                preferences: preferences.unwrap_or_default(),
                benefits: benefits.unwrap_or_default(),
                hiring_process: hiring_process.unwrap_or_default(),
                education: education.unwrap_or_default(),
                location_detail: location_detail.unwrap_or_default(),
                deadline: deadline.unwrap_or_default(),
            }),
        }
    }
}

/// Every field a user can ask about in a detail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    Title,
    Company,
    Skills,
    Location,
    Terms,
    Window,
    Link,
    Responsibilities,
    Qualifications,
    Preferences,
    Benefits,
    Process,
    Education,
    DetailedLocation,
    Deadline,
}

impl JobField {
    pub const ALL: [JobField; 15] = [
        JobField::Title,
        JobField::Company,
        JobField::Skills,
        JobField::Location,
        JobField::Terms,
        JobField::Window,
        JobField::Link,
        JobField::Responsibilities,
        JobField::Qualifications,
        JobField::Preferences,
        JobField::Benefits,
        JobField::Process,
        JobField::Education,
        JobField::DetailedLocation,
        JobField::Deadline,
    ];

    /// Wire name used in classifier output.
    pub fn key(self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Company => "company",
            JobField::Skills => "skills",
            JobField::Location => "location",
            JobField::Terms => "terms",
            JobField::Window => "window",
            JobField::Link => "link",
            JobField::Responsibilities => "responsibilities",
            JobField::Qualifications => "qualifications",
            JobField::Preferences => "preferences",
            JobField::Benefits => "benefits",
            JobField::Process => "process",
            JobField::Education => "education",
            JobField::DetailedLocation => "detailed_location",
            JobField::Deadline => "deadline",
        }
    }

    /// Heading shown to the user.
    pub fn display_name(self) -> &'static str {
        match self {
            JobField::Title => "제목",
            JobField::Company => "회사명",
            JobField::Skills => "사용기술",
            JobField::Location => "근무지역",
            JobField::Terms => "근로조건",
            JobField::Window => "모집기간",
            JobField::Link => "링크",
            JobField::Responsibilities => "주요업무",
            JobField::Qualifications => "자격요건",
            JobField::Preferences => "우대사항",
            JobField::Benefits => "복지 및 혜택",
            JobField::Process => "채용절차",
            JobField::Education => "학력",
            JobField::DetailedLocation => "근무지역 상세",
            JobField::Deadline => "마감일자",
        }
    }

    /// Accepts either the wire key or the Korean heading (with `_` or spaces).
    pub fn parse(raw: &str) -> Option<JobField> {
        let normalized = raw.trim().trim_matches('"').to_lowercase().replace(' ', "_");
        JobField::ALL.into_iter().find(|field| {
            field.key() == normalized || field.display_name().replace(' ', "_") == normalized
        })
    }
}

impl JobPosting {
    /// Value of `field`, or `None` when an extended field was requested from a
    /// posting loaded without details.
    pub fn field(&self, field: JobField) -> Option<&str> {
        let value = match field {
            JobField::Title => &self.title,
            JobField::Company => &self.company,
            JobField::Skills => &self.skills,
            JobField::Location => &self.location,
            JobField::Terms => &self.employment_terms,
            JobField::Window => &self.application_window,
            JobField::Link => &self.link,
            extended => {
                let details = self.details.as_ref()?;
                match extended {
                    JobField::Responsibilities => &details.responsibilities,
                    JobField::Qualifications => &details.qualifications,
                    JobField::Preferences => &details.preferences,
                    JobField::Benefits => &details.benefits,
                    JobField::Process => &details.hiring_process,
                    JobField::Education => &details.education,
                    JobField::DetailedLocation => &details.location_detail,
                    _ => &details.deadline,
                }
            }
        };
        Some(value.as_str())
    }
}
