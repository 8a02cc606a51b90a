//! Four-section cover letter: parse, render and section-scoped refinement.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed sections every letter must carry, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterSection {
    Motivation,
    StrengthsWeaknesses,
    Competency,
    FutureCommitment,
}

impl LetterSection {
    pub const ALL: [LetterSection; 4] = [
        LetterSection::Motivation,
        LetterSection::StrengthsWeaknesses,
        LetterSection::Competency,
        LetterSection::FutureCommitment,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LetterSection::Motivation => "motivation",
            LetterSection::StrengthsWeaknesses => "strengths_weaknesses",
            LetterSection::Competency => "competency",
            LetterSection::FutureCommitment => "future_commitment",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            LetterSection::Motivation => "지원 동기",
            LetterSection::StrengthsWeaknesses => "성격의 장단점",
            LetterSection::Competency => "직무 역량",
            LetterSection::FutureCommitment => "입사 후 포부",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            LetterSection::Motivation => &["지원동기", "motivation"],
            LetterSection::StrengthsWeaknesses => {
                &["성격의장단점", "장단점", "strengthsweaknesses", "strengthsandweaknesses"]
            }
            LetterSection::Competency => &["직무역량", "relevantcompetency", "competency"],
            LetterSection::FutureCommitment => &["입사후포부", "포부", "futurecommitment"],
        }
    }

    pub fn parse(raw: &str) -> Option<LetterSection> {
        let key = raw.trim().to_lowercase();
        LetterSection::ALL
            .into_iter()
            .find(|section| section.key() == key)
            .or_else(|| section_from_heading(raw))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LetterShapeError {
    #[error("cover letter is missing section(s): {0:?}")]
    MissingSections(Vec<LetterSection>),

    #[error("cover letter repeats section {0:?}")]
    DuplicateSection(LetterSection),
}

/// A cover letter held as exactly four section bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub motivation: String,
    pub strengths_weaknesses: String,
    pub competency: String,
    pub future_commitment: String,
}

impl CoverLetter {
    pub fn section(&self, section: LetterSection) -> &str {
        match section {
            LetterSection::Motivation => &self.motivation,
            LetterSection::StrengthsWeaknesses => &self.strengths_weaknesses,
            LetterSection::Competency => &self.competency,
            LetterSection::FutureCommitment => &self.future_commitment,
        }
    }

    fn section_mut(&mut self, section: LetterSection) -> &mut String {
        match section {
            LetterSection::Motivation => &mut self.motivation,
            LetterSection::StrengthsWeaknesses => &mut self.strengths_weaknesses,
            LetterSection::Competency => &mut self.competency,
            LetterSection::FutureCommitment => &mut self.future_commitment,
        }
    }

    /// Parses generated text of the form `[heading]\nbody` per section.
    /// Text before the first recognised heading is discarded.
    pub fn parse(text: &str) -> Result<CoverLetter, LetterShapeError> {
        let mut bodies: [Option<Vec<&str>>; 4] = Default::default();
        let mut current: Option<usize> = None;

        for line in text.lines() {
            if let Some(section) = section_from_heading(line) {
                let index = section_index(section);
                if bodies[index].is_some() {
                    return Err(LetterShapeError::DuplicateSection(section));
                }
                bodies[index] = Some(Vec::new());
                current = Some(index);
                continue;
            }
            if let Some(lines) = current.and_then(|i| bodies[i].as_mut()) {
                lines.push(line);
            }
        }

        let missing: Vec<LetterSection> = LetterSection::ALL
            .into_iter()
            .filter(|s| bodies[section_index(*s)].is_none())
            .collect();
        if !missing.is_empty() {
            return Err(LetterShapeError::MissingSections(missing));
        }

        let [motivation, strengths_weaknesses, competency, future_commitment] =
            bodies.map(|lines| lines.unwrap_or_default().join("\n").trim().to_string());
        Ok(CoverLetter {
            motivation,
            strengths_weaknesses,
            competency,
            future_commitment,
        })
    }

    pub fn render(&self) -> String {
        LetterSection::ALL
            .into_iter()
            .map(|s| format!("[{}]\n{}", s.title(), self.section(s)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Takes `targets` from `revised` and every other section verbatim from `self`.
    /// An empty target list means the whole letter was revised.
    pub fn refined_with(&self, revised: &CoverLetter, targets: &[LetterSection]) -> CoverLetter {
        if targets.is_empty() {
            return revised.clone();
        }
        let mut merged = self.clone();
        for section in targets {
            *merged.section_mut(*section) = revised.section(*section).to_string();
        }
        merged
    }
}

fn section_index(section: LetterSection) -> usize {
    match section {
        LetterSection::Motivation => 0,
        LetterSection::StrengthsWeaknesses => 1,
        LetterSection::Competency => 2,
        LetterSection::FutureCommitment => 3,
    }
}

/// Recognises heading lines such as `[지원 동기]`, `1. 직무 역량` or `## 입사 후 포부`.
fn section_from_heading(line: &str) -> Option<LetterSection> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 40 {
        return None;
    }
    let normalized: String = trimmed
        .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '#' | '*' | ' '))
        .chars()
        .filter(|c| {
            !c.is_whitespace() && !matches!(c, '[' | ']' | '*' | ':' | '#' | '_' | '-' | '/')
        })
        .collect::<String>()
        .to_lowercase();
    LetterSection::ALL
        .into_iter()
        .find(|section| section.aliases().iter().any(|alias| normalized == *alias))
}
