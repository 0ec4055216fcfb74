use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Evidence-level rank, best (0) to weakest fallback (7). Declaration order
/// *is* the rank order — `EvidenceLevel::Rct < EvidenceLevel::Review` holds
/// via the derived `Ord`, so the reconciler can just take `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceLevel {
    Guideline,
    SrMa,
    Rct,
    ClinicalTrial,
    Observational,
    CaseReport,
    Review,
    Other,
}

impl EvidenceLevel {
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub const ALL_IN_DISPLAY_ORDER: [EvidenceLevel; 8] = [
        EvidenceLevel::Guideline,
        EvidenceLevel::SrMa,
        EvidenceLevel::Rct,
        EvidenceLevel::ClinicalTrial,
        EvidenceLevel::Observational,
        EvidenceLevel::CaseReport,
        EvidenceLevel::Review,
        EvidenceLevel::Other,
    ];
}

/// Canonical adapter name. The string form is the key used in
/// `sourceCounts` and `sources.errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Pubmed,
    Jstage,
    #[serde(rename = "s2")]
    SemanticScholar,
    Openalex,
    Cinii,
    #[serde(rename = "epmc")]
    EuropePmc,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Pubmed => "pubmed",
            Source::Jstage => "jstage",
            Source::SemanticScholar => "s2",
            Source::Openalex => "openalex",
            Source::Cinii => "cinii",
            Source::EuropePmc => "epmc",
        }
    }

    pub const ALL: [Source; 6] = [
        Source::Pubmed,
        Source::Jstage,
        Source::SemanticScholar,
        Source::Openalex,
        Source::Cinii,
        Source::EuropePmc,
    ];
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The unified bibliographic item. Normalized from six different
/// JSON/XML response shapes by the source adapters, then merged across
/// sources by the reconciler.
///
/// Invariant: `source` is always a member of `found_in`; `found_in` is an
/// ordered set (first-insertion order preserved, no duplicates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    /// At most 5 entries.
    pub authors: Vec<String>,
    pub journal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "pubTypes")]
    pub pub_types: BTreeSet<String>,
    #[serde(rename = "evidenceLevel")]
    pub evidence_level: EvidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: Source,
    #[serde(rename = "foundIn")]
    pub found_in: Vec<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "isPatientVoice", skip_serializing_if = "std::ops::Not::not")]
    pub is_patient_voice: bool,
}

impl Record {
    /// Strip the DOI of any `https?://doi.org/` prefix and lowercase it.
    pub fn normalize_doi(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let stripped = trimmed
            .trim_start_matches("https://doi.org/")
            .trim_start_matches("http://doi.org/")
            .trim_start_matches("doi.org/");
        let lowered = stripped.trim().to_lowercase();
        if lowered.is_empty() { None } else { Some(lowered) }
    }

    pub fn is_pubmed_url(url: &str) -> bool {
        url.contains("pubmed.ncbi.nlm.nih.gov")
    }

    pub fn pubmed_url(pmid: &str) -> String {
        format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
    }

    pub fn doi_url(doi: &str) -> String {
        format!("https://doi.org/{doi}")
    }
}
