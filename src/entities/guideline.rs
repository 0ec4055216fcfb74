use serde::{Deserialize, Serialize};

use super::record::EvidenceLevel;

/// A national clinical-practice guideline. Read-only static data, built
/// once at process start from `crate::data::guidelines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guideline {
    pub id: String,
    pub title: String,
    #[serde(rename = "titleEn", skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    pub org: String,
    pub url: String,
    pub cat: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub year: i32,
    pub diseases: Vec<String>,
}

fn default_country() -> String {
    "JP".to_string()
}

/// A clinical question extracted from a guideline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalQuestion {
    pub gid: String,
    pub cq: String,
    pub q: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rec: String,
    pub ev: EvidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i32>,
    pub kw: Vec<String>,
}

/// A Guideline scored and matched against a query, as returned in
/// `nationalGuidelines`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredGuideline {
    #[serde(flatten)]
    pub guideline: Guideline,
    pub score: i64,
}

/// A ClinicalQuestion scored and matched against a query, as returned in
/// `clinicalQuestions`, with the parent guideline's display fields
/// attached when available.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredClinicalQuestion {
    #[serde(flatten)]
    pub cq: ClinicalQuestion,
    pub score: i64,
    #[serde(rename = "guidelineTitle", skip_serializing_if = "Option::is_none")]
    pub guideline_title: Option<String>,
    #[serde(rename = "guidelineOrg", skip_serializing_if = "Option::is_none")]
    pub guideline_org: Option<String>,
    #[serde(rename = "guidelineUrl", skip_serializing_if = "Option::is_none")]
    pub guideline_url: Option<String>,
}

/// One guideline and its clinical questions, as returned by `/api/cq/list`.
#[derive(Debug, Clone, Serialize)]
pub struct CqListGroup {
    #[serde(flatten)]
    pub guideline: Guideline,
    pub cqs: Vec<ClinicalQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CqListResponse {
    #[serde(rename = "totalGuidelines")]
    pub total_guidelines: usize,
    #[serde(rename = "totalCQs")]
    pub total_cqs: usize,
    pub groups: Vec<CqListGroup>,
}
