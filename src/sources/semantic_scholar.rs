//! Citation aggregator adapter (Semantic Scholar, spec §4.C). Has its
//! own `publicationTypes` classification, distinct from the shared
//! pub-type cascade, falling back to title classification.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::classify::classify_by_title;
use crate::entities::{EvidenceLevel, Record, Source};
use crate::error::AppError;

pub const API: &str = "s2";
const BASE_ENV: &str = "AGGREGATOR_S2_BASE";
const DEFAULT_BASE: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const FIELDS: &str = "title,year,authors,venue,publicationTypes,externalIds,citationCount";

#[derive(Clone)]
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    #[serde(default)]
    authors: Vec<Author>,
    venue: Option<String>,
    #[serde(default, rename = "publicationTypes")]
    publication_types: Vec<String>,
    #[serde(rename = "externalIds")]
    external_ids: Option<ExternalIds>,
    #[serde(rename = "citationCount")]
    citation_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

impl SemanticScholarClient {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            client: super::shared_client()?,
            base: crate::config::env_base(DEFAULT_BASE, BASE_ENV),
        })
    }

    #[cfg(test)]
    fn new_for_test(base: String) -> Result<Self, AppError> {
        Ok(Self {
            client: super::shared_client()?,
            base,
        })
    }

    pub async fn search(&self, query_text: &str) -> Result<Vec<Record>, AppError> {
        let req = self.client.get(&self.base).query(&[
            ("query", query_text),
            ("fields", FIELDS),
            ("limit", "50"),
        ]);

        let resp = req.send().await.map_err(AppError::from)?;
        if resp.status().as_u16() == 429 {
            return Ok(Vec::new());
        }
        let status = resp.status();
        let bytes = super::read_limited_body(resp, API).await?;
        if !status.is_success() {
            return Err(AppError::Api {
                api: API.to_string(),
                message: format!("HTTP {status}: {}", super::body_excerpt(&bytes)),
            });
        }
        let parsed: SearchResponse = serde_json::from_slice(&bytes).map_err(|source| AppError::ApiJson {
            api: API.to_string(),
            source,
        })?;

        Ok(parsed.data.iter().filter_map(parse_paper).collect())
    }
}

/// `metaanalysis|meta-analysis` -> sr_ma; `review` + title matches
/// `/systematic/i` -> sr_ma; `clinicaltrial|clinical trial` ->
/// clinical_trial; `casereport|case report` -> case_report; `review` ->
/// review; else title-based.
fn classify(publication_types: &[String], title: &str) -> EvidenceLevel {
    let lowered: Vec<String> = publication_types.iter().map(|t| t.to_lowercase()).collect();
    let any = |needles: &[&str]| lowered.iter().any(|t| needles.iter().any(|n| t.contains(n)));

    if any(&["metaanalysis", "meta-analysis"]) {
        return EvidenceLevel::SrMa;
    }
    if any(&["review"]) && title.to_lowercase().contains("systematic") {
        return EvidenceLevel::SrMa;
    }
    if any(&["clinicaltrial", "clinical trial"]) {
        return EvidenceLevel::ClinicalTrial;
    }
    if any(&["casereport", "case report"]) {
        return EvidenceLevel::CaseReport;
    }
    if any(&["review"]) {
        return EvidenceLevel::Review;
    }
    classify_by_title(title)
}

fn parse_paper(paper: &Paper) -> Option<Record> {
    let title = paper.title.as_deref().map(super::strip_tags).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let authors: Vec<String> = paper
        .authors
        .iter()
        .filter_map(|a| a.name.clone())
        .take(5)
        .collect();

    let doi = paper
        .external_ids
        .as_ref()
        .and_then(|ids| ids.doi.as_deref())
        .and_then(Record::normalize_doi);

    let evidence_level = classify(&paper.publication_types, &title);
    let pub_types: BTreeSet<String> = paper.publication_types.iter().cloned().collect();

    let url = doi.as_deref().map(Record::doi_url).or_else(|| {
        paper
            .paper_id
            .as_deref()
            .map(|id| format!("https://www.semanticscholar.org/paper/{id}"))
    });

    Some(Record {
        id: paper.paper_id.clone().unwrap_or_else(|| title.clone()),
        title,
        authors,
        journal: paper.venue.clone(),
        year: paper.year,
        pub_types,
        evidence_level,
        doi,
        url,
        source: Source::SemanticScholar,
        found_in: vec![Source::SemanticScholar],
        citations: paper.citation_count,
        language: None,
        is_patient_voice: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn classify_prefers_meta_analysis_over_review() {
        let types = vec!["Review".to_string(), "Meta-Analysis".to_string()];
        assert_eq!(classify(&types, "any title"), EvidenceLevel::SrMa);
    }

    #[test]
    fn classify_upgrades_review_to_sr_ma_when_title_says_systematic() {
        let types = vec!["Review".to_string()];
        assert_eq!(
            classify(&types, "A systematic review of stroke rehab"),
            EvidenceLevel::SrMa
        );
        assert_eq!(
            classify(&types, "A narrative review of stroke rehab"),
            EvidenceLevel::Review
        );
    }

    #[test]
    fn classify_falls_back_to_title_when_no_publication_types() {
        assert_eq!(
            classify(&[], "a randomized controlled trial of aspirin"),
            EvidenceLevel::Rct
        );
    }

    #[tokio::test]
    async fn search_returns_empty_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = SemanticScholarClient::new_for_test(format!("{}/", server.uri())).unwrap();
        let records = client.search("stroke").await.unwrap();
        assert!(records.is_empty());
    }
}
