//! Open scholarly graph adapter (OpenAlex, spec §4.C).

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::classify::classify_by_title;
use crate::entities::{EvidenceLevel, Record, Source};
use crate::error::AppError;

pub const API: &str = "openalex";
const BASE_ENV: &str = "AGGREGATOR_OPENALEX_BASE";
const DEFAULT_BASE: &str = "https://api.openalex.org/works";

#[derive(Clone)]
pub struct OpenAlexClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "publication_year")]
    publication_year: Option<i32>,
    #[serde(default)]
    authorships: Vec<Authorship>,
    #[serde(rename = "primary_location")]
    primary_location: Option<PrimaryLocation>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    doi: Option<String>,
    #[serde(rename = "cited_by_count")]
    cited_by_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<AuthorRef>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    #[serde(rename = "display_name")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrimaryLocation {
    source: Option<SourceRef>,
}

#[derive(Debug, Deserialize)]
struct SourceRef {
    #[serde(rename = "display_name")]
    display_name: Option<String>,
}

impl OpenAlexClient {
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
            ("search", query_text),
            ("per-page", "50"),
        ]);

        let parsed: SearchResponse = super::get_json(req, API).await?;

        Ok(parsed.results.iter().filter_map(parse_work).collect())
    }
}

/// If `type == "review"`, re-inspect the title for systematic/meta
/// patterns (English and Japanese) to upgrade to sr_ma; otherwise stays
/// review. Anything else defers to title-based classification.
fn classify(work_type: Option<&str>, title: &str) -> EvidenceLevel {
    match work_type {
        Some("review") => {
            let lowered = title.to_lowercase();
            if lowered.contains("systematic")
                || lowered.contains("meta-analysis")
                || lowered.contains("metaanalysis")
                || title.contains("システマティック")
                || title.contains("メタアナリシス")
                || title.contains("メタ分析")
            {
                EvidenceLevel::SrMa
            } else {
                EvidenceLevel::Review
            }
        }
        _ => classify_by_title(title),
    }
}

fn parse_work(work: &Work) -> Option<Record> {
    let title = work.title.as_deref().map(super::strip_tags).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let authors: Vec<String> = work
        .authorships
        .iter()
        .filter_map(|a| a.author.as_ref()?.display_name.clone())
        .take(5)
        .collect();

    let journal = work
        .primary_location
        .as_ref()
        .and_then(|loc| loc.source.as_ref())
        .and_then(|s| s.display_name.clone());

    let doi = work.doi.as_deref().and_then(Record::normalize_doi);
    let evidence_level = classify(work.work_type.as_deref(), &title);

    let mut pub_types = BTreeSet::new();
    if let Some(t) = &work.work_type {
        pub_types.insert(t.clone());
    }

    let id = work
        .id
        .clone()
        .unwrap_or_else(|| title.clone());

    let url = doi.as_deref().map(Record::doi_url);

    Some(Record {
        id,
        title,
        authors,
        journal,
        year: work.publication_year,
        pub_types,
        evidence_level,
        doi,
        url,
        source: Source::Openalex,
        found_in: vec![Source::Openalex],
        citations: work.cited_by_count,
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
    fn classify_upgrades_review_with_systematic_title() {
        assert_eq!(
            classify(Some("review"), "A systematic review of falls prevention"),
            EvidenceLevel::SrMa
        );
        assert_eq!(classify(Some("review"), "An overview of falls prevention"), EvidenceLevel::Review);
    }

    #[test]
    fn classify_upgrades_review_with_japanese_title() {
        assert_eq!(
            classify(Some("review"), "転倒予防に関するメタアナリシス"),
            EvidenceLevel::SrMa
        );
    }

    #[test]
    fn classify_defers_to_title_for_non_review_types() {
        assert_eq!(
            classify(Some("article"), "a randomized controlled trial of aspirin"),
            EvidenceLevel::Rct
        );
    }

    #[tokio::test]
    async fn search_surfaces_429_as_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = OpenAlexClient::new_for_test(format!("{}/", server.uri())).unwrap();
        let result = client.search("stroke").await;
        assert!(matches!(result, Err(AppError::Api { .. })));
    }
}
