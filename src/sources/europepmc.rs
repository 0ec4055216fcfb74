//! European biomed index adapter (Europe PMC, spec §4.C). Uses the same
//! pub-type classification cascade as PubMed.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::classify::{classify_by_title, classify_pub_type};
use crate::entities::{Record, Source};
use crate::error::AppError;

pub const API: &str = "epmc";
const BASE_ENV: &str = "AGGREGATOR_EUROPEPMC_BASE";
const DEFAULT_BASE: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";

#[derive(Clone)]
pub struct EuropePmcClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultList")]
    result_list: ResultList,
}

#[derive(Debug, Deserialize)]
struct ResultList {
    #[serde(default)]
    result: Vec<ResultItem>,
}

#[derive(Debug, Deserialize)]
struct ResultItem {
    id: Option<String>,
    pmid: Option<String>,
    title: Option<String>,
    #[serde(rename = "authorString")]
    author_string: Option<String>,
    #[serde(rename = "journalTitle")]
    journal_title: Option<String>,
    #[serde(rename = "pubYear")]
    pub_year: Option<String>,
    doi: Option<String>,
    #[serde(rename = "pubTypeList")]
    pub_type_list: Option<PubTypeList>,
}

#[derive(Debug, Deserialize)]
struct PubTypeList {
    #[serde(default, rename = "pubType")]
    pub_type: Vec<String>,
}

impl EuropePmcClient {
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

    /// `query_text` may already contain AND/OR/parentheses (patient-voice
    /// branch builds a disjunction over qualitative-research terms).
    pub async fn search(&self, query_text: &str) -> Result<Vec<Record>, AppError> {
        let req = self.client.get(&self.base).query(&[
            ("query", query_text),
            ("format", "json"),
            ("pageSize", "25"),
        ]);

        let parsed: SearchResponse = super::get_json(req, API).await?;

        Ok(parsed
            .result_list
            .result
            .iter()
            .filter_map(parse_result_item)
            .collect())
    }
}

fn parse_result_item(item: &ResultItem) -> Option<Record> {
    let raw_title = item.title.as_deref().unwrap_or_default();
    let title = super::strip_tags(raw_title);
    if title.is_empty() {
        return None;
    }

    let authors: Vec<String> = item
        .author_string
        .as_deref()
        .map(|s| s.split(',').map(|a| a.trim().to_string()).filter(|a| !a.is_empty()).take(5).collect())
        .unwrap_or_default();

    let year = item.pub_year.as_deref().and_then(|y| y.parse().ok());
    let doi = item.doi.as_deref().and_then(Record::normalize_doi);

    let pub_types: BTreeSet<String> = item
        .pub_type_list
        .as_ref()
        .map(|list| list.pub_type.iter().cloned().collect())
        .unwrap_or_default();

    let evidence_level = if pub_types.is_empty() {
        classify_by_title(&title)
    } else {
        classify_pub_type(&pub_types)
    };

    let id = item
        .id
        .clone()
        .or_else(|| item.pmid.clone())
        .unwrap_or_else(|| title.clone());

    let url = item
        .pmid
        .as_deref()
        .map(Record::pubmed_url)
        .or_else(|| doi.as_deref().map(Record::doi_url));

    Some(Record {
        id,
        title,
        authors,
        journal: item.journal_title.clone(),
        year,
        pub_types,
        evidence_level,
        doi,
        url,
        source: Source::EuropePmc,
        found_in: vec![Source::EuropePmc],
        citations: None,
        language: None,
        is_patient_voice: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_result_item_prefers_pubmed_url_when_pmid_present() {
        let item = ResultItem {
            id: Some("EPMC123".to_string()),
            pmid: Some("999".to_string()),
            title: Some("Cohort study of knee OA outcomes".to_string()),
            author_string: Some("Smith J, Doe A".to_string()),
            journal_title: Some("J Orthop".to_string()),
            pub_year: Some("2022".to_string()),
            doi: Some("10.1/EPMC".to_string()),
            pub_type_list: None,
        };
        let record = parse_result_item(&item).unwrap();
        assert_eq!(record.url.as_deref(), Some("https://pubmed.ncbi.nlm.nih.gov/999/"));
        assert_eq!(record.evidence_level, crate::entities::EvidenceLevel::Observational);
        assert_eq!(record.authors, vec!["Smith J".to_string(), "Doe A".to_string()]);
    }

    #[tokio::test]
    async fn search_surfaces_429_as_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(format!("{}/", server.uri())).unwrap();
        let result = client.search("stroke AND rehabilitation").await;
        assert!(matches!(result, Err(AppError::Api { .. })));
    }

    #[tokio::test]
    async fn search_parses_result_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("query", "stroke"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resultList": { "result": [
                    {"id": "1", "title": "A review of stroke care", "pubYear": "2018"}
                ]}
            })))
            .mount(&server)
            .await;

        let client = EuropePmcClient::new_for_test(format!("{}/", server.uri())).unwrap();
        let records = client.search("stroke").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].evidence_level, crate::entities::EvidenceLevel::Review);
    }
}
