//! Japanese multidisciplinary index adapter (CiNii, spec §4.C). List
//! view carries no author data; DOI is picked out of a typed identifier
//! list.

use serde::Deserialize;

use crate::classify::classify_by_title;
use crate::entities::{Record, Source};
use crate::error::AppError;

pub const API: &str = "cinii";
const BASE_ENV: &str = "AGGREGATOR_CINII_BASE";
const DEFAULT_BASE: &str = "https://cir.nii.ac.jp/opensearch/articles";

#[derive(Clone)]
pub struct CiniiClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "@id")]
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "prism:publicationName")]
    publication_name: Option<String>,
    #[serde(rename = "prism:publicationDate")]
    publication_date: Option<String>,
    #[serde(default, rename = "dc:identifier")]
    dc_identifier: Vec<Identifier>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Identifier {
    #[serde(rename = "@type")]
    identifier_type: Option<String>,
    #[serde(rename = "@value")]
    value: Option<String>,
}

impl CiniiClient {
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
            ("q", query_text),
            ("format", "json"),
            ("count", "50"),
        ]);

        let parsed: SearchResponse = super::get_json(req, API).await?;

        Ok(parsed.items.iter().filter_map(parse_item).collect())
    }
}

fn parse_item(item: &Item) -> Option<Record> {
    let title = item.title.as_deref().map(super::strip_tags).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let doi = item
        .dc_identifier
        .iter()
        .find(|ident| ident.identifier_type.as_deref() == Some("cir:DOI"))
        .and_then(|ident| ident.value.as_deref())
        .and_then(Record::normalize_doi);

    let year = item
        .publication_date
        .as_deref()
        .and_then(|d| d.get(0..4))
        .and_then(|y| y.parse().ok());

    let evidence_level = classify_by_title(&title);
    let url = doi.as_deref().map(Record::doi_url).or_else(|| item.link.clone());

    Some(Record {
        id: item.id.clone().unwrap_or_else(|| title.clone()),
        title,
        authors: Vec::new(),
        journal: item.publication_name.clone(),
        year,
        pub_types: Default::default(),
        evidence_level,
        doi,
        url,
        source: Source::Cinii,
        found_in: vec![Source::Cinii],
        citations: None,
        language: Some("ja".to_string()),
        is_patient_voice: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_item_extracts_doi_from_typed_identifier() {
        let item = Item {
            id: Some("CI123".to_string()),
            title: Some("転倒の危険因子の検討".to_string()),
            publication_name: Some("日本リハビリテーション医学会誌".to_string()),
            publication_date: Some("2019-03-01".to_string()),
            dc_identifier: vec![
                Identifier { identifier_type: Some("cir:NDL_Bib_ID".to_string()), value: Some("000123".to_string()) },
                Identifier { identifier_type: Some("cir:DOI".to_string()), value: Some("10.1/CI".to_string()) },
            ],
            link: None,
        };
        let record = parse_item(&item).unwrap();
        assert_eq!(record.doi.as_deref(), Some("10.1/ci"));
        assert_eq!(record.year, Some(2019));
        assert!(record.authors.is_empty());
        assert_eq!(record.evidence_level, crate::entities::EvidenceLevel::Observational);
    }

    #[tokio::test]
    async fn search_surfaces_429_as_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = CiniiClient::new_for_test(format!("{}/", server.uri())).unwrap();
        let result = client.search("脳卒中").await;
        assert!(matches!(result, Err(AppError::Api { .. })));
    }
}
