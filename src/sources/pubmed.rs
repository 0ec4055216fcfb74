//! Primary biomed index adapter (PubMed E-utilities, spec §4.C).

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::classify::{classify_by_title, classify_pub_type};
use crate::entities::{Record, Source};
use crate::error::AppError;

pub const API: &str = "pubmed";
const BASE_ENV: &str = "AGGREGATOR_PUBMED_BASE";
const DEFAULT_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

#[derive(Clone)]
pub struct PubmedClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl PubmedClient {
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

    /// Searches with parts ANDed together, then fetches summaries for
    /// every id returned. A 429 here is a typed error, not an empty
    /// result — that treatment is reserved for the citation-aggregator
    /// source alone.
    pub async fn search(&self, parts: &[String]) -> Result<Vec<Record>, AppError> {
        let term = parts.join(" AND ");
        let search_url = format!("{}/esearch.fcgi", self.base.trim_end_matches('/'));
        let req = self.client.get(&search_url).query(&[
            ("db", "pubmed"),
            ("retmode", "json"),
            ("retmax", "50"),
            ("sort", "relevance"),
            ("term", term.as_str()),
        ]);

        let parsed: EsearchResponse = super::get_json(req, API).await?;

        if parsed.esearchresult.idlist.is_empty() {
            return Ok(Vec::new());
        }

        self.summarize(&parsed.esearchresult.idlist).await
    }

    async fn summarize(&self, ids: &[String]) -> Result<Vec<Record>, AppError> {
        let summary_url = format!("{}/esummary.fcgi", self.base.trim_end_matches('/'));
        let id_param = ids.join(",");
        let req = self.client.get(&summary_url).query(&[
            ("db", "pubmed"),
            ("retmode", "json"),
            ("id", id_param.as_str()),
        ]);

        let body: Value = super::get_json(req, API).await?;

        let Some(result) = body.get("result").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for id in ids {
            if let Some(doc) = result.get(id) {
                if let Some(record) = parse_summary_doc(id, doc) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

fn parse_summary_doc(pmid: &str, doc: &Value) -> Option<Record> {
    let raw_title = doc.get("title").and_then(Value::as_str).unwrap_or_default();
    let title = super::strip_tags(raw_title);
    if title.is_empty() {
        return None;
    }

    let authors: Vec<String> = doc
        .get("authors")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .take(5)
                .collect()
        })
        .unwrap_or_default();

    let journal = doc
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);

    let year = doc
        .get("pubdate")
        .and_then(Value::as_str)
        .and_then(extract_year);

    let pub_types: BTreeSet<String> = doc
        .get("pubtype")
        .and_then(Value::as_array)
        .map(|types| {
            types
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let doi = doc
        .get("articleids")
        .and_then(Value::as_array)
        .and_then(|ids| {
            ids.iter().find(|entry| {
                entry.get("idtype").and_then(Value::as_str) == Some("doi")
            })
        })
        .and_then(|entry| entry.get("value").and_then(Value::as_str))
        .and_then(Record::normalize_doi);

    let evidence_level = if pub_types.is_empty() {
        classify_by_title(&title)
    } else {
        classify_pub_type(&pub_types)
    };

    let url = Some(Record::pubmed_url(pmid));

    Some(Record {
        id: pmid.to_string(),
        title,
        authors,
        journal,
        year,
        pub_types,
        evidence_level,
        doi,
        url,
        source: Source::Pubmed,
        found_in: vec![Source::Pubmed],
        citations: None,
        language: None,
        is_patient_voice: false,
    })
}

fn extract_year(pubdate: &str) -> Option<i32> {
    let digits: Vec<char> = pubdate.chars().collect();
    for window_start in 0..digits.len().saturating_sub(3) {
        let window: String = digits[window_start..window_start + 4].iter().collect();
        if window.chars().all(|c| c.is_ascii_digit()) {
            return window.parse().ok();
        }
    }
    None
}
