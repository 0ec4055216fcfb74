//! CQ-Evidence Endpoint (spec §4.H): turns a clinical-question's free
//! text into a handful of PubMed keywords, then a guideline/SR/MA/RCT
//! filtered search.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::entities::Record;
use crate::error::AppError;
use crate::lang::is_japanese;
use crate::orchestrator::AppContext;

const MAX_RESULTS: usize = 5;

const JAPANESE_STOP_LIST: &[&str] = &["患者", "対象", "効果", "推奨", "治療", "検討", "評価", "研究", "症例"];

const ENGLISH_STOP_LIST: &[&str] = &[
    "the", "a", "an", "of", "in", "on", "for", "with", "and", "or", "to", "is", "are", "be",
    "patients", "patient", "does", "do", "what", "which", "how",
];

/// A small curated JA→EN lexicon for common therapy terms, used only
/// when synonym-driven promotion (4.A) finds no match.
fn curated_lexicon(term: &str) -> Option<&'static str> {
    match term {
        "リハビリテーション" | "リハビリ" => Some("rehabilitation"),
        "運動療法" => Some("exercise therapy"),
        "薬物療法" => Some("pharmacotherapy"),
        "手術" | "外科手術" => Some("surgery"),
        "理学療法" => Some("physical therapy"),
        "作業療法" => Some("occupational therapy"),
        "予防" => Some("prevention"),
        "転倒" => Some("falls"),
        "認知機能" => Some("cognitive function"),
        _ => None,
    }
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:CQ|Q)\d+\s*[:：.．]?\s*").expect("prefix regex is valid"))
}

fn katakana_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[゠-ヿ]{2,}").expect("katakana regex is valid"))
}

fn kanji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[一-鿿]{2,}").expect("kanji regex is valid"))
}

fn latin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]{2,}").expect("latin regex is valid"))
}

fn strip_trailing_suffix(term: &str) -> String {
    for suffix in ["患者", "症例"] {
        if let Some(stripped) = term.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    term.to_string()
}

fn extract_japanese_terms(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut push = |term: String| {
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    };

    for m in katakana_re().find_iter(body) {
        push(m.as_str().to_string());
    }
    for m in kanji_re().find_iter(body) {
        let stripped = strip_trailing_suffix(m.as_str());
        if !JAPANESE_STOP_LIST.contains(&stripped.as_str()) {
            push(stripped);
        }
    }
    for m in latin_re().find_iter(body) {
        push(m.as_str().to_string());
    }

    out.truncate(3);
    out
}

fn extract_english_terms(body: &str) -> Vec<String> {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    let punct = PUNCT.get_or_init(|| Regex::new(r"[^\w\s]").expect("punctuation regex is valid"));
    let cleaned = punct.replace_all(body, "");

    cleaned
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty() && !ENGLISH_STOP_LIST.contains(&t.as_str()))
        .take(4)
        .collect()
}

/// Keyword extraction (spec §4.H). `kw`, if present, takes priority over
/// anything extracted from `q`.
pub fn extract_cq_keywords(q: &str, kw: Option<&str>, synonyms: &crate::synonyms::SynonymIndex) -> Vec<String> {
    if let Some(kw) = kw.map(str::trim).filter(|s| !s.is_empty()) {
        return kw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .take(4)
            .collect();
    }

    let body = prefix_re().replace(q.trim(), "").into_owned();

    if is_japanese(&body) {
        extract_japanese_terms(&body)
            .into_iter()
            .map(|term| promote_japanese_term(&term, synonyms))
            .collect()
    } else {
        extract_english_terms(&body)
    }
}

/// Synonym-driven promotion, falling back to the curated lexicon. A
/// term with no promotion is passed through unchanged (PubMed still
/// gets *some* signal from it, even untranslated).
fn promote_japanese_term(term: &str, synonyms: &crate::synonyms::SynonymIndex) -> String {
    let class = synonyms.class_of(term);
    if let Some(english) = class.iter().find(|t| t.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')) {
        return english.clone();
    }
    if let Some(english) = curated_lexicon(term) {
        return english.to_string();
    }
    term.to_string()
}

fn build_pubmed_query(keywords: &[String]) -> String {
    let terms = keywords.join(" AND ");
    format!("({terms}) AND (systematic review[pt] OR meta-analysis[pt] OR randomized controlled trial[pt])")
}

#[derive(Debug, Serialize)]
pub struct CqEvidenceResponse {
    pub results: Vec<Record>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

pub async fn evidence_for(ctx: &AppContext, q: &str, kw: Option<&str>) -> Result<CqEvidenceResponse, AppError> {
    let keywords = extract_cq_keywords(q, kw, &ctx.synonyms);
    if keywords.is_empty() {
        return Ok(CqEvidenceResponse { results: Vec::new(), keywords, query: None });
    }

    let pubmed_query = build_pubmed_query(&keywords);
    let mut results = ctx.pubmed.search(&[pubmed_query.clone()]).await?;
    results.truncate(MAX_RESULTS);

    Ok(CqEvidenceResponse { results, keywords, query: Some(pubmed_query) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::SynonymIndex;

    #[test]
    fn kw_param_takes_priority_over_extraction() {
        let synonyms = SynonymIndex::build();
        let keywords = extract_cq_keywords("CQ1: 何か", Some("stroke, rehabilitation, early"), &synonyms);
        assert_eq!(keywords, vec!["stroke".to_string(), "rehabilitation".to_string(), "early".to_string()]);
    }

    #[test]
    fn strips_cq_prefix() {
        let synonyms = SynonymIndex::build();
        let keywords = extract_cq_keywords("CQ12: Does early exercise help stroke patients?", None, &synonyms);
        assert!(keywords.contains(&"early".to_string()));
        assert!(!keywords.iter().any(|k| k.contains("cq12")));
    }

    #[test]
    fn japanese_extraction_promotes_known_terms() {
        let synonyms = SynonymIndex::build();
        let keywords = extract_cq_keywords("CQ3 脳卒中患者へのリハビリテーションは有効か", None, &synonyms);
        assert!(keywords.iter().any(|k| k.eq_ignore_ascii_case("stroke")), "{keywords:?}");
    }

    #[test]
    fn english_extraction_drops_stop_words_and_caps_at_four() {
        let synonyms = SynonymIndex::build();
        let keywords = extract_cq_keywords(
            "Q1 what is the effect of exercise therapy on falls in the elderly population",
            None,
            &synonyms,
        );
        assert!(keywords.len() <= 4);
        assert!(!keywords.contains(&"the".to_string()));
    }

    #[test]
    fn build_pubmed_query_adds_evidence_filter() {
        let query = build_pubmed_query(&["stroke".to_string(), "rehabilitation".to_string()]);
        assert_eq!(
            query,
            "(stroke AND rehabilitation) AND (systematic review[pt] OR meta-analysis[pt] OR randomized controlled trial[pt])"
        );
    }
}
