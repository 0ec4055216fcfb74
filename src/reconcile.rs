//! Reconciler (spec §4.E): collapses records that describe the same
//! underlying article, regardless of which source(s) reported them.

use std::collections::BTreeMap;

use crate::entities::{Record, Source};

/// `dedupKey(r)`: DOI takes priority, then a normalized-title+year
/// fallback (guarded by a minimum length to avoid collisions on short
/// generic titles), then the adapter-scoped id as a last resort.
pub fn dedup_key(r: &Record) -> String {
    if let Some(doi) = r.doi.as_deref().and_then(Record::normalize_doi) {
        return format!("doi:{doi}");
    }
    let normalized = normalize_title(&r.title);
    if normalized.len() > 10 {
        let year = r.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string());
        return format!("t:{normalized}:{year}");
    }
    format!("id:{}", r.id)
}

/// Lowercases, drops everything outside word characters/whitespace/CJK,
/// collapses whitespace, trims.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = false;
    for c in lowered.chars() {
        let keep = c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_cjk(c);
        if keep {
            if c.is_whitespace() {
                if !last_was_space && !out.is_empty() {
                    out.push(' ');
                }
                last_was_space = true;
            } else {
                out.push(c);
                last_was_space = false;
            }
        }
    }
    out.trim_end().to_string()
}

fn is_cjk(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        0x3040..=0x309F | 0x30A0..=0x30FF | 0x4E00..=0x9FFF | 0x3300..=0x33FF | 0xF900..=0xFAFF
    )
}

/// Result of reconciling a batch of pre-merge records.
pub struct Reconciled {
    pub records: Vec<Record>,
    pub source_counts: BTreeMap<Source, u32>,
}

/// Merges colliding records in first-seen order. `records` is consumed
/// in the order tasks completed; order among non-colliding records is
/// therefore not guaranteed — the orchestrator re-sorts by year within
/// each evidence bucket afterward.
pub fn reconcile(records: Vec<Record>) -> Reconciled {
    let mut keys: Vec<String> = Vec::new();
    let mut merged: Vec<Record> = Vec::new();
    let mut index_of_key: BTreeMap<String, usize> = BTreeMap::new();
    let mut source_counts: BTreeMap<Source, u32> = BTreeMap::new();

    for incoming in records {
        let key = dedup_key(&incoming);
        match index_of_key.get(&key) {
            Some(&idx) => {
                merge_into(&mut merged[idx], incoming);
            }
            None => {
                *source_counts.entry(incoming.source).or_insert(0) += 1;
                index_of_key.insert(key.clone(), merged.len());
                keys.push(key);
                merged.push(incoming);
            }
        }
    }

    Reconciled {
        records: merged,
        source_counts,
    }
}

fn merge_into(existing: &mut Record, incoming: Record) {
    if incoming.evidence_level < existing.evidence_level {
        existing.evidence_level = incoming.evidence_level;
    }
    existing.citations = match (existing.citations, incoming.citations) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    };
    if existing.doi.is_none() {
        existing.doi = incoming.doi;
    }
    if existing.journal.is_none() {
        existing.journal = incoming.journal;
    }
    if existing.year.is_none() {
        existing.year = incoming.year;
    }
    if existing.language.is_none() {
        existing.language = incoming.language;
    }
    if incoming.authors.len() > existing.authors.len() {
        existing.authors = incoming.authors;
    }
    if let Some(incoming_url) = &incoming.url {
        let incoming_is_pubmed = Record::is_pubmed_url(incoming_url);
        let existing_is_pubmed = existing.url.as_deref().is_some_and(Record::is_pubmed_url);
        if incoming_is_pubmed && !existing_is_pubmed {
            existing.url = incoming.url.clone();
        }
    }
    existing.pub_types.extend(incoming.pub_types);
    for source in incoming.found_in {
        if !existing.found_in.contains(&source) {
            existing.found_in.push(source);
        }
    }
    existing.is_patient_voice = existing.is_patient_voice || incoming.is_patient_voice;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EvidenceLevel;

    fn base(id: &str, source: Source) -> Record {
        Record {
            id: id.to_string(),
            title: "Effect of exercise on stroke recovery outcomes".to_string(),
            authors: vec!["Smith J".to_string()],
            journal: None,
            year: Some(2020),
            pub_types: Default::default(),
            evidence_level: EvidenceLevel::Other,
            doi: Some("10.1/abc".to_string()),
            url: None,
            source,
            found_in: vec![source],
            citations: None,
            language: None,
            is_patient_voice: false,
        }
    }

    #[test]
    fn dedup_key_is_doi_based_and_case_insensitive() {
        let mut a = base("a", Source::Pubmed);
        a.doi = Some("https://doi.org/10.1/ABC".to_string());
        let mut b = base("b", Source::Jstage);
        b.doi = Some("10.1/abc".to_string());
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn dedup_key_falls_back_to_title_and_year_when_no_doi() {
        let mut a = base("a", Source::Pubmed);
        a.doi = None;
        let mut b = base("b", Source::Jstage);
        b.doi = None;
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn short_title_without_doi_falls_back_to_id() {
        let mut a = base("unique-1", Source::Pubmed);
        a.doi = None;
        a.title = "Falls".to_string();
        assert_eq!(dedup_key(&a), "id:unique-1");
    }

    #[test]
    fn merge_takes_better_evidence_level_max_citations_and_unions_found_in() {
        let mut rct = base("1", Source::Pubmed);
        rct.evidence_level = EvidenceLevel::Rct;
        rct.citations = Some(10);

        let mut review = base("2", Source::EuropePmc);
        review.evidence_level = EvidenceLevel::Review;
        review.citations = Some(50);

        let mut sr_ma = base("3", Source::Openalex);
        sr_ma.evidence_level = EvidenceLevel::SrMa;
        sr_ma.citations = Some(5);

        let result = reconcile(vec![rct, review, sr_ma]);
        assert_eq!(result.records.len(), 1);
        let merged = &result.records[0];
        assert_eq!(merged.evidence_level, EvidenceLevel::SrMa);
        assert_eq!(merged.citations, Some(50));
        assert_eq!(
            merged.found_in,
            vec![Source::Pubmed, Source::EuropePmc, Source::Openalex]
        );
        assert_eq!(result.source_counts.get(&Source::Pubmed), Some(&1));
        assert_eq!(result.source_counts.get(&Source::EuropePmc), None);
    }

    #[test]
    fn url_replaced_only_when_incoming_is_pubmed_and_existing_is_not() {
        let mut first = base("1", Source::Jstage);
        first.url = Some("https://jstage.jst.go.jp/article/1".to_string());

        let mut second = base("2", Source::Pubmed);
        second.url = Some("https://pubmed.ncbi.nlm.nih.gov/123/".to_string());

        let result = reconcile(vec![first, second]);
        assert_eq!(
            result.records[0].url.as_deref(),
            Some("https://pubmed.ncbi.nlm.nih.gov/123/")
        );
    }

    #[test]
    fn source_counts_sum_equals_result_count_with_no_collisions() {
        let records: Vec<Record> = Source::ALL
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut r = base(&format!("rec-{i}"), *s);
                r.doi = None;
                r.title = format!("Unique non-colliding title number {i} about rehabilitation");
                r
            })
            .collect();
        let result = reconcile(records);
        assert_eq!(result.records.len(), 6);
        let total: u32 = result.source_counts.values().sum();
        assert_eq!(total, 6);
    }
}
