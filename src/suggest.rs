//! Local autocomplete (spec §6 `/api/suggest`): a pure ranking over the
//! static corpus, no network calls.

use crate::entities::{ClinicalQuestion, Guideline};

const MAX_SUGGESTIONS: usize = 15;

/// Collects the candidate terms: every clinical-question keyword and
/// every guideline disease name, deduplicated case-insensitively.
pub fn corpus_terms(guidelines: &[Guideline], cqs: &[ClinicalQuestion]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut terms = Vec::new();
    for g in guidelines {
        for disease in &g.diseases {
            if seen.insert(disease.to_lowercase()) {
                terms.push(disease.clone());
            }
        }
    }
    for cq in cqs {
        for kw in &cq.kw {
            if seen.insert(kw.to_lowercase()) {
                terms.push(kw.clone());
            }
        }
    }
    terms
}

/// Prefix matches (case-insensitive) sort first, then the rest; within
/// each group, shorter terms sort first. Ties keep corpus order.
pub fn suggest(terms: &[String], q: &str) -> Vec<String> {
    let q_lower = q.to_lowercase();
    if q_lower.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(&String, bool)> = terms
        .iter()
        .filter(|t| t.to_lowercase().contains(&q_lower))
        .map(|t| (t, t.to_lowercase().starts_with(&q_lower)))
        .collect();

    matches.sort_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| a.0.chars().count().cmp(&b.0.chars().count()))
    });

    matches.into_iter().take(MAX_SUGGESTIONS).map(|(t, _)| t.clone()).collect()
}
