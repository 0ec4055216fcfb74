//! Local GL/CQ Scorer (spec §4.G): pure-computation relevance scoring
//! against the static Guideline/ClinicalQuestion corpora.

use crate::entities::{ClinicalQuestion, CqListGroup, CqListResponse, Guideline, ScoredClinicalQuestion, ScoredGuideline};

/// +10 exact lowercased match, +5 substring either direction, +3 title
/// substring containment. Summed across all query terms.
fn score_terms(terms: &[String], fields: &[&str], title: &str) -> i64 {
    let title_lower = title.to_lowercase();
    let mut score = 0i64;
    for term in terms {
        let term = term.to_lowercase();
        if term.is_empty() {
            continue;
        }
        for field in fields {
            let field = field.to_lowercase();
            if field == term {
                score += 10;
            } else if field.contains(&term) || term.contains(&field) {
                score += 5;
            }
        }
        if title_lower.contains(&term) {
            score += 3;
        }
    }
    score
}

/// `terms` = concatenation of already-expanded query parts and
/// translated parts, lowercased by the caller is not required — scoring
/// lowercases internally.
pub fn score_guidelines(guidelines: &[Guideline], terms: &[String]) -> Vec<ScoredGuideline> {
    let mut scored: Vec<ScoredGuideline> = guidelines
        .iter()
        .filter_map(|g| {
            let fields: Vec<&str> = g.diseases.iter().map(String::as_str).collect();
            let score = score_terms(terms, &fields, &g.title);
            (score > 0).then(|| ScoredGuideline {
                guideline: g.clone(),
                score,
            })
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score).then(b.guideline.year.cmp(&a.guideline.year)));
    scored
}

pub fn score_clinical_questions(
    cqs: &[ClinicalQuestion],
    guidelines: &[Guideline],
    terms: &[String],
) -> Vec<ScoredClinicalQuestion> {
    let mut scored: Vec<ScoredClinicalQuestion> = cqs
        .iter()
        .filter_map(|cq| {
            let fields: Vec<&str> = cq.kw.iter().map(String::as_str).collect();
            let score = score_terms(terms, &fields, &cq.q);
            if score <= 0 {
                return None;
            }
            let parent = guidelines.iter().find(|g| g.id == cq.gid);
            Some(ScoredClinicalQuestion {
                cq: cq.clone(),
                score,
                guideline_title: parent.map(|g| g.title.clone()),
                guideline_org: parent.map(|g| g.org.clone()),
                guideline_url: parent.map(|g| g.url.clone()),
            })
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| {
                let a_year = guidelines.iter().find(|g| g.id == a.cq.gid).map(|g| g.year).unwrap_or(0);
                let b_year = guidelines.iter().find(|g| g.id == b.cq.gid).map(|g| g.year).unwrap_or(0);
                b_year.cmp(&a_year)
            })
    });
    scored
}

/// `/api/cq/list`: browses the corpus grouped by guideline, optionally
/// filtered to one category. No scoring involved.
pub fn browse_clinical_questions(guidelines: &[Guideline], cqs: &[ClinicalQuestion], cat: Option<&str>) -> CqListResponse {
    let filtered_guidelines: Vec<&Guideline> = guidelines
        .iter()
        .filter(|g| cat.is_none_or(|c| g.cat == c))
        .collect();

    let groups: Vec<CqListGroup> = filtered_guidelines
        .iter()
        .map(|g| CqListGroup {
            guideline: (*g).clone(),
            cqs: cqs.iter().filter(|cq| cq.gid == g.id).cloned().collect(),
        })
        .collect();

    let total_cqs = groups.iter().map(|g| g.cqs.len()).sum();

    CqListResponse {
        total_guidelines: groups.len(),
        total_cqs,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EvidenceLevel;

    fn sample_guidelines() -> Vec<Guideline> {
        vec![
            Guideline {
                id: "GL001".to_string(),
                title: "脳卒中治療ガイドライン".to_string(),
                title_en: None,
                org: "Org A".to_string(),
                url: "https://a.example".to_string(),
                cat: "circulatory".to_string(),
                country: "JP".to_string(),
                year: 2021,
                diseases: vec!["脳卒中".to_string(), "stroke".to_string()],
            },
            Guideline {
                id: "GL002".to_string(),
                title: "高血圧治療ガイドライン".to_string(),
                title_en: None,
                org: "Org B".to_string(),
                url: "https://b.example".to_string(),
                cat: "circulatory".to_string(),
                country: "JP".to_string(),
                year: 2019,
                diseases: vec!["高血圧".to_string(), "hypertension".to_string()],
            },
        ]
    }

    #[test]
    fn exact_match_outranks_substring_match() {
        let terms = vec!["stroke".to_string()];
        let scored = score_guidelines(&sample_guidelines(), &terms);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].guideline.id, "GL001");
        assert!(scored[0].score >= 10);
    }

    #[test]
    fn zero_score_guidelines_are_excluded() {
        let terms = vec!["unrelated-term".to_string()];
        let scored = score_guidelines(&sample_guidelines(), &terms);
        assert!(scored.is_empty());
    }

    #[test]
    fn sorts_by_score_then_year_descending() {
        let terms = vec!["stroke".to_string(), "hypertension".to_string()];
        let scored = score_guidelines(&sample_guidelines(), &terms);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].score, scored[1].score);
        assert_eq!(scored[0].guideline.id, "GL001");
    }

    #[test]
    fn cq_scoring_attaches_parent_guideline_fields() {
        let cqs = vec![ClinicalQuestion {
            gid: "GL001".to_string(),
            cq: "CQ1".to_string(),
            q: "脳卒中患者へのリハビリ".to_string(),
            kind: "治療".to_string(),
            rec: "推奨する".to_string(),
            ev: EvidenceLevel::Rct,
            page: None,
            kw: vec!["脳卒中".to_string(), "rehabilitation".to_string()],
        }];
        let terms = vec!["脳卒中".to_string()];
        let scored = score_clinical_questions(&cqs, &sample_guidelines(), &terms);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].guideline_title.as_deref(), Some("脳卒中治療ガイドライン"));
        assert_eq!(scored[0].guideline_org.as_deref(), Some("Org A"));
    }

    #[test]
    fn browse_groups_cqs_under_their_guideline() {
        let cqs = vec![
            ClinicalQuestion {
                gid: "GL001".to_string(),
                cq: "CQ1".to_string(),
                q: "q1".to_string(),
                kind: "治療".to_string(),
                rec: "推奨する".to_string(),
                ev: EvidenceLevel::Rct,
                page: None,
                kw: vec![],
            },
            ClinicalQuestion {
                gid: "GL002".to_string(),
                cq: "CQ2".to_string(),
                q: "q2".to_string(),
                kind: "治療".to_string(),
                rec: "推奨する".to_string(),
                ev: EvidenceLevel::Rct,
                page: None,
                kw: vec![],
            },
        ];
        let browsed = browse_clinical_questions(&sample_guidelines(), &cqs, None);
        assert_eq!(browsed.total_guidelines, 2);
        assert_eq!(browsed.total_cqs, 2);
        assert_eq!(browsed.groups[0].cqs.len(), 1);
    }

    #[test]
    fn browse_filters_by_category() {
        let browsed = browse_clinical_questions(&sample_guidelines(), &[], Some("circulatory"));
        assert_eq!(browsed.total_guidelines, 2);
        let browsed_none = browse_clinical_questions(&sample_guidelines(), &[], Some("oncology"));
        assert_eq!(browsed_none.total_guidelines, 0);
    }
}
