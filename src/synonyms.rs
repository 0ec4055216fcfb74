//! Synonym Index (spec §4.A): bidirectional equivalence classes over
//! medical terms, built once at process start from a static table and
//! read-only thereafter.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Static table of equivalence classes. Each inner slice is one class;
/// classes must be disjoint (enforced by `build`, which would otherwise
/// silently let a later class's keys shadow an earlier one — we assert
/// against that in tests instead of at runtime, since the table is
/// fixed and compiled in).
fn synonym_table() -> &'static [&'static [&'static str]] {
    &[
        &["stroke", "脳卒中", "cerebrovascular accident", "CVA"],
        &["rehabilitation", "リハビリテーション", "rehab"],
        &[
            "knee osteoarthritis",
            "変形性膝関節症",
            "knee OA",
            "gonarthrosis",
        ],
        &["diabetes", "糖尿病", "diabetes mellitus", "DM"],
        &["hypertension", "高血圧", "high blood pressure", "HTN"],
        &["myocardial infarction", "心筋梗塞", "heart attack", "MI"],
        &["pneumonia", "肺炎"],
        &["dementia", "認知症"],
        &["heart failure", "心不全", "cardiac failure", "HF"],
        &["chronic kidney disease", "慢性腎臓病", "CKD"],
        &["asthma", "喘息"],
        &["depression", "うつ病", "major depressive disorder", "MDD"],
        &["sepsis", "敗血症"],
        &["atrial fibrillation", "心房細動", "AF", "AFib"],
        &["osteoporosis", "骨粗鬆症"],
        &["falls", "転倒", "fall"],
        &["frailty", "フレイル"],
        &["cancer", "がん", "癌", "malignancy", "neoplasm"],
        &["palliative care", "緩和ケア"],
        &["delirium", "せん妄"],
    ]
}

/// Maps a lowercased term to its equivalence class (original casing
/// preserved). Process-lifetime, built once, read-only after that.
pub struct SynonymIndex {
    by_lower: HashMap<String, Arc<Vec<String>>>,
}

impl SynonymIndex {
    pub fn build() -> Self {
        let mut by_lower: HashMap<String, Arc<Vec<String>>> = HashMap::new();
        for class in synonym_table() {
            let members: Arc<Vec<String>> = Arc::new(class.iter().map(|s| s.to_string()).collect());
            for term in class.iter() {
                by_lower.insert(term.to_lowercase(), Arc::clone(&members));
            }
        }
        Self { by_lower }
    }

    /// Returns the equivalence class for a term, or empty if none.
    pub fn class_of(&self, term: &str) -> Vec<String> {
        self.by_lower
            .get(&term.to_lowercase())
            .map(|members| members.as_ref().clone())
            .unwrap_or_default()
    }

    /// `expand(terms)`: union of each input term and its class members.
    /// Deduplicated by lowercased identity; order is insertion order
    /// (not significant per spec, but kept deterministic for tests).
    pub fn expand(&self, terms: &[String]) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        let mut push = |term: &str| {
            let key = term.to_lowercase();
            if seen.insert(key) {
                out.push(term.to_string());
            }
        };

        for term in terms {
            push(term);
            if let Some(members) = self.by_lower.get(&term.to_lowercase()) {
                for member in members.iter() {
                    push(member);
                }
            }
        }
        out
    }
}
