//! Evidence Classifier (spec §4.D): maps publication-type metadata, or
//! failing that a title string, to one of eight `EvidenceLevel`s.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::entities::EvidenceLevel;

/// `classifyPubType`: scans lowercased raw types in fixed priority.
pub fn classify_pub_type(pub_types: &BTreeSet<String>) -> EvidenceLevel {
    let lowered: Vec<String> = pub_types.iter().map(|t| t.to_lowercase()).collect();
    let any = |needle: &str| lowered.iter().any(|t| t.contains(needle));
    let eq = |needle: &str| lowered.iter().any(|t| t == needle);

    if any("practice guideline") || eq("guideline") {
        EvidenceLevel::Guideline
    } else if any("systematic review") {
        EvidenceLevel::SrMa
    } else if any("meta-analysis") {
        EvidenceLevel::SrMa
    } else if any("randomized controlled trial") {
        EvidenceLevel::Rct
    } else if any("clinical trial") {
        EvidenceLevel::ClinicalTrial
    } else if any("observational") || any("cohort") || any("case-control") {
        EvidenceLevel::Observational
    } else if any("case report") {
        EvidenceLevel::CaseReport
    } else if eq("review") {
        EvidenceLevel::Review
    } else {
        EvidenceLevel::Other
    }
}

/// One tier of the title cascade: evaluated in array order, first match
/// wins. Compiled once at first use.
struct Tier {
    level: EvidenceLevel,
    pattern: Regex,
}

fn tiers() -> &'static [Tier] {
    static TIERS: OnceLock<Vec<Tier>> = OnceLock::new();
    TIERS.get_or_init(|| {
        let spec: &[(EvidenceLevel, &str)] = &[
            (
                EvidenceLevel::Guideline,
                r"guideline|practice parameter|consensus statement|clinical recommendation|ガイドライン|推奨グレード",
            ),
            (
                EvidenceLevel::SrMa,
                r"systematic|meta[\s-]?analysis|umbrella review|scoping review|システマティック|メタアナリシス|メタ分析",
            ),
            (
                EvidenceLevel::Rct,
                r"randomiz|rct\b|controlled trial|ランダム化|無作為化?比較",
            ),
            (
                EvidenceLevel::ClinicalTrial,
                r"clinical trial|intervention study|pilot study|feasibility|臨床試験|介入研究|パイロット",
            ),
            (
                EvidenceLevel::Observational,
                r"cohort|cross[\s-]?sectional|case[\s-]?control|registry|retrospectiv|prospectiv|epidemiolog|prevalence|incidence|survey|longitudinal|コホート|観察研究|横断研究|前向き|後ろ向き|追跡調査|縦断|症例対照|レジストリ|有病率|発生率|アンケート|質問紙",
            ),
            (
                EvidenceLevel::CaseReport,
                r"case report|case series|症例報告|症例検討|一例|1例|一症例|経験例",
            ),
            (
                EvidenceLevel::Review,
                r"review|overview|narrative|レビュー|総説|文献的考察|文献検討",
            ),
            (
                EvidenceLevel::Observational,
                r"についての検討|に関する検討|の検討|因子の検討|要因.{0,4}検討|発生要因|に関する研究|に関する調査|の実態調査|解析|分析した|を分析|多変量|回帰|統計",
            ),
            (
                EvidenceLevel::Review,
                r"の現状と課題|現状と展望|の動向|の概要|の概説|の紹介|最新の|特集|考え方と実際|の実際",
            ),
            (
                EvidenceLevel::CaseReport,
                r"の報告|について報告|を報告|を経験",
            ),
            (
                EvidenceLevel::ClinicalTrial,
                r"efficacy|effectiveness|comparison|outcome|効果|有効性|比較検討|治療成績",
            ),
            (EvidenceLevel::Observational, r"影響|予後|関連|関与|相関|関係"),
        ];
        spec.iter()
            .map(|(level, pattern)| Tier {
                level: *level,
                pattern: Regex::new(pattern).expect("classifier tier pattern is valid"),
            })
            .collect()
    })
}

/// `classifyByTitle`: total (never panics/returns undefined), evaluated
/// in fixed priority order, first tier match wins. English patterns are
/// matched case-insensitively via lowercasing (which leaves Japanese
/// characters, which have no case, unaffected).
pub fn classify_by_title(title: &str) -> EvidenceLevel {
    let lowered = title.to_lowercase();
    for tier in tiers() {
        if tier.pattern.is_match(&lowered) {
            return tier.level;
        }
    }
    EvidenceLevel::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pub_type_guideline_wins_over_review() {
        let types: BTreeSet<String> = ["Practice Guideline".to_string(), "Review".to_string()]
            .into_iter()
            .collect();
        assert_eq!(classify_pub_type(&types), EvidenceLevel::Guideline);
    }

    #[test]
    fn pub_type_falls_through_to_other() {
        let types: BTreeSet<String> = ["Letter".to_string()].into_iter().collect();
        assert_eq!(classify_pub_type(&types), EvidenceLevel::Other);
    }

    #[test]
    fn title_cascade_is_total() {
        assert_eq!(classify_by_title("a completely unrelated title"), EvidenceLevel::Other);
    }

    #[test]
    fn title_tier8_recovers_japanese_observational_phrasing() {
        // S5: no explicit "cohort"/"case-control" label, idiomatic phrasing instead.
        assert_eq!(
            classify_by_title("高齢者における転倒の危険因子の検討"),
            EvidenceLevel::Observational
        );
    }

    #[test]
    fn title_cascade_priority_guideline_before_sr_ma() {
        assert_eq!(
            classify_by_title("Clinical practice guideline: a systematic review"),
            EvidenceLevel::Guideline
        );
    }

    #[test]
    fn title_cascade_tier11_is_last_among_latin_heuristics() {
        // "efficacy" alone (no higher-tier term) should land as clinical_trial.
        assert_eq!(
            classify_by_title("Efficacy of drug X in adults"),
            EvidenceLevel::ClinicalTrial
        );
    }

    #[test]
    fn adding_higher_tier_match_shifts_classification() {
        let base = "a study of outcomes in patients";
        let before = classify_by_title(base);
        assert_eq!(before, EvidenceLevel::ClinicalTrial);
        let with_rct = format!("a randomized controlled trial of outcomes in patients: {base}");
        assert_eq!(classify_by_title(&with_rct), EvidenceLevel::Rct);
    }

    #[test]
    fn japanese_case_report_tier10() {
        assert_eq!(
            classify_by_title("特発性肺線維症の一例を経験した"),
            EvidenceLevel::CaseReport
        );
    }
}
