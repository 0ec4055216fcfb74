//! Illustrative seed set of clinical questions attached to the
//! guidelines in [`super::guidelines`].

use crate::entities::{ClinicalQuestion, EvidenceLevel};

pub fn clinical_questions() -> Vec<ClinicalQuestion> {
    vec![
        ClinicalQuestion {
            gid: "GL001".to_string(),
            cq: "CQ1".to_string(),
            q: "急性期脳卒中患者に早期リハビリテーションは推奨されるか".to_string(),
            kind: "治療".to_string(),
            rec: "早期リハビリテーションの開始を強く推奨する".to_string(),
            ev: EvidenceLevel::Rct,
            page: Some(42),
            kw: vec![
                "脳卒中".to_string(),
                "リハビリテーション".to_string(),
                "早期".to_string(),
                "stroke".to_string(),
                "rehabilitation".to_string(),
            ],
        },
        ClinicalQuestion {
            gid: "GL002".to_string(),
            cq: "CQ3".to_string(),
            q: "2型糖尿病患者における運動療法の効果".to_string(),
            kind: "治療".to_string(),
            rec: "有酸素運動とレジスタンス運動の併用を推奨する".to_string(),
            ev: EvidenceLevel::SrMa,
            page: Some(88),
            kw: vec![
                "糖尿病".to_string(),
                "運動療法".to_string(),
                "diabetes".to_string(),
                "exercise".to_string(),
            ],
        },
        ClinicalQuestion {
            gid: "GL003".to_string(),
            cq: "CQ5".to_string(),
            q: "変形性膝関節症に対する運動療法は疼痛を軽減するか".to_string(),
            kind: "治療".to_string(),
            rec: "運動療法を実施することを推奨する".to_string(),
            ev: EvidenceLevel::SrMa,
            page: Some(55),
            kw: vec![
                "変形性膝関節症".to_string(),
                "運動療法".to_string(),
                "knee osteoarthritis".to_string(),
                "exercise therapy".to_string(),
            ],
        },
        ClinicalQuestion {
            gid: "GL004".to_string(),
            cq: "CQ2".to_string(),
            q: "軽度認知障害に対する運動介入は認知機能を改善するか".to_string(),
            kind: "治療".to_string(),
            rec: "運動介入を行うことを提案する".to_string(),
            ev: EvidenceLevel::Observational,
            page: Some(30),
            kw: vec![
                "認知症".to_string(),
                "軽度認知障害".to_string(),
                "運動".to_string(),
                "dementia".to_string(),
                "cognitive".to_string(),
            ],
        },
        ClinicalQuestion {
            gid: "GL005".to_string(),
            cq: "CQ4".to_string(),
            q: "慢性心不全患者に対する心臓リハビリテーションの効果".to_string(),
            kind: "治療".to_string(),
            rec: "心臓リハビリテーションへの参加を推奨する".to_string(),
            ev: EvidenceLevel::Rct,
            page: Some(61),
            kw: vec![
                "心不全".to_string(),
                "心臓リハビリテーション".to_string(),
                "heart failure".to_string(),
                "cardiac rehabilitation".to_string(),
            ],
        },
    ]
}
