//! Illustrative seed set of national clinical-practice guidelines.

use crate::entities::Guideline;

pub fn guidelines() -> Vec<Guideline> {
    vec![
        Guideline {
            id: "GL001".to_string(),
            title: "脳卒中治療ガイドライン".to_string(),
            title_en: Some("Japanese Guidelines for the Management of Stroke".to_string()),
            org: "日本脳卒中学会".to_string(),
            url: "https://www.jsts.gr.jp/guideline.html".to_string(),
            cat: "circulatory".to_string(),
            country: "JP".to_string(),
            year: 2021,
            diseases: vec!["脳卒中".to_string(), "stroke".to_string(), "cerebrovascular accident".to_string()],
        },
        Guideline {
            id: "GL002".to_string(),
            title: "糖尿病診療ガイドライン".to_string(),
            title_en: Some("Clinical Practice Guideline for Diabetes".to_string()),
            org: "日本糖尿病学会".to_string(),
            url: "https://www.jds.or.jp/modules/en/index.php?content_id=44".to_string(),
            cat: "endocrine".to_string(),
            country: "JP".to_string(),
            year: 2022,
            diseases: vec!["糖尿病".to_string(), "diabetes".to_string(), "diabetes mellitus".to_string()],
        },
        Guideline {
            id: "GL003".to_string(),
            title: "変形性膝関節症診療ガイドライン".to_string(),
            title_en: Some("Clinical Practice Guideline for Knee Osteoarthritis".to_string()),
            org: "日本整形外科学会".to_string(),
            url: "https://www.joa.or.jp/public/guideline".to_string(),
            cat: "musculoskeletal".to_string(),
            country: "JP".to_string(),
            year: 2023,
            diseases: vec!["変形性膝関節症".to_string(), "knee osteoarthritis".to_string(), "knee OA".to_string()],
        },
        Guideline {
            id: "GL004".to_string(),
            title: "認知症疾患診療ガイドライン".to_string(),
            title_en: Some("Clinical Practice Guideline for Dementia".to_string()),
            org: "日本神経学会".to_string(),
            url: "https://www.neurology-jp.org/guidelinem/degl.html".to_string(),
            cat: "neurology".to_string(),
            country: "JP".to_string(),
            year: 2017,
            diseases: vec!["認知症".to_string(), "dementia".to_string()],
        },
        Guideline {
            id: "GL005".to_string(),
            title: "心不全診療ガイドライン".to_string(),
            title_en: Some("Guidelines for the Diagnosis and Treatment of Heart Failure".to_string()),
            org: "日本循環器学会".to_string(),
            url: "https://www.j-circ.or.jp/cms/wp-content/uploads/2021/03/JCS2021_Tsutsui.pdf".to_string(),
            cat: "circulatory".to_string(),
            country: "JP".to_string(),
            year: 2021,
            diseases: vec!["心不全".to_string(), "heart failure".to_string(), "cardiac failure".to_string()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_guidelines_have_unique_ids() {
        let gls = guidelines();
        let mut ids: Vec<&str> = gls.iter().map(|g| g.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), gls.len());
    }
}
