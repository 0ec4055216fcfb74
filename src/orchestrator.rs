//! Search Orchestrator (spec §4.F): parses the incoming query, plans
//! which sources get which language variant of it, fans out
//! concurrently, and assembles the grouped response envelope.

use std::collections::{BTreeMap, HashMap};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::entities::{ClinicalQuestion, EvidenceLevel, Guideline, Record, ScoredClinicalQuestion, ScoredGuideline, Source};
use crate::error::AppError;
use crate::lang::{is_japanese, Translator};
use crate::mesh::MeshClient;
use crate::reconcile::reconcile;
use crate::sources::{cinii::CiniiClient, europepmc::EuropePmcClient, jstage::JstageClient, openalex::OpenAlexClient, pubmed::PubmedClient, semantic_scholar::SemanticScholarClient};
use crate::synonyms::SynonymIndex;

/// Everything an orchestration run needs: one client per source, the
/// translator, and the read-only indexes. Built once at startup and
/// shared behind an `Arc` across requests.
pub struct AppContext {
    pub pubmed: PubmedClient,
    pub jstage: JstageClient,
    pub s2: SemanticScholarClient,
    pub openalex: OpenAlexClient,
    pub cinii: CiniiClient,
    pub epmc: EuropePmcClient,
    pub translator: Translator,
    pub mesh: MeshClient,
    pub synonyms: SynonymIndex,
    pub guidelines: Vec<Guideline>,
    pub clinical_questions: Vec<ClinicalQuestion>,
}

impl AppContext {
    pub fn new() -> Result<Self, AppError> {
        let client = crate::sources::shared_client()?;
        Ok(Self {
            pubmed: PubmedClient::new()?,
            jstage: JstageClient::new()?,
            s2: SemanticScholarClient::new()?,
            openalex: OpenAlexClient::new()?,
            cinii: CiniiClient::new()?,
            epmc: EuropePmcClient::new()?,
            translator: Translator::new(client.clone()),
            mesh: MeshClient::new(client),
            synonyms: SynonymIndex::build(),
            guidelines: crate::data::guidelines(),
            clinical_questions: crate::data::clinical_questions(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub disease: Option<String>,
    pub treatment: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub multilingual: bool,
    #[serde(default, rename = "patientVoice")]
    pub patient_voice: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct GroupedResults {
    pub guideline: Vec<Record>,
    pub sr_ma: Vec<Record>,
    pub rct: Vec<Record>,
    pub clinical_trial: Vec<Record>,
    pub observational: Vec<Record>,
    pub case_report: Vec<Record>,
    pub review: Vec<Record>,
    pub other: Vec<Record>,
}

impl GroupedResults {
    fn bucket_mut(&mut self, level: EvidenceLevel) -> &mut Vec<Record> {
        match level {
            EvidenceLevel::Guideline => &mut self.guideline,
            EvidenceLevel::SrMa => &mut self.sr_ma,
            EvidenceLevel::Rct => &mut self.rct,
            EvidenceLevel::ClinicalTrial => &mut self.clinical_trial,
            EvidenceLevel::Observational => &mut self.observational,
            EvidenceLevel::CaseReport => &mut self.case_report,
            EvidenceLevel::Review => &mut self.review,
            EvidenceLevel::Other => &mut self.other,
        }
    }

    fn sort_each_bucket_by_year_desc(&mut self) {
        for level in EvidenceLevel::ALL_IN_DISPLAY_ORDER {
            self.bucket_mut(level).sort_by(|a, b| b.year.unwrap_or(0).cmp(&a.year.unwrap_or(0)));
        }
    }
}

fn group_by_evidence_level(records: Vec<Record>) -> GroupedResults {
    let mut grouped = GroupedResults::default();
    for record in records {
        grouped.bucket_mut(record.evidence_level).push(record);
    }
    grouped.sort_each_bucket_by_year_desc();
    grouped
}

#[derive(Debug, Serialize, Default)]
pub struct TranslatedParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MultilingualEnvelope {
    pub translated: TranslatedParts,
}

#[derive(Debug, Serialize, Default)]
pub struct SourcesEnvelope {
    pub errors: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multilingual: Option<MultilingualEnvelope>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    pub results: GroupedResults,
    #[serde(rename = "sourceCounts")]
    pub source_counts: BTreeMap<Source, u32>,
    #[serde(rename = "nationalGuidelines")]
    pub national_guidelines: Vec<ScoredGuideline>,
    #[serde(rename = "clinicalQuestions")]
    pub clinical_questions: Vec<ScoredClinicalQuestion>,
    pub sources: SourcesEnvelope,
    #[serde(rename = "patientVoice", skip_serializing_if = "Option::is_none")]
    pub patient_voice: Option<Vec<Record>>,
}

/// One named query part, tagged with which structured field (if any)
/// it came from, so translations can be re-attached to `disease` /
/// `treatment` / `topic` in the response envelope.
struct Part {
    text: String,
    field: Option<&'static str>,
}

fn collect_parts(query: &SearchQuery) -> Result<Vec<Part>, AppError> {
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(q.split_whitespace().map(|s| Part { text: s.to_string(), field: None }).collect());
    }

    let mut parts = Vec::new();
    if let Some(v) = query.disease.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(Part { text: v.to_string(), field: Some("disease") });
    }
    if let Some(v) = query.treatment.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(Part { text: v.to_string(), field: Some("treatment") });
    }
    if let Some(v) = query.topic.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(Part { text: v.to_string(), field: Some("topic") });
    }

    if parts.is_empty() {
        return Err(AppError::InvalidArgument(
            "at least one of q, disease, treatment, topic is required".to_string(),
        ));
    }
    Ok(parts)
}

type SourceTask = BoxFuture<'static, (Source, Result<Vec<Record>, AppError>)>;

/// Runs the full orchestration for one request.
pub async fn search(ctx: &AppContext, query: SearchQuery) -> Result<SearchResponse, AppError> {
    let parts = collect_parts(&query)?;
    let original_parts: Vec<String> = parts.iter().map(|p| p.text.clone()).collect();
    let original_joined = original_parts.join(" ");

    let expanded_parts = ctx.synonyms.expand(&original_parts);

    let is_ja_query = is_japanese(&original_joined);
    let needs_translation = query.multilingual || is_ja_query;

    let (src_lang, tgt_lang) = if is_ja_query { ("ja", "en") } else { ("en", "ja") };

    let mut translated_by_index: Vec<Option<String>> = vec![None; parts.len()];
    if needs_translation {
        let translations = futures::future::join_all(
            parts
                .iter()
                .map(|p| ctx.translator.translate(&p.text, src_lang, tgt_lang)),
        )
        .await;
        translated_by_index = translations;
    }

    let translated_parts: Vec<String> = translated_by_index.iter().filter_map(|t| t.clone()).collect();
    let translation_succeeded = needs_translation && !translated_parts.is_empty();
    let translated_joined = translated_parts.join(" ");

    let mut translated_fields = TranslatedParts::default();
    if query.multilingual {
        for (part, translated) in parts.iter().zip(translated_by_index.iter()) {
            if let (Some(field), Some(value)) = (part.field, translated) {
                match field {
                    "disease" => translated_fields.disease = Some(value.clone()),
                    "treatment" => translated_fields.treatment = Some(value.clone()),
                    "topic" => translated_fields.topic = Some(value.clone()),
                    _ => {}
                }
            }
        }
    }

    let tasks: Vec<SourceTask> = if is_ja_query && !query.multilingual && translation_succeeded {
        plan_japanese_bilingual(ctx, &translated_parts, &translated_joined, &original_joined)
    } else if query.multilingual && translation_succeeded {
        plan_multilingual_both(ctx, &original_parts, &original_joined, &translated_parts, &translated_joined)
    } else {
        plan_single(ctx, &original_parts, &original_joined)
    };

    let outcomes = futures::future::join_all(tasks).await;

    let mut all_records = Vec::new();
    let mut errors: HashMap<String, String> = HashMap::new();
    for (source, outcome) in outcomes {
        match outcome {
            Ok(records) => all_records.extend(records),
            Err(err) => {
                errors.entry(source.label().to_string()).or_insert_with(|| err.to_string());
            }
        }
    }

    let reconciled = reconcile(all_records);
    let total_count = reconciled.records.len();
    let results = group_by_evidence_level(reconciled.records);

    let scoring_terms: Vec<String> = expanded_parts
        .iter()
        .cloned()
        .chain(translated_parts.iter().cloned())
        .collect();

    let national_guidelines = crate::local_scorer::score_guidelines(&ctx.guidelines, &scoring_terms);
    let clinical_questions = crate::local_scorer::score_clinical_questions(
        &ctx.clinical_questions,
        &ctx.guidelines,
        &scoring_terms,
    );

    let patient_voice = if query.patient_voice {
        Some(
            crate::patient_voice::search(
                ctx,
                &original_joined,
                is_ja_query,
                translation_succeeded,
                &translated_joined,
            )
            .await,
        )
    } else {
        None
    };

    Ok(SearchResponse {
        query: original_parts,
        multilingual: query.multilingual.then_some(MultilingualEnvelope { translated: translated_fields }),
        total_count,
        results,
        source_counts: reconciled.source_counts,
        national_guidelines,
        clinical_questions,
        sources: SourcesEnvelope { errors },
        patient_voice,
    })
}

/// Plan 1 — Japanese query, non-multilingual, translation succeeded.
/// PubMed + S2 get the translated (English) form; J-STAGE and CiNii get
/// only the original Japanese form; OpenAlex and EPMC get both, to
/// widen coverage of bilingual records. 1+1+1+2+1+2 = 8 tasks.
fn plan_japanese_bilingual(
    ctx: &AppContext,
    translated_parts: &[String],
    translated_joined: &str,
    original_joined: &str,
) -> Vec<SourceTask> {
    let pubmed = ctx.pubmed.clone();
    let s2 = ctx.s2.clone();
    let jstage = ctx.jstage.clone();
    let openalex1 = ctx.openalex.clone();
    let openalex2 = ctx.openalex.clone();
    let cinii = ctx.cinii.clone();
    let epmc1 = ctx.epmc.clone();
    let epmc2 = ctx.epmc.clone();

    let translated_parts = translated_parts.to_vec();
    let translated_joined = translated_joined.to_string();
    let original_joined = original_joined.to_string();

    vec![
        Box::pin(async move { (Source::Pubmed, pubmed.search(&translated_parts).await) }),
        Box::pin({
            let q = translated_joined.clone();
            async move { (Source::SemanticScholar, s2.search(&q).await) }
        }),
        Box::pin({
            let q = original_joined.clone();
            async move { (Source::Jstage, jstage.search(&q).await) }
        }),
        Box::pin({
            let q = original_joined.clone();
            async move { (Source::Openalex, openalex1.search(&q).await) }
        }),
        Box::pin({
            let q = translated_joined.clone();
            async move { (Source::Openalex, openalex2.search(&q).await) }
        }),
        Box::pin({
            let q = original_joined.clone();
            async move { (Source::Cinii, cinii.search(&q).await) }
        }),
        Box::pin({
            let q = original_joined.clone();
            async move { (Source::EuropePmc, epmc1.search(&q).await) }
        }),
        Box::pin({
            let q = translated_joined.clone();
            async move { (Source::EuropePmc, epmc2.search(&q).await) }
        }),
    ]
}

/// Plan 2 — multilingual, translation succeeded: every source dispatched twice.
fn plan_multilingual_both(
    ctx: &AppContext,
    original_parts: &[String],
    original_joined: &str,
    translated_parts: &[String],
    translated_joined: &str,
) -> Vec<SourceTask> {
    let original_parts = original_parts.to_vec();
    let translated_parts = translated_parts.to_vec();
    let original_joined = original_joined.to_string();
    let translated_joined = translated_joined.to_string();

    let mut tasks: Vec<SourceTask> = Vec::with_capacity(12);

    let pubmed1 = ctx.pubmed.clone();
    let pubmed2 = ctx.pubmed.clone();
    tasks.push(Box::pin({
        let p = original_parts.clone();
        async move { (Source::Pubmed, pubmed1.search(&p).await) }
    }));
    tasks.push(Box::pin({
        let p = translated_parts.clone();
        async move { (Source::Pubmed, pubmed2.search(&p).await) }
    }));

    let jstage1 = ctx.jstage.clone();
    let jstage2 = ctx.jstage.clone();
    tasks.push(Box::pin({
        let q = original_joined.clone();
        async move { (Source::Jstage, jstage1.search(&q).await) }
    }));
    tasks.push(Box::pin({
        let q = translated_joined.clone();
        async move { (Source::Jstage, jstage2.search(&q).await) }
    }));

    let s2a = ctx.s2.clone();
    let s2b = ctx.s2.clone();
    tasks.push(Box::pin({
        let q = original_joined.clone();
        async move { (Source::SemanticScholar, s2a.search(&q).await) }
    }));
    tasks.push(Box::pin({
        let q = translated_joined.clone();
        async move { (Source::SemanticScholar, s2b.search(&q).await) }
    }));

    let openalex1 = ctx.openalex.clone();
    let openalex2 = ctx.openalex.clone();
    tasks.push(Box::pin({
        let q = original_joined.clone();
        async move { (Source::Openalex, openalex1.search(&q).await) }
    }));
    tasks.push(Box::pin({
        let q = translated_joined.clone();
        async move { (Source::Openalex, openalex2.search(&q).await) }
    }));

    let cinii1 = ctx.cinii.clone();
    let cinii2 = ctx.cinii.clone();
    tasks.push(Box::pin({
        let q = original_joined.clone();
        async move { (Source::Cinii, cinii1.search(&q).await) }
    }));
    tasks.push(Box::pin({
        let q = translated_joined.clone();
        async move { (Source::Cinii, cinii2.search(&q).await) }
    }));

    let epmc1 = ctx.epmc.clone();
    let epmc2 = ctx.epmc.clone();
    tasks.push(Box::pin({
        let q = original_joined.clone();
        async move { (Source::EuropePmc, epmc1.search(&q).await) }
    }));
    tasks.push(Box::pin({
        let q = translated_joined.clone();
        async move { (Source::EuropePmc, epmc2.search(&q).await) }
    }));

    tasks
}

/// Plan 3 — otherwise: every source dispatched once with the original parts/text.
fn plan_single(ctx: &AppContext, original_parts: &[String], original_joined: &str) -> Vec<SourceTask> {
    let pubmed = ctx.pubmed.clone();
    let jstage = ctx.jstage.clone();
    let s2 = ctx.s2.clone();
    let openalex = ctx.openalex.clone();
    let cinii = ctx.cinii.clone();
    let epmc = ctx.epmc.clone();

    let parts = original_parts.to_vec();
    let joined = original_joined.to_string();

    vec![
        Box::pin(async move { (Source::Pubmed, pubmed.search(&parts).await) }),
        Box::pin({
            let joined = joined.clone();
            async move { (Source::Jstage, jstage.search(&joined).await) }
        }),
        Box::pin({
            let joined = joined.clone();
            async move { (Source::SemanticScholar, s2.search(&joined).await) }
        }),
        Box::pin({
            let joined = joined.clone();
            async move { (Source::Openalex, openalex.search(&joined).await) }
        }),
        Box::pin({
            let joined = joined.clone();
            async move { (Source::Cinii, cinii.search(&joined).await) }
        }),
        Box::pin({
            let joined = joined.clone();
            async move { (Source::EuropePmc, epmc.search(&joined).await) }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_parts_splits_free_form_query_on_whitespace() {
        let query = SearchQuery {
            q: Some("stroke rehabilitation".to_string()),
            disease: None,
            treatment: None,
            topic: None,
            multilingual: false,
            patient_voice: false,
        };
        let parts = collect_parts(&query).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text, "stroke");
    }

    #[test]
    fn collect_parts_uses_structured_fields_when_q_is_absent() {
        let query = SearchQuery {
            q: None,
            disease: Some("knee osteoarthritis".to_string()),
            treatment: None,
            topic: None,
            multilingual: true,
            patient_voice: false,
        };
        let parts = collect_parts(&query).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text, "knee osteoarthritis");
        assert_eq!(parts[0].field, Some("disease"));
    }

    #[test]
    fn collect_parts_rejects_when_nothing_supplied() {
        let query = SearchQuery {
            q: None,
            disease: None,
            treatment: None,
            topic: None,
            multilingual: false,
            patient_voice: false,
        };
        assert!(collect_parts(&query).is_err());
    }

    #[test]
    fn grouped_results_sort_each_bucket_by_year_descending() {
        let mk = |year: Option<i32>, level: EvidenceLevel| Record {
            id: format!("{year:?}"),
            title: "t".to_string(),
            authors: vec![],
            journal: None,
            year,
            pub_types: Default::default(),
            evidence_level: level,
            doi: None,
            url: None,
            source: Source::Pubmed,
            found_in: vec![Source::Pubmed],
            citations: None,
            language: None,
            is_patient_voice: false,
        };
        let records = vec![
            mk(Some(2010), EvidenceLevel::Rct),
            mk(Some(2020), EvidenceLevel::Rct),
            mk(None, EvidenceLevel::Rct),
        ];
        let grouped = group_by_evidence_level(records);
        let years: Vec<Option<i32>> = grouped.rct.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2020), Some(2010), None]);
    }
}
