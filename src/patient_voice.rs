//! Patient-Voice Branch (spec §4.I): a second fan-out appending
//! qualitative-research results, tagged and capped separately from the
//! main result set.

use futures::future::BoxFuture;

use crate::entities::Record;
use crate::error::AppError;
use crate::orchestrator::AppContext;
use crate::reconcile::reconcile;

const CAP: usize = 30;

const PUBMED_QUALITATIVE_FILTER: &str = "qualitative research[pt] OR patient experience[tw] OR lived experience[tw] OR quality of life[tw] OR patient reported outcome[tw] OR patient perspective[tw]";

const ENGLISH_QUALITATIVE_TERMS: [&str; 4] = [
    "patient experience",
    "lived experience",
    "quality of life",
    "patient reported outcome",
];

const JAPANESE_QUALITATIVE_TERM: &str = "患者の語り";

fn qualitative_base_text<'a>(is_ja_query: bool, translation_succeeded: bool, original_joined: &'a str, translated_joined: &'a str) -> &'a str {
    if is_ja_query && translation_succeeded {
        translated_joined
    } else {
        original_joined
    }
}

fn build_pubmed_parts(base_text: &str) -> Vec<String> {
    vec![format!("({base_text})"), format!("({PUBMED_QUALITATIVE_FILTER})")]
}

fn build_epmc_query(base_text: &str) -> String {
    format!(
        "({base_text}) AND ({})",
        ENGLISH_QUALITATIVE_TERMS
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(" OR ")
    )
}

fn build_japanese_narrative_query(original_joined: &str) -> String {
    format!("{original_joined} {JAPANESE_QUALITATIVE_TERM}")
}

/// Runs the qualitative-research fan-out and reconciles it separately
/// from the main result set, tagging every record `isPatientVoice`.
pub async fn search(
    ctx: &AppContext,
    original_joined: &str,
    is_ja_query: bool,
    translation_succeeded: bool,
    translated_joined: &str,
) -> Vec<Record> {
    let base_text = qualitative_base_text(is_ja_query, translation_succeeded, original_joined, translated_joined);
    let pubmed_parts = build_pubmed_parts(base_text);
    let epmc_query = build_epmc_query(base_text);

    let pubmed = ctx.pubmed.clone();
    let epmc = ctx.epmc.clone();

    let mut tasks: Vec<BoxFuture<'static, Result<Vec<Record>, AppError>>> = vec![
        Box::pin(async move { pubmed.search(&pubmed_parts).await }),
        Box::pin(async move { epmc.search(&epmc_query).await }),
    ];

    if is_ja_query {
        let jstage_query = build_japanese_narrative_query(original_joined);
        let jstage = ctx.jstage.clone();
        tasks.push(Box::pin(async move { jstage.search(&jstage_query).await }));

        let cinii_query = build_japanese_narrative_query(original_joined);
        let cinii = ctx.cinii.clone();
        tasks.push(Box::pin(async move { cinii.search(&cinii_query).await }));
    }

    let outcomes = futures::future::join_all(tasks).await;
    let records: Vec<Record> = outcomes.into_iter().filter_map(Result::ok).flatten().collect();

    let mut reconciled = reconcile(records).records;
    for record in &mut reconciled {
        record.is_patient_voice = true;
    }
    reconciled.truncate(CAP);
    reconciled
}
