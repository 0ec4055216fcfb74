//! Shared plumbing for the six bibliographic-source adapters: one
//! process-wide HTTP client, a uniform JSON-fetch helper, and the
//! regex-based tag stripping the design notes call for.

pub mod cinii;
pub mod europepmc;
pub mod jstage;
pub mod openalex;
pub mod pubmed;
pub mod semantic_scholar;

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Per-source deadline (spec §4.C/§5): every adapter call is bounded so
/// one slow upstream can't stall the whole fan-out past this.
pub const SOURCE_DEADLINE: Duration = Duration::from_secs(8);

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// The shared client, built once. Cloning `reqwest::Client` is cheap
/// (it's an `Arc` internally), so every adapter holds its own clone.
pub fn shared_client() -> Result<reqwest::Client, AppError> {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(SOURCE_DEADLINE)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("evidence-aggregator/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .build()
        .map_err(AppError::HttpClientInit)?;

    match CLIENT.set(client.clone()) {
        Ok(()) => Ok(client),
        Err(_) => CLIENT.get().cloned().ok_or_else(|| {
            AppError::Internal("shared HTTP client initialization race".to_string())
        }),
    }
}

/// Reads a response body capped at `MAX_BODY_BYTES`, to keep a
/// misbehaving upstream from exhausting memory.
pub async fn read_limited_body(resp: reqwest::Response, api: &str) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    let mut stream = resp;
    while let Some(chunk) = stream.chunk().await.map_err(AppError::from)? {
        if bytes.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(AppError::Api {
                api: api.to_string(),
                message: "response body exceeded size limit".to_string(),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// A short, log-safe preview of a response body for error messages.
pub fn body_excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.len() > 200 {
        format!("{}…", &trimmed[..200])
    } else {
        trimmed.to_string()
    }
}

/// Sends a GET request and decodes the JSON body, mapping any failure
/// to the per-source `AppError::Api`/`ApiJson` variants. Adapters treat
/// these uniformly: caught per-task by the orchestrator, never
/// escalated to the whole request.
pub async fn get_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    api: &str,
) -> Result<T, AppError> {
    let resp = req.send().await.map_err(AppError::from)?;
    let status = resp.status();
    let bytes = read_limited_body(resp, api).await?;
    if !status.is_success() {
        return Err(AppError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {}", body_excerpt(&bytes)),
        });
    }
    serde_json::from_slice(&bytes).map_err(|source| AppError::ApiJson {
        api: api.to_string(),
        source,
    })
}

/// Sends a GET request and returns the raw body text, for sources whose
/// response is XML/Atom rather than JSON (J-STAGE).
pub async fn get_text(req: reqwest::RequestBuilder, api: &str) -> Result<String, AppError> {
    let resp = req.send().await.map_err(AppError::from)?;
    let status = resp.status();
    let bytes = read_limited_body(resp, api).await?;
    if !status.is_success() {
        return Err(AppError::Api {
            api: api.to_string(),
            message: format!("HTTP {status}: {}", body_excerpt(&bytes)),
        });
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Design note: "remove all `<…>` spans, expand CDATA" — approximate by
/// design, not a real HTML/XML parser. Good enough for narrow,
/// predictable feeds (J-STAGE's Atom-like output, HTML-bearing titles).
pub fn strip_tags(input: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static CDATA: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));
    let cdata =
        CDATA.get_or_init(|| Regex::new(r"<!\[CDATA\[(.*?)\]\]>").expect("cdata regex is valid"));

    let expanded = cdata.replace_all(input, "$1");
    let stripped = tag.replace_all(&expanded, "");
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_removes_markup_and_expands_cdata() {
        assert_eq!(strip_tags("<b>Stroke</b> recovery"), "Stroke recovery");
        assert_eq!(
            strip_tags("<title><![CDATA[Knee OA trial]]></title>"),
            "Knee OA trial"
        );
    }

    #[test]
    fn body_excerpt_truncates_long_bodies() {
        let body = "x".repeat(500);
        let excerpt = body_excerpt(body.as_bytes());
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.len() < 210);
    }
}
