//! Language Detection & Translation (spec §4.B).

use std::time::Duration;

use serde_json::Value;

use crate::error::AppError;

const TRANSLATE_API: &str = "translate";
const TRANSLATE_BASE_ENV: &str = "AGGREGATOR_TRANSLATE_BASE";
const DEFAULT_TRANSLATE_BASE: &str = "https://translate.googleapis.com/translate_a/single";
const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(5);

/// `isJapanese(text)`: true iff any code point falls in a Japanese
/// Unicode range. A single matching character suffices.
pub fn is_japanese(text: &str) -> bool {
    text.chars().any(is_japanese_char)
}

fn is_japanese_char(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF // Katakana
        | 0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0x3300..=0x33FF // CJK Compatibility
        | 0xF900..=0xFAFF // CJK Compatibility Ideographs
    )
}

#[derive(Clone)]
pub struct Translator {
    client: reqwest::Client,
    base: String,
}

impl Translator {
    pub fn new(client: reqwest::Client) -> Self {
        let base = crate::config::env_base(DEFAULT_TRANSLATE_BASE, TRANSLATE_BASE_ENV);
        Self { client, base }
    }

    /// `translate(text, src, tgt)`: GET with a 5s deadline. Returns
    /// `None` (the "absent" sentinel) on any network/timeout/parse
    /// failure, on an empty translation, or when the translation is
    /// case-insensitively identical to the input. Never raises.
    pub async fn translate(&self, text: &str, src: &str, tgt: &str) -> Option<String> {
        match self.try_translate(text, src, tgt).await {
            Ok(translated) => translated,
            Err(err) => {
                tracing::debug!(error = %err, "translation failed, degrading to absent");
                None
            }
        }
    }

    async fn try_translate(
        &self,
        text: &str,
        src: &str,
        tgt: &str,
    ) -> Result<Option<String>, AppError> {
        let resp = tokio::time::timeout(
            TRANSLATE_TIMEOUT,
            self.client
                .get(&self.base)
                .query(&[
                    ("client", "gtx"),
                    ("sl", src),
                    ("tl", tgt),
                    ("dt", "t"),
                    ("q", text),
                ])
                .send(),
        )
        .await
        .map_err(|_| AppError::Api {
            api: TRANSLATE_API.to_string(),
            message: "translation request timed out".to_string(),
        })?
        .map_err(AppError::from)?;

        if !resp.status().is_success() {
            return Err(AppError::Api {
                api: TRANSLATE_API.to_string(),
                message: format!("HTTP {}", resp.status()),
            });
        }

        let body: Value = resp.json().await.map_err(AppError::from)?;
        let translated = extract_translation(&body);

        match translated {
            Some(value) if !value.is_empty() && !value.eq_ignore_ascii_case(text.trim()) => {
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }
}

/// Parses the first element of the response as a sequence of segment
/// tuples and concatenates `segment[0]` across all segments.
fn extract_translation(body: &Value) -> Option<String> {
    let segments = body.as_array()?.first()?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(chunk) = segment.as_array().and_then(|s| s.first()).and_then(Value::as_str) {
            out.push_str(chunk);
        }
    }
    let trimmed = out.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_japanese_detects_hiragana_katakana_kanji() {
        assert!(is_japanese("脳卒中"));
        assert!(is_japanese("リハビリテーション"));
        assert!(is_japanese("stroke rehabilitation 脳"));
        assert!(!is_japanese("stroke rehabilitation"));
    }

    #[test]
    fn is_japanese_single_char_suffices() {
        assert!(is_japanese("a脳b"));
    }

    #[test]
    fn extract_translation_concatenates_segments() {
        let body = serde_json::json!([
            [["stroke ", "脳卒中", null], ["rehabilitation", "リハビリテーション", null]]
        ]);
        assert_eq!(
            extract_translation(&body).as_deref(),
            Some("stroke rehabilitation")
        );
    }

    #[test]
    fn extract_translation_handles_missing_shape() {
        let body = serde_json::json!({});
        assert_eq!(extract_translation(&body), None);
    }
}
