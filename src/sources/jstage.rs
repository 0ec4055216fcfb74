//! Japanese full-text index adapter (J-STAGE, spec §4.C). The feed is
//! Atom-like XML, parsed here by regex rather than a real XML parser:
//! the feeds are narrow and predictable enough that this holds up.

use std::sync::OnceLock;

use regex::Regex;

use crate::classify::classify_by_title;
use crate::entities::{Record, Source};
use crate::error::AppError;

pub const API: &str = "jstage";
const BASE_ENV: &str = "AGGREGATOR_JSTAGE_BASE";
const DEFAULT_BASE: &str = "https://api.jstage.jst.go.jp/searchapi/do/searchCrossGetSimple";

#[derive(Clone)]
pub struct JstageClient {
    client: reqwest::Client,
    base: String,
}

impl JstageClient {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            client: super::shared_client()?,
            base: crate::config::env_base(DEFAULT_BASE, BASE_ENV),
        })
    }

    #[cfg(test)]
    fn new_for_test(base: String) -> Result<Self, AppError> {
        Ok(Self {
            client: super::shared_client()?,
            base,
        })
    }

    pub async fn search(&self, query_text: &str) -> Result<Vec<Record>, AppError> {
        let req = self.client.get(&self.base).query(&[
            ("text", query_text),
            ("count", "50"),
        ]);

        let xml = super::get_text(req, API).await?;
        Ok(parse_feed(&xml))
    }
}

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>").expect("entry regex is valid"))
}

fn tag_lang_re(tag: &str, lang: &str) -> Regex {
    Regex::new(&format!(
        r#"(?s)<{tag}[^>]*lang="{lang}"[^>]*>(.*?)</{tag}>"#
    ))
    .expect("tag-lang regex is valid")
}

fn tag_re(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>")).expect("tag regex is valid")
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<link[^>]*href="([^"]+)"[^>]*/?>"#).expect("href regex is valid"))
}

fn extract_tagged(block: &str, tag: &str) -> Option<String> {
    let ja = tag_lang_re(tag, "ja").captures(block).map(|c| c[1].to_string());
    let en = tag_lang_re(tag, "en").captures(block).map(|c| c[1].to_string());
    let plain = tag_re(tag).captures(block).map(|c| c[1].to_string());
    let chosen = ja.or(en).or(plain)?;
    let stripped = super::strip_tags(&chosen);
    if stripped.is_empty() { None } else { Some(stripped) }
}

/// `article_title/ja` preferring Japanese over the bottom `<title>`.
fn extract_title(block: &str) -> Option<String> {
    extract_tagged(block, "article_title").or_else(|| extract_tagged(block, "title"))
}

/// `article_link/ja` then `/en` then a bare `<link href=…>` attribute.
fn extract_link(block: &str) -> Option<String> {
    if let Some(v) = tag_lang_re("article_link", "ja").captures(block).map(|c| c[1].trim().to_string()) {
        return Some(v);
    }
    if let Some(v) = tag_lang_re("article_link", "en").captures(block).map(|c| c[1].trim().to_string()) {
        return Some(v);
    }
    href_re().captures(block).map(|c| c[1].to_string())
}

fn extract_authors(block: &str) -> Vec<String> {
    static AUTHOR_BLOCK: OnceLock<Regex> = OnceLock::new();
    let author_block_re = AUTHOR_BLOCK
        .get_or_init(|| Regex::new(r"(?s)<author>(.*?)</author>").expect("author regex is valid"));

    author_block_re
        .captures_iter(block)
        .filter_map(|c| extract_tagged(&c[1], "name"))
        .take(5)
        .collect()
}

fn extract_journal(block: &str) -> Option<String> {
    extract_tagged(block, "material_title")
        .or_else(|| tag_re("prism:publicationName").captures(block).map(|c| super::strip_tags(&c[1])))
}

fn extract_year(block: &str) -> Option<i32> {
    tag_re("pubyear").captures(block).and_then(|c| c[1].trim().parse().ok())
}

fn extract_doi(block: &str) -> Option<String> {
    tag_re("prism:doi")
        .captures(block)
        .map(|c| c[1].trim().to_string())
        .and_then(|d| Record::normalize_doi(&d))
}

fn parse_feed(xml: &str) -> Vec<Record> {
    let mut records = Vec::new();
    for entry_match in entry_re().captures_iter(xml) {
        let block = &entry_match[1];
        let Some(title) = extract_title(block) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let url = extract_link(block);
        let evidence_level = classify_by_title(&title);

        records.push(Record {
            id: url.clone().unwrap_or_else(|| title.clone()),
            title,
            authors: extract_authors(block),
            journal: extract_journal(block),
            year: extract_year(block),
            pub_types: Default::default(),
            evidence_level,
            doi: extract_doi(block),
            url,
            source: Source::Jstage,
            found_in: vec![Source::Jstage],
            citations: None,
            language: Some("ja".to_string()),
            is_patient_voice: false,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_FEED: &str = r#"
        <feed>
          <entry>
            <article_title lang="ja">転倒の危険因子の検討</article_title>
            <article_title lang="en">A study of fall risk factors</article_title>
            <article_link lang="ja">https://jstage.jst.go.jp/article/ja/1</article_link>
            <author><name lang="ja">田中太郎</name></author>
            <author><name lang="ja">鈴木花子</name></author>
            <material_title lang="ja">日本老年医学会誌</material_title>
            <pubyear>2019</pubyear>
            <prism:doi>10.1/JSTAGE</prism:doi>
          </entry>
          <entry>
            <title></title>
          </entry>
        </feed>
    "#;

    #[test]
    fn parse_feed_extracts_japanese_fields_and_drops_empty_titles() {
        let records = parse_feed(SAMPLE_FEED);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "転倒の危険因子の検討");
        assert_eq!(r.authors, vec!["田中太郎".to_string(), "鈴木花子".to_string()]);
        assert_eq!(r.journal.as_deref(), Some("日本老年医学会誌"));
        assert_eq!(r.year, Some(2019));
        assert_eq!(r.doi.as_deref(), Some("10.1/jstage"));
        assert_eq!(r.url.as_deref(), Some("https://jstage.jst.go.jp/article/ja/1"));
        assert_eq!(r.evidence_level, crate::entities::EvidenceLevel::Observational);
    }

    #[test]
    fn extract_link_falls_back_to_bare_href() {
        let block = r#"<link href="https://jstage.jst.go.jp/bare" rel="alternate"/>"#;
        assert_eq!(extract_link(block).as_deref(), Some("https://jstage.jst.go.jp/bare"));
    }

    #[tokio::test]
    async fn search_surfaces_429_as_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = JstageClient::new_for_test(server.uri()).unwrap();
        let result = client.search("転倒").await;
        assert!(matches!(result, Err(AppError::Api { .. })));
    }
}
