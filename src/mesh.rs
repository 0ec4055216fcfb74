//! MeSH lookup proxy (spec §6 `/api/mesh`). Supplemented per SPEC_FULL.md
//! §B: the endpoint is in scope even though the upstream MeSH service
//! itself is an external collaborator, same shape as `lang::Translator`.

use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

const MESH_API: &str = "mesh";
const MESH_BASE_ENV: &str = "AGGREGATOR_MESH_BASE";
const DEFAULT_MESH_BASE: &str = "https://id.nlm.nih.gov/mesh/lookup/descriptor";
const MESH_TIMEOUT: Duration = Duration::from_secs(5);
const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Deserialize)]
struct MeshDescriptor {
    label: String,
}

#[derive(Clone)]
pub struct MeshClient {
    client: reqwest::Client,
    base: String,
}

impl MeshClient {
    pub fn new(client: reqwest::Client) -> Self {
        let base = crate::config::env_base(DEFAULT_MESH_BASE, MESH_BASE_ENV);
        Self { client, base }
    }

    /// Returns matching descriptor labels, or an empty vector on any
    /// failure (short query, network error, timeout, bad body). Never
    /// raises — the handler always has something to serialize.
    pub async fn lookup(&self, q: &str) -> Vec<String> {
        if q.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        match self.try_lookup(q).await {
            Ok(labels) => labels,
            Err(err) => {
                tracing::debug!(error = %err, "mesh lookup failed, degrading to empty");
                Vec::new()
            }
        }
    }

    async fn try_lookup(&self, q: &str) -> Result<Vec<String>, AppError> {
        let resp = tokio::time::timeout(
            MESH_TIMEOUT,
            self.client
                .get(&self.base)
                .query(&[("label", q), ("match", "contains"), ("limit", "15")])
                .send(),
        )
        .await
        .map_err(|_| AppError::Api {
            api: MESH_API.to_string(),
            message: "mesh lookup timed out".to_string(),
        })?
        .map_err(AppError::from)?;

        if !resp.status().is_success() {
            return Err(AppError::Api {
                api: MESH_API.to_string(),
                message: format!("HTTP {}", resp.status()),
            });
        }

        let descriptors: Vec<MeshDescriptor> = resp.json().await.map_err(AppError::from)?;
        Ok(descriptors.into_iter().map(|d| d.label).collect())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(base: String) -> MeshClient {
        MeshClient { client: reqwest::Client::new(), base }
    }

    #[tokio::test]
    async fn returns_labels_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "label": "Stroke" },
                { "label": "Stroke, Lacunar" }
            ])))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/", server.uri()));
        let labels = client.lookup("stroke").await;
        assert_eq!(labels, vec!["Stroke".to_string(), "Stroke, Lacunar".to_string()]);
    }

    #[tokio::test]
    async fn returns_empty_on_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(format!("{}/", server.uri()));
        assert!(client.lookup("stroke").await.is_empty());
    }

    #[tokio::test]
    async fn rejects_too_short_query_without_network_call() {
        let client = test_client("http://127.0.0.1:1".to_string());
        assert!(client.lookup("s").await.is_empty());
    }
}
