//! API client for a running girth-server

use anyhow::{Context, Result};
use girth_core::{FeatureImportance, FeatureVector, InferenceStats, ModelInfo};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the prediction service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                anyhow::bail!("API error ({}): {} [{}]", status, err.error, err.code);
            }
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, features: &FeatureVector) -> Result<PredictResponse> {
        self.post("api/v1/predict", features).await
    }

    pub async fn importances(&self) -> Result<ImportancesResponse> {
        self.get("api/v1/importances").await
    }

    pub async fn about(&self) -> Result<AboutResponse> {
        self.get("api/v1/about").await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label: String,
    pub girth_cm: f64,
    pub display: String,
    pub predicted_log: f64,
    pub model: String,
    pub model_version: String,
    pub generated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportancesResponse {
    pub title: String,
    pub axis_label: String,
    pub features: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutResponse {
    pub description: String,
    pub model: ModelInfo,
    /// Absent when describing a locally loaded model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<InferenceStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
