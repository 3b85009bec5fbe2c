use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::app_config::ImageConfig;
use crate::errors::ProviderError;
use crate::providers::ImageGenerator;

/// Replicate prediction client for image models
#[derive(Debug, Clone)]
pub struct Replicate {
    /// HTTP client for API requests
    client: Client,
    /// API token, sent as a bearer token
    api_token: String,
    /// Endpoint, model and polling settings
    settings: ImageConfig,
}

/// Prediction creation request
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct PredictionInput<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

/// Prediction state as returned by create and poll
#[derive(Debug, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
}

impl Prediction {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    /// First output URL; models return either a string or a list
    pub fn first_output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        }
    }
}

impl Replicate {
    pub fn new(api_token: impl Into<String>, settings: ImageConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_token: api_token.into(),
            settings,
        }
    }

    /// Creation URL: pinned versions go through `/v1/predictions`
    pub fn predictions_url(&self) -> String {
        let base = self.settings.endpoint.trim_end_matches('/');
        if self.settings.version.trim().is_empty() {
            format!("{}/v1/models/{}/predictions", base, self.settings.model.trim())
        } else {
            format!("{}/v1/predictions", base)
        }
    }

    pub fn request_body<'a>(&'a self, prompt: &'a str, width: u32, height: u32) -> PredictionRequest<'a> {
        let version = self.settings.version.trim();
        PredictionRequest {
            version: (!version.is_empty()).then_some(version),
            input: PredictionInput { prompt, width, height },
        }
    }

    async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("Replicate API error ({}): {}", status, error_text);
        Err(ProviderError::from_status(status.as_u16(), error_text))
    }

    async fn parse(response: Response) -> Result<Prediction, ProviderError> {
        Self::check(response).await?
            .json::<Prediction>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Replicate prediction: {}", e)))
    }

    /// Poll until the prediction reaches a terminal state or the deadline passes
    async fn wait(&self, mut prediction: Prediction) -> Result<Prediction, ProviderError> {
        let deadline = Instant::now() + Duration::from_secs(self.settings.timeout_secs);
        let interval = Duration::from_millis(self.settings.poll_interval_ms.max(1));

        while !prediction.is_terminal() {
            if Instant::now() >= deadline {
                return Err(ProviderError::ConnectionError(format!(
                    "Replicate prediction {} still {} after {}s",
                    prediction.id, prediction.status, self.settings.timeout_secs
                )));
            }
            let Some(urls) = prediction.urls.as_ref() else {
                return Err(ProviderError::ParseError(format!(
                    "Replicate prediction {} has no polling URL",
                    prediction.id
                )));
            };
            let url = urls.get.clone();

            tokio::time::sleep(interval).await;
            debug!("Polling Replicate prediction {} ({})", prediction.id, prediction.status);
            let response = self.client.get(&url)
                .bearer_auth(&self.api_token)
                .send()
                .await?;
            prediction = Self::parse(response).await?;
        }

        Ok(prediction)
    }
}

#[async_trait]
impl ImageGenerator for Replicate {
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.post(self.predictions_url())
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&self.request_body(prompt, width, height))
            .send()
            .await?;

        let prediction = self.wait(Self::parse(response).await?).await?;
        if prediction.status != "succeeded" {
            let reason = prediction.error.map(|e| e.to_string()).unwrap_or_else(|| prediction.status.clone());
            warn!("Replicate prediction {} ended as {}", prediction.id, prediction.status);
            return Err(ProviderError::ApiError { status_code: 200, message: reason });
        }

        let url = prediction.first_output_url()
            .ok_or_else(|| ProviderError::ParseError(format!("Replicate prediction {} has no output", prediction.id)))?
            .to_string();

        let image = self.client.get(&url).send().await?;
        let image = Self::check(image).await?;
        let bytes = image.bytes().await?.to_vec();
        debug!("Downloaded {} byte image from {}", bytes.len(), url);
        Ok(bytes)
    }
}
