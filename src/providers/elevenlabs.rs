use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::app_config::ElevenLabsConfig;
use crate::errors::ProviderError;
use crate::providers::Synthesizer;

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct ElevenLabs {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent as `xi-api-key`
    api_key: String,
    /// Voice, model and endpoint settings
    settings: ElevenLabsConfig,
}

/// Text-to-speech request body
#[derive(Debug, Serialize)]
pub struct SpeechRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
pub struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabs {
    pub fn new(api_key: impl Into<String>, settings: ElevenLabsConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            settings,
        }
    }

    /// Full request URL including the output format query
    pub fn speech_url(&self) -> Result<Url, ProviderError> {
        let base = self.settings.endpoint.trim_end_matches('/');
        let url = format!("{}/v1/text-to-speech/{}", base, self.settings.voice_id.trim());
        Url::parse_with_params(&url, &[("output_format", self.settings.output_format.as_str())])
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid ElevenLabs URL {}: {}", url, e)))
    }

    pub fn request_body(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            model_id: self.settings.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: self.settings.stability,
                similarity_boost: self.settings.similarity_boost,
            },
        }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabs {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let url = self.speech_url()?;
        debug!("ElevenLabs speech request for {} chars", text.chars().count());

        let response = self.client.post(url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
