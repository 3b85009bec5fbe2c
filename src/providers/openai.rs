use async_trait::async_trait;
use log::{debug, error};
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{GenerationOptions, Synthesizer, TextGenerator, Transcriber, Transcript};

/// OpenAI client for interacting with OpenAI API
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, including the version segment
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Forces a JSON object answer
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// May be null when the model refuses
    #[serde(default)]
    pub content: Option<String>,
}

/// Speech synthesis request
#[derive(Debug, Serialize)]
pub struct SpeechRequest {
    model: String,
    voice: String,
    input: String,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            response_format: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Request a JSON object answer
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat { format_type: "json_object".to_string() });
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() { "https://api.openai.com/v1" } else { &self.endpoint };
        format!("{}/{}", base.trim_end_matches('/'), path)
    }

    /// Map a non-success response onto a provider error
    async fn check(response: Response, what: &str) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("OpenAI {} error ({}): {}", what, status, error_text);
        Err(ProviderError::from_status(status.as_u16(), error_text))
    }

    /// Complete a chat request
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self.client.post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let response = Self::check(response, "chat").await?;
        response.json::<ChatResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI chat response: {}", e)))
    }

    /// Synthesize speech, returning MP3 bytes
    pub async fn speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.post(self.url("audio/speech"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let response = Self::check(response, "speech").await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Transcribe audio with word timestamps
    pub async fn transcription(&self, model: &str, audio: &[u8], file_name: &str) -> Result<Transcript, ProviderError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = multipart::Form::new()
            .text("model", model.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .part("file", part);

        let response = self.client.post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = Self::check(response, "transcription").await?;
        response.json::<Transcript>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI transcription: {}", e)))
    }

    /// Extract text from a chat response
    pub fn extract_text_from_response(response: &ChatResponse) -> Result<String, ProviderError> {
        response.choices.first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("OpenAI response contained no message content".to_string()))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        _ => "audio/mpeg",
    }
}

/// Chat completions as a `TextGenerator`
#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: OpenAI,
    model: String,
}

impl OpenAIChat {
    pub fn new(client: OpenAI, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl TextGenerator for OpenAIChat {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ProviderError> {
        let mut request = ChatRequest::new(&self.model)
            .add_message("user", prompt)
            .temperature(options.temperature);
        if options.json_response {
            request = request.json_object();
        }

        debug!("OpenAI chat request to {} ({} prompt chars)", self.model, prompt.chars().count());
        let response = self.client.chat(&request).await?;
        OpenAI::extract_text_from_response(&response)
    }
}

/// OpenAI speech as a `Synthesizer`
#[derive(Debug, Clone)]
pub struct OpenAISpeech {
    client: OpenAI,
    model: String,
    voice: String,
}

impl OpenAISpeech {
    pub fn new(client: OpenAI, model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self { client, model: model.into(), voice: voice.into() }
    }
}

#[async_trait]
impl Synthesizer for OpenAISpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let request = SpeechRequest {
            model: self.model.clone(),
            voice: self.voice.clone(),
            input: text.to_string(),
        };
        self.client.speech(&request).await
    }
}

/// Whisper as a `Transcriber`
#[derive(Debug, Clone)]
pub struct OpenAITranscriber {
    client: OpenAI,
    model: String,
}

impl OpenAITranscriber {
    pub fn new(client: OpenAI, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<Transcript, ProviderError> {
        let transcript = self.client.transcription(&self.model, audio, file_name).await?;
        debug!("Transcribed {} words from {}", transcript.words.len(), file_name);
        Ok(transcript)
    }
}
