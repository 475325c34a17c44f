//! Generative backend boundary and the Gemini `generateContent` client.

use std::future::Future;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::extraction::{parse_medicine_output, MedicineInfo};
use crate::prompts::{build_full_prompt, ComposedPrompt};
use crate::query::{InlineImage, QueryResult};
use crate::schema::response_schema;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Backend errors.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned no content: {}", .0.as_deref().unwrap_or("no reason given"))]
    Empty(Option<String>),

    #[error("{0}")]
    Other(String),
}

/// Connection settings for the generative backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
}

impl BackendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// A service that turns a prompt (and optional image) into schema-constrained JSON text.
pub trait GenerativeBackend {
    fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: Blob,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn build_request_body(
    prompt: &str,
    image: Option<&InlineImage>,
    temperature: f32,
) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = image {
        parts.push(Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.data),
            },
        });
    }
    parts.push(Part::Text {
        text: prompt.to_string(),
    });

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
            temperature,
        },
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, BackendError> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(BackendError::Empty(block_reason))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BackendError::Empty(candidate.finish_reason));
    }
    Ok(text)
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the Gemini `generateContent` endpoint.
///
/// No client-side timeout is set; a request runs for as long as the service takes.
pub struct GeminiClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl GeminiClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("generic-meds/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl GenerativeBackend for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, BackendError> {
        let body = build_request_body(prompt, image, self.config.temperature);
        debug!(
            "Backend request: model={}, prompt={} chars, image={}, temp={}",
            self.config.model,
            prompt.len(),
            image.map_or(0, |i| i.data.len()),
            self.config.temperature,
        );

        let start = Instant::now();
        let resp = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(
            "Backend response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        let output = response_text(parsed)?;
        trace!("Backend output: {}", output);
        Ok(output)
    }
}

/// Ask the backend about a medicine and validate the reply.
pub async fn get_medicine_info<B: GenerativeBackend>(
    backend: &B,
    prompt: &ComposedPrompt,
) -> QueryResult<MedicineInfo> {
    let full_prompt = build_full_prompt(prompt);

    let reply = backend.generate(&full_prompt, prompt.image.as_ref()).await;
    let result: QueryResult<MedicineInfo> = match reply {
        Ok(text) => parse_medicine_output(&text).map_err(Into::into),
        Err(e) => Err(e.into()),
    };

    if let Err(ref e) = result {
        error!("Error fetching medicine info from backend: {}", e);
    }
    result
}
