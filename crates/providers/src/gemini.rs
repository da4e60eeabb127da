//! Google Gemini provider implementation.
//!
//! Uses the Generative Language API `generateContent` endpoint directly.
//!
//! Features:
//! - `x-goog-api-key` header authentication (key never placed in the URL)
//! - Single-turn request: the whole assembled prompt is one user content
//! - Blocked prompts / empty candidates surfaced as transport failures

use async_trait::async_trait;
use docchat_core::error::ProviderError;
use docchat_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider. No request timeout is set.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => warn!(error = %e, "Failed to build HTTP client with timeout, keeping default"),
        }
        self
    }

    /// `models/gemini-x` and `gemini-x` name the same model.
    fn model_path(model: &str) -> &str {
        model.strip_prefix("models/").unwrap_or(model)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            self.base_url,
            Self::model_path(model)
        )
    }

    fn request_body(request: &GenerationRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }

    /// Map a non-success HTTP answer onto the three provider error kinds.
    pub(crate) fn classify_error(status: u16, body: &str, model: &str) -> ProviderError {
        let envelope: Option<GeminiErrorEnvelope> = serde_json::from_str(body).ok();
        let (message, api_status, reasons) = match envelope {
            Some(env) => (
                env.error.message,
                env.error.status.unwrap_or_default(),
                env.error
                    .details
                    .into_iter()
                    .filter_map(|d| d.reason)
                    .collect::<Vec<_>>(),
            ),
            None => (body.to_string(), String::new(), Vec::new()),
        };

        let bad_key = reasons.iter().any(|r| r == "API_KEY_INVALID")
            || message.contains("API key not valid");
        if status == 401
            || status == 403
            || bad_key
            || api_status == "UNAUTHENTICATED"
            || api_status == "PERMISSION_DENIED"
        {
            return ProviderError::AuthenticationFailed(message);
        }

        if status == 404 || api_status == "NOT_FOUND" {
            return ProviderError::ModelUnavailable(format!("{model}: {message}"));
        }

        ProviderError::status(status, message)
    }

    /// Convert a Gemini response body to our GenerationResponse.
    pub(crate) fn response_to_generation(
        resp: GeminiResponse,
        requested_model: &str,
    ) -> Result<GenerationResponse, ProviderError> {
        let Some(candidate) = resp.candidates.into_iter().next() else {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".into());
            return Err(ProviderError::status(200, format!("prompt blocked: {reason}")));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
            return Err(ProviderError::status(
                200,
                format!("response contained no text (finish reason {reason})"),
            ));
        }

        let usage = resp.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(GenerationResponse {
            text,
            model: resp
                .model_version
                .unwrap_or_else(|| Self::model_path(requested_model).to_string()),
            usage,
        })
    }
}

#[async_trait]
impl docchat_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let url = self.endpoint(&request.model);
        let body = Self::request_body(&request);

        debug!(provider = "gemini", model = %request.model, prompt_chars = request.prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(Self::classify_error(status, &error_body, &request.model));
        }

        let api_resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::status(200, format!("Failed to parse Gemini response: {e}")))?;

        Self::response_to_generation(api_resp, &request.model)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/{API_VERSION}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &error_body, "models"));
        }

        let body: GeminiModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::status(200, e.to_string()))?;

        Ok(body
            .models
            .into_iter()
            .map(|m| Self::model_path(&m.name).to_string())
            .collect())
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
struct GeminiModel {
    name: String,
}
