//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Supports single-shot `generateContent` calls and SSE-streamed
//! `streamGenerateContent` calls with replayed chat history.
//! The API key is loaded through a [`SecretService`].

use crate::sse::decode_text_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tarot_core::config::DEFAULT_GEMINI_MODEL;
use tarot_core::error::BackendError;
use tarot_core::ports::{GenerationRequest, GenerativeBackend, TextStream};
use tarot_core::secret::SecretService;
use tarot_core::session::{ChatMessage, ChatRole};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            default_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    /// Loads the API key from the secret service.
    pub async fn try_from_secrets(service: &dyn SecretService) -> Result<Self, BackendError> {
        let secrets = service
            .load_secrets()
            .await
            .map_err(|e| BackendError::NotConfigured(format!("Failed to load secrets: {e}")))?;

        let gemini_config = secrets.gemini.ok_or_else(|| {
            BackendError::NotConfigured("Gemini configuration not found in secret.json".into())
        })?;
        if gemini_config.api_key.trim().is_empty() {
            return Err(BackendError::NotConfigured("Gemini API key is empty".into()));
        }

        let agent = Self::new(gemini_config.api_key);
        Ok(match gemini_config.model_name {
            Some(model) => agent.with_default_model(model),
            None => agent,
        })
    }

    /// Model used when a request does not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Overrides the API base URL (e.g. for a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request URL for `model` and `method`. The API key travels in a header
    /// so it never appears in URLs carried by transport errors.
    fn endpoint(&self, model: &str, method: &str, query: &str) -> String {
        let model = if model.is_empty() {
            self.default_model.as_str()
        } else {
            model
        };
        let mut url = format!("{base}/{model}:{method}", base = self.base_url);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    async fn post(&self, url: String, body: &GenerateContentRequest) -> Result<reqwest::Response, BackendError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| BackendError::Process {
                status_code: None,
                is_retryable: err.is_connect() || err.is_timeout(),
                message: format!("Gemini API request failed: {}", err.without_url()),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiApiAgent {
    async fn complete(&self, request: GenerationRequest) -> Result<String, BackendError> {
        let url = self.endpoint(&request.model, "generateContent", "");
        tracing::debug!(model = %request.model, "Gemini generateContent");

        let response = self.post(url, &GenerateContentRequest::from(&request)).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| {
                BackendError::Malformed(format!("Failed to parse Gemini response: {}", err.without_url()))
            })?;

        extract_text_response(parsed)?.ok_or(BackendError::EmptyResponse)
    }

    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, BackendError> {
        let url = self.endpoint(&request.model, "streamGenerateContent", "alt=sse");
        tracing::debug!(
            model = %request.model,
            history = request.history.len(),
            "Gemini streamGenerateContent"
        );

        let response = self.post(url, &GenerateContentRequest::from(&request)).await?;
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(|e| e.without_url().to_string()))
            .boxed();

        Ok(decode_text_stream(bytes, parse_stream_payload))
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .filter(|message| !message.text.trim().is_empty())
            .map(Content::from_message)
            .collect();
        contents.push(Content::text("user", &request.prompt));

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| Content::text("system", text));

        Self {
            contents,
            system_instruction,
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    fn from_message(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        };
        Self::text(role, &message.text)
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(self, fallback: &str) -> String {
        let status_text = self.status.unwrap_or_default();
        let msg = self.message.unwrap_or_else(|| fallback.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

/// Joins the text parts of the first candidate.
fn extract_text_response(response: GenerateContentResponse) -> Result<Option<String>, BackendError> {
    if let Some(error) = response.error {
        let status_code = error.code;
        return Err(BackendError::Process {
            status_code,
            message: error.describe("Gemini reported an error"),
            is_retryable: false,
            retry_after: None,
        });
    }

    let text = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.is_empty());

    Ok(text)
}

fn parse_stream_payload(payload: &str) -> Result<Option<String>, BackendError> {
    let parsed: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|err| BackendError::Malformed(format!("Failed to parse Gemini stream chunk: {err}")))?;
    extract_text_response(parsed)
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> BackendError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    BackendError::Process {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}
