//! Gemini `generateContent` client (https://generativelanguage.googleapis.com by default).
//! Single non-streaming call per request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("gemini request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gemini api error: {0}")]
    Api(String),
}

/// One content part: plain text or inline base64 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// Response-side part; non-text parts deserialize with `text: None`.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Debug, Serialize)]
struct GenerateContentBody<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's first content part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Something that turns prompt parts into generated text. `Ok(None)` means the
/// service answered but produced no candidate text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, parts: Vec<Part>) -> Result<Option<String>, GeminiError>;
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /v1beta/models/{model}:generateContent with a single user turn.
    pub async fn generate_content(
        &self,
        parts: &[Part],
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateContentBody {
            contents: [RequestContent {
                role: "user",
                parts,
            }],
        };
        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GeminiError::Api(format!("{} {}", status, body)));
        }
        let data: GenerateContentResponse = res.json().await?;
        Ok(data)
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn generate(&self, parts: Vec<Part>) -> Result<Option<String>, GeminiError> {
        let res = self.generate_content(&parts).await?;
        Ok(res.first_text().map(str::to_string))
    }
}
