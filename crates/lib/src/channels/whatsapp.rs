//! WhatsApp Cloud API channel: send messages and download inbound media via the Graph API.

use crate::channels::handle::{MediaSource, ReplySender};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

const MESSAGING_PRODUCT: &str = "whatsapp";

#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    #[error("whatsapp request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("whatsapp api error: {0}")]
    Api(String),
    #[error("media {0} has no download url")]
    MissingMediaUrl(String),
    #[error("unexpected content type: expected {expected}, got {actual}")]
    ContentType { expected: String, actual: String },
}

/// `GET /{media_id}` response. Only `url` matters; the link is short-lived.
#[derive(Debug, Deserialize)]
struct MediaInfo {
    #[serde(default)]
    url: Option<String>,
}

/// Client for the outbound messaging and media endpoints of one phone number.
#[derive(Clone)]
pub struct WhatsAppChannel {
    api_url: String,
    phone_number_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(api_url: &str, phone_number_id: &str, access_token: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            access_token: access_token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_url, self.phone_number_id)
    }

    async fn post_message(&self, body: serde_json::Value, what: &str) -> Result<(), WhatsAppError> {
        let res = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!("{} failed: {} {}", what, status, body)));
        }
        Ok(())
    }

    /// POST /{phone_number_id}/messages with a text body.
    pub async fn send_text(&self, to: &str, text: &str) -> Result<(), WhatsAppError> {
        let body = serde_json::json!({
            "messaging_product": MESSAGING_PRODUCT,
            "to": to,
            "text": { "body": text },
        });
        self.post_message(body, "send text").await
    }

    /// POST /{phone_number_id}/messages with a document link and caption.
    pub async fn send_document(
        &self,
        to: &str,
        link: &str,
        caption: &str,
    ) -> Result<(), WhatsAppError> {
        let body = serde_json::json!({
            "messaging_product": MESSAGING_PRODUCT,
            "to": to,
            "type": "document",
            "document": { "link": link, "caption": caption },
        });
        self.post_message(body, "send document").await
    }

    /// GET /{media_id} — resolve a media id to its temporary download URL.
    pub async fn media_url(&self, media_id: &str) -> Result<String, WhatsAppError> {
        let url = format!("{}/{}", self.api_url, media_id);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!(
                "media lookup failed: {} {}",
                status, body
            )));
        }
        let info: MediaInfo = res.json().await?;
        info.url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| WhatsAppError::MissingMediaUrl(media_id.to_string()))
    }

    /// Download media bytes from a resolved URL; the response content type must be one of `accepted`.
    pub async fn download_media(
        &self,
        url: &str,
        accepted: &[&str],
    ) -> Result<Vec<u8>, WhatsAppError> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(WhatsAppError::Api(format!("media download failed: {}", status)));
        }
        let actual = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(mime_essence)
            .unwrap_or_default();
        if !accepted.iter().any(|a| a.eq_ignore_ascii_case(&actual)) {
            return Err(WhatsAppError::ContentType {
                expected: accepted.join(" or "),
                actual: if actual.is_empty() {
                    "(none)".to_string()
                } else {
                    actual
                },
            });
        }
        let bytes = res.bytes().await?;
        log::debug!("downloaded {} bytes of {}", bytes.len(), actual);
        Ok(bytes.to_vec())
    }
}

/// `type/subtype` of a content type header, lowercased, without parameters.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[async_trait]
impl ReplySender for WhatsAppChannel {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        WhatsAppChannel::send_text(self, to, body).await
    }

    async fn send_document(
        &self,
        to: &str,
        link: &str,
        caption: &str,
    ) -> Result<(), WhatsAppError> {
        WhatsAppChannel::send_document(self, to, link, caption).await
    }
}

#[async_trait]
impl MediaSource for WhatsAppChannel {
    async fn fetch_media(&self, media_id: &str, accepted: &[&str]) -> Result<Vec<u8>, WhatsAppError> {
        let url = self.media_url(media_id).await?;
        self.download_media(&url, accepted).await
    }
}
