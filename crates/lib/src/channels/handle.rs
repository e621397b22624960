//! Seams between the dispatcher and the outbound messaging platform.
//!
//! The gateway holds these as `Arc<dyn ...>` so tests can swap in fakes.

use crate::channels::whatsapp::WhatsAppError;
use async_trait::async_trait;

/// Sends replies back to a chat user.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send a text message to `to` (the sender's phone number).
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError>;

    /// Send a document by link with a caption.
    async fn send_document(&self, to: &str, link: &str, caption: &str)
        -> Result<(), WhatsAppError>;
}

/// Resolves a platform media id to its bytes.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Resolve `media_id`, download it, and check the declared content type is one of `accepted`.
    async fn fetch_media(&self, media_id: &str, accepted: &[&str]) -> Result<Vec<u8>, WhatsAppError>;
}
