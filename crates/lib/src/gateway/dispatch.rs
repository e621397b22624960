//! Inbound dispatcher: turns one [`InboundEvent`] into a completion call and a reply.

use crate::channels::{DocumentRef, InboundEvent, MediaSource, MessageKind, ReplySender, WhatsAppError};
use crate::extract::{self, DocumentKind, ExtractError, Extracted, PDF_MIME};
use crate::llm::{CompletionBackend, GeminiError, Part};
use std::sync::Arc;

/// Sent when the model returns no text for a chat message.
pub const TEXT_FALLBACK: &str = "I'm not sure how to respond to that.";
/// Sent when the model returns no text for a document.
pub const SUMMARY_FALLBACK: &str = "No summary could be generated.";
/// Instruction appended after an inline PDF.
pub const PDF_SUMMARY_PROMPT: &str = "Summarize this document.";
const TEXT_SUMMARY_PREFIX: &str = "Summarize the following text:\n\n";

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Channel(#[from] WhatsAppError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Completion(#[from] GeminiError),
}

/// What happened to an event that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replied,
    /// Nothing to answer (empty text, unsupported message type).
    Ignored,
}

/// Prompt parts for extracted document content.
pub fn document_parts(extracted: Extracted) -> Vec<Part> {
    match extracted {
        Extracted::InlinePdf { data } => vec![
            Part::inline(PDF_MIME, data),
            Part::text(PDF_SUMMARY_PROMPT),
        ],
        Extracted::Text(text) => vec![Part::text(format!("{}{}", TEXT_SUMMARY_PREFIX, text))],
    }
}

/// Holds the injected clients; cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<dyn ReplySender>,
    media: Arc<dyn MediaSource>,
    completion: Arc<dyn CompletionBackend>,
}

impl Dispatcher {
    pub fn new(
        sender: Arc<dyn ReplySender>,
        media: Arc<dyn MediaSource>,
        completion: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            sender,
            media,
            completion,
        }
    }

    /// Handle one event end to end. Each step runs after the previous one finishes.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Outcome, DispatchError> {
        match event.kind {
            MessageKind::Text(ref body) => self.reply_to_text(&event.from, body).await,
            MessageKind::Document(ref doc) => self.summarize_document(&event.from, doc).await,
            MessageKind::Unsupported(ref typ) => {
                log::info!("ignoring unsupported message type {:?} from {}", typ, event.from);
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn reply_to_text(&self, from: &str, body: &str) -> Result<Outcome, DispatchError> {
        if body.trim().is_empty() {
            log::info!("ignoring empty text message from {}", from);
            return Ok(Outcome::Ignored);
        }
        let reply = self
            .completion
            .generate(vec![Part::text(body)])
            .await?
            .unwrap_or_else(|| TEXT_FALLBACK.to_string());
        self.sender.send_text(from, &reply).await?;
        Ok(Outcome::Replied)
    }

    async fn summarize_document(
        &self,
        from: &str,
        doc: &DocumentRef,
    ) -> Result<Outcome, DispatchError> {
        let kind = DocumentKind::from_filename(&doc.filename)
            .ok_or_else(|| ExtractError::Unsupported(doc.filename.clone()))?;
        log::info!(
            "summarizing {:?} document {:?} ({}) from {}",
            kind,
            doc.filename,
            doc.mime_type.as_deref().unwrap_or("no declared type"),
            from
        );

        let bytes = self
            .media
            .fetch_media(&doc.media_id, kind.accepted_content_types())
            .await?;
        let extracted = extract::extract(kind, &bytes)?;
        let summary = self
            .completion
            .generate(document_parts(extracted))
            .await?
            .unwrap_or_else(|| SUMMARY_FALLBACK.to_string());
        self.sender.send_text(from, &summary).await?;
        Ok(Outcome::Replied)
    }
}
