//! Inbound webhook payload from WhatsApp and the event the dispatcher works on.

use serde::Deserialize;

/// Webhook POST body: `entry[].changes[].value.messages[]`.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WhatsAppMessage>,
}

/// One message object as delivered by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppMessage {
    pub from: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub document: Option<DocumentBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentBody {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl WebhookPayload {
    /// The first message at `entry[0].changes[0].value.messages[0]`, if present.
    pub fn first_message(&self) -> Option<&WhatsAppMessage> {
        self.entry
            .first()?
            .changes
            .first()?
            .value
            .as_ref()?
            .messages
            .first()
    }
}

/// Reference to an attached document: media id plus what the sender called it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub media_id: String,
    pub filename: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text(String),
    Document(DocumentRef),
    /// Any other `type` value (image, audio, reaction, ...).
    Unsupported(String),
}

/// A message from the platform to be answered by the relay. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub from: String,
    pub kind: MessageKind,
}

impl From<&WhatsAppMessage> for InboundEvent {
    fn from(msg: &WhatsAppMessage) -> Self {
        let kind = match msg.typ.as_str() {
            "text" => MessageKind::Text(
                msg.text
                    .as_ref()
                    .map(|t| t.body.clone())
                    .unwrap_or_default(),
            ),
            "document" => match msg.document {
                Some(ref doc) => MessageKind::Document(DocumentRef {
                    media_id: doc.id.clone(),
                    filename: doc.filename.clone().unwrap_or_default(),
                    mime_type: doc.mime_type.clone(),
                }),
                None => MessageKind::Unsupported(msg.typ.clone()),
            },
            other => MessageKind::Unsupported(other.to_string()),
        };
        Self {
            from: msg.from.clone(),
            kind,
        }
    }
}
