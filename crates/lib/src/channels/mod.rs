//! Messaging channel (WhatsApp Cloud API).
//!
//! Inbound webhook payloads are parsed into [`InboundEvent`]s; replies and media
//! downloads go through the [`ReplySender`] and [`MediaSource`] seams, both
//! implemented by [`WhatsAppChannel`].

mod handle;
mod inbound;
mod whatsapp;

pub use handle::{MediaSource, ReplySender};
pub use inbound::{DocumentRef, InboundEvent, MessageKind, WebhookPayload, WhatsAppMessage};
pub use whatsapp::{WhatsAppChannel, WhatsAppError};
