//! Webhook relay core: receives WhatsApp events, asks Gemini for a reply or
//! document summary, and sends the result back to the chat. Used by the CLI.

pub mod channels;
pub mod config;
pub mod extract;
pub mod gateway;
pub mod llm;
