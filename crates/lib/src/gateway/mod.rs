//! Gateway: HTTP surface of the relay.
//!
//! `GET /webhook` answers the subscription handshake, `POST /webhook` relays the
//! first inbound message through the dispatcher, `POST /send-document` sends a
//! document link, and `GET /` is a health check.

mod dispatch;
mod server;

pub use dispatch::{
    document_parts, DispatchError, Dispatcher, Outcome, PDF_SUMMARY_PROMPT, SUMMARY_FALLBACK,
    TEXT_FALLBACK,
};
pub use server::{router, run_gateway, GatewayState};
