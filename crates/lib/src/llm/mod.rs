//! AI completion client (Gemini).
//!
//! The gateway depends on [`CompletionBackend`]; [`GeminiClient`] is the real implementation.

mod gemini;

pub use gemini::{
    CompletionBackend, GeminiClient, GeminiError, GenerateContentResponse, InlineData, Part,
};
