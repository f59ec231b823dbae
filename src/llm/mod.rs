//! Language-model services: extraction and answer synthesis over an
//! OpenAI-compatible chat API.

pub mod answer;
pub mod client;
pub mod extract;
pub mod prompts;

pub use answer::{AnswerContext, AnswerGenerator, LlmAnswerGenerator, ScoredTranscript};
pub use client::ChatClient;
pub use extract::{Extraction, Extractor, LlmExtractor};
