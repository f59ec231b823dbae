//! Personal knowledge graph built from conversation transcripts.
//!
//! Omiverse receives transcripts from a wearable recorder over a webhook, embeds
//! them, and asks an LLM to extract nouns and the relationships between them.
//! Nouns are deduplicated per user by their base form, so repeated mentions
//! converge on one graph node. Questions are answered by ranking a user's
//! transcripts against the query embedding, handing the best ones and their
//! relationships to an LLM, and returning only the graph edges the answer
//! actually mentions.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one connection behind a mutex; embeddings are stored as
//!   little-endian `f32` blobs and compared in process
//! - **Embeddings**: OpenAI-compatible or Ollama HTTP endpoints
//! - **Extraction and answers**: OpenAI-compatible chat completions
//! - **Transport**: REST over axum
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`]: Embedding providers and vector helpers
//! - [`graph`]: Users, transcripts, nouns, relationships, and graph views
//! - [`llm`]: Chat client, extraction, and answer generation
//! - [`pipeline`]: Ingestion and query-answering orchestration
//! - [`api`]: HTTP routes

pub mod api;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod server;
