//! Query answering: embed → rank transcripts → gather relationships →
//! synthesize answer → evidence filter → pruned graph.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::db::{self, SharedConnection};
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::ServiceError;
use crate::graph::relations::relationships_for_transcripts;
use crate::graph::transcripts::{list_transcripts, TranscriptRecord};
use crate::graph::types::GraphView;
use crate::llm::answer::{AnswerContext, AnswerGenerator, ScoredTranscript};
use crate::pipeline::evidence::EvidenceFilter;

/// Number of transcripts handed to the answer generator.
pub const TOP_TRANSCRIPTS: usize = 5;

/// Reply for users with nothing ingested yet.
pub const NO_INFORMATION_ANSWER: &str =
    "I couldn't find any information about that in your transcripts yet.";

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("{0}")]
    Validation(String),

    #[error("embedding failed: {0}")]
    Embedding(#[source] ServiceError),

    #[error("answer generation failed: {0}")]
    Generation(#[source] ServiceError),

    #[error("storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnswer {
    pub answer: String,
    pub context: AnswerContext,
    pub graph_data: GraphView,
}

pub struct AnswerEngine {
    db: SharedConnection,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
    evidence: Arc<dyn EvidenceFilter>,
}

impl AnswerEngine {
    pub fn new(
        db: SharedConnection,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
        evidence: Arc<dyn EvidenceFilter>,
    ) -> Self {
        Self {
            db,
            embedder,
            generator,
            evidence,
        }
    }

    pub async fn answer(&self, user_id: &str, query: &str) -> Result<QueryAnswer, AnswerError> {
        let user_id = user_id.trim();
        let query = query.trim();
        if user_id.is_empty() {
            return Err(AnswerError::Validation("user id must not be empty".into()));
        }
        if query.is_empty() {
            return Err(AnswerError::Validation("query must not be empty".into()));
        }

        let transcripts = {
            let uid = user_id.to_string();
            db::with_conn(&self.db, move |conn| list_transcripts(conn, Some(&uid))).await?
        };

        if transcripts.is_empty() {
            tracing::info!(user_id, "no transcripts for user; skipping retrieval");
            return Ok(QueryAnswer {
                answer: NO_INFORMATION_ANSWER.to_string(),
                context: AnswerContext::default(),
                graph_data: GraphView::default(),
            });
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(AnswerError::Embedding)?;

        let top = rank_transcripts(&query_embedding, &transcripts, TOP_TRANSCRIPTS);
        let top_ids: Vec<String> = top.iter().map(|t| t.id.clone()).collect();

        let relationships = {
            let uid = user_id.to_string();
            db::with_conn(&self.db, move |conn| {
                relationships_for_transcripts(conn, &uid, &top_ids)
            })
            .await?
        };

        let context = AnswerContext {
            transcripts: top,
            relationships,
        };

        let answer = self
            .generator
            .generate(query, &context)
            .await
            .map_err(AnswerError::Generation)?;

        let retained = self.evidence.retain(&answer, &context.relationships);
        let graph_data = GraphView::from_relationships(&retained);

        tracing::info!(
            user_id,
            transcripts = context.transcripts.len(),
            relationships = context.relationships.len(),
            retained = retained.len(),
            "query answered"
        );

        Ok(QueryAnswer {
            answer,
            context,
            graph_data,
        })
    }
}

/// Score every transcript against the query and keep the `k` most similar,
/// highest first. Ties keep storage order.
pub fn rank_transcripts(
    query_embedding: &[f32],
    transcripts: &[TranscriptRecord],
    k: usize,
) -> Vec<ScoredTranscript> {
    let mut scored: Vec<ScoredTranscript> = transcripts
        .iter()
        .map(|t| ScoredTranscript {
            id: t.id.clone(),
            overview: t.text.clone(),
            similarity: cosine_similarity(query_embedding, &t.embedding),
            received_at: t.received_at.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(k);
    scored
}
