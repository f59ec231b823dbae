//! Transcript ingestion: received → embedded → stored → extracted → graph-updated.
//!
//! Each stage runs once with no retry. A failure after the transcript row is
//! written is handled according to [`OrphanPolicy`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::config::{OrphanPolicy, PipelineConfig};
use crate::db::{self, SharedConnection};
use crate::embedding::EmbeddingProvider;
use crate::error::ServiceError;
use crate::graph::nouns::{normalize_base_form, upsert_noun};
use crate::graph::relations::{insert_relationship, NewRelationship};
use crate::graph::transcripts::{delete_transcript, insert_transcript, NewTranscript};
use crate::llm::extract::{Extraction, Extractor};
use crate::pipeline::payload::TranscriptPayload;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("embedding failed: {0}")]
    Embedding(#[source] ServiceError),

    #[error("extraction failed: {0}")]
    Extraction(#[source] ServiceError),

    #[error("storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Counts of what an ingestion wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphWriteSummary {
    pub nouns_created: usize,
    pub nouns_existing: usize,
    pub relationships_stored: usize,
    pub relationships_dropped: usize,
}

/// Returned to the webhook caller on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub transcript_id: String,
    #[serde(flatten)]
    pub graph: GraphWriteSummary,
}

pub struct Ingestor {
    db: SharedConnection,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn Extractor>,
    config: PipelineConfig,
}

impl Ingestor {
    pub fn new(
        db: SharedConnection,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn Extractor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            extractor,
            config,
        }
    }

    pub async fn ingest(
        &self,
        user_id: &str,
        raw: serde_json::Value,
    ) -> Result<IngestReport, IngestError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(IngestError::Validation("user id must not be empty".into()));
        }

        let payload = TranscriptPayload::from_json(&raw).map_err(IngestError::Validation)?;
        let text = payload
            .designated_text(self.config.text_source)
            .ok_or_else(|| IngestError::Validation("Invalid transcript data".into()))?;

        tracing::info!(user_id, text_len = text.len(), "transcript received");

        let embedding = self
            .embedder
            .embed(&text)
            .await
            .map_err(IngestError::Embedding)?;

        let transcript_id = {
            let user_id = user_id.to_string();
            let session_id = payload.session();
            let text = text.clone();
            db::with_conn(&self.db, move |conn| {
                insert_transcript(
                    conn,
                    &NewTranscript {
                        user_id: &user_id,
                        session_id: session_id.as_deref(),
                        payload: &raw,
                        text: &text,
                        embedding: &embedding,
                    },
                )
            })
            .await?
        };
        tracing::debug!(user_id, transcript_id = %transcript_id, "transcript stored");

        let extraction = match self.extractor.extract(&text).await {
            Ok(extraction) => extraction,
            Err(e) => {
                self.handle_orphan(&transcript_id).await;
                return Err(IngestError::Extraction(e));
            }
        };

        let summary = {
            let user_id = user_id.to_string();
            let transcript_id = transcript_id.clone();
            db::with_conn(&self.db, move |conn| {
                write_extraction(conn, &user_id, &transcript_id, &extraction)
            })
            .await
        };
        let summary = match summary {
            Ok(summary) => summary,
            Err(e) => {
                self.handle_orphan(&transcript_id).await;
                return Err(IngestError::Storage(e));
            }
        };

        tracing::info!(
            user_id,
            transcript_id = %transcript_id,
            nouns_created = summary.nouns_created,
            relationships_stored = summary.relationships_stored,
            relationships_dropped = summary.relationships_dropped,
            "transcript ingested"
        );

        Ok(IngestReport {
            transcript_id,
            graph: summary,
        })
    }

    async fn handle_orphan(&self, transcript_id: &str) {
        match self.config.on_extraction_failure {
            OrphanPolicy::KeepOrphan => {
                tracing::warn!(transcript_id, "later stage failed; transcript kept without graph data");
            }
            OrphanPolicy::Compensate => {
                let id = transcript_id.to_string();
                match db::with_conn(&self.db, move |conn| delete_transcript(conn, &id)).await {
                    Ok(_) => tracing::warn!(transcript_id, "later stage failed; transcript removed"),
                    Err(e) => tracing::error!(transcript_id, error = %e, "failed to remove orphan transcript"),
                }
            }
        }
    }
}

/// Write an extraction's nouns and relationships for one transcript, in a single
/// transaction.
///
/// Relationship endpoints are matched to extracted nouns by surface text or
/// base form; anything unmatched is looked up by its own normalized text.
pub fn write_extraction(
    conn: &mut Connection,
    user_id: &str,
    transcript_id: &str,
    extraction: &Extraction,
) -> Result<GraphWriteSummary> {
    let tx = conn.transaction()?;
    let mut summary = GraphWriteSummary::default();
    let mut aliases: HashMap<String, String> = HashMap::new();

    for noun in &extraction.nouns {
        let mut key = normalize_base_form(&noun.base_form);
        if key.is_empty() {
            key = normalize_base_form(&noun.text);
        }
        if key.is_empty() {
            tracing::debug!(user_id, "skipping blank noun");
            continue;
        }

        let name = if noun.text.trim().is_empty() {
            noun.base_form.as_str()
        } else {
            noun.text.as_str()
        };
        let upsert = upsert_noun(&tx, user_id, name, noun.noun_type, &key)?;
        if upsert.created {
            summary.nouns_created += 1;
        } else {
            summary.nouns_existing += 1;
        }

        let surface = normalize_base_form(&noun.text);
        if !surface.is_empty() {
            aliases.insert(surface, key.clone());
        }
        aliases.insert(key.clone(), key);
    }

    let resolve = |name: &str| -> String {
        let normalized = normalize_base_form(name);
        aliases.get(&normalized).cloned().unwrap_or(normalized)
    };

    for rel in &extraction.relationships {
        let source = resolve(&rel.source);
        let target = resolve(&rel.target);
        let outcome = insert_relationship(
            &tx,
            &NewRelationship {
                user_id,
                source_base_form: &source,
                target_base_form: &target,
                action: &rel.action,
                base_action: &rel.base_action,
                transcript_id,
            },
        )?;

        if outcome.is_stored() {
            summary.relationships_stored += 1;
        } else {
            tracing::debug!(
                user_id,
                source = %rel.source,
                target = %rel.target,
                outcome = ?outcome,
                "relationship dropped"
            );
            summary.relationships_dropped += 1;
        }
    }

    tx.commit()?;
    Ok(summary)
}
