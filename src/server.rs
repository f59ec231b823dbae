//! HTTP server initialization.
//!
//! [`build_services`] opens the database and constructs the model clients and
//! pipelines from configuration; [`serve`] binds the router and runs until ctrl-c.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{self, AppState};
use crate::config::OmiverseConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::llm::{AnswerGenerator, ChatClient, Extractor, LlmAnswerGenerator, LlmExtractor};
use crate::pipeline::{AnswerEngine, EvidenceFilter, Ingestor, SubstringEvidenceFilter};

/// Process-wide services, constructed once at startup.
pub struct Services {
    pub db: db::SharedConnection,
    pub ingestor: Arc<Ingestor>,
    pub answers: Arc<AnswerEngine>,
}

/// Open the database, create the provider clients and assemble both pipelines.
pub fn build_services(config: &OmiverseConfig) -> Result<Services> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let embedder: Arc<dyn EmbeddingProvider> = Arc::from(embedding::create_provider(
        &config.embedding,
        config.llm.api_key.as_deref(),
        config.llm.timeout_secs,
    )?);
    if config.llm.api_key.is_none() {
        tracing::warn!("no OPENAI_API_KEY configured; model calls will likely be rejected");
    }

    check_embedding_model(&conn, embedder.model())?;
    let db = db::shared(conn);

    let chat = Arc::new(ChatClient::new(&config.llm)?);
    let extractor: Arc<dyn Extractor> = Arc::new(LlmExtractor::new(
        Arc::clone(&chat),
        config.llm.extraction_model.clone(),
    ));
    let generator: Arc<dyn AnswerGenerator> =
        Arc::new(LlmAnswerGenerator::new(Arc::clone(&chat), &config.llm));
    let evidence: Arc<dyn EvidenceFilter> = Arc::new(SubstringEvidenceFilter);

    let ingestor = Arc::new(Ingestor::new(
        Arc::clone(&db),
        Arc::clone(&embedder),
        extractor,
        config.pipeline.clone(),
    ));
    let answers = Arc::new(AnswerEngine::new(Arc::clone(&db), embedder, generator, evidence));
    tracing::info!(
        embedding = %config.embedding.model,
        extraction = %config.llm.extraction_model,
        answer = %config.llm.answer_model,
        "model clients ready"
    );

    Ok(Services {
        db,
        ingestor,
        answers,
    })
}

/// Compare the embedding model in use with the one recorded in `schema_meta`.
///
/// An unset record is filled in with `model`. A different recorded model is
/// kept and reported, since stored vectors came from it.
pub fn check_embedding_model(conn: &rusqlite::Connection, model: &str) -> Result<()> {
    match db::migrations::get_embedding_model(conn) {
        Ok(Some(stored)) if stored != model => {
            tracing::warn!(
                stored = %stored,
                configured = %model,
                "embedding model changed; similarity against older transcripts will be meaningless"
            );
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            db::migrations::set_embedding_model(conn, model)
                .context("failed to record embedding model")?;
            tracing::info!(model, "embedding model recorded");
        }
        Err(e) => tracing::warn!(error = %e, "could not read stored embedding model"),
    }
    Ok(())
}

/// Serve the HTTP API until ctrl-c.
pub async fn serve(config: OmiverseConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    let services = build_services(&config)?;
    let state = AppState::new(services.db, services.ingestor, services.answers);
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
