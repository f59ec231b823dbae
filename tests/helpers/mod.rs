#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use omiverse::api::AppState;
use omiverse::config::{OrphanPolicy, PipelineConfig};
use omiverse::db::{self, SharedConnection};
use omiverse::embedding::EmbeddingProvider;
use omiverse::error::{ServiceError, ServiceResult};
use omiverse::graph::types::NounType;
use omiverse::llm::extract::{ExtractedNoun, ExtractedRelationship, Extraction, Extractor};
use omiverse::llm::{AnswerContext, AnswerGenerator};
use omiverse::pipeline::{AnswerEngine, Ingestor, SubstringEvidenceFilter};

pub const DIMS: usize = 64;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> SharedConnection {
    db::shared(db::open_memory_database().unwrap())
}

/// Deterministic bag-of-words embedder: each lowercase word bumps one of
/// [`DIMS`] buckets. Texts sharing words get high cosine similarity.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        v[bucket % DIMS] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> ServiceResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }
        Ok(bag_of_words(text))
    }

    fn model(&self) -> &str {
        "bag-of-words"
    }
}

/// Embedder whose backend is always down.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> ServiceResult<Vec<f32>> {
        Err(ServiceError::EmptyResponse("embedding"))
    }

    fn model(&self) -> &str {
        "offline"
    }
}

/// Extractor returning canned results keyed by the exact input text. Unknown
/// text yields an empty extraction; `failing()` makes every call fail.
#[derive(Default)]
pub struct CannedExtractor {
    canned: HashMap<String, Extraction>,
    fail: bool,
}

impl CannedExtractor {
    pub fn with(mut self, text: &str, extraction: Extraction) -> Self {
        self.canned.insert(text.to_string(), extraction);
        self
    }

    pub fn failing() -> Self {
        Self {
            canned: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Extractor for CannedExtractor {
    async fn extract(&self, text: &str) -> ServiceResult<Extraction> {
        if self.fail {
            return Err(ServiceError::EmptyResponse("extraction"));
        }
        Ok(self.canned.get(text).cloned().unwrap_or_default())
    }
}

/// Answer generator that always replies with the same text.
pub struct FixedAnswer(pub String);

#[async_trait]
impl AnswerGenerator for FixedAnswer {
    async fn generate(&self, _query: &str, _context: &AnswerContext) -> ServiceResult<String> {
        Ok(self.0.clone())
    }
}

/// Answer generator whose backend is always down.
pub struct FailingAnswer;

#[async_trait]
impl AnswerGenerator for FailingAnswer {
    async fn generate(&self, _query: &str, _context: &AnswerContext) -> ServiceResult<String> {
        Err(ServiceError::EmptyResponse("chat API"))
    }
}

pub fn noun(text: &str, noun_type: NounType, base_form: &str) -> ExtractedNoun {
    ExtractedNoun {
        text: text.to_string(),
        noun_type,
        base_form: base_form.to_string(),
    }
}

pub fn rel(source: &str, action: &str, target: &str, base_action: &str) -> ExtractedRelationship {
    ExtractedRelationship {
        source: source.to_string(),
        action: action.to_string(),
        target: target.to_string(),
        base_action: base_action.to_string(),
    }
}

/// Session-shaped webhook payload with one segment.
pub fn session_payload(session_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "sessionId": session_id,
        "segments": [{ "text": text, "speaker": "SPEAKER_0" }]
    })
}

pub fn pipeline_config(policy: OrphanPolicy) -> PipelineConfig {
    PipelineConfig {
        on_extraction_failure: policy,
        ..PipelineConfig::default()
    }
}

pub fn ingestor(
    db: &SharedConnection,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: CannedExtractor,
    policy: OrphanPolicy,
) -> Ingestor {
    Ingestor::new(
        Arc::clone(db),
        embedder,
        Arc::new(extractor),
        pipeline_config(policy),
    )
}

pub fn answer_engine(
    db: &SharedConnection,
    embedder: Arc<dyn EmbeddingProvider>,
    answer: &str,
) -> AnswerEngine {
    AnswerEngine::new(
        Arc::clone(db),
        embedder,
        Arc::new(FixedAnswer(answer.to_string())),
        Arc::new(SubstringEvidenceFilter),
    )
}

/// Application state wired with the fakes above.
pub fn app_state(db: &SharedConnection, extractor: CannedExtractor, answer: &str) -> AppState {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(BagOfWordsEmbedder::default());
    AppState::new(
        Arc::clone(db),
        Arc::new(ingestor(db, Arc::clone(&embedder), extractor, OrphanPolicy::KeepOrphan)),
        Arc::new(answer_engine(db, embedder, answer)),
    )
}
