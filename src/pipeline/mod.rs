//! The two request flows: transcript ingestion and query answering.

pub mod answer;
pub mod evidence;
pub mod ingest;
pub mod payload;

pub use answer::{AnswerEngine, AnswerError, QueryAnswer};
pub use evidence::{EvidenceFilter, SubstringEvidenceFilter};
pub use ingest::{IngestError, IngestReport, Ingestor};
