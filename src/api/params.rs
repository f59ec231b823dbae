//! Query-string and body shapes for the HTTP routes.

use serde::{Deserialize, Serialize};

use crate::graph::transcripts::TranscriptRecord;

/// `POST /webhook/transcript?uid=...`
#[derive(Debug, Deserialize)]
pub struct WebhookParams {
    pub uid: Option<String>,
}

/// `GET /graph?userId=...` and `GET /transcripts?userId=...`
#[derive(Debug, Deserialize)]
pub struct UserParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `GET /search?query=...&userId=...`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `POST /users`
#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A transcript as listed by `GET /transcripts`; the vector is summarized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSummary {
    #[serde(flatten)]
    pub record: TranscriptRecord,
    pub embedding_dims: usize,
}

impl From<TranscriptRecord> for TranscriptSummary {
    fn from(record: TranscriptRecord) -> Self {
        Self {
            embedding_dims: record.embedding.len(),
            record,
        }
    }
}

/// Trimmed, non-empty value of an optional parameter.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
