//! Webhook transcript payloads.
//!
//! Two shapes are accepted: the session form `{sessionId, segments: [...]}` and
//! the device form `{id, structured: {overview, ...}, transcript_segments: [...]}`.
//! Unknown fields are ignored; the raw JSON is stored as-is.

use serde::Deserialize;

use crate::config::TextSource;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Structured {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptPayload {
    /// String or number; see [`TranscriptPayload::session`].
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<serde_json::Value>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub transcript_segments: Vec<Segment>,
    #[serde(default)]
    pub structured: Option<Structured>,
}

impl TranscriptPayload {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        if !value.is_object() {
            return Err("transcript payload must be a JSON object".into());
        }
        serde_json::from_value(value.clone()).map_err(|e| format!("invalid transcript payload: {e}"))
    }

    /// Session identifier: explicit `sessionId`, else the device transcript `id`.
    /// Numeric ids are rendered in decimal.
    pub fn session(&self) -> Option<String> {
        self.session_id
            .as_ref()
            .and_then(id_text)
            .or_else(|| self.id.as_ref().and_then(id_text))
    }

    /// Non-empty structured overview, if any.
    pub fn overview(&self) -> Option<String> {
        self.structured
            .as_ref()
            .map(|s| s.overview.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
    }

    /// Texts of `segments` then `transcript_segments`, joined by single spaces,
    /// if any are non-empty.
    pub fn segment_text(&self) -> Option<String> {
        let joined = self
            .segments
            .iter()
            .chain(&self.transcript_segments)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }

    /// The text that gets embedded and extracted, per the configured source.
    pub fn designated_text(&self, source: TextSource) -> Option<String> {
        match source {
            TextSource::Auto => self.overview().or_else(|| self.segment_text()),
            TextSource::Overview => self.overview(),
            TextSource::Segments => self.segment_text(),
        }
    }
}

fn id_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
