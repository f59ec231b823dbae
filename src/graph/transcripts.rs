//! Transcript records and their embeddings.

use anyhow::Result;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::embedding::{bytes_to_embedding, embedding_to_bytes};

/// A stored transcript as received by the webhook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// The payload exactly as posted.
    pub payload: serde_json::Value,
    /// Designated text that was embedded and extracted.
    pub text: String,
    pub received_at: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Fields supplied by the ingestion pipeline for a new transcript.
#[derive(Debug, Clone)]
pub struct NewTranscript<'a> {
    pub user_id: &'a str,
    pub session_id: Option<&'a str>,
    pub payload: &'a serde_json::Value,
    pub text: &'a str,
    pub embedding: &'a [f32],
}

/// Insert a transcript and return its generated id.
pub fn insert_transcript(conn: &Connection, new: &NewTranscript<'_>) -> Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let payload = serde_json::to_string(new.payload)?;

    conn.execute(
        "INSERT INTO transcripts (id, user_id, session_id, payload, text, received_at, embedding) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            new.user_id,
            new.session_id,
            payload,
            new.text,
            now,
            embedding_to_bytes(new.embedding),
        ],
    )?;

    Ok(id)
}

/// Delete a transcript; relationships extracted from it cascade.
/// Returns `true` if a row was removed.
pub fn delete_transcript(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM transcripts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Transcripts for one user, or for everyone when `user_id` is `None`, oldest first.
pub fn list_transcripts(conn: &Connection, user_id: Option<&str>) -> Result<Vec<TranscriptRecord>> {
    const COLUMNS: &str =
        "SELECT id, user_id, session_id, payload, text, received_at, embedding FROM transcripts";

    let records = match user_id {
        Some(uid) => {
            let mut stmt = conn.prepare(&format!(
                "{COLUMNS} WHERE user_id = ?1 ORDER BY received_at, id"
            ))?;
            let rows = stmt.query_map(params![uid], map_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("{COLUMNS} ORDER BY received_at, id"))?;
            let rows = stmt.query_map([], map_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(records)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<TranscriptRecord> {
    let payload: String = row.get(3)?;
    let embedding: Option<Vec<u8>> = row.get(6)?;
    Ok(TranscriptRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
        text: row.get(4)?,
        received_at: row.get(5)?,
        embedding: embedding.map(|b| bytes_to_embedding(&b)).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn insert(conn: &Connection, user_id: &str, text: &str) -> String {
        let payload = serde_json::json!({ "segments": [{ "text": text }] });
        insert_transcript(
            conn,
            &NewTranscript {
                user_id,
                session_id: Some("s-1"),
                payload: &payload,
                text,
                embedding: &[1.0, 0.0, 0.5],
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_and_list_roundtrip() {
        let conn = db::open_memory_database().unwrap();
        let id = insert(&conn, "u1", "Leo went to Bangkok");

        let records = list_transcripts(&conn, Some("u1")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].session_id.as_deref(), Some("s-1"));
        assert_eq!(records[0].embedding, vec![1.0, 0.0, 0.5]);
        assert_eq!(records[0].payload["segments"][0]["text"], "Leo went to Bangkok");
    }

    #[test]
    fn list_filters_by_user() {
        let conn = db::open_memory_database().unwrap();
        insert(&conn, "u1", "one");
        insert(&conn, "u2", "two");

        assert_eq!(list_transcripts(&conn, Some("u1")).unwrap().len(), 1);
        assert_eq!(list_transcripts(&conn, None).unwrap().len(), 2);
        assert!(list_transcripts(&conn, Some("u3")).unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = db::open_memory_database().unwrap();
        let id = insert(&conn, "u1", "one");
        assert!(delete_transcript(&conn, &id).unwrap());
        assert!(!delete_transcript(&conn, &id).unwrap());
    }
}
