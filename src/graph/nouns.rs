//! Noun storage with per-user deduplication on the normalized base form.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::graph::types::{Noun, NounType};

/// Result returned from [`upsert_noun`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NounUpsert {
    /// ID of the stored (or already existing) noun.
    pub id: String,
    /// `false` when a noun with the same base form already existed.
    pub created: bool,
}

/// Normalize a base form into the dedup key: trimmed, inner whitespace
/// collapsed to single spaces, lowercased.
pub fn normalize_base_form(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Insert a noun unless one with the same `(user_id, base_form)` exists.
///
/// An existing noun is never modified, even if `name` or `noun_type` differ.
/// The insert-if-absent runs as one `ON CONFLICT DO NOTHING` statement against
/// the UNIQUE index, so concurrent writers cannot create duplicates.
pub fn upsert_noun(
    conn: &Connection,
    user_id: &str,
    name: &str,
    noun_type: NounType,
    base_form: &str,
) -> Result<NounUpsert> {
    let mut key = normalize_base_form(base_form);
    if key.is_empty() {
        key = normalize_base_form(name);
    }
    anyhow::ensure!(!key.is_empty(), "noun has neither a name nor a base form");

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let inserted = conn.execute(
        "INSERT INTO nouns (id, user_id, name, type, base_form, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(user_id, base_form) DO NOTHING",
        params![id, user_id, name.trim(), noun_type.as_str(), key, now],
    )?;

    if inserted == 1 {
        return Ok(NounUpsert { id, created: true });
    }

    let existing = find_noun_id(conn, user_id, &key)?
        .with_context(|| format!("noun {key} vanished after conflicting insert"))?;
    Ok(NounUpsert {
        id: existing,
        created: false,
    })
}

/// Resolve a base form (normalized here) to the user's noun id.
pub fn find_noun_id(conn: &Connection, user_id: &str, base_form: &str) -> Result<Option<String>> {
    let key = normalize_base_form(base_form);
    let id = conn
        .query_row(
            "SELECT id FROM nouns WHERE user_id = ?1 AND base_form = ?2",
            params![user_id, key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// All nouns for a user, oldest first.
pub fn list_nouns(conn: &Connection, user_id: &str) -> Result<Vec<Noun>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, type, base_form, created_at FROM nouns \
         WHERE user_id = ?1 ORDER BY created_at, id",
    )?;
    let nouns = stmt
        .query_map(params![user_id], |row| {
            let noun_type: String = row.get(3)?;
            Ok(Noun {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                noun_type: NounType::from_label(&noun_type),
                base_form: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(nouns)
}
