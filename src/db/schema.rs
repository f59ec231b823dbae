//! SQL DDL for all omiverse tables.
//!
//! Defines `users`, `transcripts`, `nouns`, `relationships` and `schema_meta`.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- One row per webhook call. `text` is the designated text that was embedded.
CREATE TABLE IF NOT EXISTS transcripts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    session_id TEXT,
    payload TEXT NOT NULL,
    text TEXT NOT NULL,
    received_at TEXT NOT NULL,
    embedding BLOB
);

CREATE INDEX IF NOT EXISTS idx_transcripts_user ON transcripts(user_id);

-- At most one noun per (user_id, base_form).
CREATE TABLE IF NOT EXISTS nouns (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('PERSON','PLACE','THING','OTHER')),
    base_form TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, base_form)
);

CREATE TABLE IF NOT EXISTS relationships (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    source_noun_id TEXT NOT NULL REFERENCES nouns(id),
    target_noun_id TEXT NOT NULL REFERENCES nouns(id),
    action TEXT NOT NULL,
    base_action TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    transcript_id TEXT NOT NULL REFERENCES transcripts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_relationships_user ON relationships(user_id);
CREATE INDEX IF NOT EXISTS idx_relationships_transcript ON relationships(transcript_id);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
