//! Relationship storage.
//!
//! Relationships are directed (source, action, target) edges between nouns of
//! the same user, with provenance to the transcript they were extracted from.
//! Endpoints are given as base forms and resolved against the user's nouns;
//! unresolved endpoints produce a typed drop outcome instead of an error.

use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;

use crate::graph::nouns::find_noun_id;
use crate::graph::types::{JoinedRelationship, NounRef, NounType, Relationship};

/// Outcome of [`insert_relationship`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelationshipOutcome {
    Stored { id: String },
    DroppedUnresolvedSource,
    DroppedUnresolvedTarget,
}

impl RelationshipOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Fields of a relationship to store.
#[derive(Debug, Clone)]
pub struct NewRelationship<'a> {
    pub user_id: &'a str,
    pub source_base_form: &'a str,
    pub target_base_form: &'a str,
    pub action: &'a str,
    pub base_action: &'a str,
    pub transcript_id: &'a str,
}

/// Store a relationship after resolving both endpoints among the user's nouns.
///
/// Never stores an edge whose endpoints belong to another user: resolution is
/// scoped by `user_id`.
pub fn insert_relationship(
    conn: &Connection,
    new: &NewRelationship<'_>,
) -> Result<RelationshipOutcome> {
    let Some(source_id) = find_noun_id(conn, new.user_id, new.source_base_form)? else {
        return Ok(RelationshipOutcome::DroppedUnresolvedSource);
    };
    let Some(target_id) = find_noun_id(conn, new.user_id, new.target_base_form)? else {
        return Ok(RelationshipOutcome::DroppedUnresolvedTarget);
    };

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let base_action = if new.base_action.trim().is_empty() {
        new.action
    } else {
        new.base_action
    };

    conn.execute(
        "INSERT INTO relationships \
         (id, user_id, source_noun_id, target_noun_id, action, base_action, timestamp, transcript_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            new.user_id,
            source_id,
            target_id,
            new.action.trim(),
            base_action.trim(),
            now,
            new.transcript_id,
        ],
    )?;

    Ok(RelationshipOutcome::Stored { id })
}

const JOINED_SELECT: &str = "\
SELECT r.id, r.user_id, r.source_noun_id, r.target_noun_id, r.action, r.base_action, \
       r.timestamp, r.transcript_id, \
       s.name, s.type, s.base_form, \
       t.name, t.type, t.base_form \
FROM relationships r \
JOIN nouns s ON s.id = r.source_noun_id AND s.user_id = r.user_id \
JOIN nouns t ON t.id = r.target_noun_id AND t.user_id = r.user_id";

/// Every relationship of a user, joined with its endpoint nouns, in insertion order.
pub fn list_joined(conn: &Connection, user_id: &str) -> Result<Vec<JoinedRelationship>> {
    let mut stmt = conn.prepare(&format!(
        "{JOINED_SELECT} WHERE r.user_id = ?1 ORDER BY r.rowid"
    ))?;
    let rows = stmt
        .query_map(params![user_id], map_joined)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Relationships of a user extracted from any of `transcript_ids`, joined with
/// their endpoint nouns, in insertion order.
pub fn relationships_for_transcripts(
    conn: &Connection,
    user_id: &str,
    transcript_ids: &[String],
) -> Result<Vec<JoinedRelationship>> {
    if transcript_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = (0..transcript_ids.len())
        .map(|i| format!("?{}", i + 2))
        .collect();
    let sql = format!(
        "{JOINED_SELECT} WHERE r.user_id = ?1 AND r.transcript_id IN ({}) ORDER BY r.rowid",
        placeholders.join(", ")
    );

    let mut values: Vec<&str> = Vec::with_capacity(transcript_ids.len() + 1);
    values.push(user_id);
    values.extend(transcript_ids.iter().map(String::as_str));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), map_joined)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_joined(row: &Row<'_>) -> rusqlite::Result<JoinedRelationship> {
    let relationship = Relationship {
        id: row.get(0)?,
        user_id: row.get(1)?,
        source_noun_id: row.get(2)?,
        target_noun_id: row.get(3)?,
        action: row.get(4)?,
        base_action: row.get(5)?,
        timestamp: row.get(6)?,
        transcript_id: row.get(7)?,
    };
    let source_type: String = row.get(9)?;
    let target_type: String = row.get(12)?;
    Ok(JoinedRelationship {
        source_noun: NounRef {
            id: relationship.source_noun_id.clone(),
            name: row.get(8)?,
            noun_type: NounType::from_label(&source_type),
            base_form: row.get(10)?,
        },
        target_noun: NounRef {
            id: relationship.target_noun_id.clone(),
            name: row.get(11)?,
            noun_type: NounType::from_label(&target_type),
            base_form: row.get(13)?,
        },
        relationship,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::graph::nouns::upsert_noun;
    use crate::graph::transcripts::{insert_transcript, NewTranscript};

    fn setup() -> (Connection, String) {
        let conn = db::open_memory_database().unwrap();
        let payload = serde_json::json!({});
        let transcript_id = insert_transcript(
            &conn,
            &NewTranscript {
                user_id: "u1",
                session_id: None,
                payload: &payload,
                text: "Leo met Fabian",
                embedding: &[1.0],
            },
        )
        .unwrap();
        upsert_noun(&conn, "u1", "Leo", NounType::Person, "leo").unwrap();
        upsert_noun(&conn, "u1", "Fabian", NounType::Person, "fabian").unwrap();
        (conn, transcript_id)
    }

    fn rel<'a>(source: &'a str, target: &'a str, transcript_id: &'a str) -> NewRelationship<'a> {
        NewRelationship {
            user_id: "u1",
            source_base_form: source,
            target_base_form: target,
            action: "met",
            base_action: "meet",
            transcript_id,
        }
    }

    #[test]
    fn stores_resolved_relationship() {
        let (conn, tid) = setup();
        let outcome = insert_relationship(&conn, &rel("Leo", "fabian", &tid)).unwrap();
        assert!(outcome.is_stored());

        let joined = list_joined(&conn, "u1").unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].source_noun.name, "Leo");
        assert_eq!(joined[0].target_noun.name, "Fabian");
        assert_eq!(joined[0].relationship.base_action, "meet");
        assert_eq!(joined[0].relationship.transcript_id, tid);
    }

    #[test]
    fn unresolved_endpoints_are_dropped_with_reason() {
        let (conn, tid) = setup();
        assert_eq!(
            insert_relationship(&conn, &rel("alice", "fabian", &tid)).unwrap(),
            RelationshipOutcome::DroppedUnresolvedSource
        );
        assert_eq!(
            insert_relationship(&conn, &rel("leo", "bob", &tid)).unwrap(),
            RelationshipOutcome::DroppedUnresolvedTarget
        );
        assert!(list_joined(&conn, "u1").unwrap().is_empty());
    }

    #[test]
    fn other_users_nouns_do_not_resolve() {
        let (conn, tid) = setup();
        let new = NewRelationship {
            user_id: "u2",
            ..rel("leo", "fabian", &tid)
        };
        assert_eq!(
            insert_relationship(&conn, &new).unwrap(),
            RelationshipOutcome::DroppedUnresolvedSource
        );
    }

    #[test]
    fn filters_by_transcript() {
        let (conn, tid) = setup();
        insert_relationship(&conn, &rel("leo", "fabian", &tid)).unwrap();

        let hits = relationships_for_transcripts(&conn, "u1", &[tid.clone()]).unwrap();
        assert_eq!(hits.len(), 1);
        let misses = relationships_for_transcripts(&conn, "u1", &["other".to_string()]).unwrap();
        assert!(misses.is_empty());
        assert!(relationships_for_transcripts(&conn, "u1", &[]).unwrap().is_empty());
        assert!(relationships_for_transcripts(&conn, "u2", &[tid]).unwrap().is_empty());
    }

    #[test]
    fn empty_base_action_falls_back_to_action() {
        let (conn, tid) = setup();
        let new = NewRelationship {
            base_action: "",
            ..rel("leo", "fabian", &tid)
        };
        insert_relationship(&conn, &new).unwrap();
        assert_eq!(list_joined(&conn, "u1").unwrap()[0].relationship.base_action, "met");
    }
}
