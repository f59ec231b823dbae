//! Whole-graph view for a user.

use anyhow::Result;
use rusqlite::Connection;

use crate::graph::nouns::list_nouns;
use crate::graph::relations::list_joined;
use crate::graph::types::{GraphEdge, GraphNode, GraphView};

/// All of a user's nouns as nodes and all of their relationships as edges, unfiltered.
pub fn list_graph(conn: &Connection, user_id: &str) -> Result<GraphView> {
    let nodes = list_nouns(conn, user_id)?
        .into_iter()
        .map(|n| GraphNode {
            id: n.id,
            label: n.name,
            noun_type: n.noun_type,
        })
        .collect();

    let edges = list_joined(conn, user_id)?
        .into_iter()
        .map(|r| GraphEdge {
            source: r.relationship.source_noun_id,
            target: r.relationship.target_noun_id,
            label: r.relationship.action,
        })
        .collect();

    Ok(GraphView { nodes, edges })
}
