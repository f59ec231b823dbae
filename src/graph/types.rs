//! Knowledge graph type definitions.
//!
//! Defines [`NounType`], the stored [`Noun`] and [`Relationship`] records, the
//! [`JoinedRelationship`] read model used by retrieval, and the [`GraphView`]
//! returned to visualization clients.

use serde::{Deserialize, Serialize};

/// Coarse entity category assigned by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NounType {
    Person,
    Place,
    Thing,
    Other,
}

impl NounType {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Place => "PLACE",
            Self::Thing => "THING",
            Self::Other => "OTHER",
        }
    }

    /// Lenient parse used for model output: unknown labels become [`NounType::Other`].
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or(Self::Other)
    }
}

impl std::fmt::Display for NounType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NounType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PERSON" => Ok(Self::Person),
            "PLACE" => Ok(Self::Place),
            "THING" => Ok(Self::Thing),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("unknown noun type: {s}")),
        }
    }
}

/// An entity mentioned in one of a user's transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Noun {
    pub id: String,
    pub user_id: String,
    /// Surface form from the first observation.
    pub name: String,
    #[serde(rename = "type")]
    pub noun_type: NounType,
    /// Normalized dedup key, unique per user.
    pub base_form: String,
    pub created_at: String,
}

/// A directed, labeled edge between two nouns of the same user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub user_id: String,
    pub source_noun_id: String,
    pub target_noun_id: String,
    pub action: String,
    pub base_action: String,
    pub timestamp: String,
    /// Transcript the relationship was extracted from.
    pub transcript_id: String,
}

/// The parts of a noun carried alongside a joined relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NounRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub noun_type: NounType,
    pub base_form: String,
}

/// A relationship joined with both endpoint nouns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRelationship {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub source_noun: NounRef,
    pub target_noun: NounRef,
}

impl JoinedRelationship {
    /// "Leo participated in ETH Global Hackathon"
    pub fn statement(&self) -> String {
        format!(
            "{} {} {}",
            self.source_noun.name, self.relationship.action, self.target_noun.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub noun_type: NounType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Nodes and edges for visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphView {
    /// Build a view from joined relationships: nodes deduplicated by id in
    /// first-seen order, one edge per relationship.
    pub fn from_relationships<'a>(
        relationships: impl IntoIterator<Item = &'a JoinedRelationship>,
    ) -> Self {
        let mut view = GraphView::default();
        let mut seen = std::collections::HashSet::new();

        for rel in relationships {
            for noun in [&rel.source_noun, &rel.target_noun] {
                if seen.insert(noun.id.clone()) {
                    view.nodes.push(GraphNode {
                        id: noun.id.clone(),
                        label: noun.name.clone(),
                        noun_type: noun.noun_type,
                    });
                }
            }
            view.edges.push(GraphEdge {
                source: rel.relationship.source_noun_id.clone(),
                target: rel.relationship.target_noun_id.clone(),
                label: rel.relationship.action.clone(),
            });
        }

        view
    }
}
