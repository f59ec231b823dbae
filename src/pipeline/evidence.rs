//! Evidence filtering: decides which retrieved relationships a generated
//! answer actually talks about.

use crate::graph::types::JoinedRelationship;

pub trait EvidenceFilter: Send + Sync {
    /// Whether `answer` gives evidence for `relationship`.
    fn is_supported(&self, answer: &str, relationship: &JoinedRelationship) -> bool;

    /// Keep only supported relationships, preserving order.
    fn retain(&self, answer: &str, relationships: &[JoinedRelationship]) -> Vec<JoinedRelationship> {
        relationships
            .iter()
            .filter(|r| self.is_supported(answer, r))
            .cloned()
            .collect()
    }
}

/// Keeps a relationship when both endpoint noun names occur in the answer as
/// case-insensitive substrings.
///
/// Substring matching yields false positives ("Al" inside "Alice") and misses
/// paraphrases; both are accepted behavior of this filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringEvidenceFilter;

impl EvidenceFilter for SubstringEvidenceFilter {
    fn is_supported(&self, answer: &str, relationship: &JoinedRelationship) -> bool {
        let haystack = answer.to_lowercase();
        let mentions = |name: &str| {
            let needle = name.trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        };
        mentions(&relationship.source_noun.name) && mentions(&relationship.target_noun.name)
    }
}
