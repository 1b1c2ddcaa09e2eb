//! Per-node visual classification
//!
//! A node's base classification is chosen from a closed set of variants by an
//! explicit precedence. Inactive (filtered out) and focused are independent
//! overlays on top of the base classification.

use crate::value_objects::NodeId;
use serde::{Deserialize, Serialize};

/// Base classification of a node, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Selected,
    Outgoing,
    Incoming,
    Phantom,
    Regular,
}

impl Classification {
    /// Every variant ordered from highest to lowest precedence
    pub const PRECEDENCE: [Classification; 5] = [
        Classification::Selected,
        Classification::Outgoing,
        Classification::Incoming,
        Classification::Phantom,
        Classification::Regular,
    ];

    /// Precedence rank, 0 is highest
    pub fn rank(self) -> u8 {
        match self {
            Classification::Selected => 0,
            Classification::Outgoing => 1,
            Classification::Incoming => 2,
            Classification::Phantom => 3,
            Classification::Regular => 4,
        }
    }

    /// Pick the highest-precedence variant among those that apply.
    ///
    /// `Regular` always applies, so the result is never empty.
    pub fn resolve<I>(applicable: I) -> Classification
    where
        I: IntoIterator<Item = Classification>,
    {
        applicable
            .into_iter()
            .chain([Classification::Regular])
            .min_by_key(|c| c.rank())
            .unwrap_or(Classification::Regular)
    }

    /// Lowercase name used by renderers
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Selected => "selected",
            Classification::Outgoing => "outgoing",
            Classification::Incoming => "incoming",
            Classification::Phantom => "phantom",
            Classification::Regular => "regular",
        }
    }
}

/// Facts about one node that drive its classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFacts {
    pub selected: bool,
    pub outgoing: bool,
    pub incoming: bool,
    pub phantom: bool,
    pub active: bool,
    pub focused: bool,
}

/// What the renderer needs to style one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAppearance {
    pub classification: Classification,
    /// Excluded by the effective active set; overrides the classification visually
    pub inactive: bool,
    pub focused: bool,
}

impl NodeAppearance {
    /// Derive the appearance from node facts
    pub fn from_facts(facts: NodeFacts) -> Self {
        let applicable = [
            (facts.selected, Classification::Selected),
            (facts.outgoing, Classification::Outgoing),
            (facts.incoming, Classification::Incoming),
            (facts.phantom, Classification::Phantom),
        ]
        .into_iter()
        .filter_map(|(applies, class)| applies.then_some(class));

        Self {
            classification: Classification::resolve(applicable),
            inactive: !facts.active,
            focused: facts.focused,
        }
    }
}

/// Restyle instruction for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub id: NodeId,
    #[serde(flatten)]
    pub appearance: NodeAppearance,
}

/// How a redraw batch was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecolorMode {
    /// Every known node
    Full,
    /// Only nodes whose appearance changed
    Incremental,
}

/// Batch of restyle instructions for the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedrawBatch {
    pub mode: RecolorMode,
    pub entries: Vec<NodeStyle>,
}

impl RedrawBatch {
    /// Empty incremental batch
    pub fn empty() -> Self {
        Self {
            mode: RecolorMode::Incremental,
            entries: Vec::new(),
        }
    }

    /// Whether there is nothing to redraw
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the entry for a node
    pub fn get(&self, id: &str) -> Option<&NodeAppearance> {
        self.entries
            .iter()
            .find(|entry| entry.id.as_str() == id)
            .map(|entry| &entry.appearance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_table_matches_rank() {
        for (index, class) in Classification::PRECEDENCE.iter().enumerate() {
            assert_eq!(class.rank() as usize, index);
        }
    }

    #[test]
    fn test_resolve_picks_highest() {
        use Classification::*;
        assert_eq!(Classification::resolve([Phantom, Incoming]), Incoming);
        assert_eq!(Classification::resolve([Incoming, Outgoing]), Outgoing);
        assert_eq!(Classification::resolve([Phantom, Selected, Outgoing]), Selected);
        assert_eq!(Classification::resolve(std::iter::empty()), Regular);
    }

    #[test]
    fn test_every_fact_combination_respects_priority() {
        for bits in 0u8..64 {
            let facts = NodeFacts {
                selected: bits & 1 != 0,
                outgoing: bits & 2 != 0,
                incoming: bits & 4 != 0,
                phantom: bits & 8 != 0,
                active: bits & 16 != 0,
                focused: bits & 32 != 0,
            };
            let appearance = NodeAppearance::from_facts(facts);

            let expected = if facts.selected {
                Classification::Selected
            } else if facts.outgoing {
                Classification::Outgoing
            } else if facts.incoming {
                Classification::Incoming
            } else if facts.phantom {
                Classification::Phantom
            } else {
                Classification::Regular
            };
            assert_eq!(appearance.classification, expected, "facts: {facts:?}");
            assert_eq!(appearance.inactive, !facts.active);
            assert_eq!(appearance.focused, facts.focused);
        }
    }

    #[test]
    fn test_node_style_serializes_flat() {
        let style = NodeStyle {
            id: NodeId::from("a"),
            appearance: NodeAppearance {
                classification: Classification::Selected,
                inactive: false,
                focused: true,
            },
        };
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["classification"], "selected");
        assert_eq!(json["focused"], true);
    }
}
