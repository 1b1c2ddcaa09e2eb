//! Graph value objects
//!
//! Value objects are immutable types that represent concepts in the note graph.
//! They are compared by value rather than identity.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a document node.
///
/// The id is the join key across store, view state and renderer. It is never
/// reused for a different logical document within one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Whether a node is backed by a document or only referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A node backed by an existing document
    #[default]
    Regular,
    /// A referenced-but-nonexistent document (broken reference)
    Phantom,
}

/// A document node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique, stable identifier
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Size metric derived from the inbound-link count
    #[serde(default)]
    pub weight: u32,
    /// Regular or phantom
    #[serde(default)]
    pub kind: NodeKind,
    /// Path of the backing document, empty for phantoms
    #[serde(default)]
    pub source_path: String,
    /// Tags found in the document, in order of appearance
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Node {
    /// Create a regular node backed by the document at `source_path`.
    ///
    /// The label defaults to the id.
    pub fn document(id: impl Into<NodeId>, source_path: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            weight: 0,
            kind: NodeKind::Regular,
            source_path: source_path.into(),
            tags: Vec::new(),
        }
    }

    /// Create a phantom node for a referenced document that does not exist
    pub fn phantom(id: impl Into<NodeId>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            weight: 0,
            kind: NodeKind::Phantom,
            source_path: String::new(),
            tags: Vec::new(),
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this node is a phantom
    pub fn is_phantom(&self) -> bool {
        self.kind == NodeKind::Phantom
    }
}

/// A directed reference from one document to another.
///
/// Identity is the ordered pair `(from, to)`; several references between the
/// same two documents collapse into one edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Referencing node
    pub from: NodeId,
    /// Referenced node
    pub to: NodeId,
}

impl Edge {
    /// Create a new edge
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Represents the position of a node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Get the distance to another position
    pub fn distance_to(&self, other: &Position2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Arithmetic mean of a set of positions, `None` when empty
    pub fn centroid<'a, I>(positions: I) -> Option<Position2D>
    where
        I: IntoIterator<Item = &'a Position2D>,
    {
        let mut count = 0usize;
        let (mut sum_x, mut sum_y) = (0.0, 0.0);
        for position in positions {
            sum_x += position.x;
            sum_y += position.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Position2D::new(sum_x / count as f64, sum_y / count as f64))
    }
}

impl Default for Position2D {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Cardinal direction of a keyboard move.
///
/// Canvas coordinates grow to the right and downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Whether the offset `(dx, dy)` lies in this direction (zero boundary inclusive)
    pub fn admits(&self, dx: f64, dy: f64) -> bool {
        match self {
            Direction::Left => dx <= 0.0,
            Direction::Right => dx >= 0.0,
            Direction::Up => dy <= 0.0,
            Direction::Down => dy >= 0.0,
        }
    }

    /// Offset perpendicular to the direction of travel
    pub fn perpendicular(&self, dx: f64, dy: f64) -> f64 {
        match self {
            Direction::Left | Direction::Right => dy,
            Direction::Up | Direction::Down => dx,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}
