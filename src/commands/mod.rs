//! View commands
//!
//! Commands represent user intent against a graph view (keyboard navigation,
//! clicks, search box input). They are processed by [`crate::handlers::GraphView`],
//! which validates them against the store and emits redraw and camera
//! instructions.

use crate::events::DeltaError;
use crate::queries::NavigationHop;
use crate::value_objects::{Direction, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Commands for view operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ViewCommand {
    /// Select a node, or deselect with `None`
    Select(Option<NodeId>),
    /// Focus a node, or clear focus with `None`
    Focus(Option<NodeId>),
    /// Filter to the nodes matching a query; an empty query clears the filter
    Search(String),
    /// Replace the filter, or clear it with `None`
    SetFilter(Option<HashSet<NodeId>>),
    /// Clear the filter
    ClearFilter,
    /// Move focus to the nearest node in a direction
    Move(Direction),
    /// Move focus to the next neighbour of the selection, clockwise
    NextConnected,
    /// Move focus to the previous neighbour of the selection
    PreviousConnected,
    /// Move focus to the next filter match, clockwise around the matches
    NextMatch,
    /// Move focus to the previous filter match
    PreviousMatch,
    /// Select the focused node
    SelectFocused,
    /// Clear selection and focus
    Reset,
}

impl ViewCommand {
    /// Short name for logging
    pub fn command_type(&self) -> &'static str {
        match self {
            ViewCommand::Select(_) => "select",
            ViewCommand::Focus(_) => "focus",
            ViewCommand::Search(_) => "search",
            ViewCommand::SetFilter(_) => "set-filter",
            ViewCommand::ClearFilter => "clear-filter",
            ViewCommand::Move(_) => "move",
            ViewCommand::NextConnected => "next-connected",
            ViewCommand::PreviousConnected => "previous-connected",
            ViewCommand::NextMatch => "next-match",
            ViewCommand::PreviousMatch => "previous-match",
            ViewCommand::SelectFocused => "select-focused",
            ViewCommand::Reset => "reset",
        }
    }

    /// Whether the command is a focus traversal
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            ViewCommand::Move(_)
                | ViewCommand::NextConnected
                | ViewCommand::PreviousConnected
                | ViewCommand::NextMatch
                | ViewCommand::PreviousMatch
        )
    }
}

/// What a processed command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// View state changed; `redrawn` nodes were restyled
    Applied { redrawn: usize },
    /// Focus moved along a navigation hop
    Navigated { hop: NavigationHop, redrawn: usize },
    /// Nothing to do (empty traversal set, nothing focused)
    NoOp,
}

impl CommandOutcome {
    /// Whether the command changed anything
    pub fn is_noop(&self) -> bool {
        matches!(self, CommandOutcome::NoOp)
    }
}

/// Result type for view operations
pub type ViewResult<T> = Result<T, ViewError>;

/// Errors that can occur while processing view operations
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("View has been closed")]
    ViewClosed,

    #[error(transparent)]
    Delta(#[from] DeltaError),

    #[error("Document operation failed for {id}: {source}")]
    Document {
        id: NodeId,
        #[source]
        source: anyhow::Error,
    },
}
