//! Graph view
//!
//! Owns the store, the view state engine, the navigator and the reheat
//! controller for one open graph, and turns commands and deltas into
//! renderer instructions.

use crate::aggregate::{DeltaOutcome, GraphSnapshot, GraphStore};
use crate::commands::{CommandOutcome, ViewCommand, ViewError, ViewResult};
use crate::config::ViewConfig;
use crate::events::{DeltaBatch, DeltaEvent};
use crate::infrastructure::{CameraInstruction, DocumentService, PositionSource, RenderSurface};
use crate::projections::{RecolorMode, RedrawBatch, ViewState, ViewStateEngine};
use crate::queries::{CycleStep, NavigationHop, SpatialNavigator};
use crate::systems::ReheatController;
use crate::value_objects::NodeId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Ticket for an in-flight preview load.
///
/// Only the most recent ticket of an open view is honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    view_id: Uuid,
    generation: u64,
    node_id: NodeId,
}

impl PreviewRequest {
    /// Node whose content is being loaded
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

#[derive(Debug, Clone)]
struct Preview {
    node_id: NodeId,
    content: String,
}

/// One open graph view
pub struct GraphView {
    view_id: Uuid,
    config: ViewConfig,
    store: GraphStore,
    engine: ViewStateEngine,
    navigator: SpatialNavigator,
    reheat: ReheatController,
    renderer: Arc<dyn RenderSurface>,
    positions: Arc<dyn PositionSource>,
    preview_generation: u64,
    preview: Option<Preview>,
    last_error: Option<String>,
    closed: bool,
}

impl GraphView {
    /// Create an empty view. The reheat timer runs on `runtime`.
    pub fn new(
        config: ViewConfig,
        renderer: Arc<dyn RenderSurface>,
        positions: Arc<dyn PositionSource>,
        runtime: Handle,
    ) -> Self {
        let store = GraphStore::new();
        let engine = ViewStateEngine::new(&store);
        let reheat = ReheatController::new(
            &store,
            Arc::clone(&renderer),
            engine.focus_watch(),
            config.reheat_window(),
            runtime,
        );
        let navigator = SpatialNavigator::new(&config);

        Self {
            view_id: Uuid::new_v4(),
            config,
            store,
            engine,
            navigator,
            reheat,
            renderer,
            positions,
            preview_generation: 0,
            preview: None,
            last_error: None,
            closed: false,
        }
    }

    /// Unique id of this view instance
    pub fn view_id(&self) -> Uuid {
        self.view_id
    }

    /// The view's configuration
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The authoritative graph
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Selection, focus and filter state
    pub fn state(&self) -> &ViewState {
        self.engine.state()
    }

    /// Focused node, if any
    pub fn focused(&self) -> Option<&NodeId> {
        self.engine.focused()
    }

    /// Selected node, if any
    pub fn selected(&self) -> Option<&NodeId> {
        self.engine.selected()
    }

    /// Whether a reheat is in progress
    pub fn is_reheating(&self) -> bool {
        self.reheat.is_active()
    }

    /// Whether the view has been destroyed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// User-visible error from the last failed document operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Dismiss the user-visible error
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Node and content of the current preview
    pub fn current_preview(&self) -> Option<(&NodeId, &str)> {
        self.preview
            .as_ref()
            .map(|preview| (&preview.node_id, preview.content.as_str()))
    }

    fn ensure_open(&self) -> ViewResult<()> {
        if self.closed {
            return Err(ViewError::ViewClosed);
        }
        Ok(())
    }

    fn emit(&self, batch: &RedrawBatch) -> usize {
        if batch.mode == RecolorMode::Full || !batch.is_empty() {
            self.renderer.redraw(batch);
        }
        batch.len()
    }

    /// Replace the dataset and redraw every node
    pub fn initialize(&mut self, snapshot: GraphSnapshot) -> ViewResult<RedrawBatch> {
        self.ensure_open()?;
        self.store.initialize(snapshot);
        self.engine.invalidate();
        let batch = self.engine.refresh(&self.store);
        self.emit(&batch);
        self.drop_orphaned_preview();
        Ok(batch)
    }

    /// Apply one delta and redraw what changed
    pub fn apply_delta(&mut self, event: DeltaEvent) -> ViewResult<DeltaOutcome> {
        self.ensure_open()?;
        let outcome = self.store.apply_delta(event)?;
        if outcome == DeltaOutcome::Applied {
            let batch = self.engine.refresh(&self.store);
            self.emit(&batch);
            self.drop_orphaned_preview();
        }
        Ok(outcome)
    }

    /// Apply a batch of deltas as one bulk change and redraw every node.
    ///
    /// Returns the number of events that changed the store.
    pub fn apply_batch(&mut self, batch: DeltaBatch) -> ViewResult<usize> {
        self.ensure_open()?;
        let applied = self.store.apply_batch(batch);
        if applied > 0 {
            self.engine.invalidate();
            let redraw = self.engine.refresh(&self.store);
            self.emit(&redraw);
            self.drop_orphaned_preview();
        }
        debug!("Applied {} batched deltas", applied);
        Ok(applied)
    }

    fn drop_orphaned_preview(&mut self) {
        let orphaned = self
            .preview
            .as_ref()
            .is_some_and(|preview| !self.store.contains_node(preview.node_id.as_str()));
        if orphaned {
            self.preview = None;
        }
    }

    /// Process a user command
    pub fn handle_command(&mut self, command: ViewCommand) -> ViewResult<CommandOutcome> {
        self.ensure_open()?;
        debug!("Handling {} command", command.command_type());

        match command {
            ViewCommand::Select(id) => {
                let batch = self.engine.select(&self.store, id)?;
                Ok(self.applied(&batch))
            }
            ViewCommand::Focus(id) => {
                let batch = self.engine.focus(&self.store, id)?;
                Ok(self.applied(&batch))
            }
            ViewCommand::Search(query) => Ok(self.search(&query)),
            ViewCommand::SetFilter(ids) => {
                let batch = self.engine.set_active(&self.store, ids);
                Ok(self.applied(&batch))
            }
            ViewCommand::ClearFilter => {
                let batch = self.engine.set_active(&self.store, None);
                Ok(self.applied(&batch))
            }
            ViewCommand::Move(direction) => {
                self.engine.sync(&self.store);
                let hop = self.navigator.nearest_in_direction(
                    &self.store,
                    self.engine.state(),
                    self.positions.as_ref(),
                    direction,
                );
                self.follow(hop)
            }
            ViewCommand::NextConnected => self.step_connected(CycleStep::Next),
            ViewCommand::PreviousConnected => self.step_connected(CycleStep::Previous),
            ViewCommand::NextMatch => self.step_search(CycleStep::Next),
            ViewCommand::PreviousMatch => self.step_search(CycleStep::Previous),
            ViewCommand::SelectFocused => {
                self.engine.sync(&self.store);
                match self.engine.focused().cloned() {
                    Some(focused) => {
                        let batch = self.engine.select(&self.store, Some(focused))?;
                        Ok(self.applied(&batch))
                    }
                    None => Ok(CommandOutcome::NoOp),
                }
            }
            ViewCommand::Reset => {
                self.engine.reset();
                let batch = self.engine.refresh(&self.store);
                Ok(self.applied(&batch))
            }
        }
    }

    fn applied(&self, batch: &RedrawBatch) -> CommandOutcome {
        CommandOutcome::Applied {
            redrawn: self.emit(batch),
        }
    }

    fn search(&mut self, query: &str) -> CommandOutcome {
        let query = query.trim();
        if query.is_empty() {
            let batch = self.engine.set_active(&self.store, None);
            return self.applied(&batch);
        }

        let matches = self.store.search(query);
        debug!("Search {:?} matched {} nodes", query, matches.len());
        let active: HashSet<NodeId> = matches.iter().cloned().collect();
        let batch = self.engine.set_active(&self.store, Some(active));
        let outcome = self.applied(&batch);
        if !matches.is_empty() {
            self.renderer
                .camera(CameraInstruction::FitTo { fit_to: matches });
        }
        outcome
    }

    fn step_connected(&mut self, step: CycleStep) -> ViewResult<CommandOutcome> {
        self.engine.sync(&self.store);
        let hop = self.navigator.step_connected(
            &self.store,
            self.engine.state(),
            self.positions.as_ref(),
            step,
        );
        self.follow(hop)
    }

    fn step_search(&mut self, step: CycleStep) -> ViewResult<CommandOutcome> {
        self.engine.sync(&self.store);
        let hop = self.navigator.step_search(
            &self.store,
            self.engine.state(),
            self.positions.as_ref(),
            step,
        );
        self.follow(hop)
    }

    fn follow(&mut self, hop: Option<NavigationHop>) -> ViewResult<CommandOutcome> {
        match hop {
            Some(hop) => self.navigate(hop),
            None => Ok(CommandOutcome::NoOp),
        }
    }

    /// Focus the hop's target and ask the renderer to center on it
    pub fn navigate(&mut self, hop: NavigationHop) -> ViewResult<CommandOutcome> {
        self.ensure_open()?;
        let batch = self.engine.focus(&self.store, Some(hop.target.clone()))?;
        let redrawn = self.emit(&batch);
        self.renderer.camera(CameraInstruction::Focus {
            focus: hop.target.clone(),
            zoom_factor: hop.zoom_factor,
        });
        Ok(CommandOutcome::Navigated { hop, redrawn })
    }

    /// Start loading a node's content for preview
    pub fn begin_preview(&mut self, id: NodeId) -> ViewResult<PreviewRequest> {
        self.ensure_open()?;
        if !self.store.contains_node(id.as_str()) {
            return Err(ViewError::UnknownNode(id));
        }
        self.preview_generation += 1;
        Ok(PreviewRequest {
            view_id: self.view_id,
            generation: self.preview_generation,
            node_id: id,
        })
    }

    /// Apply the result of a preview load.
    ///
    /// Returns `Ok(false)` when the result is stale (superseded, for another
    /// view, for a removed node, or arriving after the view closed) and was
    /// dropped. A failed load records `last_error` and leaves focus unchanged.
    pub fn finish_preview(
        &mut self,
        request: PreviewRequest,
        result: anyhow::Result<String>,
    ) -> ViewResult<bool> {
        if self.closed
            || request.view_id != self.view_id
            || request.generation != self.preview_generation
            || !self.store.contains_node(request.node_id.as_str())
        {
            warn!("Dropping stale preview of {}", request.node_id);
            return Ok(false);
        }

        match result {
            Ok(content) => {
                let batch = self.engine.focus(&self.store, Some(request.node_id.clone()))?;
                self.emit(&batch);
                let content = content
                    .lines()
                    .skip(self.config.preview_line_offset)
                    .collect::<Vec<_>>()
                    .join("\n");
                self.preview = Some(Preview {
                    node_id: request.node_id,
                    content,
                });
                self.last_error = None;
                Ok(true)
            }
            Err(source) => {
                warn!("Preview of {} failed: {:#}", request.node_id, source);
                self.last_error = Some(format!("{source:#}"));
                Err(ViewError::Document {
                    id: request.node_id,
                    source,
                })
            }
        }
    }

    /// Load and show a node's content
    pub async fn preview(
        &mut self,
        service: &dyn DocumentService,
        id: NodeId,
    ) -> ViewResult<bool> {
        let request = self.begin_preview(id)?;
        let result = service.read_content(request.node_id()).await;
        self.finish_preview(request, result)
    }

    /// Open a node's document in the external editor
    pub async fn open(&mut self, service: &dyn DocumentService, id: NodeId) -> ViewResult<()> {
        self.ensure_open()?;
        if let Err(source) = service.open(&id).await {
            warn!("Opening {} failed: {:#}", id, source);
            self.last_error = Some(format!("{source:#}"));
            return Err(ViewError::Document { id, source });
        }
        Ok(())
    }

    /// Tear down the view: cancel the reheat timer, detach from the store and
    /// drop the dataset. Later operations fail with [`ViewError::ViewClosed`].
    pub fn destroy(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reheat.shutdown();
        self.engine.detach();
        self.store.destroy();
        self.preview = None;
        info!("Graph view {} destroyed", self.view_id);
    }
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("view_id", &self.view_id)
            .field("nodes", &self.store.node_count())
            .field("edges", &self.store.edge_count())
            .field("engine", &self.engine)
            .field("reheat", &self.reheat)
            .field("closed", &self.closed)
            .finish()
    }
}
