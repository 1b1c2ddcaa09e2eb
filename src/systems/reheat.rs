//! Layout reheat
//!
//! Store deltas re-enable the renderer's force simulation so new nodes settle;
//! once deltas stop arriving for the debounce window the simulation is halted
//! and disabled again.

use crate::aggregate::{GraphStore, Subscription};
use crate::events::{DeltaEvent, StoreNotification};
use crate::infrastructure::{CameraInstruction, RenderSurface, SimulationCommand};
use crate::value_objects::NodeId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Reheat state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReheatPhase {
    Idle,
    /// `locked` records whether the camera was locked on entry
    Active { locked: bool },
}

#[derive(Debug)]
struct TimerState {
    phase: ReheatPhase,
    /// Node the camera is locked on while active
    locked_on: Option<NodeId>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Reheat {
    renderer: Arc<dyn RenderSurface>,
    focus: watch::Receiver<Option<NodeId>>,
    window: Duration,
    runtime: Handle,
    state: Mutex<TimerState>,
}

impl Reheat {
    // Renderer calls happen after the state guard is released, so a surface
    // that reacts with another delta re-enters without deadlocking.
    fn on_delta(self: &Arc<Self>, event: &DeltaEvent) {
        let removed = match event {
            DeltaEvent::NodeRemoved { node_id } => Some(node_id),
            _ => None,
        };
        // The focus channel still names a node removed by this very delta
        let focus = self
            .focus
            .borrow()
            .clone()
            .filter(|focus| Some(focus) != removed);

        let mut instructions = Vec::new();
        {
            let mut state = self.state.lock();
            match state.phase {
                ReheatPhase::Idle => {
                    instructions.push(Instruction::Simulation(SimulationCommand::Enable));
                    if let Some(focus) = focus.clone() {
                        instructions.push(Instruction::Camera(CameraInstruction::Lock { focus }));
                    }
                    state.phase = ReheatPhase::Active {
                        locked: focus.is_some(),
                    };
                    state.locked_on = focus;
                    debug!("Reheat started (camera locked: {})", state.locked_on.is_some());
                }
                ReheatPhase::Active { locked: true } => {
                    if removed.is_some() && state.locked_on.as_ref() == removed {
                        debug!("Locked node removed, releasing camera");
                        instructions.push(Instruction::Camera(CameraInstruction::Release));
                        state.phase = ReheatPhase::Active { locked: false };
                        state.locked_on = None;
                    }
                }
                ReheatPhase::Active { locked: false } => {}
            }

            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.generation += 1;
            let generation = state.generation;
            let deadline = Instant::now() + self.window;
            let reheat = Arc::clone(self);
            state.timer = Some(self.runtime.spawn(async move {
                sleep_until(deadline).await;
                reheat.expire(generation);
            }));
        }

        self.issue(instructions);
    }

    fn expire(&self, generation: u64) {
        let phase = {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!("Ignoring stale reheat timer {}", generation);
                return;
            }
            state.timer = None;
            state.locked_on = None;
            std::mem::replace(&mut state.phase, ReheatPhase::Idle)
        };

        if let ReheatPhase::Active { locked } = phase {
            let mut instructions = vec![
                Instruction::Simulation(SimulationCommand::Stop),
                Instruction::Simulation(SimulationCommand::Disable),
            ];
            if locked {
                instructions.push(Instruction::Camera(CameraInstruction::Release));
            }
            self.issue(instructions);
            debug!("Reheat settled");
        }
    }

    fn issue(&self, instructions: Vec<Instruction>) {
        for instruction in instructions {
            match instruction {
                Instruction::Simulation(command) => self.renderer.simulation(command),
                Instruction::Camera(camera) => self.renderer.camera(camera),
            }
        }
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.phase = ReheatPhase::Idle;
        state.locked_on = None;
    }
}

enum Instruction {
    Simulation(SimulationCommand),
    Camera(CameraInstruction),
}

/// Debounced simulation toggle driven by store deltas
pub struct ReheatController {
    reheat: Arc<Reheat>,
    subscription: Option<Subscription>,
}

impl ReheatController {
    /// Subscribe to `store` deltas. The timer runs on `runtime`; `focus`
    /// decides whether the camera is locked while the layout settles.
    pub fn new(
        store: &GraphStore,
        renderer: Arc<dyn RenderSurface>,
        focus: watch::Receiver<Option<NodeId>>,
        window: Duration,
        runtime: Handle,
    ) -> Self {
        let reheat = Arc::new(Reheat {
            renderer,
            focus,
            window,
            runtime,
            state: Mutex::new(TimerState {
                phase: ReheatPhase::Idle,
                locked_on: None,
                generation: 0,
                timer: None,
            }),
        });

        let listener = Arc::clone(&reheat);
        let subscription = store.subscribe(move |notification| {
            if let StoreNotification::Delta(event) = notification {
                listener.on_delta(event);
            }
        });

        Self {
            reheat,
            subscription: Some(subscription),
        }
    }

    /// Current phase
    pub fn phase(&self) -> ReheatPhase {
        self.reheat.state.lock().phase
    }

    /// Whether the simulation is currently enabled by a reheat
    pub fn is_active(&self) -> bool {
        self.phase() != ReheatPhase::Idle
    }

    /// Debounce window
    pub fn window(&self) -> Duration {
        self.reheat.window
    }

    /// Stop listening and cancel a pending timer without touching the renderer
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.reheat.cancel();
    }
}

impl Drop for ReheatController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ReheatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReheatController")
            .field("window", &self.reheat.window)
            .field("state", &*self.reheat.state.lock())
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}
