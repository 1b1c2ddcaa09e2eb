//! Layout Reheat Integration Tests
//!
//! Time is paused, so instants recorded by the surface are exact.

use notegraph_view::{
    infrastructure::{RecordingSurface, StaticPositions},
    CameraInstruction, DeltaEvent, GraphSnapshot, GraphView, Node, NodeId, SimulationCommand,
    ViewCommand, ViewConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep, Instant};

fn open_view() -> (GraphView, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::new());
    let mut view = GraphView::new(
        ViewConfig::default(),
        surface.clone(),
        Arc::new(StaticPositions::new()),
        Handle::current(),
    );
    view.initialize(GraphSnapshot::from_parts(vec![Node::document("root", "/root.md")], vec![]))
        .unwrap();
    surface.clear();
    (view, surface)
}

fn millis_since(start: Instant, at: Instant) -> u128 {
    at.duration_since(start).as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_enables_once_and_disables_after_last_delta() {
        let (mut view, surface) = open_view();
        let start = Instant::now();

        view.apply_delta(DeltaEvent::node_added(Node::phantom("a"))).unwrap();
        sleep(Duration::from_millis(100)).await;
        view.apply_delta(DeltaEvent::node_added(Node::phantom("b"))).unwrap();
        sleep(Duration::from_millis(200)).await;
        view.apply_delta(DeltaEvent::edge_added("a", "b")).unwrap();
        assert!(view.is_reheating());

        sleep(Duration::from_millis(499)).await;
        assert!(view.is_reheating());
        assert_eq!(surface.simulation_commands().len(), 1);

        sleep(Duration::from_millis(100)).await;
        assert!(!view.is_reheating());

        let commands: Vec<(u128, SimulationCommand)> = surface
            .simulation_commands()
            .into_iter()
            .map(|(at, command)| (millis_since(start, at), command))
            .collect();
        assert_eq!(
            commands,
            vec![
                (0, SimulationCommand::Enable),
                (800, SimulationCommand::Stop),
                (800, SimulationCommand::Disable),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_reheat_twice() {
        let (mut view, surface) = open_view();

        view.apply_delta(DeltaEvent::node_added(Node::phantom("a"))).unwrap();
        sleep(Duration::from_millis(700)).await;
        view.apply_delta(DeltaEvent::node_added(Node::phantom("b"))).unwrap();
        sleep(Duration::from_millis(700)).await;

        let enables = surface
            .simulation_commands()
            .iter()
            .filter(|(_, command)| *command == SimulationCommand::Enable)
            .count();
        assert_eq!(enables, 2);
        assert_eq!(surface.simulation_commands().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_op_delta_does_not_reheat() {
        let (mut view, surface) = open_view();

        view.apply_delta(DeltaEvent::node_removed("missing")).unwrap();
        view.apply_delta(DeltaEvent::edge_removed("x", "y")).unwrap();
        sleep(Duration::from_secs(1)).await;

        assert!(surface.simulation_commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_locked_on_focus_during_reheat() {
        let (mut view, surface) = open_view();
        view.handle_command(ViewCommand::Focus(Some(NodeId::from("root"))))
            .unwrap();

        view.apply_delta(DeltaEvent::node_added(Node::phantom("a"))).unwrap();
        sleep(Duration::from_millis(600)).await;

        assert_eq!(
            surface.camera_instructions(),
            vec![
                CameraInstruction::Lock {
                    focus: NodeId::from("root")
                },
                CameraInstruction::Release
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_cancels_pending_timer() {
        let (mut view, surface) = open_view();

        view.apply_delta(DeltaEvent::node_added(Node::phantom("a"))).unwrap();
        view.destroy();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(
            surface.simulation_commands().into_iter().map(|(_, c)| c).collect::<Vec<_>>(),
            vec![SimulationCommand::Enable]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_focused_node_reheats_without_camera_lock() {
        let (mut view, surface) = open_view();
        view.apply_delta(DeltaEvent::node_added(Node::phantom("a"))).unwrap();
        sleep(Duration::from_millis(600)).await;
        view.handle_command(ViewCommand::Focus(Some(NodeId::from("a"))))
            .unwrap();
        surface.clear();

        view.apply_delta(DeltaEvent::node_removed("a")).unwrap();
        assert!(view.is_reheating());
        assert!(view.focused().is_none());
        sleep(Duration::from_millis(600)).await;

        assert!(surface.camera_instructions().is_empty());
        assert_eq!(
            surface.simulation_commands().into_iter().map(|(_, c)| c).collect::<Vec<_>>(),
            vec![
                SimulationCommand::Enable,
                SimulationCommand::Stop,
                SimulationCommand::Disable
            ]
        );
    }
}
