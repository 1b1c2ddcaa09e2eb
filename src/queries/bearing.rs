//! Compass bearings and cyclic ordering

use crate::value_objects::{NodeId, Position2D};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Direction of a cyclic step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleStep {
    Next,
    Previous,
}

/// Bearing of `target` seen from `origin`, clockwise from north in `[0, 360)`.
///
/// Canvas y grows downward, so north is `-y`. Computed as
/// `(degrees(atan2(dy, dx)) + 90 + 360) mod 360`; a target on the origin
/// itself gets 90.
pub fn compass_bearing(origin: Position2D, target: Position2D) -> f64 {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    let bearing = (dy.atan2(dx).to_degrees() + 90.0 + 360.0).rem_euclid(360.0);
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Sort ids by bearing around `center`, ascending.
///
/// Ids without a position, or every id when there is no center, get bearing
/// 0. The sort is stable, so equal bearings keep the input order.
pub fn order_by_bearing(
    ids: Vec<NodeId>,
    center: Option<Position2D>,
    positions: &HashMap<NodeId, Position2D>,
) -> Vec<(NodeId, f64)> {
    let mut ordered: Vec<(NodeId, f64)> = ids
        .into_iter()
        .map(|id| {
            let bearing = match (center, positions.get(&id)) {
                (Some(center), Some(position)) => compass_bearing(center, *position),
                _ => 0.0,
            };
            (id, bearing)
        })
        .collect();
    ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ordered
}

/// Index reached by stepping once from `current` in a cycle of `len`.
///
/// A missing `current` behaves as index -1, so `Next` lands on the first
/// element. Returns `None` for an empty cycle.
pub fn step_index(current: Option<usize>, len: usize, step: CycleStep) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = current.map_or(-1, |index| index as isize);
    let delta = match step {
        CycleStep::Next => 1,
        CycleStep::Previous => -1,
    };
    Some((current + delta).rem_euclid(len as isize) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = Position2D::new(0.0, 0.0);
        assert_eq!(compass_bearing(origin, Position2D::new(0.0, -10.0)), 0.0);
        assert!(close(compass_bearing(origin, Position2D::new(10.0, 0.0)), 90.0));
        assert!(close(compass_bearing(origin, Position2D::new(0.0, 10.0)), 180.0));
        assert!(close(compass_bearing(origin, Position2D::new(-10.0, 0.0)), 270.0));
        assert!(close(compass_bearing(origin, Position2D::new(10.0, -10.0)), 45.0));
    }

    #[test]
    fn test_bearing_matches_reference_formula() {
        let origin = Position2D::new(3.0, -7.0);
        for (x, y) in [
            (5.0, 1.0),
            (-2.0, -9.5),
            (3.5, 40.0),
            (-100.0, 2.0),
            (8.0, -7.0),
            (3.0, -7.0),
        ] {
            let target = Position2D::new(x, y);
            let (dx, dy) = (x - origin.x, y - origin.y);
            let reference = (dy.atan2(dx).to_degrees() + 90.0 + 360.0) % 360.0;
            assert!(close(compass_bearing(origin, target), reference), "{x},{y}");
        }
    }

    #[test]
    fn test_order_by_bearing() {
        let positions: HashMap<NodeId, Position2D> = [
            ("c", -10.0, 0.0),
            ("a", 0.0, -10.0),
            ("b", 10.0, 0.0),
        ]
        .into_iter()
        .map(|(id, x, y)| (NodeId::from(id), Position2D::new(x, y)))
        .collect();

        let ids = vec![NodeId::from("c"), NodeId::from("b"), NodeId::from("a")];
        let ordered = order_by_bearing(ids, Some(Position2D::default()), &positions);
        let names: Vec<&str> = ordered.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_coincident_target_ties_with_east() {
        let center = Position2D::new(10.0, 0.0);
        assert_eq!(compass_bearing(center, center), 90.0);

        let positions: HashMap<NodeId, Position2D> = [
            ("west", 0.0, 0.0),
            ("middle", 10.0, 0.0),
            ("east", 20.0, 0.0),
        ]
        .into_iter()
        .map(|(id, x, y)| (NodeId::from(id), Position2D::new(x, y)))
        .collect();

        // Equal bearings keep the input order
        let ids = vec![NodeId::from("middle"), NodeId::from("east"), NodeId::from("west")];
        let ordered = order_by_bearing(ids, Some(center), &positions);
        let names: Vec<&str> = ordered.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(names, vec!["middle", "east", "west"]);

        let ids = vec![NodeId::from("east"), NodeId::from("middle"), NodeId::from("west")];
        let ordered = order_by_bearing(ids, Some(center), &positions);
        let names: Vec<&str> = ordered.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(names, vec!["east", "middle", "west"]);
    }

    #[test]
    fn test_missing_position_gets_bearing_zero() {
        let positions: HashMap<NodeId, Position2D> =
            HashMap::from([(NodeId::from("east"), Position2D::new(5.0, 0.0))]);
        let ids = vec![NodeId::from("east"), NodeId::from("nowhere")];
        let ordered = order_by_bearing(ids, Some(Position2D::default()), &positions);
        assert_eq!(ordered[0], (NodeId::from("nowhere"), 0.0));
    }

    #[test]
    fn test_step_index_wraps() {
        assert_eq!(step_index(Some(2), 3, CycleStep::Next), Some(0));
        assert_eq!(step_index(Some(0), 3, CycleStep::Previous), Some(2));
        assert_eq!(step_index(None, 3, CycleStep::Next), Some(0));
        assert_eq!(step_index(None, 3, CycleStep::Previous), Some(1));
        assert_eq!(step_index(None, 1, CycleStep::Previous), Some(0));
        assert_eq!(step_index(None, 0, CycleStep::Next), None);
    }
}
