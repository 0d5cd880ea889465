//! Belief fusion between agents.

use proptest::prelude::*;
use rig_planner::simulation::agent::LineFollower;
use rig_planner::simulation::field::ProbabilityField;
use rig_planner::simulation::fusion::{try_fuse, ChannelRegistry};
use rig_planner::simulation::geometry::Position;

fn follower(name: &str, waypoints: &[Position], range: f64) -> LineFollower {
    LineFollower::new(name, waypoints, ProbabilityField::uniform(10, 10), 0.6, range).unwrap()
}

#[test]
fn test_crossing_followers_fuse_within_bound() {
    // Both routes pass (5, 5) at time step 4.
    let mut a = follower("inky", &[Position::new(1.0, 5.0), Position::new(9.0, 5.0)], 1.5);
    let mut b = follower("clyde", &[Position::new(5.0, 1.0), Position::new(5.0, 9.0)], 2.0);
    for _ in 0..4 {
        a.step();
        b.step();
    }
    assert!(a.position().distance(&b.position()) < 1e-9);

    let before_a = a.field().clone();
    let before_b = b.field().clone();
    let (pa, pb) = (a.position(), b.position());
    let event = try_fuse(
        (&pa, a.fusion_range(), a.field_mut()),
        (&pb, b.fusion_range(), b.field_mut()),
    )
    .unwrap();
    assert_eq!(event.range, 1.5);

    for (i, (x, y)) in a.field().cells().iter().zip(b.field().cells()).enumerate() {
        let spread = (before_a.cells()[i] - before_b.cells()[i]).abs();
        assert!((x - y).abs() <= spread + 1e-12);
    }
    assert_eq!(a.field(), b.field());
    assert!((a.field().total() - 1.0).abs() < 1e-9);
}

#[test]
fn test_out_of_range_does_not_fuse() {
    let mut a = ProbabilityField::uniform(4, 4);
    let mut b = ProbabilityField::point_mass(4, 4, 1, 1).unwrap();
    let before = b.clone();
    let event = try_fuse(
        (&Position::new(0.0, 0.0), 2.0, &mut a),
        (&Position::new(2.0, 0.0), 5.0, &mut b),
    );
    assert!(event.is_none());
    assert_eq!(b, before);
}

#[test]
fn test_shared_information_tracks_latest_fusion() {
    let mut registry = ChannelRegistry::new();
    registry.register("inky");
    registry.register("clyde");
    registry.record_fusion("inky", 0.4);
    registry.record_fusion("clyde", 0.1);
    registry.record_fusion("inky", 0.9);
    assert!((registry.get("inky").unwrap().shared() - 0.9).abs() < 1e-12);
    assert!((registry.get("clyde").unwrap().novel_total() - 0.1).abs() < 1e-12);
    assert!((registry.information_fused() - 1.0).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_second_fusion_changes_nothing(
        a in prop::collection::vec(0.01f64..1.0, 16),
        b in prop::collection::vec(0.01f64..1.0, 16),
    ) {
        let mut a = ProbabilityField::from_cells(4, 4, a).unwrap();
        let mut b = ProbabilityField::from_cells(4, 4, b).unwrap();
        let p = Position::new(1.0, 1.0);
        prop_assert!(try_fuse((&p, 2.0, &mut a), (&p, 2.0, &mut b)).is_some());
        let (once_a, once_b) = (a.clone(), b.clone());
        prop_assert!(try_fuse((&p, 2.0, &mut a), (&p, 2.0, &mut b)).is_some());
        for (x, y) in a.cells().iter().zip(once_a.cells()) {
            prop_assert!((x - y).abs() < 1e-12);
        }
        for (x, y) in b.cells().iter().zip(once_b.cells()) {
            prop_assert!((x - y).abs() < 1e-12);
        }
    }
}
