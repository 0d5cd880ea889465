//! End-to-end runs of the multi-agent simulation.

use rig_planner::simulation::config::PlannerConfig;
use rig_planner::simulation::geometry::Position;
use rig_planner::simulation::scenario::FollowerConfig;
use rig_planner::simulation::ScenarioConfig;

fn quick_scenario() -> ScenarioConfig {
    let mut scenario = ScenarioConfig::default();
    scenario.volunteer.planner = PlannerConfig::new()
        .with_home(scenario.volunteer.start)
        .with_budget(12.0)
        .with_iteration_limit(60)
        .with_t_limit(60.0);
    scenario
}

#[test]
fn test_simulation_stays_within_budget() {
    env_logger::try_init().ok();
    let mut sim = quick_scenario().build().unwrap();
    let summary = sim.run(100);

    assert!(sim.is_finished());
    assert!(summary.time_steps >= 1);
    assert!(summary.cost_spent <= 12.0 + 1e-9);
    assert!(summary.information_gained > 0.0);

    let volunteer = sim.volunteer();
    assert_eq!(volunteer.state_log().len() as u32, summary.time_steps + 1);
    assert_eq!(volunteer.motion_log().len() as u32, summary.time_steps);
    assert!((volunteer.field().total() - 1.0).abs() < 1e-9);
    for pair in volunteer.state_log().windows(2) {
        let d = pair[0].position.distance(&pair[1].position);
        assert!((d - 1.0).abs() < 1e-9);
    }
    let tree = volunteer.tree().unwrap();
    assert!(tree.check_invariants(12.0).is_ok());
}

#[test]
fn test_same_seed_same_run() {
    let run = || {
        let mut sim = quick_scenario().build().unwrap();
        sim.run(6);
        sim.volunteer()
            .state_log()
            .iter()
            .map(|s| s.position)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_escort_fuses_and_shares() {
    let mut scenario = quick_scenario();
    let start = scenario.volunteer.start;
    // A follower shadowing the volunteer's start with a generous radio.
    scenario.followers = vec![FollowerConfig {
        name: "escort".into(),
        waypoints: vec![start, Position::new(start.x + 0.5, start.y)],
        fusion_range: 50.0,
        p_d: 0.5,
    }];
    scenario.volunteer.planner.fusion_range = 50.0;
    let mut sim = scenario.build().unwrap();
    let summary = sim.run(4);

    assert_eq!(summary.fusion_events as u32, summary.time_steps);
    assert!((summary.information_fused - summary.information_gained).abs() < 1e-12);
    let channel = sim.volunteer().channels().get("escort").unwrap();
    assert_eq!(channel.fusion_count() as u32, summary.time_steps);
    assert_eq!(sim.volunteer().field(), sim.followers()[0].field());
}
