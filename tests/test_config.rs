//! Configuration loading and clamping.

use std::io::Write;

use rig_planner::simulation::config::{ExpansionStrategy, PlannerConfig};
use rig_planner::simulation::geometry::Position;
use rig_planner::simulation::params::{MAX_LAMBDA, MIN_T_LIMIT};
use rig_planner::simulation::{RigError, ScenarioConfig};

#[test]
fn test_out_of_range_values_are_clamped_not_rejected() {
    let config: PlannerConfig = toml::from_str(
        r#"
        lambda = 1.0
        t_limit = 0.0
        gamma = 3.0
        p_d = -0.5
        samples = 0
        "#,
    )
    .unwrap();
    let config = config.validated();
    assert!((config.lambda - MAX_LAMBDA).abs() < 1e-12);
    assert!((config.t_limit - MIN_T_LIMIT).abs() < 1e-12);
    assert_eq!(config.gamma, 1.0);
    assert_eq!(config.p_d, 0.0);
    assert_eq!(config.samples, 1);
}

#[test]
fn test_goal_tolerance_is_clamped() {
    let config = PlannerConfig::new()
        .with_strategy(ExpansionStrategy::GoalDirected {
            goal: Position::new(1.0, 1.0),
            tolerance: -2.0,
        })
        .validated();
    assert_eq!(
        config.strategy,
        ExpansionStrategy::GoalDirected {
            goal: Position::new(1.0, 1.0),
            tolerance: 0.0
        }
    );
}

#[test]
fn test_scenario_round_trips_through_file() {
    let scenario = ScenarioConfig::default();
    let text = toml::to_string(&scenario).unwrap();
    let path = std::env::temp_dir().join(format!("rig_planner_scenario_{}.toml", std::process::id()));
    std::fs::File::create(&path)
        .unwrap()
        .write_all(text.as_bytes())
        .unwrap();
    let loaded = ScenarioConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, scenario);
}

#[test]
fn test_scenario_without_sources_is_rejected() {
    let err = ScenarioConfig::from_toml_str(
        r#"
        sources = []
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, RigError::Scenario(_)));
    assert!(err.to_string().starts_with("Scenario error"));
}
