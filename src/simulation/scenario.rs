//! Scenario files: workspace, initial belief sources and agents.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::simulation::agent::{LineFollower, Volunteer};
use crate::simulation::config::PlannerConfig;
use crate::simulation::environment::{gaussian_mixture_field, GaussianSource};
use crate::simulation::error::{Result, RigError};
use crate::simulation::geometry::{Bounds, Position};
use crate::simulation::params::{
    BUDGET, DETECTION_PROBABILITY, FUSION_RANGE, MAX_TURN, WORKSPACE_HEIGHT, WORKSPACE_WIDTH,
};
use crate::simulation::planning::{HeadingDynamics, MotionModel, TurnRateDynamics};
use crate::simulation::world::Simulation;

/// Motion model of the volunteer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicsKind {
    /// Uniform heading, fixed step.
    #[default]
    Heading,
    /// Bounded turn relative to the current heading.
    TurnRate {
        #[serde(default = "default_max_turn")]
        max_turn: f64,
    },
}

impl DynamicsKind {
    #[must_use]
    pub fn build(self, step: f64) -> MotionModel {
        match self {
            Self::Heading => MotionModel::Heading(HeadingDynamics::new(step)),
            Self::TurnRate { max_turn } => MotionModel::TurnRate(TurnRateDynamics::new(step, max_turn)),
        }
    }
}

/// Workspace extent; the field has one unit cell per unit of area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            width: WORKSPACE_WIDTH,
            height: WORKSPACE_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolunteerConfig {
    pub name: String,
    pub start: Position,
    #[serde(default)]
    pub dynamics: DynamicsKind,
    #[serde(default)]
    pub planner: PlannerConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FollowerConfig {
    pub name: String,
    pub waypoints: Vec<Position>,
    #[serde(default = "default_fusion_range")]
    pub fusion_range: f64,
    #[serde(default = "default_p_d")]
    pub p_d: f64,
}

const fn default_max_turn() -> f64 {
    MAX_TURN
}

const fn default_fusion_range() -> f64 {
    FUSION_RANGE
}

const fn default_p_d() -> f64 {
    DETECTION_PROBABILITY
}

/// Everything needed to build a [`Simulation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub workspace: WorkspaceConfig,
    pub sources: Vec<GaussianSource>,
    pub volunteer: VolunteerConfig,
    pub followers: Vec<FollowerConfig>,
}

impl Default for ScenarioConfig {
    /// Two followers sweeping the top and right edges while the volunteer
    /// starts in the bottom-left corner.
    fn default() -> Self {
        let start = Position::new(1.5, 1.5);
        Self {
            seed: 42,
            workspace: WorkspaceConfig::default(),
            sources: vec![
                GaussianSource::new(5.0, 14.0, 2.0, 2.5),
                GaussianSource::new(14.0, 6.0, 3.0, 2.0),
            ],
            volunteer: VolunteerConfig {
                name: "volunteer".into(),
                start,
                dynamics: DynamicsKind::Heading,
                planner: PlannerConfig::new()
                    .with_home(start)
                    .with_budget(2.0 * BUDGET),
            },
            followers: vec![
                FollowerConfig {
                    name: "inky".into(),
                    waypoints: vec![
                        Position::new(1.5, 18.5),
                        Position::new(18.5, 18.5),
                        Position::new(18.5, 1.5),
                    ],
                    fusion_range: FUSION_RANGE,
                    p_d: DETECTION_PROBABILITY,
                },
                FollowerConfig {
                    name: "clyde".into(),
                    waypoints: vec![
                        Position::new(18.5, 1.5),
                        Position::new(10.5, 1.5),
                        Position::new(10.5, 10.5),
                    ],
                    fusion_range: FUSION_RANGE,
                    p_d: DETECTION_PROBABILITY,
                },
            ],
        }
    }
}

impl ScenarioConfig {
    /// Parses and validates a TOML scenario.
    ///
    /// # Errors
    /// Returns [`RigError::Config`] on malformed TOML and
    /// [`RigError::Scenario`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Loads a TOML scenario file.
    ///
    /// # Errors
    /// Returns [`RigError::Io`] if the file cannot be read, otherwise as
    /// [`ScenarioConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        info!("Loading scenario from {}", path.display());
        Self::from_toml_str(&content)
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(self.workspace.width, self.workspace.height)
    }

    /// Checks the scenario for inconsistencies that cannot be clamped away.
    ///
    /// # Errors
    /// Returns [`RigError::Scenario`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let ws = self.workspace;
        if !(ws.width.is_finite() && ws.height.is_finite() && ws.width >= 1.0 && ws.height >= 1.0) {
            return Err(RigError::Scenario(format!(
                "workspace must be at least 1x1, got {}x{}",
                ws.width, ws.height
            )));
        }
        if self.sources.is_empty() {
            return Err(RigError::Scenario("no belief sources".into()));
        }
        if let Some(s) = self.sources.iter().find(|s| !(s.x_std > 0.0 && s.y_std > 0.0)) {
            return Err(RigError::Scenario(format!(
                "source at ({}, {}) needs positive spread",
                s.x_mean, s.y_mean
            )));
        }
        let bounds = self.bounds();
        if !bounds.contains(&self.volunteer.start) {
            return Err(RigError::Scenario(format!(
                "{} starts outside the workspace",
                self.volunteer.name
            )));
        }
        if let DynamicsKind::TurnRate { max_turn } = self.volunteer.dynamics {
            if !(max_turn.is_finite() && max_turn >= 0.0) {
                return Err(RigError::Scenario(format!(
                    "max_turn must be non-negative, got {max_turn}"
                )));
            }
        }
        let mut names = vec![self.volunteer.name.as_str()];
        for follower in &self.followers {
            if names.contains(&follower.name.as_str()) {
                return Err(RigError::Scenario(format!("duplicate agent name {}", follower.name)));
            }
            names.push(&follower.name);
            if follower.waypoints.len() < 2 {
                return Err(RigError::Scenario(format!(
                    "{} needs at least two waypoints",
                    follower.name
                )));
            }
        }
        Ok(())
    }

    /// Builds the simulation described by this scenario.
    ///
    /// # Errors
    /// Returns [`RigError::Scenario`] if the scenario is invalid or its
    /// sources carry no mass over the workspace.
    pub fn build(&self) -> Result<Simulation> {
        self.validate()?;
        let bounds = self.bounds();
        let field = gaussian_mixture_field(&bounds, &self.sources)
            .ok_or_else(|| RigError::Scenario("initial field has no mass".into()))?;

        let planner = self.volunteer.planner.clone().validated();
        let dynamics = self.volunteer.dynamics.build(planner.step_size);
        let volunteer = Volunteer::new(
            self.volunteer.name.clone(),
            self.volunteer.start,
            field.clone(),
            bounds,
            planner,
            dynamics,
        );
        let followers = self
            .followers
            .iter()
            .map(|f| LineFollower::new(f.name.clone(), &f.waypoints, field.clone(), f.p_d, f.fusion_range))
            .collect::<Result<Vec<_>>>()?;
        info!(
            "Scenario: {}x{} workspace, {} sources, {} followers",
            self.workspace.width,
            self.workspace.height,
            self.sources.len(),
            followers.len()
        );
        Ok(Simulation::new(bounds, volunteer, followers, self.seed))
    }
}
