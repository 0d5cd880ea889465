//! Agents moving through the workspace.
//!
//! The [`Volunteer`] plans with a RIG tree and tracks what it has shared with
//! its partners; [`LineFollower`]s walk fixed waypoint routes and only serve
//! as fusion partners.

use std::collections::VecDeque;

use log::{debug, info};
use rand::Rng;

use crate::simulation::config::PlannerConfig;
use crate::simulation::error::{Result, RigError};
use crate::simulation::field::ProbabilityField;
use crate::simulation::fusion::{ChannelRegistry, TrajectoryPoint};
use crate::simulation::geometry::{Bounds, Position};
use crate::simulation::planning::{
    Control, ExpansionStats, FusionSet, MotionModel, Node, NodeId, RigPlanner, State, Tree,
};

/// Informative agent planning with a RIG tree.
#[derive(Debug, Clone)]
pub struct Volunteer {
    name: String,
    state: State,
    field: ProbabilityField,
    bounds: Bounds,
    channels: ChannelRegistry,
    planner: RigPlanner<MotionModel>,
    tree: Option<Tree>,
    path: Vec<NodeId>,
    time_step: u32,
    cost_spent: f64,
    information_gained: f64,
    state_log: Vec<State>,
    motion_log: Vec<Control>,
}

impl Volunteer {
    /// Creates a volunteer at `start` holding its own copy of `field`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        start: Position,
        field: ProbabilityField,
        bounds: Bounds,
        config: PlannerConfig,
        dynamics: MotionModel,
    ) -> Self {
        let state = State::at(start);
        Self {
            name: name.into(),
            state,
            field,
            bounds,
            channels: ChannelRegistry::new(),
            planner: RigPlanner::new(config, dynamics),
            tree: None,
            path: Vec::new(),
            time_step: 0,
            cost_spent: 0.0,
            information_gained: 0.0,
            state_log: vec![state],
            motion_log: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.state.position
    }

    #[must_use]
    pub const fn field(&self) -> &ProbabilityField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ProbabilityField {
        &mut self.field
    }

    #[must_use]
    pub const fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelRegistry {
        &mut self.channels
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        self.planner.config()
    }

    #[must_use]
    pub const fn fusion_range(&self) -> f64 {
        self.planner.config().fusion_range
    }

    #[must_use]
    pub const fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    #[must_use]
    pub const fn time_step(&self) -> u32 {
        self.time_step
    }

    #[must_use]
    pub const fn cost_spent(&self) -> f64 {
        self.cost_spent
    }

    #[must_use]
    pub const fn information_gained(&self) -> f64 {
        self.information_gained
    }

    #[must_use]
    pub fn state_log(&self) -> &[State] {
        &self.state_log
    }

    /// Motion primitives (heading, distance) executed so far.
    #[must_use]
    pub fn motion_log(&self) -> &[Control] {
        &self.motion_log
    }

    #[must_use]
    pub const fn last_expansion(&self) -> ExpansionStats {
        self.planner.last_stats()
    }

    /// Positions along the currently selected path, root first.
    #[must_use]
    pub fn planned_path(&self) -> Vec<Position> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        self.path
            .iter()
            .filter_map(|&id| tree.get(id).map(Node::position))
            .collect()
    }

    /// Whether another step would exceed the travel budget.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        let config = self.planner.config();
        self.cost_spent + config.step_size > config.budget
    }

    fn shared_values(&self) -> FusionSet {
        self.channels
            .iter()
            .map(|(name, channel)| (name.to_owned(), channel.shared()))
            .collect()
    }

    /// Syncs the tree root with what the agent has actually done.
    fn refresh_root(&mut self) {
        let fusion = self.shared_values();
        let tree = self.tree.get_or_insert_with(|| {
            Tree::new(Node::root(self.state, self.cost_spent, self.information_gained, self.time_step, FusionSet::new()))
        });
        let root = tree.root();
        if let Some(node) = tree.get_mut(root) {
            node.state = self.state;
            node.cost = self.cost_spent;
            node.information = self.information_gained;
            node.time_step = self.time_step;
            node.fusion = fusion;
            node.objective = 0.0;
            node.reward = 0.0;
        }
    }

    /// Runs one planning cycle and stores the selected path.
    ///
    /// Returns the number of nodes on the path, root included.
    pub fn plan<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.refresh_root();
        let Some(tree) = self.tree.as_mut() else {
            return 0;
        };
        self.path = self
            .planner
            .plan(tree, &self.field, &self.channels, &self.bounds, rng);
        debug!(
            "{} planned {} steps over {} nodes",
            self.name,
            self.path.len().saturating_sub(1),
            tree.len()
        );
        self.path.len()
    }

    /// Executes the first edge of the selected path.
    ///
    /// Returns `None` without moving when there is no edge to execute.
    pub fn step(&mut self) -> Option<Control> {
        let next = *self.path.get(1)?;
        let tree = self.tree.as_mut()?;
        let control = tree.commit(next)?;
        // Ids were renumbered; the best node is unchanged, so this is the
        // remainder of the executed path.
        self.path = self.planner.select_path(tree);
        let root = tree.root_node();
        self.state = root.state;
        self.cost_spent = root.cost;
        self.time_step = root.time_step;

        let gained = self.field.consume(&self.state.position, self.planner.config().p_d);
        self.information_gained += gained;
        self.state_log.push(self.state);
        self.motion_log.push(control);
        debug!(
            "{} moved to ({:.2}, {:.2}) k={} gained {:.4} (total {:.4})",
            self.name,
            self.state.position.x,
            self.state.position.y,
            self.time_step,
            gained,
            self.information_gained
        );
        Some(control)
    }
}

/// Waypoint follower with a fixed, fully known schedule.
#[derive(Debug, Clone)]
pub struct LineFollower {
    name: String,
    position: Position,
    time_step: u32,
    schedule: VecDeque<TrajectoryPoint>,
    visited: Vec<TrajectoryPoint>,
    field: ProbabilityField,
    p_d: f64,
    fusion_range: f64,
    information_gained: f64,
}

impl LineFollower {
    /// Creates a follower at the first waypoint with a unit-step schedule
    /// through the remaining ones.
    ///
    /// # Errors
    /// Returns [`RigError::Scenario`] with fewer than two waypoints.
    pub fn new(
        name: impl Into<String>,
        waypoints: &[Position],
        field: ProbabilityField,
        p_d: f64,
        fusion_range: f64,
    ) -> Result<Self> {
        let name = name.into();
        let Some(&start) = waypoints.first() else {
            return Err(RigError::Scenario(format!("{name}: no waypoints")));
        };
        if waypoints.len() < 2 {
            return Err(RigError::Scenario(format!(
                "{name}: needs at least two waypoints, got {}",
                waypoints.len()
            )));
        }
        let schedule = straight_line_schedule(waypoints, 0, 1.0);
        info!("{name} scheduled {} steps", schedule.len());
        Ok(Self {
            name,
            position: start,
            time_step: 0,
            schedule,
            visited: vec![TrajectoryPoint::new(start, 0)],
            field,
            p_d: p_d.clamp(0.0, 1.0),
            fusion_range,
            information_gained: 0.0,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn fusion_range(&self) -> f64 {
        self.fusion_range
    }

    #[must_use]
    pub const fn field(&self) -> &ProbabilityField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ProbabilityField {
        &mut self.field
    }

    #[must_use]
    pub const fn information_gained(&self) -> f64 {
        self.information_gained
    }

    #[must_use]
    pub fn visited(&self) -> &[TrajectoryPoint] {
        &self.visited
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Current point followed by the remaining schedule.
    #[must_use]
    pub fn trajectory(&self) -> Vec<TrajectoryPoint> {
        std::iter::once(TrajectoryPoint::new(self.position, self.time_step))
            .chain(self.schedule.iter().copied())
            .collect()
    }

    /// Advances one scheduled step and consumes the field there. A finished
    /// follower holds position but still advances its clock.
    pub fn step(&mut self) {
        match self.schedule.pop_front() {
            Some(point) => {
                self.position = point.position;
                self.time_step = point.time_step;
            }
            None => self.time_step += 1,
        }
        self.information_gained += self.field.consume(&self.position, self.p_d);
        self.visited
            .push(TrajectoryPoint::new(self.position, self.time_step));
    }
}

/// Time-indexed points from `waypoints[0]` through every later waypoint,
/// moving at most `step` per time step and landing on each waypoint exactly.
#[allow(
    clippy::cast_possible_truncation, // Leg lengths are small
    clippy::cast_sign_loss
)]
fn straight_line_schedule(waypoints: &[Position], start_time: u32, step: f64) -> VecDeque<TrajectoryPoint> {
    let mut schedule = VecDeque::new();
    let mut k = start_time;
    for leg in waypoints.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        let length = from.distance(&to);
        let steps = (length / step).ceil() as u32;
        let heading = from.heading_to(&to);
        for i in 1..=steps {
            k += 1;
            let position = if i == steps {
                to
            } else {
                from.offset(heading, step * f64::from(i))
            };
            schedule.push_back(TrajectoryPoint::new(position, k));
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::planning::HeadingDynamics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn volunteer(config: PlannerConfig) -> Volunteer {
        let start = Position::new(2.5, 2.5);
        Volunteer::new(
            "volunteer",
            start,
            ProbabilityField::uniform(10, 10),
            Bounds::from_size(10.0, 10.0),
            config.with_home(start).with_t_limit(60.0),
            MotionModel::Heading(HeadingDynamics::new(1.0)),
        )
    }

    #[test]
    fn test_schedule_unit_steps_onto_waypoints() {
        let waypoints = [
            Position::new(0.0, 0.0),
            Position::new(3.0, 0.0),
            Position::new(3.0, 2.5),
        ];
        let schedule: Vec<_> = straight_line_schedule(&waypoints, 0, 1.0).into_iter().collect();
        assert_eq!(schedule.len(), 6);
        assert_eq!(schedule[2].position, Position::new(3.0, 0.0));
        assert_eq!(schedule[5].position, Position::new(3.0, 2.5));
        for (i, p) in schedule.iter().enumerate() {
            assert_eq!(p.time_step as usize, i + 1);
        }
    }

    #[test]
    fn test_follower_rejects_single_waypoint() {
        let field = ProbabilityField::uniform(4, 4);
        let err = LineFollower::new("inky", &[Position::new(1.0, 1.0)], field, 0.5, 2.0);
        assert!(matches!(err, Err(RigError::Scenario(_))));
    }

    #[test]
    fn test_follower_walks_schedule_and_consumes() {
        let field = ProbabilityField::uniform(4, 1);
        let mut follower = LineFollower::new(
            "inky",
            &[Position::new(0.5, 0.5), Position::new(2.5, 0.5)],
            field,
            1.0,
            2.0,
        )
        .unwrap();
        assert_eq!(follower.trajectory().len(), 3);
        follower.step();
        assert!((follower.position().x - 1.5).abs() < 1e-12);
        assert!((follower.information_gained() - 0.25).abs() < 1e-12);
        assert_eq!(follower.field().cell(1, 0), 0.0);
        follower.step();
        assert!(follower.is_finished());
        follower.step();
        assert_eq!(follower.visited().last().unwrap().time_step, 3);
        assert_eq!(follower.trajectory().len(), 1);
    }

    #[test]
    fn test_volunteer_without_plan_does_not_move() {
        let mut v = volunteer(PlannerConfig::new());
        assert!(v.step().is_none());
        assert_eq!(v.time_step(), 0);
        assert_eq!(v.state_log().len(), 1);
    }

    #[test]
    fn test_volunteer_plan_and_step() {
        let mut v = volunteer(PlannerConfig::new().with_iteration_limit(50));
        let mut rng = StdRng::seed_from_u64(17);
        assert!(v.plan(&mut rng) >= 2);
        let planned = v.planned_path();
        let control = v.step().unwrap();
        assert_eq!(v.planned_path(), planned[1..].to_vec());
        assert!((control.distance - 1.0).abs() < 1e-12);
        assert_eq!(v.time_step(), 1);
        assert!((v.cost_spent() - 1.0).abs() < 1e-12);
        assert!(v.information_gained() > 0.0);
        assert!((v.field().total() - 1.0).abs() < 1e-9);
        assert_eq!(v.motion_log().len(), 1);
        let tree = v.tree().unwrap();
        assert!(tree.check_invariants(v.config().budget).is_ok());
        assert_eq!(tree.root_node().position(), v.position());
    }

    #[test]
    fn test_volunteer_replans_on_residual_tree() {
        let mut v = volunteer(PlannerConfig::new().with_iteration_limit(30));
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..3 {
            v.plan(&mut rng);
            if v.step().is_none() {
                break;
            }
        }
        let tree = v.tree().unwrap();
        assert!(tree.check_invariants(v.config().budget).is_ok());
        assert_eq!(tree.root_node().time_step, v.time_step());
        assert!((tree.root_node().information - v.information_gained()).abs() < 1e-12);
    }
}
