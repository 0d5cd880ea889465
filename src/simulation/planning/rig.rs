//! Rapidly-exploring information gathering (RIG) tree planner.
//!
//! One planning cycle re-scores the carried-forward tree against the current
//! field, grows it until the time or iteration limit is hit (or nothing is
//! left open) and selects the best root-to-node path.

use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;

use super::reward::RewardModel;
use super::sampler::Sampler;
use super::state::Node;
use super::steering::{near, nearest, steer, Dynamics};
use super::tree::{NodeId, Tree};
use crate::simulation::config::{ExpansionStrategy, PlannerConfig};
use crate::simulation::field::ProbabilityField;
use crate::simulation::fusion::ChannelRegistry;
use crate::simulation::geometry::Bounds;

/// Why an expansion loop stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Termination {
    #[default]
    TimeLimit,
    IterationLimit,
    /// Every node is closed.
    EmptyFrontier,
}

/// Summary of one expansion loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExpansionStats {
    pub iterations: usize,
    pub inserted: usize,
    /// Best candidates dropped as near-duplicates of a sibling.
    pub twins_rejected: usize,
    pub open: usize,
    pub closed: usize,
    pub elapsed: Duration,
    pub termination: Termination,
}

/// Tree planner parameterised by the agent's motion model.
#[derive(Clone, Debug)]
pub struct RigPlanner<D> {
    config: PlannerConfig,
    dynamics: D,
    last_stats: ExpansionStats,
}

impl<D: Dynamics> RigPlanner<D> {
    /// Creates a planner. The configuration is clamped to admissible values.
    #[must_use]
    pub fn new(config: PlannerConfig, dynamics: D) -> Self {
        Self {
            config: config.validated(),
            dynamics,
            last_stats: ExpansionStats::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Statistics of the most recent expansion.
    #[must_use]
    pub const fn last_stats(&self) -> ExpansionStats {
        self.last_stats
    }

    const fn prefers_goal(&self) -> bool {
        matches!(self.config.strategy, ExpansionStrategy::GoalDirected { .. })
    }

    /// Re-scores `tree` against the current field and channel state.
    pub fn rescore(&self, tree: &mut Tree, field: &ProbabilityField, channels: &ChannelRegistry) {
        RewardModel::new(&self.config, channels, tree.root_node().time_step).rescore(tree, field);
    }

    /// Grows `tree` until a limit is hit or no open node remains.
    ///
    /// Each iteration inserts at most one node: the best-reward candidate
    /// over the near set of a steered intermediate position.
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        tree: &mut Tree,
        field: &ProbabilityField,
        channels: &ChannelRegistry,
        bounds: &Bounds,
        rng: &mut R,
    ) -> ExpansionStats {
        let config = &self.config;
        let model = RewardModel::new(config, channels, tree.root_node().time_step);
        let sampler = Sampler::new(*bounds, Some(config.bias_target()), config.sample_bias);
        let start = Instant::now();
        let mut stats = ExpansionStats::default();

        stats.termination = loop {
            if config
                .iteration_limit
                .is_some_and(|limit| stats.iterations >= limit)
            {
                break Termination::IterationLimit;
            }
            if start.elapsed().as_secs_f64() >= config.t_limit {
                break Termination::TimeLimit;
            }
            let target = sampler.sample(rng);
            let Some(from) = nearest(tree, &target).and_then(|id| tree.get(id).map(|n| n.state))
            else {
                debug!("No open nodes left after {} iterations", stats.iterations);
                break Termination::EmptyFrontier;
            };
            stats.iterations += 1;

            let (intermediate, _) = steer(&self.dynamics, &from, &target, config.samples, rng);
            let mut best: Option<(NodeId, Node)> = None;
            for parent_id in near(tree, &intermediate.position, config.radius) {
                let Some(parent) = tree.get(parent_id) else { continue };
                let (state, control) =
                    steer(&self.dynamics, &parent.state, &intermediate.position, config.samples, rng);
                let branch = model.branch_at(tree, parent_id, field);
                let (candidate, _) = model.evaluate(parent, state, control, &branch);
                if best
                    .as_ref()
                    .is_none_or(|(_, b)| candidate.reward > b.reward)
                {
                    best = Some((parent_id, candidate));
                }
            }

            let Some((parent_id, node)) = best else { continue };
            if config.twin_tolerance > 0.0
                && tree.has_twin(parent_id, &node.position(), config.twin_tolerance)
            {
                stats.twins_rejected += 1;
                continue;
            }
            let close = node.cost > config.budget || node.goal_reached;
            if let Some(id) = tree.insert(parent_id, node) {
                stats.inserted += 1;
                if close {
                    tree.close(id);
                }
            }
        };

        stats.elapsed = start.elapsed();
        stats.open = tree.open_count();
        stats.closed = tree.len() - stats.open;
        debug!(
            "Expansion: {} iterations, {} inserted, {} twins, {} open / {} closed in {:?} ({:?})",
            stats.iterations,
            stats.inserted,
            stats.twins_rejected,
            stats.open,
            stats.closed,
            stats.elapsed,
            stats.termination
        );
        self.last_stats = stats;
        stats
    }

    /// Root-to-node path to the best node of `tree`.
    #[must_use]
    pub fn select_path(&self, tree: &Tree) -> Vec<NodeId> {
        tree.select_path(self.prefers_goal())
    }

    /// Runs a full planning cycle and returns the selected path.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        tree: &mut Tree,
        field: &ProbabilityField,
        channels: &ChannelRegistry,
        bounds: &Bounds,
        rng: &mut R,
    ) -> Vec<NodeId> {
        self.rescore(tree, field, channels);
        self.expand(tree, field, channels, bounds, rng);
        self.select_path(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometry::Position;
    use crate::simulation::planning::state::{FusionSet, State};
    use crate::simulation::planning::steering::HeadingDynamics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn root_tree(x: f64, y: f64) -> Tree {
        Tree::new(Node::root(State::new(x, y, 0.0), 0.0, 0.0, 0, FusionSet::new()))
    }

    fn planner(config: PlannerConfig) -> RigPlanner<HeadingDynamics> {
        let step = config.step_size;
        RigPlanner::new(config.with_t_limit(60.0), HeadingDynamics::new(step))
    }

    #[test]
    fn test_zero_iterations_leaves_root_only() {
        let mut planner = planner(PlannerConfig::new().with_iteration_limit(0));
        let mut tree = root_tree(1.0, 1.0);
        let field = ProbabilityField::uniform(10, 10);
        let mut rng = StdRng::seed_from_u64(0);
        let path = planner.plan(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(10.0, 10.0),
            &mut rng,
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.edges().count(), 0);
        assert_eq!(path, vec![tree.root()]);
        assert_eq!(planner.last_stats().termination, Termination::IterationLimit);
    }

    #[test]
    fn test_one_node_per_iteration_at_most() {
        let mut planner = planner(
            PlannerConfig::new()
                .with_iteration_limit(40)
                .with_twin_tolerance(0.0),
        );
        let mut tree = root_tree(5.0, 5.0);
        let field = ProbabilityField::uniform(10, 10);
        let mut rng = StdRng::seed_from_u64(3);
        let stats = planner.expand(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(10.0, 10.0),
            &mut rng,
        );
        assert_eq!(stats.iterations, 40);
        assert!(stats.inserted <= 40);
        assert_eq!(tree.len(), stats.inserted + 1);
        assert!(tree.check_invariants(planner.config().budget).is_ok());
    }

    #[test]
    fn test_closed_root_is_empty_frontier() {
        let mut planner = planner(PlannerConfig::new().with_iteration_limit(10));
        let mut tree = root_tree(1.0, 1.0);
        tree.close(tree.root());
        let field = ProbabilityField::uniform(4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let stats = planner.expand(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(4.0, 4.0),
            &mut rng,
        );
        assert_eq!(stats.termination, Termination::EmptyFrontier);
        assert_eq!(stats.iterations, 0);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_over_budget_nodes_are_closed() {
        let mut planner = planner(
            PlannerConfig::new()
                .with_budget(3.0)
                .with_iteration_limit(300),
        );
        let mut tree = root_tree(2.0, 2.0);
        let field = ProbabilityField::uniform(5, 5);
        let mut rng = StdRng::seed_from_u64(8);
        let stats = planner.expand(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(5.0, 5.0),
            &mut rng,
        );
        assert!(stats.closed > 0);
        for (id, node) in tree.nodes() {
            if node.cost > 3.0 {
                assert!(tree.is_closed(id));
            }
        }
        assert!(tree.check_invariants(3.0).is_ok());
    }

    #[test]
    fn test_goal_directed_closes_and_prefers_goal() {
        let goal = Position::new(4.0, 1.0);
        let mut planner = planner(
            PlannerConfig::new()
                .with_iteration_limit(400)
                .with_strategy(ExpansionStrategy::GoalDirected {
                    goal,
                    tolerance: 0.75,
                }),
        );
        let mut tree = root_tree(1.0, 1.0);
        let field = ProbabilityField::uniform(6, 6);
        let mut rng = StdRng::seed_from_u64(21);
        let path = planner.plan(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(6.0, 6.0),
            &mut rng,
        );
        let goal_nodes: Vec<_> = tree.nodes().filter(|(_, n)| n.goal_reached).collect();
        assert!(!goal_nodes.is_empty());
        for (id, _) in &goal_nodes {
            assert!(tree.is_closed(*id));
        }
        let leaf = tree.get(*path.last().unwrap()).unwrap();
        assert!(leaf.goal_reached);
        assert!(leaf.position().distance(&goal) < 0.75);
    }

    #[test]
    fn test_twin_suppression_counts_rejections() {
        // A large tolerance makes every second child of a parent a twin.
        let mut planner = planner(
            PlannerConfig::new()
                .with_iteration_limit(100)
                .with_twin_tolerance(10.0),
        );
        let mut tree = root_tree(5.0, 5.0);
        let field = ProbabilityField::uniform(10, 10);
        let mut rng = StdRng::seed_from_u64(2);
        let stats = planner.expand(
            &mut tree,
            &field,
            &ChannelRegistry::new(),
            &Bounds::from_size(10.0, 10.0),
            &mut rng,
        );
        assert!(stats.twins_rejected > 0);
        for id in tree.ids() {
            assert!(tree.children(id).len() <= 1);
        }
    }
}
