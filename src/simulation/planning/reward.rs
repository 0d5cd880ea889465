//! Information and reward model.
//!
//! A candidate successor is scored against the field as it would look after
//! walking the branch from the root to its parent, so every evaluation works
//! on its own [`BranchField`].
//!
//! ```text
//! gained   = p_d · field[cell(x)]
//! I        = I_parent + gained
//! novelty  = mean over channels c of (c fused here ? 0 : I − fused_c)
//! penalty  = w · max(0, |x − home| − (B − C))²
//! clamped  = max(γ^k · (I − λ · novelty) − penalty, −1)
//! step     = clamped + 1
//! J        = J_parent + clamped
//! reward   = J + 1
//! ```
//!
//! The progress bonus enters the selection key once per node rather than
//! once per edge, so path length alone never outweighs information.

use log::trace;

use super::state::{Control, FusionSet, Node, State};
use super::tree::{NodeId, Tree};
use crate::simulation::config::{ExpansionStrategy, PlannerConfig};
use crate::simulation::field::{BranchField, ProbabilityField};
use crate::simulation::fusion::ChannelRegistry;
use crate::simulation::geometry::Position;
use crate::simulation::params::{PROGRESS_BONUS, REWARD_FLOOR};

/// The terms that make up one step reward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RewardBreakdown {
    pub novelty: f64,
    pub penalty: f64,
    /// Discounted objective minus penalty, before clamping.
    pub raw: f64,
    /// `raw` clamped to the reward floor.
    pub clamped: f64,
    /// `clamped` plus the progress bonus.
    pub step: f64,
}

/// Expected information gathered by visiting `position`.
#[must_use]
pub fn information_gained(field: &BranchField<'_>, position: &Position, p_d: f64) -> f64 {
    p_d * field.density(position)
}

/// Copies the parent's fusion set and stamps every channel predicted to be
/// in range at `time_step` with the candidate's cumulative information.
///
/// Returns the new set together with the channels fused at this node.
#[must_use]
pub fn fusion_set(
    parent: &FusionSet,
    channels: &ChannelRegistry,
    position: &Position,
    time_step: u32,
    information: f64,
    fusion_range: f64,
) -> (FusionSet, Vec<String>) {
    let mut fusion = parent.clone();
    let fused_now: Vec<String> = channels
        .coincident(position, time_step, fusion_range)
        .into_iter()
        .map(str::to_owned)
        .collect();
    for name in &fused_now {
        fusion.insert(name.clone(), information);
    }
    (fusion, fused_now)
}

/// Mean information not yet shared across all channels.
///
/// Channels fused at this node contribute zero; channels never fused count
/// everything since the start. No channels means no novelty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn novelty(
    channels: &ChannelRegistry,
    fusion: &FusionSet,
    fused_now: &[String],
    information: f64,
) -> f64 {
    if channels.is_empty() {
        return 0.0;
    }
    let total: f64 = channels
        .names()
        .map(|name| {
            if fused_now.iter().any(|f| f == name) {
                0.0
            } else {
                information - fusion.get(name).copied().unwrap_or(0.0)
            }
        })
        .sum();
    total / channels.len() as f64
}

/// Quadratic penalty for positions from which home is out of reach with the
/// remaining budget.
#[must_use]
pub fn budget_penalty(config: &PlannerConfig, position: &Position, cost: f64) -> f64 {
    let remaining = config.budget - cost;
    let shortfall = position.distance(&config.home) - remaining;
    if shortfall > 0.0 {
        config.penalty_weight * shortfall * shortfall
    } else {
        0.0
    }
}

/// Combines the terms into a clamped step reward.
#[must_use]
pub fn step_reward(
    config: &PlannerConfig,
    relative_time: u32,
    information: f64,
    novelty: f64,
    penalty: f64,
) -> RewardBreakdown {
    let discount = config.gamma.powf(f64::from(relative_time));
    let raw = discount * (information - config.lambda * novelty) - penalty;
    let clamped = raw.max(REWARD_FLOOR);
    RewardBreakdown {
        novelty,
        penalty,
        raw,
        clamped,
        step: clamped + PROGRESS_BONUS,
    }
}

/// Scores candidate successors for one planning tree.
#[derive(Clone, Copy, Debug)]
pub struct RewardModel<'a> {
    pub config: &'a PlannerConfig,
    pub channels: &'a ChannelRegistry,
    /// Time step of the tree root; discounting is relative to it.
    pub root_time: u32,
}

impl<'a> RewardModel<'a> {
    #[must_use]
    pub const fn new(config: &'a PlannerConfig, channels: &'a ChannelRegistry, root_time: u32) -> Self {
        Self {
            config,
            channels,
            root_time,
        }
    }

    fn is_goal(&self, position: &Position) -> bool {
        match self.config.strategy {
            ExpansionStrategy::Rig => false,
            ExpansionStrategy::GoalDirected { goal, tolerance } => {
                position.distance(&goal) < tolerance
            }
        }
    }

    /// Builds the node reached from `parent` through `control`.
    ///
    /// `branch` must reflect the field after walking root → `parent`.
    #[must_use]
    pub fn evaluate(
        &self,
        parent: &Node,
        state: State,
        control: Control,
        branch: &BranchField<'_>,
    ) -> (Node, RewardBreakdown) {
        let position = state.position;
        let time_step = parent.time_step + 1;
        let information = parent.information + information_gained(branch, &position, self.config.p_d);
        let cost = parent.cost + self.config.step_size;
        let (fusion, fused_now) = fusion_set(
            &parent.fusion,
            self.channels,
            &position,
            time_step,
            information,
            self.config.fusion_range,
        );
        let novelty = novelty(self.channels, &fusion, &fused_now, information);
        let penalty = budget_penalty(self.config, &position, cost);
        let breakdown = step_reward(
            self.config,
            time_step.saturating_sub(self.root_time),
            information,
            novelty,
            penalty,
        );
        trace!(
            "Candidate ({:.2}, {:.2}) k={} I={:.4} novelty={:.4} penalty={:.4} step={:.4}",
            position.x,
            position.y,
            time_step,
            information,
            novelty,
            penalty,
            breakdown.step
        );
        let node = Node {
            state,
            control: Some(control),
            cost,
            information,
            time_step,
            fusion,
            objective: parent.objective + breakdown.clamped,
            reward: parent.objective + breakdown.step,
            goal_reached: self.is_goal(&position),
        };
        (node, breakdown)
    }

    /// Field as seen from `id`'s children: the canonical field with every
    /// node below the root on the path to `id` consumed in order.
    #[must_use]
    pub fn branch_at<'f>(&self, tree: &Tree, id: NodeId, field: &'f ProbabilityField) -> BranchField<'f> {
        let mut branch = field.branch();
        for step in tree.path_to(id).into_iter().skip(1) {
            if let Some(node) = tree.get(step) {
                branch.consume(&node.position(), self.config.p_d);
            }
        }
        branch
    }

    /// Re-scores every node of a carried-forward tree against the current
    /// field, depth first, with a private field copy per branch.
    pub fn rescore(&self, tree: &mut Tree, field: &ProbabilityField) {
        let root = tree.root();
        let mut stack: Vec<(NodeId, BranchField<'_>)> = vec![(root, field.branch())];
        while let Some((id, branch)) = stack.pop() {
            let Some(parent) = tree.get(id).cloned() else {
                continue;
            };
            for &child in tree.children(id).to_vec().iter().rev() {
                let Some(old) = tree.get(child) else { continue };
                let Some(control) = old.control else { continue };
                let (node, _) = self.evaluate(&parent, old.state, control, &branch);
                let position = node.position();
                if let Some(slot) = tree.get_mut(child) {
                    *slot = node;
                }
                let mut child_branch = branch.clone();
                child_branch.consume(&position, self.config.p_d);
                stack.push((child, child_branch));
            }
        }
    }
}
