//! Informative path planning for the volunteer agent.
//!
//! This module provides:
//! - An arena tree with commit-and-prune
//! - Target sampling and dynamics-based steering
//! - The fusion-aware information and reward model
//! - The RIG expansion loop and path selection

mod reward;
mod rig;
mod sampler;
mod state;
mod steering;
mod tree;

pub use reward::{budget_penalty, fusion_set, information_gained, novelty, step_reward, RewardBreakdown, RewardModel};
pub use rig::{ExpansionStats, RigPlanner, Termination};
pub use sampler::Sampler;
pub use state::{Control, FusionSet, Node, State};
pub use steering::{near, nearest, steer, Dynamics, HeadingDynamics, MotionModel, TurnRateDynamics};
pub use tree::{InvariantViolation, NodeId, Tree};
