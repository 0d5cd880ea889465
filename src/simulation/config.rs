//! Planner configuration.
//!
//! Every tunable has a default in [`crate::simulation::params`]. Out-of-range
//! values are clamped by [`PlannerConfig::validated`] with a warning rather
//! than rejected.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::simulation::geometry::Position;
use crate::simulation::params::{
    BUDGET, DETECTION_PROBABILITY, FUSION_RANGE, GAMMA, INPUT_SAMPLES, LAMBDA, MAX_LAMBDA,
    MIN_T_LIMIT, PENALTY_WEIGHT, RADIUS, SAMPLE_BIAS, STEP_SIZE, TWIN_TOLERANCE, T_LIMIT,
};

/// Selects the sampler bias and termination policy of the expansion loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpansionStrategy {
    /// Plain information-gathering tree, biased toward home.
    #[default]
    Rig,
    /// Goal-directed tree: biased toward `goal`, nodes within `tolerance` of
    /// it are closed and preferred during path selection.
    GoalDirected { goal: Position, tolerance: f64 },
}

/// Read-only configuration bundle threaded through every planning call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Length of one motion primitive; also the cost of one edge.
    pub step_size: f64,
    /// Maximum cumulative travel cost.
    pub budget: f64,
    /// Near-set radius.
    pub radius: f64,
    /// Dynamics samples per steering call.
    pub samples: usize,
    /// Wall-clock expansion time per planning cycle (seconds).
    pub t_limit: f64,
    /// Optional hard cap on expansion iterations per cycle.
    pub iteration_limit: Option<usize>,
    /// Discount on future reward, in `[0, 1]`.
    pub gamma: f64,
    /// Fusion preference, in `[0, 0.99]`.
    pub lambda: f64,
    /// Detection probability, in `[0, 1]`.
    pub p_d: f64,
    pub fusion_range: f64,
    pub home: Position,
    /// Probability of sampling the bias target.
    pub sample_bias: f64,
    /// Sibling duplicate suppression distance; zero disables the check.
    pub twin_tolerance: f64,
    /// Coefficient of the quadratic return-home penalty.
    pub penalty_weight: f64,
    pub strategy: ExpansionStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            step_size: STEP_SIZE,
            budget: BUDGET,
            radius: RADIUS,
            samples: INPUT_SAMPLES,
            t_limit: T_LIMIT,
            iteration_limit: None,
            gamma: GAMMA,
            lambda: LAMBDA,
            p_d: DETECTION_PROBABILITY,
            fusion_range: FUSION_RANGE,
            home: Position::default(),
            sample_bias: SAMPLE_BIAS,
            twin_tolerance: TWIN_TOLERANCE,
            penalty_weight: PENALTY_WEIGHT,
            strategy: ExpansionStrategy::Rig,
        }
    }
}

fn clamp_logged(name: &str, value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        warn!("{name} is NaN, setting to {min}");
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{name} = {value} out of range [{min}, {max}], setting to {clamped}");
    }
    clamped
}

impl PlannerConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_home(mut self, home: Position) -> Self {
        self.home = home;
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = budget;
        self
    }

    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    #[must_use]
    pub fn with_t_limit(mut self, t_limit: f64) -> Self {
        self.t_limit = t_limit;
        self
    }

    #[must_use]
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_detection_probability(mut self, p_d: f64) -> Self {
        self.p_d = p_d;
        self
    }

    #[must_use]
    pub fn with_fusion_range(mut self, range: f64) -> Self {
        self.fusion_range = range;
        self
    }

    #[must_use]
    pub fn with_twin_tolerance(mut self, tolerance: f64) -> Self {
        self.twin_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ExpansionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns a copy with every tunable clamped to its admissible range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.lambda = clamp_logged("lambda", self.lambda, 0.0, MAX_LAMBDA);
        self.gamma = clamp_logged("gamma", self.gamma, 0.0, 1.0);
        self.p_d = clamp_logged("p_d", self.p_d, 0.0, 1.0);
        self.sample_bias = clamp_logged("sample_bias", self.sample_bias, 0.0, 1.0);
        self.t_limit = clamp_logged("t_limit", self.t_limit, MIN_T_LIMIT, f64::MAX);
        self.budget = clamp_logged("budget", self.budget, 0.0, f64::MAX);
        self.fusion_range = clamp_logged("fusion_range", self.fusion_range, 0.0, f64::MAX);
        self.twin_tolerance = clamp_logged("twin_tolerance", self.twin_tolerance, 0.0, f64::MAX);
        self.penalty_weight = clamp_logged("penalty_weight", self.penalty_weight, 0.0, f64::MAX);

        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            warn!("step_size = {} must be positive, setting to {STEP_SIZE}", self.step_size);
            self.step_size = STEP_SIZE;
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            warn!("radius = {} must be positive, setting to {RADIUS}", self.radius);
            self.radius = RADIUS;
        }
        if self.samples == 0 {
            warn!("samples = 0, setting to 1");
            self.samples = 1;
        }
        if let ExpansionStrategy::GoalDirected { goal, tolerance } = self.strategy {
            let tolerance = clamp_logged("goal tolerance", tolerance, 0.0, f64::MAX);
            self.strategy = ExpansionStrategy::GoalDirected { goal, tolerance };
        }
        self
    }

    /// Position the sampler is biased toward.
    #[must_use]
    pub fn bias_target(&self) -> Position {
        match self.strategy {
            ExpansionStrategy::Rig => self.home,
            ExpansionStrategy::GoalDirected { goal, .. } => goal,
        }
    }
}
