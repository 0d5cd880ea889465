//! Planner and simulation hyperparameters.

/// Distance covered by one motion primitive.
pub const STEP_SIZE: f64 = 1.0;
/// Maximum cumulative travel cost before the agent must be home.
pub const BUDGET: f64 = 20.0;
/// Near-set radius around a steered intermediate position.
pub const RADIUS: f64 = 1.5;
/// Dynamics draws per steering call.
pub const INPUT_SAMPLES: usize = 16;
/// Wall-clock expansion budget per planning cycle (seconds).
pub const T_LIMIT: f64 = 0.1;
pub const MIN_T_LIMIT: f64 = 0.1;
/// Discount applied per time step of look-ahead.
pub const GAMMA: f64 = 1.0;
/// Fusion preference; 0 ignores fusion entirely.
pub const LAMBDA: f64 = 0.5;
pub const MAX_LAMBDA: f64 = 0.99;
/// Fraction of a cell's mass removed when the agent occupies it.
pub const DETECTION_PROBABILITY: f64 = 0.5;
pub const FUSION_RANGE: f64 = 2.0;
/// Probability of sampling the bias target instead of a uniform position.
pub const SAMPLE_BIAS: f64 = 0.05;
/// Children of one parent closer than this are treated as duplicates.
pub const TWIN_TOLERANCE: f64 = 0.1;
pub const PENALTY_WEIGHT: f64 = 1.0;

/// Floor applied to a step reward before the progress bonus.
pub const REWARD_FLOOR: f64 = -1.0;
/// Constant bonus granted to every successful expansion step.
pub const PROGRESS_BONUS: f64 = 1.0;

/// Maximum turn per step for heading-relative dynamics (radians).
pub const MAX_TURN: f64 = std::f64::consts::FRAC_PI_2;

/// Total mass below which a field is considered exhausted.
pub const FIELD_EPSILON: f64 = 1e-12;

pub const WORKSPACE_WIDTH: f64 = 20.0;
pub const WORKSPACE_HEIGHT: f64 = 20.0;
