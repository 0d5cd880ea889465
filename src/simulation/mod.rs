pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod field;
pub mod fusion;
pub mod geometry;
pub mod params;
pub mod planning;
pub mod scenario;
pub mod world;

pub use config::{ExpansionStrategy, PlannerConfig};
pub use error::{Result, RigError};
pub use scenario::ScenarioConfig;
pub use world::{Simulation, SimulationSummary};
