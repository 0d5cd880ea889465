//! Multi-agent simulation driving the volunteer and its partners in lockstep.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::simulation::agent::{LineFollower, Volunteer};
use crate::simulation::fusion::try_fuse;
use crate::simulation::geometry::Bounds;

/// Totals reported at the end of (or during) a run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationSummary {
    pub time_steps: u32,
    /// Information gathered by the volunteer.
    pub information_gained: f64,
    /// Information the volunteer handed to its partners.
    pub information_fused: f64,
    pub fusion_events: usize,
    pub cost_spent: f64,
}

/// One volunteer, any number of line followers and a shared logical clock.
#[derive(Debug, Clone)]
pub struct Simulation {
    bounds: Bounds,
    volunteer: Volunteer,
    followers: Vec<LineFollower>,
    time_step: u32,
    fusion_events: usize,
    finished: bool,
    rng: StdRng,
}

impl Simulation {
    /// Creates a simulation and seeds the volunteer's channels with every
    /// follower's schedule.
    #[must_use]
    pub fn new(bounds: Bounds, volunteer: Volunteer, followers: Vec<LineFollower>, seed: u64) -> Self {
        let mut sim = Self {
            bounds,
            volunteer,
            followers,
            time_step: 0,
            fusion_events: 0,
            finished: false,
            rng: StdRng::seed_from_u64(seed),
        };
        sim.refresh_channels();
        sim
    }

    #[must_use]
    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[must_use]
    pub const fn volunteer(&self) -> &Volunteer {
        &self.volunteer
    }

    #[must_use]
    pub fn followers(&self) -> &[LineFollower] {
        &self.followers
    }

    #[must_use]
    pub const fn time_step(&self) -> u32 {
        self.time_step
    }

    /// True once the volunteer's budget is spent or its plan degenerated.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            time_steps: self.time_step,
            information_gained: self.volunteer.information_gained(),
            information_fused: self.volunteer.channels().information_fused(),
            fusion_events: self.fusion_events,
            cost_spent: self.volunteer.cost_spent(),
        }
    }

    fn refresh_channels(&mut self) {
        for follower in &self.followers {
            self.volunteer
                .channels_mut()
                .set_trajectory(follower.name(), follower.trajectory());
        }
    }

    fn fuse_all(&mut self) {
        let volunteer = &mut self.volunteer;
        for follower in &mut self.followers {
            let position = volunteer.position();
            let range = volunteer.fusion_range();
            let follower_position = follower.position();
            let follower_range = follower.fusion_range();
            let Some(event) = try_fuse(
                (&position, range, volunteer.field_mut()),
                (&follower_position, follower_range, follower.field_mut()),
            ) else {
                continue;
            };
            let total = volunteer.information_gained();
            let novel = volunteer.channels_mut().record_fusion(follower.name(), total);
            self.fusion_events += 1;
            info!(
                "{} fused with {} at distance {:.2}: shared {:.4} ({:.4} new)",
                volunteer.name(),
                follower.name(),
                event.distance,
                total,
                novel
            );
        }
    }

    /// Advances every agent by one logical time step.
    ///
    /// Returns `false` once the simulation has finished.
    pub fn step(&mut self) -> bool {
        if self.finished {
            return false;
        }
        if self.volunteer.budget_exhausted() {
            info!("Budget exhausted after {} steps", self.time_step);
            self.finished = true;
            return false;
        }

        self.volunteer.plan(&mut self.rng);
        for follower in &mut self.followers {
            follower.step();
        }
        if self.volunteer.step().is_none() {
            info!("No edge to execute at step {}, stopping", self.time_step);
            self.finished = true;
            return false;
        }
        self.time_step += 1;
        self.fuse_all();
        self.refresh_channels();
        true
    }

    /// Steps until finished or `max_steps` were taken.
    pub fn run(&mut self, max_steps: u32) -> SimulationSummary {
        for _ in 0..max_steps {
            if !self.step() {
                break;
            }
        }
        let summary = self.summary();
        info!(
            "Run ended after {} steps: gained {:.4}, fused {:.4} over {} events",
            summary.time_steps,
            summary.information_gained,
            summary.information_fused,
            summary.fusion_events
        );
        summary
    }
}
