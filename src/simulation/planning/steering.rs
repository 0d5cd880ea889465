//! Nearest-neighbour queries and dynamics-based local steering.

use std::f64::consts::PI;

use rand::Rng;

use super::state::{Control, State};
use super::tree::{NodeId, Tree};
use crate::simulation::geometry::Position;

/// Agent motion model: draws one admissible control from a state and
/// returns the resulting successor. May be stochastic.
pub trait Dynamics {
    fn propagate<R: Rng + ?Sized>(&self, from: &State, rng: &mut R) -> (State, Control);
}

/// Uniformly random heading, fixed step length.
#[derive(Clone, Copy, Debug)]
pub struct HeadingDynamics {
    pub step: f64,
}

impl HeadingDynamics {
    #[must_use]
    pub const fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Dynamics for HeadingDynamics {
    fn propagate<R: Rng + ?Sized>(&self, from: &State, rng: &mut R) -> (State, Control) {
        let control = Control {
            heading: rng.random_range(0.0..2.0 * PI),
            distance: self.step,
        };
        (control.apply(from), control)
    }
}

/// Unicycle-style model: turn by at most `max_turn` relative to the current
/// heading, then advance a fixed step.
#[derive(Clone, Copy, Debug)]
pub struct TurnRateDynamics {
    pub step: f64,
    pub max_turn: f64,
}

impl TurnRateDynamics {
    #[must_use]
    pub const fn new(step: f64, max_turn: f64) -> Self {
        Self { step, max_turn }
    }
}

impl Dynamics for TurnRateDynamics {
    fn propagate<R: Rng + ?Sized>(&self, from: &State, rng: &mut R) -> (State, Control) {
        let turn = if self.max_turn > 0.0 {
            rng.random_range(-self.max_turn..=self.max_turn)
        } else {
            0.0
        };
        let control = Control {
            heading: (from.heading + turn).rem_euclid(2.0 * PI),
            distance: self.step,
        };
        (control.apply(from), control)
    }
}

/// Runtime choice between the built-in motion models.
#[derive(Clone, Copy, Debug)]
pub enum MotionModel {
    Heading(HeadingDynamics),
    TurnRate(TurnRateDynamics),
}

impl MotionModel {
    #[must_use]
    pub const fn step(&self) -> f64 {
        match self {
            Self::Heading(d) => d.step,
            Self::TurnRate(d) => d.step,
        }
    }
}

impl Dynamics for MotionModel {
    fn propagate<R: Rng + ?Sized>(&self, from: &State, rng: &mut R) -> (State, Control) {
        match self {
            Self::Heading(d) => d.propagate(from, rng),
            Self::TurnRate(d) => d.propagate(from, rng),
        }
    }
}

/// Open node closest to `target`; ties go to the first encountered.
///
/// Returns `None` when every node is closed.
#[must_use]
pub fn nearest(tree: &Tree, target: &Position) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for id in tree.open_ids() {
        let Some(node) = tree.get(id) else { continue };
        let d = node.position().distance(target);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((id, d));
        }
    }
    best.map(|(id, _)| id)
}

/// Open nodes within `radius` of `center`, in insertion order.
#[must_use]
pub fn near(tree: &Tree, center: &Position, radius: f64) -> Vec<NodeId> {
    tree.open_ids()
        .filter(|&id| {
            tree.get(id)
                .is_some_and(|n| n.position().distance(center) <= radius)
        })
        .collect()
}

/// Draws `samples` successors of `from` and keeps the one closest to
/// `target` (first found on ties). At least one draw is always made.
pub fn steer<D, R>(
    dynamics: &D,
    from: &State,
    target: &Position,
    samples: usize,
    rng: &mut R,
) -> (State, Control)
where
    D: Dynamics + ?Sized,
    R: Rng + ?Sized,
{
    let mut best = dynamics.propagate(from, rng);
    let mut best_d = best.0.position.distance(target);
    for _ in 1..samples {
        let candidate = dynamics.propagate(from, rng);
        let d = candidate.0.position.distance(target);
        if d < best_d {
            best = candidate;
            best_d = d;
        }
    }
    best
}
