//! Value objects describing a planning-tree vertex.

use std::collections::BTreeMap;

use crate::simulation::geometry::Position;

/// Kinematic state of the agent: position plus heading (radians).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct State {
    pub position: Position,
    pub heading: f64,
}

impl State {
    #[must_use]
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Position::new(x, y),
            heading,
        }
    }

    #[must_use]
    pub const fn at(position: Position) -> Self {
        Self {
            position,
            heading: 0.0,
        }
    }
}

/// Motion command: travel `distance` along `heading`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Control {
    pub heading: f64,
    pub distance: f64,
}

impl Control {
    /// Control that moves straight from `from` to `to`.
    #[must_use]
    pub fn between(from: &Position, to: &Position) -> Self {
        Self {
            heading: from.heading_to(to),
            distance: from.distance(to),
        }
    }

    /// Applies the command to a state.
    #[must_use]
    pub fn apply(&self, state: &State) -> State {
        State {
            position: state.position.offset(self.heading, self.distance),
            heading: self.heading,
        }
    }
}

/// Channel name to the cumulative information at the moment of fusion.
pub type FusionSet = BTreeMap<String, f64>;

/// A hypothesised future agent state.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub state: State,
    /// Command that produced this state from its parent; `None` at the root.
    pub control: Option<Control>,
    /// Cumulative travel cost since departure; the root carries the cost
    /// already spent by the agent.
    pub cost: f64,
    /// Cumulative expected information along the root-to-node path.
    pub information: f64,
    /// Absolute planning time index; parent + 1.
    pub time_step: u32,
    pub fusion: FusionSet,
    /// Sum of the clamped step objectives along the root-to-node path.
    pub objective: f64,
    /// Selection key: `objective` plus the progress bonus, counted once.
    /// Zero at the root.
    pub reward: f64,
    pub goal_reached: bool,
}

impl Node {
    /// Root node at the agent's committed state.
    #[must_use]
    pub fn root(
        state: State,
        cost: f64,
        information: f64,
        time_step: u32,
        fusion: FusionSet,
    ) -> Self {
        Self {
            state,
            control: None,
            cost,
            information,
            time_step,
            fusion,
            objective: 0.0,
            reward: 0.0,
            goal_reached: false,
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.state.position
    }

    /// Whether the node fused with `channel` (fusion value recorded).
    #[must_use]
    pub fn fused_with(&self, channel: &str) -> Option<f64> {
        self.fusion.get(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_round_trip() {
        let from = State::new(1.0, 1.0, 0.0);
        let to = Position::new(1.0, 3.0);
        let u = Control::between(&from.position, &to);
        let next = u.apply(&from);
        assert!(next.position.distance(&to) < 1e-12);
        assert!((next.heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_root_defaults() {
        let root = Node::root(
            State::at(Position::new(2.0, 2.0)),
            0.0,
            0.3,
            4,
            FusionSet::new(),
        );
        assert!(root.control.is_none());
        assert_eq!(root.cost, 0.0);
        assert_eq!(root.time_step, 4);
        assert!(!root.goal_reached);
        assert!(root.fused_with("inky").is_none());
    }
}
