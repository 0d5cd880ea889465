//! Communication channels to other agents.
//!
//! Each channel holds the partner's time-indexed trajectory (used by the
//! planner to predict where fusion can happen) and running totals of the
//! information shared with, and not yet shared with, that partner.

use std::collections::BTreeMap;

use log::info;

use crate::simulation::field::{fuse_fields, ProbabilityField};
use crate::simulation::geometry::Position;

/// One sample of a partner's trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    pub position: Position,
    pub time_step: u32,
}

impl TrajectoryPoint {
    #[must_use]
    pub const fn new(position: Position, time_step: u32) -> Self {
        Self {
            position,
            time_step,
        }
    }
}

/// Bookkeeping for a single partner agent.
#[derive(Clone, Debug, Default)]
pub struct Channel {
    trajectory: Vec<TrajectoryPoint>,
    /// Cumulative information of the owning agent at the last fusion.
    shared: f64,
    /// Information handed over across all fusions so far.
    novel_total: f64,
    fusions: usize,
}

impl Channel {
    #[must_use]
    pub fn trajectory(&self) -> &[TrajectoryPoint] {
        &self.trajectory
    }

    #[must_use]
    pub const fn shared(&self) -> f64 {
        self.shared
    }

    #[must_use]
    pub const fn novel_total(&self) -> f64 {
        self.novel_total
    }

    #[must_use]
    pub const fn fusion_count(&self) -> usize {
        self.fusions
    }

    /// Whether the partner is predicted within `range` of `position` at
    /// exactly `time_step`. A missing time-aligned sample never matches.
    #[must_use]
    pub fn coincides(&self, position: &Position, time_step: u32, range: f64) -> bool {
        self.trajectory
            .iter()
            .any(|p| p.time_step == time_step && p.position.distance(position) < range)
    }
}

/// Channels keyed by partner name, iterated in name order.
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Channel>,
}

impl ChannelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel if it does not exist yet.
    pub fn register(&mut self, name: impl Into<String>) {
        self.channels.entry(name.into()).or_default();
    }

    /// Replaces a partner's predicted trajectory, opening the channel if
    /// needed.
    pub fn set_trajectory(&mut self, name: &str, trajectory: Vec<TrajectoryPoint>) {
        self.channels.entry(name.to_owned()).or_default().trajectory = trajectory;
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// The partner's trajectory, empty for unknown channels.
    #[must_use]
    pub fn get_trajectory(&self, name: &str) -> &[TrajectoryPoint] {
        self.channels.get(name).map_or(&[], |c| c.trajectory())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Channel)> + '_ {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channels predicted to be within `range` of `position` at `time_step`.
    #[must_use]
    pub fn coincident(&self, position: &Position, time_step: u32, range: f64) -> Vec<&str> {
        self.iter()
            .filter(|(_, c)| c.coincides(position, time_step, range))
            .map(|(name, _)| name)
            .collect()
    }

    /// Marks the agent's information as caught up with `name`.
    ///
    /// Returns the information that was novel to the partner.
    pub fn record_fusion(&mut self, name: &str, information_total: f64) -> f64 {
        let channel = self.channels.entry(name.to_owned()).or_default();
        let novel = (information_total - channel.shared).max(0.0);
        channel.shared = information_total;
        channel.novel_total += novel;
        channel.fusions += 1;
        novel
    }

    /// Total information handed to partners across all channels.
    #[must_use]
    pub fn information_fused(&self) -> f64 {
        self.channels.values().map(Channel::novel_total).sum()
    }
}

/// Outcome of a successful fusion between two agents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionEvent {
    pub distance: f64,
    pub range: f64,
}

/// Fuses two agents' beliefs when they are within communication range.
///
/// The effective range is the smaller of the two agents' ranges. On success
/// both fields adopt their cell-wise minimum.
pub fn try_fuse(
    (a_pos, a_range, a_field): (&Position, f64, &mut ProbabilityField),
    (b_pos, b_range, b_field): (&Position, f64, &mut ProbabilityField),
) -> Option<FusionEvent> {
    let range = a_range.min(b_range);
    let distance = a_pos.distance(b_pos);
    if distance >= range {
        return None;
    }
    if !fuse_fields(a_field, b_field) {
        return None;
    }
    info!("Fused beliefs at distance {distance:.2} (range {range:.2})");
    Some(FusionEvent { distance, range })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(y: f64, start: u32, len: u32) -> Vec<TrajectoryPoint> {
        (0..len)
            .map(|k| TrajectoryPoint::new(Position::new(f64::from(k), y), start + k))
            .collect()
    }

    #[test]
    fn test_coincidence_requires_same_time_step() {
        let mut registry = ChannelRegistry::new();
        registry.set_trajectory("inky", line(0.0, 0, 10));
        let at = Position::new(3.0, 0.5);
        assert_eq!(registry.coincident(&at, 3, 1.0), vec!["inky"]);
        assert!(registry.coincident(&at, 4, 1.0).is_empty());
        assert!(registry.coincident(&at, 42, 1.0).is_empty());
    }

    #[test]
    fn test_range_is_strict() {
        let mut registry = ChannelRegistry::new();
        registry.set_trajectory("clyde", line(0.0, 0, 5));
        assert!(registry.coincident(&Position::new(2.0, 1.0), 2, 1.0).is_empty());
        assert_eq!(
            registry.coincident(&Position::new(2.0, 0.99), 2, 1.0),
            vec!["clyde"]
        );
    }

    #[test]
    fn test_record_fusion_accumulates_novelty() {
        let mut registry = ChannelRegistry::new();
        registry.register("inky");
        assert_eq!(registry.record_fusion("inky", 0.3), 0.3);
        assert!((registry.record_fusion("inky", 0.5) - 0.2).abs() < 1e-12);
        assert_eq!(registry.record_fusion("inky", 0.5), 0.0);
        let channel = registry.get("inky").unwrap();
        assert_eq!(channel.shared(), 0.5);
        assert_eq!(channel.fusion_count(), 3);
        assert!((registry.information_fused() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_channel_has_empty_trajectory() {
        let registry = ChannelRegistry::new();
        assert!(registry.get_trajectory("blinky").is_empty());
    }

    #[test]
    fn test_try_fuse_respects_smaller_range() {
        let mut a = ProbabilityField::from_cells(2, 1, vec![0.9, 0.1]).unwrap();
        let mut b = ProbabilityField::from_cells(2, 1, vec![0.1, 0.9]).unwrap();
        let pa = Position::new(0.0, 0.0);
        let pb = Position::new(1.5, 0.0);
        assert!(try_fuse((&pa, 5.0, &mut a), (&pb, 1.0, &mut b)).is_none());
        let event = try_fuse((&pa, 5.0, &mut a), (&pb, 2.0, &mut b)).unwrap();
        assert_eq!(event.range, 2.0);
        assert_eq!(a, b);
        assert!((a.cell(0, 0) - 0.5).abs() < 1e-12);
    }
}
