//! Planar positions and workspace bounds.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A position in the continuous 2D workspace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Heading (radians) pointing from `self` towards `other`.
    #[must_use]
    pub fn heading_to(&self, other: &Position) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Moves `distance` along `heading`.
    #[must_use]
    pub fn offset(&self, heading: f64, distance: f64) -> Self {
        Self {
            x: self.x + distance * heading.cos(),
            y: self.y + distance * heading.sin(),
        }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle enclosing the workspace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Bounds spanning `[0, width] × [0, height]`.
    #[must_use]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, width, 0.0, height)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[must_use]
    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// Draws a position uniformly, independently per axis.
    ///
    /// Degenerate (zero-width) axes return their single coordinate.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let rx: f64 = rng.random();
        let ry: f64 = rng.random();
        Position::new(
            self.x_min + rx * self.width(),
            self.y_min + ry * self.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_distance_and_heading() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert!((a.heading_to(&Position::new(0.0, 2.0)) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_offset() {
        let p = Position::new(1.0, 1.0).offset(0.0, 2.0);
        assert!((p.x - 3.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_samples_stay_inside() {
        let bounds = Bounds::new(-2.0, 3.0, 5.0, 6.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = bounds.sample_uniform(&mut rng);
            assert!(bounds.contains(&p), "{p:?} escaped {bounds:?}");
        }
    }
}
