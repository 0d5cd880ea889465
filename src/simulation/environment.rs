//! Initial belief generation from Gaussian sources.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::simulation::field::ProbabilityField;
use crate::simulation::geometry::Bounds;

/// An axis-aligned Gaussian bump of target likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianSource {
    pub x_mean: f64,
    pub y_mean: f64,
    pub x_std: f64,
    pub y_std: f64,
}

impl GaussianSource {
    #[must_use]
    pub const fn new(x_mean: f64, y_mean: f64, x_std: f64, y_std: f64) -> Self {
        Self {
            x_mean,
            y_mean,
            x_std,
            y_std,
        }
    }

    /// Creates a random source within the given bounds.
    pub fn random<R: Rng + ?Sized>(bounds: &Bounds, rng: &mut R) -> Self {
        let center = bounds.sample_uniform(rng);
        let spread = bounds.width().min(bounds.height()).max(1.0);
        Self {
            x_mean: center.x,
            y_mean: center.y,
            x_std: rng.random_range(0.1 * spread..0.3 * spread),
            y_std: rng.random_range(0.1 * spread..0.3 * spread),
        }
    }

    /// Product of the two marginal normal densities at `(x, y)`.
    #[must_use]
    pub fn pdf(&self, x: f64, y: f64) -> f64 {
        normal_pdf(x, self.x_mean, self.x_std) * normal_pdf(y, self.y_mean, self.y_std)
    }
}

fn normal_pdf(v: f64, mean: f64, std: f64) -> f64 {
    let sigma = std.abs().max(f64::EPSILON);
    let z = (v - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// Evaluates a Gaussian mixture on the unit grid covering `bounds`.
///
/// Each cell takes the mixture value at its lower-left corner. Returns `None`
/// when the grid is empty or the mixture has no mass over it.
#[must_use]
#[allow(
    clippy::cast_possible_truncation, // Bounds are small positive extents
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn gaussian_mixture_field(bounds: &Bounds, sources: &[GaussianSource]) -> Option<ProbabilityField> {
    let width = bounds.width().max(0.0).ceil() as usize;
    let height = bounds.height().max(0.0).ceil() as usize;
    if width == 0 || height == 0 {
        return None;
    }

    let mut cells = Vec::with_capacity(width * height);
    for row in 0..height {
        let y = bounds.y_min + row as f64;
        for col in 0..width {
            let x = bounds.x_min + col as f64;
            cells.push(sources.iter().map(|s| s.pdf(x, y)).sum());
        }
    }
    ProbabilityField::from_cells(width, height, cells)
}
