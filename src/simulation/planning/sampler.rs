//! Target sampling for tree expansion.

use rand::Rng;

use crate::simulation::geometry::{Bounds, Position};

/// Draws expansion targets: the bias target with probability `bias`,
/// otherwise a uniform position over the workspace bounds.
#[derive(Clone, Copy, Debug)]
pub struct Sampler {
    bounds: Bounds,
    target: Option<Position>,
    bias: f64,
}

impl Sampler {
    #[must_use]
    pub fn new(bounds: Bounds, target: Option<Position>, bias: f64) -> Self {
        Self {
            bounds,
            target,
            bias: bias.clamp(0.0, 1.0),
        }
    }

    /// Unbiased sampler over `bounds`.
    #[must_use]
    pub fn uniform(bounds: Bounds) -> Self {
        Self::new(bounds, None, 0.0)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        match self.target {
            Some(target) if self.bias > 0.0 && rng.random_bool(self.bias) => target,
            _ => self.bounds.sample_uniform(rng),
        }
    }

    /// Endless stream of samples. Each call starts a fresh sequence.
    pub fn iter<'a, R: Rng + ?Sized>(&'a self, rng: &'a mut R) -> impl Iterator<Item = Position> + 'a {
        std::iter::repeat_with(move || self.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bias_frequency() {
        let target = Position::new(-5.0, -5.0);
        let sampler = Sampler::new(Bounds::from_size(10.0, 10.0), Some(target), 0.05);
        let mut rng = StdRng::seed_from_u64(11);
        let hits = sampler.iter(&mut rng).take(10_000).filter(|p| *p == target).count();
        assert!((350..=650).contains(&hits), "bias hits {hits}");
    }

    #[test]
    fn test_full_bias_always_returns_target() {
        let target = Position::new(3.0, 4.0);
        let sampler = Sampler::new(Bounds::from_size(10.0, 10.0), Some(target), 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sampler.iter(&mut rng).take(50).all(|p| p == target));
    }

    #[test]
    fn test_uniform_samples_in_bounds() {
        let bounds = Bounds::new(2.0, 4.0, 10.0, 11.0);
        let sampler = Sampler::uniform(bounds);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(sampler.iter(&mut rng).take(1_000).all(|p| bounds.contains(&p)));
    }

    #[test]
    fn test_restart_with_same_seed_repeats_sequence() {
        let sampler = Sampler::uniform(Bounds::from_size(10.0, 10.0));
        let first: Vec<_> = sampler.iter(&mut StdRng::seed_from_u64(9)).take(5).collect();
        let second: Vec<_> = sampler.iter(&mut StdRng::seed_from_u64(9)).take(5).collect();
        assert_eq!(first, second);
    }
}
