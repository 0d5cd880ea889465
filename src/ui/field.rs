use crate::simulation::field::ProbabilityField;
use crate::simulation::geometry::{Bounds, Position};
use rayon::prelude::*;

const CHARS: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Renders the belief field as character rows, scaled to its current peak.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[must_use]
pub fn compute_field_grid(
    field: &ProbabilityField,
    bounds: &Bounds,
    rows: usize,
    cols: usize,
) -> Vec<String> {
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let scale_y = bounds.height() / rows as f64;
    let scale_x = bounds.width() / cols as f64;
    let peak = field.max_density();

    // Use rayon to compute rows in parallel
    (0..rows)
        .into_par_iter()
        .map(|r| {
            let mut line = String::with_capacity(cols);
            for c in 0..cols {
                let world = Position::new(
                    bounds.x_min + c as f64 * scale_x,
                    bounds.y_min + r as f64 * scale_y,
                );
                let val = if peak > 0.0 {
                    field.density(&world) / peak
                } else {
                    0.0
                };

                let idx = (val * (CHARS.len() - 1) as f64).round() as usize;
                let idx = idx.min(CHARS.len() - 1);

                line.push(CHARS[idx]);
            }
            line
        })
        .collect()
}
