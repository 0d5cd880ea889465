//! Probability field over a unit-cell grid.
//!
//! The field stores the belief that the target occupies each cell. Visiting a
//! cell removes a detection-weighted fraction of its mass, after which the
//! field is renormalised. Speculative tree walks never touch the canonical
//! field: they run on a [`BranchField`], a copy-on-branch overlay whose clones
//! are independent of their siblings.

use log::{debug, warn};

use crate::simulation::geometry::Position;
use crate::simulation::params::FIELD_EPSILON;

/// Belief grid indexed by truncated integer coordinates (`col = ⌊x⌋`,
/// `row = ⌊y⌋`). Cells are non-negative and sum to one unless the field has
/// been fully consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityField {
    cells: Vec<f64>,
    width: usize,
    height: usize,
}

impl ProbabilityField {
    /// Uniform belief over a `width × height` grid.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(width: usize, height: usize) -> Self {
        let n = (width * height).max(1);
        Self {
            cells: vec![1.0 / n as f64; width * height],
            width,
            height,
        }
    }

    /// Builds a field from row-major raw cell weights, normalising them.
    ///
    /// Returns `None` if the cell count does not match the dimensions or the
    /// weights carry no positive mass. Negative or non-finite weights are
    /// treated as zero.
    #[must_use]
    pub fn from_cells(width: usize, height: usize, cells: Vec<f64>) -> Option<Self> {
        if cells.len() != width * height {
            return None;
        }
        let cells: Vec<f64> = cells
            .into_iter()
            .map(|c| if c.is_finite() && c > 0.0 { c } else { 0.0 })
            .collect();
        let mut field = Self {
            cells,
            width,
            height,
        };
        if field.total() <= FIELD_EPSILON {
            return None;
        }
        field.normalize();
        Some(field)
    }

    /// All mass concentrated in a single cell.
    #[must_use]
    pub fn point_mass(width: usize, height: usize, col: usize, row: usize) -> Option<Self> {
        if col >= width || row >= height {
            return None;
        }
        let mut cells = vec![0.0; width * height];
        cells[row * width + col] = 1.0;
        Some(Self {
            cells,
            width,
            height,
        })
    }

    /// Returns grid dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Converts a world position to a flat cell index.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation, // Range-checked before the cast
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn cell_index(&self, pos: &Position) -> Option<usize> {
        if !pos.x.is_finite() || !pos.y.is_finite() || pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let col = pos.x.trunc();
        let row = pos.y.trunc();
        if col >= self.width as f64 || row >= self.height as f64 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    /// Belief mass of the cell containing `pos`; zero outside the grid.
    #[must_use]
    pub fn density(&self, pos: &Position) -> f64 {
        self.cell_index(pos).map_or(0.0, |i| self.cells[i])
    }

    /// Belief mass at grid coordinates; zero outside the grid.
    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> f64 {
        if col >= self.width || row >= self.height {
            return 0.0;
        }
        self.cells[row * self.width + col]
    }

    /// Row-major view of the raw cells.
    #[must_use]
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.cells.iter().copied().fold(0.0, f64::max)
    }

    /// Rescales the cells to sum to one.
    ///
    /// An exhausted field (no mass left) is left as is.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total <= FIELD_EPSILON {
            debug!("Field exhausted (total mass {total:e}), skipping normalisation");
            return;
        }
        for c in &mut self.cells {
            *c /= total;
        }
    }

    /// Removes `fraction` of the mass in the cell containing `pos`, then
    /// renormalises. Returns the mass removed (before renormalisation).
    ///
    /// The field keeps summing to one as long as any mass is left. Taking
    /// all of the last occupied cell (`fraction = 1`) exhausts it: every cell
    /// is zero and further reads and consumption yield nothing.
    pub fn consume(&mut self, pos: &Position, fraction: f64) -> f64 {
        let Some(i) = self.cell_index(pos) else {
            return 0.0;
        };
        let fraction = fraction.clamp(0.0, 1.0);
        let available = self.cells[i];
        let remaining = available * (1.0 - fraction);
        self.cells[i] = remaining;
        self.normalize();
        available - remaining
    }

    /// Cell-wise minimum of two fields, renormalised.
    ///
    /// Returns `None` when the dimensions disagree.
    #[must_use]
    pub fn min_merged(&self, other: &ProbabilityField) -> Option<ProbabilityField> {
        if self.dimensions() != other.dimensions() {
            return None;
        }
        let mut merged = Self {
            cells: self
                .cells
                .iter()
                .zip(&other.cells)
                .map(|(a, b)| a.min(*b))
                .collect(),
            width: self.width,
            height: self.height,
        };
        merged.normalize();
        Some(merged)
    }

    /// Starts a speculative walk rooted at this field.
    #[must_use]
    pub fn branch(&self) -> BranchField<'_> {
        BranchField {
            base: self,
            overrides: Vec::new(),
            total: self.total(),
        }
    }
}

/// Makes both fields adopt their cell-wise minimum.
///
/// Returns `false` (and leaves both untouched) when the grids disagree.
pub fn fuse_fields(a: &mut ProbabilityField, b: &mut ProbabilityField) -> bool {
    match a.min_merged(b) {
        Some(merged) => {
            b.clone_from(&merged);
            *a = merged;
            true
        }
        None => {
            warn!(
                "Cannot fuse fields of different dimensions {:?} and {:?}",
                a.dimensions(),
                b.dimensions()
            );
            false
        }
    }
}

/// Copy-on-branch view of a [`ProbabilityField`].
///
/// Holds the cells consumed along one hypothetical path as overrides on top
/// of the canonical field, together with the unnormalised total. Cloning a
/// `BranchField` gives an independent branch.
#[derive(Clone, Debug)]
pub struct BranchField<'a> {
    base: &'a ProbabilityField,
    overrides: Vec<(usize, f64)>,
    total: f64,
}

impl BranchField<'_> {
    fn raw(&self, index: usize) -> f64 {
        self.overrides
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map_or(self.base.cells[index], |(_, v)| *v)
    }

    /// Normalised belief mass at `pos` along this branch.
    #[must_use]
    pub fn density(&self, pos: &Position) -> f64 {
        if self.total <= FIELD_EPSILON {
            return 0.0;
        }
        self.base
            .cell_index(pos)
            .map_or(0.0, |i| self.raw(i) / self.total)
    }

    /// Consumes `fraction` of the cell at `pos` on this branch only.
    /// Returns the normalised mass removed.
    pub fn consume(&mut self, pos: &Position, fraction: f64) -> f64 {
        let Some(i) = self.base.cell_index(pos) else {
            return 0.0;
        };
        if self.total <= FIELD_EPSILON {
            return 0.0;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let raw = self.raw(i);
        let removed = raw * fraction;
        let gained = removed / self.total;
        match self.overrides.iter_mut().find(|(idx, _)| *idx == i) {
            Some(entry) => entry.1 = raw - removed,
            None => self.overrides.push((i, raw - removed)),
        }
        self.total -= removed;
        gained
    }

    /// Materialises the branch as an owned, normalised field.
    #[must_use]
    pub fn to_field(&self) -> ProbabilityField {
        let mut field = self.base.clone();
        for &(i, v) in &self.overrides {
            field.cells[i] = v;
        }
        field.normalize();
        field
    }
}
