//! Mountain-pass extraction over a settled altitude field.
//!
//! A pass is a non-ground cell whose glide-slope origin is on the ground:
//! the last point where the glide clears a ridge. Passes are weighted by
//! how many cells' origin chains transit them.

use crate::{ConeError, Grid};
use std::io::Write;

/// Longest origin chain tolerated before declaring the field corrupt.
/// Chains are acyclic, so hitting this means an invariant broke.
pub const MAX_ORIGIN_CHAIN: usize = 1000;

/// Noise filter applied when emitting passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFilter {
    /// Minimum number of cells gliding through the pass.
    pub min_weight: u32,

    /// Only emit passes whose origin's own origin is a ground cell.
    pub ground_grand_origin: bool,
}

impl Default for PassFilter {
    fn default() -> Self {
        Self {
            min_weight: 100,
            ground_grand_origin: true,
        }
    }
}

/// One emitted pass, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub x: f64,
    pub y: f64,
    pub weight: u32,
}

impl Grid {
    /// Marks every non-ground cell whose origin is a ground cell.
    pub fn detect_passes(&mut self) {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                let cell = self.cell(i, j);
                let is_pass = match cell.origin.coords() {
                    Some((oi, oj)) => !cell.ground && self.cell(oi, oj).ground,
                    None => false,
                };
                self.cell_mut(i, j).mountain_pass = is_pass;
            }
        }
    }

    /// Accumulates, on every cell, the number of cells whose origin
    /// chain passes through it.
    pub fn weight_passes(&mut self) -> Result<(), ConeError> {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                self.accumulate_weight(i, j)?;
            }
        }
        Ok(())
    }

    /// Cells selected by `filter`, in row-major order.
    pub fn passes(&self, filter: &PassFilter) -> Vec<Pass> {
        let win = self.window();
        let mut passes = Vec::new();
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                let cell = self.cell(i, j);
                if !cell.mountain_pass || cell.weight <= filter.min_weight {
                    continue;
                }
                if filter.ground_grand_origin && !self.grand_origin_is_ground(i, j) {
                    continue;
                }
                passes.push(Pass {
                    x: self.xllcorner() + (win.start_col + j) as f64 * self.cellsize(),
                    y: self.yllcorner()
                        + (self.global_nrows() - 1 - win.start_row - i) as f64 * self.cellsize(),
                    weight: cell.weight,
                });
            }
        }
        passes
    }

    /// Writes the selected passes as `name,x,y,weight` CSV.
    pub fn write_passes<W: Write>(&self, out: &mut W, filter: &PassFilter) -> Result<(), ConeError> {
        writeln!(out, "name,x,y,weight")?;
        for Pass { x, y, weight } in self.passes(filter) {
            writeln!(out, "pass,{x},{y},{weight}")?;
        }
        Ok(())
    }
}

/// Private API.
impl Grid {
    /// Walks the origin chain above `(i, j)`, incrementing the weight of
    /// every ancestor, stopping past a ground ancestor or a self-loop.
    fn accumulate_weight(&mut self, i: usize, j: usize) -> Result<(), ConeError> {
        let (mut ci, mut cj) = (i, j);
        for _ in 0..MAX_ORIGIN_CHAIN {
            let Some((oi, oj)) = self.cell(ci, cj).origin.coords() else {
                return Ok(());
            };
            let origin = self.cell_mut(oi, oj);
            origin.weight += 1;
            if origin.ground || (oi == ci && oj == cj) {
                return Ok(());
            }
            (ci, cj) = (oi, oj);
        }
        Err(ConeError::OriginChainTooDeep {
            i,
            j,
            max: MAX_ORIGIN_CHAIN,
        })
    }

    fn grand_origin_is_ground(&self, i: usize, j: usize) -> bool {
        let Some((oi, oj)) = self.cell(i, j).origin.coords() else {
            return false;
        };
        let Some((goi, goj)) = self.cell(oi, oj).origin.coords() else {
            return false;
        };
        self.cell(goi, goj).ground
    }
}
