//! Square site lattice with independent open/blocked occupancy.
//!
//! An L×L grid stores one boolean per site in row-major order: `true` means the
//! site is open (water can pass), `false` means it is blocked. A random grid is
//! generated by drawing one uniform value per site and opening the site when
//! the draw falls below the occupation probability p.
//!
//! Unlike the toric lattice there are no periodic boundaries: row 0 is the top
//! face, row L-1 the bottom face, and neighbours outside the grid do not exist.

use rand::RngCore;

use crate::error::{check_probability, invalid, Result};

/// Scale for turning the top 53 bits of a u64 into a float in [0, 1).
const UNIFORM_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Draw one uniform value in [0, 1) through the fallible rng interface.
///
/// The value never reaches 1.0, so `u < 1.0` always holds and `u < 0.0` never does.
pub fn uniform_draw<R: RngCore + ?Sized>(rng: &mut R) -> Result<f64> {
    let mut bytes = [0u8; 8];
    rng.try_fill_bytes(&mut bytes)?;
    Ok((u64::from_le_bytes(bytes) >> 11) as f64 * UNIFORM_SCALE)
}

/// Number of sites in an L×L grid, rejecting L = 0 and sizes whose square overflows.
pub fn cell_count(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(invalid("grid size L must be positive"));
    }
    size
        .checked_mul(size)
        .ok_or_else(|| invalid(format!("grid size L={} is too large", size)))
}

/// An L×L site occupancy grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Generate a random grid where each site is open independently with probability `p`.
    ///
    /// Consumes exactly `size * size` draws from `rng`, in row-major order.
    pub fn generate<R: RngCore + ?Sized>(size: usize, p: f64, rng: &mut R) -> Result<Self> {
        let num_cells = cell_count(size)?;
        check_probability(p)?;

        let mut cells = Vec::with_capacity(num_cells);
        for _ in 0..num_cells {
            cells.push(uniform_draw(rng)? < p);
        }
        Ok(Self { size, cells })
    }

    /// A grid with every site open (or every site blocked).
    pub fn filled(size: usize, open: bool) -> Result<Self> {
        let num_cells = cell_count(size)?;
        Ok(Self {
            size,
            cells: vec![open; num_cells],
        })
    }

    /// Build a grid from a row-major cell vector of length `size * size`.
    pub fn from_cells(size: usize, cells: Vec<bool>) -> Result<Self> {
        let num_cells = cell_count(size)?;
        if cells.len() != num_cells {
            return Err(invalid(format!(
                "expected {} cells for a {}x{} grid, got {}",
                num_cells,
                size,
                size,
                cells.len()
            )));
        }
        Ok(Self { size, cells })
    }

    /// Build a grid from explicit rows. Every row must have as many cells as there are rows.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(invalid("grid must have at least one row"));
        }
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(invalid(format!(
                "grid is not square: row {} has {} cells, expected {}",
                r,
                row.len(),
                size
            )));
        }
        Ok(Self {
            size,
            cells: rows.concat(),
        })
    }

    /// Side length L.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of sites (L²).
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Row-major linear index of site (r, c).
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    /// Whether site (r, c) is open. Panics if out of bounds.
    #[inline]
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)]
    }

    /// Raw occupancy (read-only).
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// One row of the grid.
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.size;
        &self.cells[start..start + self.size]
    }

    /// Iterate over rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.size)
    }

    /// Number of open sites.
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|&&open| open).count()
    }

    /// Fraction of open sites.
    pub fn open_fraction(&self) -> f64 {
        self.open_count() as f64 / self.num_cells() as f64
    }

    /// In-bounds axis-aligned neighbours of (r, c): up, down, left, right.
    ///
    /// No wrapping. Edge sites have fewer than 4 neighbours.
    pub fn neighbours(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        let n = self.size;
        [
            row.checked_sub(1).map(|r| (r, col)),                  // up
            (row + 1 < n).then_some((row + 1, col)),               // down
            col.checked_sub(1).map(|c| (row, c)),                  // left
            (col + 1 < n).then_some((row, col + 1)),               // right
        ]
        .into_iter()
        .flatten()
    }
}
