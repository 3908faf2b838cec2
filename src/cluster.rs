//! Breadth-first flood fill from the top face of the grid.
//!
//! Water enters every open site in row 0 and spreads through 4-connected open
//! sites. The grid percolates when the wetted region touches row L-1.
//!
//! [`check`] explores the whole top-connected component before answering, so the
//! returned [`FlowMask`] is complete. [`percolates`] stops at the first bottom-row
//! site it reaches; it yields the same flag but no mask, and is what the Monte
//! Carlo loop uses.

use std::collections::VecDeque;

use crate::grid::Grid;

/// Sites reached by the flood fill. `flow[r][c]` implies `grid[r][c]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMask {
    size: usize,
    cells: Vec<bool>,
}

impl FlowMask {
    fn dry(grid: &Grid) -> Self {
        Self {
            size: grid.size(),
            cells: vec![false; grid.num_cells()],
        }
    }

    /// Side length L.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether site (r, c) was reached.
    #[inline]
    pub fn is_wet(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col]
    }

    /// Raw mask (read-only), row-major.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// One row of the mask.
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.size;
        &self.cells[start..start + self.size]
    }

    /// Number of wet sites.
    pub fn wet_count(&self) -> usize {
        self.cells.iter().filter(|&&w| w).count()
    }
}

/// Per-site classification for external renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Blocked,
    /// Open but not connected to the top face.
    Dry,
    /// Open and reached from the top face.
    Wet,
}

/// Outcome of a full flood fill.
#[derive(Debug, Clone)]
pub struct PercolationResult {
    pub percolates: bool,
    pub grid: Grid,
    pub flow: FlowMask,
}

impl PercolationResult {
    /// Number of wet sites.
    pub fn wet_count(&self) -> usize {
        self.flow.wet_count()
    }

    pub fn cell_state(&self, row: usize, col: usize) -> CellState {
        if self.flow.is_wet(row, col) {
            CellState::Wet
        } else if self.grid.is_open(row, col) {
            CellState::Dry
        } else {
            CellState::Blocked
        }
    }

    /// Columns of the bottom row reached by the flow.
    pub fn spanning_columns(&self) -> Vec<usize> {
        let last = self.grid.size() - 1;
        (0..self.grid.size())
            .filter(|&c| self.flow.is_wet(last, c))
            .collect()
    }
}

/// Seed the frontier with every open site of row 0.
fn seed_top_row(grid: &Grid, visited: &mut [bool], frontier: &mut VecDeque<(usize, usize)>) {
    for col in 0..grid.size() {
        if grid.is_open(0, col) {
            visited[grid.index(0, col)] = true;
            frontier.push_back((0, col));
        }
    }
}

/// Flood fill the whole top-connected component and report whether it spans the grid.
///
/// Every open site reachable from row 0 ends up in the flow mask, even after the
/// bottom row has been reached. The result depends only on `grid`.
pub fn check(grid: Grid) -> PercolationResult {
    let n = grid.size();
    let last_row = n - 1;
    let mut flow = FlowMask::dry(&grid);
    let mut frontier = VecDeque::with_capacity(n);

    // The visited set and the flow mask coincide: a site is marked exactly when
    // it is enqueued, and only open sites are enqueued.
    seed_top_row(&grid, &mut flow.cells, &mut frontier);

    let mut percolates = false;
    while let Some((r, c)) = frontier.pop_front() {
        if r == last_row {
            percolates = true;
        }
        for (nr, nc) in grid.neighbours(r, c) {
            let idx = grid.index(nr, nc);
            if grid.cells()[idx] && !flow.cells[idx] {
                flow.cells[idx] = true;
                frontier.push_back((nr, nc));
            }
        }
    }

    PercolationResult {
        percolates,
        grid,
        flow,
    }
}

/// Whether the grid percolates, stopping at the first bottom-row site reached.
///
/// Gives the same answer as `check(grid).percolates` without building a flow mask.
pub fn percolates(grid: &Grid) -> bool {
    let n = grid.size();
    let last_row = n - 1;
    let mut visited = vec![false; grid.num_cells()];
    let mut frontier = VecDeque::with_capacity(n);
    seed_top_row(grid, &mut visited, &mut frontier);

    while let Some((r, c)) = frontier.pop_front() {
        if r == last_row {
            return true;
        }
        for (nr, nc) in grid.neighbours(r, c) {
            let idx = grid.index(nr, nc);
            if grid.cells()[idx] && !visited[idx] {
                visited[idx] = true;
                frontier.push_back((nr, nc));
            }
        }
    }
    false
}
