//! Square cell grid and the placement queries used to populate it.
//!
//! Every query scans the whole grid afresh and enumerates eligible cells in
//! row-major order before drawing one uniformly, so the cell chosen for a
//! given PRNG state depends only on the grid contents at call time.

use std::collections::HashSet;

use crate::prng::Pcg32;
use crate::types::CellKind;

/// `(row, col)`
pub type Coord = (usize, usize);

/// Cells withheld from general placement for the rest of a build (moat
/// tiles), independent of what the grid currently holds there.
pub type BlockedSet = HashSet<Coord>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    /// All-`Empty` grid of `size × size`.
    pub fn new(size: usize) -> Self {
        Grid {
            size,
            cells: vec![CellKind::Empty; size * size],
        }
    }

    /// Wrap row-major cells. `None` unless `cells.len() == size * size`.
    pub fn from_cells(size: usize, cells: Vec<CellKind>) -> Option<Self> {
        (cells.len() == size * size).then_some(Grid { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, (r, c): Coord) -> CellKind {
        self.cells[r * self.size + c]
    }

    pub fn set(&mut self, (r, c): Coord, kind: CellKind) {
        self.cells[r * self.size + c] = kind;
    }

    pub fn is_empty_at(&self, at: Coord) -> bool {
        self.get(at) == CellKind::Empty
    }

    /// Row-major cells.
    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, CellKind> {
        self.cells.chunks(self.size.max(1))
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|&&k| k == kind).count()
    }

    pub fn positions(&self, kind: CellKind) -> Vec<Coord> {
        self.coords().filter(|&at| self.get(at) == kind).collect()
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let size = self.size;
        (0..size).flat_map(move |r| (0..size).map(move |c| (r, c)))
    }

    /// In-bounds cells of the 3×3 block centred on `at`, centre included.
    pub fn neighbourhood(&self, (r, c): Coord) -> impl Iterator<Item = Coord> {
        let last = self.size.saturating_sub(1);
        let rows = r.saturating_sub(1)..=(r + 1).min(last);
        let cols = c.saturating_sub(1)..=(c + 1).min(last);
        rows.flat_map(move |nr| cols.clone().map(move |nc| (nr, nc)))
    }

    /// In-bounds up/down/left/right neighbours of `at`.
    pub fn cardinal_neighbours(&self, (r, c): Coord) -> Vec<Coord> {
        let mut out = Vec::with_capacity(4);
        if r > 0 {
            out.push((r - 1, c));
        }
        if r + 1 < self.size {
            out.push((r + 1, c));
        }
        if c > 0 {
            out.push((r, c - 1));
        }
        if c + 1 < self.size {
            out.push((r, c + 1));
        }
        out
    }
}

// -- Predicates ----------------------------------------------------

/// True if any of the (up to) eight surrounding cells is a workshop.
pub fn is_adjacent_to_workshop(grid: &Grid, at: Coord) -> bool {
    grid.neighbourhood(at)
        .filter(|&n| n != at)
        .any(|n| grid.get(n).is_workshop())
}

/// True if the whole 3×3 block around `at` is empty and none of those cells
/// touches a workshop.
pub fn has_clearance(grid: &Grid, at: Coord) -> bool {
    grid.neighbourhood(at)
        .all(|n| grid.is_empty_at(n) && !is_adjacent_to_workshop(grid, n))
}

// -- Candidate sets ------------------------------------------------

pub fn free_cells(grid: &Grid, blocked: &BlockedSet) -> Vec<Coord> {
    grid.coords()
        .filter(|at| grid.is_empty_at(*at) && !blocked.contains(at))
        .collect()
}

pub fn free_cells_with_clearance(grid: &Grid, blocked: &BlockedSet) -> Vec<Coord> {
    grid.coords()
        .filter(|at| {
            !blocked.contains(at) && grid.is_empty_at(*at) && has_clearance(grid, *at)
        })
        .collect()
}

/// Empty cells off the border. The blocked set is not consulted.
pub fn interior_free_cells(grid: &Grid) -> Vec<Coord> {
    let size = grid.size();
    if size < 3 {
        return Vec::new();
    }
    (1..size - 1)
        .flat_map(|r| (1..size - 1).map(move |c| (r, c)))
        .filter(|&at| grid.is_empty_at(at))
        .collect()
}

// -- Queries -------------------------------------------------------

/// Uniform pick among empty, unblocked cells. `None` when there are none.
pub fn find_any_free(grid: &Grid, blocked: &BlockedSet, rng: &mut Pcg32) -> Option<Coord> {
    rng.choose(&free_cells(grid, blocked)).copied()
}

/// Uniform pick among empty, unblocked cells with clearance.
pub fn find_free_with_clearance(
    grid: &Grid,
    blocked: &BlockedSet,
    rng: &mut Pcg32,
) -> Option<Coord> {
    rng.choose(&free_cells_with_clearance(grid, blocked)).copied()
}

/// Uniform pick among empty cells strictly inside the border, so all four
/// cardinal neighbours of the result are in bounds.
pub fn find_interior_free(grid: &Grid, rng: &mut Pcg32) -> Option<Coord> {
    rng.choose(&interior_free_cells(grid)).copied()
}
