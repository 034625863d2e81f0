//! Random placement of the start and end pieces.
//!
//! Each search draws a random orientation and then samples random cells for a
//! bounded number of attempts. When sampling fails the grid is scanned in
//! row-major order, first with the drawn orientation and then with the
//! remaining ones, so a search only fails when no valid cell exists at all.

use pipeflow_core::{CellCoord, EndOrientation, StartOrientation};
use rand::{Rng, RngCore};

use crate::grid::Grid;

/// Random cells drawn before falling back to a deterministic scan.
pub(crate) const MAX_RANDOM_ATTEMPTS: usize = 256;

/// A start cell must be free and must not face the boundary it releases
/// flow toward.
pub(crate) fn valid_start(grid: &Grid, cell: CellCoord, orientation: StartOrientation) -> bool {
    grid.is_free(cell) && !grid.size().is_boundary(cell, orientation.heading())
}

/// An end cell must be free, must not open onto the boundary and must have
/// no occupied neighbours.
pub(crate) fn valid_end(grid: &Grid, cell: CellCoord, orientation: EndOrientation) -> bool {
    grid.is_free(cell)
        && !grid.size().is_boundary(cell, orientation.open_side())
        && grid.neighbors_free(cell)
}

pub(crate) fn place_start(
    grid: &Grid,
    rng: &mut dyn RngCore,
) -> Option<(CellCoord, StartOrientation)> {
    search(grid, rng, &StartOrientation::ALL, valid_start)
}

pub(crate) fn place_end(grid: &Grid, rng: &mut dyn RngCore) -> Option<(CellCoord, EndOrientation)> {
    search(grid, rng, &EndOrientation::ALL, valid_end)
}

fn search<O: Copy + PartialEq>(
    grid: &Grid,
    rng: &mut dyn RngCore,
    orientations: &[O],
    valid: fn(&Grid, CellCoord, O) -> bool,
) -> Option<(CellCoord, O)> {
    let size = grid.size();
    if size.cell_count() == 0 || orientations.is_empty() {
        return None;
    }

    let chosen = orientations[rng.gen_range(0..orientations.len())];
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let cell = CellCoord::new(
            rng.gen_range(0..size.rows()),
            rng.gen_range(0..size.columns()),
        );
        if valid(grid, cell, chosen) {
            return Some((cell, chosen));
        }
    }

    std::iter::once(chosen)
        .chain(orientations.iter().copied().filter(|candidate| *candidate != chosen))
        .find_map(|orientation| {
            size.cells()
                .find(|cell| valid(grid, *cell, orientation))
                .map(|cell| (cell, orientation))
        })
}
