use pipeflow_core::{CellCoord, CellTag, Direction, GridSize};

/// Dense row-major matrix of cell tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<CellTag>,
}

impl Grid {
    pub(crate) fn new(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![CellTag::Empty; size.cell_count()],
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Tag stored for the cell, or `None` outside the grid.
    #[must_use]
    pub fn tag(&self, cell: CellCoord) -> Option<CellTag> {
        self.size
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell lies inside the grid and holds nothing.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.tag(cell).is_some_and(|tag| tag.is_empty())
    }

    /// Reports whether every in-bounds orthogonal neighbour of the cell is free.
    #[must_use]
    pub fn neighbors_free(&self, cell: CellCoord) -> bool {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| self.size.neighbor(cell, direction))
            .all(|neighbor| self.is_free(neighbor))
    }

    /// Number of cells holding a tag other than [`CellTag::Empty`].
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|tag| !tag.is_empty()).count()
    }

    /// Iterator over every cell and its tag in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellTag)> + '_ {
        self.size.cells().zip(self.cells.iter().copied())
    }

    pub(crate) fn set(&mut self, cell: CellCoord, tag: CellTag) {
        if let Some(slot) = self
            .size
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
        {
            *slot = tag;
        }
    }
}
