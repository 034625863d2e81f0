//! Hand-authored boards.
//!
//! A layout pins the start piece, the end piece and any pre-placed pipes so a
//! session can replay the same board on every reset. Layouts are written as
//! whitespace separated tokens, one grid row per line:
//!
//! ```text
//! S> -  -  7
//! .  .  .  |
//! E> -  -  J
//! ```
//!
//! | token | meaning |
//! |-------|---------|
//! | `.` | empty cell |
//! | `-` `\|` | horizontal and vertical pipes |
//! | `J` `7` `L` `F` | turns joining top-left, bottom-left, top-right and bottom-right |
//! | `S>` `S<` `S^` `Sv` | start piece releasing flow right, left, up or down |
//! | `E<` `E>` `E^` `Ev` | end piece open on its left, right, top or bottom edge |

use std::{collections::BTreeSet, fmt, str::FromStr};

use pipeflow_core::{CellCoord, CellTag, EndOrientation, GridSize, PipeShape, StartOrientation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MAXIMUM_GRID_EDGE;

/// Fixed board description: grid size, both endpoints and pre-placed pipes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    size: GridSize,
    start: (CellCoord, StartOrientation),
    end: (CellCoord, EndOrientation),
    #[serde(default)]
    pipes: Vec<(CellCoord, PipeShape)>,
}

impl BoardLayout {
    /// Creates a layout holding only the two endpoints.
    pub fn new(
        size: GridSize,
        start: (CellCoord, StartOrientation),
        end: (CellCoord, EndOrientation),
    ) -> Result<Self, LayoutError> {
        let layout = Self {
            size,
            start,
            end,
            pipes: Vec::new(),
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Adds a pre-placed pipe.
    pub fn with_pipe(mut self, cell: CellCoord, shape: PipeShape) -> Result<Self, LayoutError> {
        self.pipes.push((cell, shape));
        self.validate()?;
        Ok(self)
    }

    /// Dimensions of the board.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Start cell and the direction it releases flow toward.
    #[must_use]
    pub const fn start(&self) -> (CellCoord, StartOrientation) {
        self.start
    }

    /// End cell and the side it is open on.
    #[must_use]
    pub const fn end(&self) -> (CellCoord, EndOrientation) {
        self.end
    }

    /// Pre-placed pipes.
    #[must_use]
    pub fn pipes(&self) -> &[(CellCoord, PipeShape)] {
        &self.pipes
    }

    /// Every occupied cell with its tag: start, end, then pipes.
    pub fn tags(&self) -> impl Iterator<Item = (CellCoord, CellTag)> + '_ {
        [
            (self.start.0, CellTag::Start(self.start.1)),
            (self.end.0, CellTag::End(self.end.1)),
        ]
        .into_iter()
        .chain(
            self.pipes
                .iter()
                .map(|(cell, shape)| (*cell, CellTag::Pipe(*shape))),
        )
    }

    /// Checks that every piece lies on the grid and no two share a cell.
    ///
    /// Deserialized layouts bypass the constructors and must be validated
    /// before use.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.size.cell_count() == 0 {
            return Err(LayoutError::Empty);
        }
        if self.size.rows() > MAXIMUM_GRID_EDGE || self.size.columns() > MAXIMUM_GRID_EDGE {
            return Err(LayoutError::TooLarge { size: self.size });
        }
        let mut seen = BTreeSet::new();
        for (cell, _) in self.tags() {
            if !self.size.contains(cell) {
                return Err(LayoutError::OutOfBounds { cell });
            }
            if !seen.insert(cell) {
                return Err(LayoutError::Overlap { cell });
            }
        }
        Ok(())
    }

    fn tag_at(&self, cell: CellCoord) -> CellTag {
        self.tags()
            .find(|(candidate, _)| *candidate == cell)
            .map_or(CellTag::Empty, |(_, tag)| tag)
    }
}

impl fmt::Display for BoardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size.rows() {
            let line: Vec<&str> = (0..self.size.columns())
                .map(|column| token(self.tag_at(CellCoord::new(row, column))))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl FromStr for BoardLayout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|tokens| !tokens.is_empty())
            .collect();
        let columns = rows.first().map_or(0, Vec::len);
        if columns == 0 {
            return Err(LayoutError::Empty);
        }

        let mut start = None;
        let mut end = None;
        let mut pipes = Vec::new();
        for (row, tokens) in (0_u32..).zip(&rows) {
            if tokens.len() != columns {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: columns,
                    found: tokens.len(),
                });
            }
            for (column, token) in (0_u32..).zip(tokens) {
                let cell = CellCoord::new(row, column);
                match parse_token(token).ok_or_else(|| LayoutError::UnknownToken {
                    cell,
                    token: (*token).to_owned(),
                })? {
                    CellTag::Empty => {}
                    CellTag::Pipe(shape) => pipes.push((cell, shape)),
                    CellTag::Start(orientation) => {
                        if start.replace((cell, orientation)).is_some() {
                            return Err(LayoutError::DuplicateStart { cell });
                        }
                    }
                    CellTag::End(orientation) => {
                        if end.replace((cell, orientation)).is_some() {
                            return Err(LayoutError::DuplicateEnd { cell });
                        }
                    }
                }
            }
        }

        let row_count = u32::try_from(rows.len()).map_err(|_| LayoutError::Empty)?;
        let column_count = u32::try_from(columns).map_err(|_| LayoutError::Empty)?;
        let layout = Self {
            size: GridSize::new(row_count, column_count),
            start: start.ok_or(LayoutError::MissingStart)?,
            end: end.ok_or(LayoutError::MissingEnd)?,
            pipes,
        };
        layout.validate()?;
        Ok(layout)
    }
}

fn parse_token(token: &str) -> Option<CellTag> {
    let tag = match token {
        "." => CellTag::Empty,
        "-" => CellTag::Pipe(PipeShape::Horizontal),
        "|" => CellTag::Pipe(PipeShape::Vertical),
        "J" => CellTag::Pipe(PipeShape::TopLeft),
        "7" => CellTag::Pipe(PipeShape::BottomLeft),
        "L" => CellTag::Pipe(PipeShape::TopRight),
        "F" => CellTag::Pipe(PipeShape::BottomRight),
        "S>" => CellTag::Start(StartOrientation::Right),
        "S<" => CellTag::Start(StartOrientation::Left),
        "S^" => CellTag::Start(StartOrientation::Up),
        "Sv" => CellTag::Start(StartOrientation::Down),
        "E<" => CellTag::End(EndOrientation::Left),
        "E>" => CellTag::End(EndOrientation::Right),
        "E^" => CellTag::End(EndOrientation::Up),
        "Ev" => CellTag::End(EndOrientation::Down),
        _ => return None,
    };
    Some(tag)
}

const fn token(tag: CellTag) -> &'static str {
    match tag {
        CellTag::Empty => ".",
        CellTag::Pipe(PipeShape::Horizontal) => "-",
        CellTag::Pipe(PipeShape::Vertical) => "|",
        CellTag::Pipe(PipeShape::TopLeft) => "J",
        CellTag::Pipe(PipeShape::BottomLeft) => "7",
        CellTag::Pipe(PipeShape::TopRight) => "L",
        CellTag::Pipe(PipeShape::BottomRight) => "F",
        CellTag::Start(StartOrientation::Right) => "S>",
        CellTag::Start(StartOrientation::Left) => "S<",
        CellTag::Start(StartOrientation::Up) => "S^",
        CellTag::Start(StartOrientation::Down) => "Sv",
        CellTag::End(EndOrientation::Left) => "E<",
        CellTag::End(EndOrientation::Right) => "E>",
        CellTag::End(EndOrientation::Up) => "E^",
        CellTag::End(EndOrientation::Down) => "Ev",
    }
}

/// Reasons a layout is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout has no cells.
    #[error("layout has no cells")]
    Empty,
    /// The grid exceeds [`MAXIMUM_GRID_EDGE`] on some side.
    #[error(
        "layout of {}x{} cells is too large; neither dimension may exceed {}",
        .size.rows(),
        .size.columns(),
        MAXIMUM_GRID_EDGE
    )]
    TooLarge {
        /// Declared grid dimensions.
        size: GridSize,
    },
    /// A row holds a different number of tokens than the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Token count of the first row.
        expected: usize,
        /// Token count of the offending row.
        found: usize,
    },
    /// A token is not part of the layout alphabet.
    #[error("unknown token `{token}` at row {}, column {}", .cell.row(), .cell.column())]
    UnknownToken {
        /// Cell holding the token.
        cell: CellCoord,
        /// Offending token.
        token: String,
    },
    /// No start piece was given.
    #[error("layout has no start piece")]
    MissingStart,
    /// No end piece was given.
    #[error("layout has no end piece")]
    MissingEnd,
    /// A second start piece was given.
    #[error("second start piece at row {}, column {}", .cell.row(), .cell.column())]
    DuplicateStart {
        /// Cell of the second start piece.
        cell: CellCoord,
    },
    /// A second end piece was given.
    #[error("second end piece at row {}, column {}", .cell.row(), .cell.column())]
    DuplicateEnd {
        /// Cell of the second end piece.
        cell: CellCoord,
    },
    /// A piece lies outside the grid.
    #[error("piece at row {}, column {} lies outside the grid", .cell.row(), .cell.column())]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// Two pieces share a cell.
    #[error("more than one piece at row {}, column {}", .cell.row(), .cell.column())]
    Overlap {
        /// Shared cell.
        cell: CellCoord,
    },
}
