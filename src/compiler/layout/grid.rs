use log::trace;
use serde::Serialize;

use super::{Coord, LayoutError, Orientation, Walk};

/// Whether a cell runs on its own trigger or after the cell that points
/// into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Origin,
    Chained,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridCell {
    pub command: Option<String>,
    pub linkage: Linkage,
    pub orientation: Orientation,
    pub source_line: Option<u32>,
}

impl GridCell {
    pub fn new(
        command: String,
        linkage: Linkage,
        orientation: Orientation,
        source_line: Option<u32>,
    ) -> GridCell {
        GridCell {
            command: Some(command),
            linkage,
            orientation,
            source_line,
        }
    }

    /// A non-executing cell which only redirects the chain at a row wrap.
    pub fn turn_marker(orientation: Orientation) -> GridCell {
        GridCell {
            command: None,
            linkage: Linkage::Chained,
            orientation,
            source_line: None,
        }
    }
}

/// Rows of cells with a fixed width.  Rows are only ever appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    rows: Vec<Vec<Option<GridCell>>>,
}

impl Grid {
    pub fn new(width: usize) -> Grid {
        Grid {
            width,
            rows: vec![],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, at: Coord) -> Option<&GridCell> {
        self.rows.get(at.row).and_then(|r| r[at.col].as_ref())
    }

    /// Store a cell, growing the grid by as many rows as needed.  A cell can
    /// only be written once.
    pub fn place(&mut self, at: Coord, cell: GridCell) -> Result<(), LayoutError> {
        if at.col >= self.width {
            return Err(LayoutError::OutOfBounds(at));
        }
        while self.rows.len() <= at.row {
            trace!("Add row {}", self.rows.len());
            self.rows.push(vec![None; self.width]);
        }

        let slot = &mut self.rows[at.row][at.col];
        if slot.is_some() {
            return Err(LayoutError::CellOccupied(at));
        }
        *slot = Some(cell);
        Ok(())
    }

    /// Every occupied cell in row major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &GridCell)> {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, c)| c.as_ref().map(|c| (Coord::new(row, col), c)))
        })
    }
}

/// A [`Grid`] being filled along a [`Walk`].
#[derive(Clone, Debug)]
pub struct Layout {
    grid: Grid,
    walk: Walk,
}

impl Layout {
    pub fn new(width: usize) -> Result<Layout, LayoutError> {
        Ok(Layout {
            grid: Grid::new(width),
            walk: Walk::new(width)?,
        })
    }

    pub fn walk(&self) -> &Walk {
        &self.walk
    }

    pub fn position(&self) -> Coord {
        self.walk.position()
    }

    /// Put a command at the current position, then advance.  The cell's
    /// orientation is taken from the direction of travel right now.  When the
    /// step wraps, a turn marker is placed on each of the two rows.
    pub fn place(
        &mut self,
        command: String,
        linkage: Linkage,
        source_line: Option<u32>,
    ) -> Result<Coord, LayoutError> {
        let at = self.walk.position();
        let cell = GridCell::new(command, linkage, self.walk.orientation(), source_line);
        self.grid.place(at, cell)?;

        if let Some(wrap) = self.walk.step() {
            trace!("Wrap at column {} into row {}", wrap.col, wrap.to_row);
            self.grid.place(
                Coord::new(wrap.from_row, wrap.col),
                GridCell::turn_marker(Orientation::NextRow),
            )?;
            self.grid.place(
                Coord::new(wrap.to_row, wrap.col),
                GridCell::turn_marker(wrap.dir.orientation()),
            )?;
        }
        Ok(at)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }
}
