use std::fmt::Display;

use serde::Serialize;

use super::LayoutError;

/// Smallest row width that still leaves one usable column between the two
/// reserved turn marker columns.
pub const MIN_ROW_WIDTH: usize = 3;

/// A position on the grid.  `row` grows as the walk wraps; `col` is always
/// inside `0..width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Coord {
        Coord { row, col }
    }

    /// The relative offset which, applied at `self`, addresses `target`.
    pub fn delta_to(&self, target: Coord) -> Delta {
        Delta {
            rows: target.row as i64 - self.row as i64,
            cols: target.col as i64 - self.col as i64,
        }
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Difference between two coordinates.  This is the only form of address the
/// execution substrate understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delta {
    pub rows: i64,
    pub cols: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(&self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    pub fn flip(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Direction::Forward => Orientation::Forward,
            Direction::Backward => Orientation::Backward,
        }
    }
}

/// Which neighbour a cell hands execution to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Toward increasing columns.
    Forward,
    /// Toward decreasing columns.
    Backward,
    /// Down into the next row; used by the turn marker on the row being left.
    NextRow,
}

impl Orientation {
    /// The block facing used by the exporter.
    pub fn facing(&self) -> &'static str {
        match self {
            Orientation::Forward => "south",
            Orientation::Backward => "north",
            Orientation::NextRow => "east",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
    pub dir: Direction,
}

impl Cursor {
    pub fn start() -> Cursor {
        Cursor {
            row: 0,
            col: 1,
            dir: Direction::Forward,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

/// A row change.  Turn markers go in column `col` of both rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wrap {
    pub col: usize,
    pub from_row: usize,
    pub to_row: usize,
    /// Direction of travel on `to_row`.
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub next: Cursor,
    pub wrap: Option<Wrap>,
}

/// The stepping rule of the snake walk.  Every consumer of coordinates
/// (label scanning, cell placement and look-ahead prediction) goes through
/// this one function.
///
/// Columns `0` and `width - 1` are reserved for turn markers.  Moving into
/// one of them flips the direction, drops to the next row, and continues one
/// column past the marker in the new direction.
pub fn advance(cursor: Cursor, width: usize) -> Step {
    let x = cursor.col as isize + cursor.dir.sign();
    if x >= 1 && x <= width as isize - 2 {
        return Step {
            next: Cursor {
                col: x as usize,
                ..cursor
            },
            wrap: None,
        };
    }

    let turn = x.max(0) as usize;
    let dir = cursor.dir.flip();
    let row = cursor.row + 1;
    Step {
        next: Cursor {
            row,
            col: (turn as isize + dir.sign()) as usize,
            dir,
        },
        wrap: Some(Wrap {
            col: turn,
            from_row: cursor.row,
            to_row: row,
            dir,
        }),
    }
}

/// A cursor moving along the snake path of a grid with a fixed row width.
#[derive(Clone, Debug, PartialEq)]
pub struct Walk {
    width: usize,
    cursor: Cursor,
}

impl Walk {
    pub fn new(width: usize) -> Result<Walk, LayoutError> {
        if width < MIN_ROW_WIDTH {
            return Err(LayoutError::WidthTooSmall(width));
        }
        Ok(Walk {
            width,
            cursor: Cursor::start(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn position(&self) -> Coord {
        self.cursor.coord()
    }

    /// Orientation of a cell placed at the current position.
    pub fn orientation(&self) -> Orientation {
        self.cursor.dir.orientation()
    }

    /// Move one cell along the path, returning the wrap if one happened.
    pub fn step(&mut self) -> Option<Wrap> {
        let step = advance(self.cursor, self.width);
        self.cursor = step.next;
        step.wrap
    }

    /// Move `n` cells along the path.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// The coordinate `steps` cells ahead, without moving.
    pub fn predict(&self, steps: usize) -> Coord {
        let mut cursor = self.cursor;
        for _ in 0..steps {
            cursor = advance(cursor, self.width).next;
        }
        cursor.coord()
    }
}
