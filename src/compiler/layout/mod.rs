//! Maps the linear statement stream onto a fixed width grid that grows one
//! row at a time.  Cells are placed along a snake (boustrophedon) path: a row
//! is filled in one direction, the path turns down through two turn marker
//! cells, and the next row is filled in the opposite direction.
//!
//! The same [`advance`] function drives label scanning, cell placement, and
//! look-ahead prediction, so that every consumer agrees on where a statement
//! lands.

mod error;
mod grid;
mod walk;

pub use error::LayoutError;
pub use grid::{Grid, GridCell, Layout, Linkage};
pub use walk::{
    advance, Coord, Cursor, Delta, Direction, Orientation, Step, Walk, Wrap, MIN_ROW_WIDTH,
};
