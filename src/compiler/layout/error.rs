use std::fmt::Display;

use crate::compiler::error::{Categorize, ErrorCategory};

use super::Coord;

/// Errors raised while laying cells out on the grid.  Apart from a row
/// width that is too small, these indicate a bug in the toolchain rather than
/// in the user's program.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    WidthTooSmall(usize),
    CellOccupied(Coord),
    OutOfBounds(Coord),
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::WidthTooSmall(w) => write!(
                f,
                "Row width {} leaves no usable column (minimum {})",
                w,
                super::MIN_ROW_WIDTH
            ),
            LayoutError::CellOccupied(c) => write!(f, "Cell {} is already occupied", c),
            LayoutError::OutOfBounds(c) => write!(f, "Cell {} is outside of the grid", c),
        }
    }
}

impl Categorize for LayoutError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Layout
    }
}
