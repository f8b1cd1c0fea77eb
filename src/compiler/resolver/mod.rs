//! Pass 1: find where every label lands before anything is emitted.
//!
//! The emulator resolves labels to statement indices and the spatial backend
//! resolves them to grid coordinates.  Both scans walk the same parsed
//! [`Program`], so blank lines and comments can never make the two disagree.
//! Every duplicate definition and dangling reference in a unit is collected
//! and reported together.

mod error;
mod label_table;
mod tests;

use log::debug;

use crate::compiler::{
    isa::{Program, StatementKind},
    layout::{Coord, Walk},
    CompilerError,
};

pub use error::LabelError;
pub use label_table::LabelTable;

pub type LabelResult<T> = Result<LabelTable<T>, Vec<CompilerError<LabelError>>>;

/// Resolve every label to the index of its statement.
pub fn index_labels(program: &Program) -> LabelResult<usize> {
    debug!("Index labels of {} statements", program.len());
    collect(program, |idx| idx)
}

/// Resolve every label to the cell it will be placed in.  `walk` must be
/// positioned where the generator will place the first statement; it is
/// stepped once per statement, labels and instructions alike.
pub fn scan_layout(program: &Program, mut walk: Walk) -> LabelResult<Coord> {
    debug!(
        "Scan layout of {} statements from {}",
        program.len(),
        walk.position()
    );
    collect(program, move |_| {
        let at = walk.position();
        walk.step();
        at
    })
}

fn collect<T>(program: &Program, mut locate: impl FnMut(usize) -> T) -> LabelResult<T> {
    let mut table = LabelTable::new();
    let mut errors = vec![];

    for (idx, stmt) in program.statements().iter().enumerate() {
        let target = locate(idx);
        if let StatementKind::Label(name) = &stmt.kind {
            if let Err(e) = table.insert(name, target, stmt.line) {
                errors.push(CompilerError::new(stmt.line, e));
            }
        }
    }

    for stmt in program.statements() {
        if let Some(name) = stmt.op().and_then(|op| op.label_ref()) {
            if !table.contains(name) {
                errors.push(CompilerError::new(
                    stmt.line,
                    LabelError::Undefined(name.into()),
                ));
            }
        }
    }

    if errors.is_empty() {
        debug!("Resolved {} labels", table.len());
        Ok(table)
    } else {
        errors.sort_by_key(|e| e.line());
        Err(errors)
    }
}
