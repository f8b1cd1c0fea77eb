//! Lowers the structured dialect onto the primitive instruction set.
//!
//! Lowering is line oriented and one-to-many: every structured line becomes
//! zero or more primitive lines, each of which remembers the unit and line
//! it came from so that later stages can report errors against the text the
//! user actually wrote.
//!
//! Structured forms:
//! - `CALL target` becomes the `TAG`, `SLF`, `CALL` call unit.
//! - `IF a op b GOTO label` gains the `ELSE` and `CLR` that must follow it.
//! - `OPR op dest a b` computes `dest = a op b` through a scratch slot.
//! - `FSET`, `FADD`, `FSUB`, `FMUL`, `FDIV` and `FSHOW` work on fixed point
//!   values.
//! - `IMPORT NAME` appends a namespaced module after the main program and
//!   calls its `START`.
//! - `END` returns from a module, or stops the main program.

mod expander;
mod error;
mod fixed;
mod library;
mod namespace;
mod tests;

use crate::compiler::CompilerError;

pub use error::ExpandError;
pub use expander::{expand, Expander};
pub use fixed::FixedPoint;
pub use library::{builtin, Library};
pub use namespace::is_reserved;

pub type ExpandResult<T> = Result<T, CompilerError<ExpandError>>;

/// Label which ends the program when jumped to.
pub const EXIT_LABEL: &str = "SYS.EXIT";

/// The text of a module, and the unit name its errors are reported under.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleSource {
    pub unit: String,
    pub text: String,
}

/// Finds the source of an imported module by name.
pub trait ModuleLoader {
    /// `Ok(None)` if no module with that name exists.
    fn load(&self, name: &str) -> std::io::Result<Option<ModuleSource>>;
}

/// One line of primitive text and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedLine {
    pub text: String,
    pub unit: String,
    /// Line in `unit`, or 0 for lines the expander adds on its own.
    pub line: u32,
}

/// The primitive program produced by the expander.
#[derive(Clone, Debug, PartialEq)]
pub struct Expansion {
    lines: Vec<ExpandedLine>,
}

impl Expansion {
    pub(crate) fn new(lines: Vec<ExpandedLine>) -> Expansion {
        Expansion { lines }
    }

    pub fn lines(&self) -> &[ExpandedLine] {
        &self.lines
    }

    /// The primitive text, one instruction per line.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for l in &self.lines {
            text.push_str(&l.text);
            text.push('\n');
        }
        text
    }

    /// Where line `line` (1-based) of [`text`](Self::text) came from.
    pub fn origin(&self, line: u32) -> Option<&ExpandedLine> {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx as usize))
    }

    /// Report an error raised against the primitive text at the structured
    /// line it came from.
    pub fn locate<E>(&self, err: CompilerError<E>) -> CompilerError<E> {
        match self.origin(err.line()) {
            Some(origin) => {
                let (unit, line) = (origin.unit.clone(), origin.line);
                CompilerError::new(line, err.into_inner()).in_unit(&unit)
            }
            None => err,
        }
    }
}

fn split_mnemonic(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim()),
        None => (line, ""),
    }
}

fn operands(rest: &str) -> Vec<&str> {
    rest.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}
