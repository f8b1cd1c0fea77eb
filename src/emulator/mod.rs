//! A linear interpreter for primitive programs.  It shares the parsed
//! [`Program`] and the label rules with the spatial backend and is used as
//! the semantic reference for it.

mod error;
mod machine;
mod sink;

use crate::compiler::{isa::Program, CompilerError};

pub use error::EmulatorError;
pub use machine::{floor_div, Emulator, EmulatorResult};
pub use sink::{Sink, WriterSink};

/// Parse and run primitive `text` with `registers` registers, sending all
/// output to `sink`.
pub fn emulate(
    text: &str,
    registers: usize,
    sink: &mut dyn Sink,
) -> Result<(), Vec<CompilerError<EmulatorError>>> {
    let program =
        Program::parse(text).map_err(|e| vec![e.map(EmulatorError::Malformed)])?;
    let mut emulator = Emulator::new(&program, registers)?;
    emulator.run(sink).map_err(|e| vec![e])
}
