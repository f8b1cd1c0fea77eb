//! The primitive instruction set shared by the spatial code generator and
//! the emulator.  Source text is parsed exactly once into a [`Program`] of
//! typed [`Statement`]s; neither backend ever looks at the raw text again.

mod error;
mod instruction;
mod parser;
mod tests;

pub use error::ParseError;
pub use instruction::*;
pub use parser::{if_structure, is_identifier, parse_line, strip_comment, ParseResult, Program};

/// The call unit contract.  A call is the three statement sequence
/// `TAG target; SLF; CALL`, and SLF records the address this many statements
/// ahead of itself: the statement immediately after the CALL.  The emulator
/// adds it to the program counter and the layout engine advances the walk by
/// it, so both backends resume at the same place.
pub const CALL_RETURN_STEPS: usize = 2;
