/*!
 * The toolchain turns structured source into a grid of command cells.
 *
 * The stages run in order and each only accepts the output of the one
 * before it:
 * 1. `expander` lowers the structured dialect (calls, IF blocks, fixed
 *    point, imports) onto the primitive instruction set, remembering where
 *    every primitive line came from.
 * 2. `isa` parses the primitive text into a closed set of operations and
 *    checks the IF/ELSE/CLR and SLF/CALL structure.
 * 3. `resolver` is pass 1: it finds where every label will land without
 *    emitting anything.
 * 4. `codegen` is pass 2: it walks the program again along the same snake
 *    path laid out by `layout` and emits one cell per statement, with every
 *    jump encoded as a relative offset.
 *
 * User errors can come out of any stage and are reported as a
 * `CompilerError` carrying the unit and line they were found on.  Errors in
 * pass 2 that pass 1 did not catch are layout faults and are fatal.
 */
pub mod codegen;
pub mod error;
pub mod expander;
pub mod isa;
pub mod layout;
pub mod resolver;

pub use error::CompilerError;
