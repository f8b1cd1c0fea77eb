//! Pass 2 of the spatial backend.  Turns a parsed [`Program`] into a grid of
//! command cells in which every jump is a coordinate delta.
//!
//! [`Program`]: crate::compiler::isa::Program

pub mod command;
mod error;
mod generator;
pub mod prelude;
mod tests;

pub use error::CodegenError;
pub use generator::{generate, CodegenResult, Compilation};
pub use prelude::Routines;
