pub mod cli;
pub mod compiler;
pub mod emulator;
pub mod io;
pub mod project;

pub use cli::*;
