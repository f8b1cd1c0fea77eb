use std::fmt::Display;

use crate::compiler::{
    error::{Categorize, ErrorCategory},
    isa::{Operand, ParseError},
    resolver::LabelError,
};

/// Errors which stop the emulator.  Those raised while running leave the
/// machine state as it was just before the failing statement.
#[derive(Clone, Debug, PartialEq)]
pub enum EmulatorError {
    Malformed(ParseError),
    Label(LabelError),
    RegisterOutOfRange { index: u32, count: usize },
    EmptyStack,
    StackOverflow(usize),
    NoPendingCall,
    DivisionByZero,
    UndeclaredVariable(String),
    Unassigned(String),
    ExpectedValue(Operand),
    Output(String),
}

impl Display for EmulatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use EmulatorError::*;
        match self {
            Malformed(e) => write!(f, "{}", e),
            Label(e) => write!(f, "{}", e),
            RegisterOutOfRange { index, count } => write!(
                f,
                "Register R{} is out of range, only {} registers are available",
                index, count
            ),
            EmptyStack => f.write_str("RET with an empty call stack"),
            StackOverflow(depth) => write!(f, "Call stack exceeded {} frames", depth),
            NoPendingCall => f.write_str("CALL without a pending TAG"),
            DivisionByZero => f.write_str("Division by zero"),
            UndeclaredVariable(v) => write!(f, "Variable {} is not declared", v),
            Unassigned(v) => write!(f, "Variable {} is read before it is assigned", v),
            ExpectedValue(o) => write!(f, "Expected a value but found {}", o),
            Output(reason) => write!(f, "Could not write output: {}", reason),
        }
    }
}

impl Categorize for EmulatorError {
    fn category(&self) -> ErrorCategory {
        use EmulatorError::*;
        match self {
            Malformed(e) => e.category(),
            Label(e) => e.category(),
            EmptyStack | NoPendingCall => ErrorCategory::StructuralViolation,
            DivisionByZero => ErrorCategory::Arithmetic,
            _ => ErrorCategory::Runtime,
        }
    }
}
