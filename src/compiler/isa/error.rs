use std::fmt::Display;

use crate::compiler::error::{Categorize, ErrorCategory};

use super::Opcode;

/// Errors which can be encountered while parsing primitive source text
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    UnknownOpcode(String),
    OperandCount {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },
    InvalidOperand(String),
    InvalidLabel(String),
    InvalidComparison(String),
    ExpectedGoto(String),
    MalformedTemplate(String),
    ImmediateNotAllowed(Opcode),
    MissingElse,
    MissingClr,
    ElseWithoutIf,
    SlfWithoutCall,
    UndeclaredVariable(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ParseError::*;
        match self {
            UnknownOpcode(op) => write!(f, "Unknown opcode {}", op),
            OperandCount {
                opcode,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} operand(s) but found {}",
                opcode, expected, found
            ),
            InvalidOperand(tok) => write!(f, "Invalid operand {}", tok),
            InvalidLabel(tok) => write!(f, "Invalid label {}", tok),
            InvalidComparison(tok) => write!(f, "Invalid comparison operator {}", tok),
            ExpectedGoto(tok) => write!(f, "Expected GOTO in IF but found {}", tok),
            MalformedTemplate(t) => write!(f, "Malformed SAY template {}", t),
            ImmediateNotAllowed(op) => write!(f, "{} does not support immediate values", op),
            MissingElse => f.write_str("IF must be followed by ELSE"),
            MissingClr => f.write_str("IF must be followed by ELSE then CLR"),
            ElseWithoutIf => f.write_str("ELSE must immediately follow an IF"),
            SlfWithoutCall => f.write_str("SLF must immediately be followed by CALL"),
            UndeclaredVariable(v) => write!(f, "Variable {} is used before its VAR", v),
        }
    }
}

impl Categorize for ParseError {
    fn category(&self) -> ErrorCategory {
        use ParseError::*;
        match self {
            ImmediateNotAllowed(_) | MissingElse | MissingClr | ElseWithoutIf
            | SlfWithoutCall => ErrorCategory::StructuralViolation,
            _ => ErrorCategory::Syntax,
        }
    }
}
