use std::fmt::Display;

use crate::compiler::error::{Categorize, ErrorCategory};

/// Errors which can be encountered while lowering structured source
#[derive(Clone, Debug, PartialEq)]
pub enum ExpandError {
    UnknownOpcode(String),
    OperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    InvalidOperand(String),
    InvalidFixed(String),
    MalformedTemplate(String),
    ReservedName(String),
    ModuleNotFound(String),
    ModuleUnreadable { name: String, reason: String },
    CyclicImport(Vec<String>),
    MissingStart(String),
}

impl Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ExpandError::*;
        match self {
            UnknownOpcode(op) => write!(f, "Unknown opcode {}", op),
            OperandCount {
                mnemonic,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} operands but found {}",
                mnemonic, expected, found
            ),
            InvalidOperand(tok) => write!(f, "Invalid operand {}", tok),
            InvalidFixed(lit) => write!(f, "Invalid fixed point literal {}", lit),
            MalformedTemplate(t) => write!(f, "Malformed template {}", t),
            ReservedName(name) => write!(f, "{} is reserved for the system", name),
            ModuleNotFound(name) => write!(f, "Could not find module {}", name),
            ModuleUnreadable { name, reason } => {
                write!(f, "Could not read module {}: {}", name, reason)
            }
            CyclicImport(chain) => write!(f, "Cyclic import: {}", chain.join(" -> ")),
            MissingStart(name) => write!(f, "Module {} does not declare :START", name),
        }
    }
}

impl Categorize for ExpandError {
    fn category(&self) -> ErrorCategory {
        use ExpandError::*;
        match self {
            ModuleNotFound(_) | ModuleUnreadable { .. } => ErrorCategory::ModuleNotFound,
            CyclicImport(_) | MissingStart(_) => ErrorCategory::StructuralViolation,
            _ => ErrorCategory::Syntax,
        }
    }
}
