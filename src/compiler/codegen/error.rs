use std::fmt::Display;

use crate::compiler::{
    error::{Categorize, ErrorCategory},
    isa::Operand,
    layout::LayoutError,
    resolver::LabelError,
};

/// Errors which can be encountered while placing a program on the grid.
#[derive(Clone, Debug, PartialEq)]
pub enum CodegenError {
    Label(LabelError),
    Layout(LayoutError),
    RegisterOutOfRange { index: u32, count: usize },
    ExpectedSlot(Operand),
}

impl Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::Label(e) => write!(f, "{}", e),
            CodegenError::Layout(e) => write!(f, "{}", e),
            CodegenError::RegisterOutOfRange { index, count } => write!(
                f,
                "Register R{} is out of range, only {} registers are available",
                index, count
            ),
            CodegenError::ExpectedSlot(o) => {
                write!(f, "Expected a register or variable but found {}", o)
            }
        }
    }
}

impl Categorize for CodegenError {
    fn category(&self) -> ErrorCategory {
        match self {
            CodegenError::Label(e) => e.category(),
            CodegenError::Layout(e) => e.category(),
            CodegenError::RegisterOutOfRange { .. } => ErrorCategory::StructuralViolation,
            CodegenError::ExpectedSlot(_) => ErrorCategory::Syntax,
        }
    }
}

impl From<LabelError> for CodegenError {
    fn from(e: LabelError) -> Self {
        CodegenError::Label(e)
    }
}

impl From<LayoutError> for CodegenError {
    fn from(e: LayoutError) -> Self {
        CodegenError::Layout(e)
    }
}
