use std::fmt::Display;

use crate::compiler::error::{Categorize, ErrorCategory};

#[derive(Clone, Debug, PartialEq)]
pub enum LabelError {
    Undefined(String),
    Duplicate { name: String, first_line: u32 },
}

impl Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::Undefined(name) => write!(f, "Undefined label :{}", name),
            LabelError::Duplicate { name, first_line } => write!(
                f,
                "Label :{} is already defined on L{}",
                name, first_line
            ),
        }
    }
}

impl Categorize for LabelError {
    fn category(&self) -> ErrorCategory {
        match self {
            LabelError::Undefined(_) => ErrorCategory::UndefinedLabel,
            LabelError::Duplicate { .. } => ErrorCategory::DuplicateLabel,
        }
    }
}
