use std::fmt::Display;

/// Represents all errors that are generated from within the Compiler
/// module, its submodules, and the emulator.
///
/// This type captures common metadata which is necessarily present for
/// all errors which are caused by input source code.  E.g. the line #
/// that the error occurs on and, when known, the compilation unit (a file
/// or an imported module) that contains the line.
///
/// The inner error allows metadata which is specific to a stage of the
/// toolchain. E.g., the errors themselves are stage specific and
/// are stored in the `inner` field.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE> {
    unit: Option<String>,
    line: u32,
    inner: IE,
}

impl<IE> CompilerError<IE> {
    pub fn new(line: u32, inner: IE) -> Self {
        CompilerError {
            unit: None,
            line,
            inner,
        }
    }

    /// Attach the name of the compilation unit which produced this error.
    pub fn in_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Convert the inner error, keeping the line and unit.
    pub fn map<E>(self, f: impl FnOnce(IE) -> E) -> CompilerError<E> {
        CompilerError {
            unit: self.unit,
            line: self.line,
            inner: f(self.inner),
        }
    }

    pub fn inner(&self) -> &IE {
        &self.inner
    }

    pub fn into_inner(self) -> IE {
        self.inner
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

impl<IE: Categorize> CompilerError<IE> {
    pub fn category(&self) -> ErrorCategory {
        self.inner.category()
    }
}

impl<IE: Display> Display for CompilerError<IE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}:L{}: {}", unit, self.line, self.inner),
            None => write!(f, "L{}: {}", self.line, self.inner),
        }
    }
}

/// The broad families of faults that the toolchain can report.  Each stage
/// has its own error type; this is the common classification used for
/// reporting and exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    UndefinedLabel,
    DuplicateLabel,
    StructuralViolation,
    ModuleNotFound,
    Arithmetic,
    Layout,
    Runtime,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorCategory::*;
        let s = match self {
            Syntax => "syntax error",
            UndefinedLabel => "undefined label",
            DuplicateLabel => "duplicate label",
            StructuralViolation => "structural violation",
            ModuleNotFound => "module not found",
            Arithmetic => "arithmetic error",
            Layout => "layout error",
            Runtime => "runtime error",
        };
        f.write_str(s)
    }
}

/// Maps a stage specific error onto the shared [`ErrorCategory`].
pub trait Categorize {
    fn category(&self) -> ErrorCategory;
}
