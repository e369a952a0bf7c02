use std::error::Error as StdError;
use std::fmt::Display;

use crate::diagnostics::Diagnostic;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Top-level error for callers that want to use `?` against a compile
/// result instead of inspecting [`crate::CompileResult::diagnostics`]
/// themselves. The pipeline itself never panics or returns `Err`; this
/// exists purely for ergonomic conversion at the call site.
#[derive(Debug)]
pub enum Error {
  /// The pipeline halted with at least one error-severity diagnostic.
  Diagnostics(Vec<Diagnostic>),
}

impl From<Vec<Diagnostic>> for Error {
  fn from(value: Vec<Diagnostic>) -> Self {
    Error::Diagnostics(value)
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::Diagnostics(diagnostics) => {
        write!(f, "compilation failed with {} diagnostic(s)", diagnostics.len())?;
        for diagnostic in diagnostics {
          write!(f, "\n  {diagnostic}")?;
        }
        Ok(())
      }
    }
  }
}

impl StdError for Error {}
