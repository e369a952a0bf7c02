//! The diagnostics sink shared by all four passes.
//!
//! Every phase accumulates [`Diagnostic`]s here instead of aborting on the
//! first problem (see spec §7): a lexer that hits an unterminated string
//! still wants to report the next three as well.

use std::fmt;

use diag::Report;
use span::Span;

/// Precomputed line-start offsets, so phases can turn a byte [`Span`] into a
/// 1-based (line, column) pair without rescanning the source on every call.
pub struct LineIndex {
  /// Byte offset of the first character of each line; `starts[0] == 0`.
  starts: Vec<usize>,
}

impl LineIndex {
  pub fn new(src: &str) -> Self {
    let mut starts = vec![0];
    starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
    Self { starts }
  }

  /// 1-based (line, column) for a byte offset into the source this index was
  /// built from.
  pub fn line_col(&self, offset: usize) -> (usize, usize) {
    let line = match self.starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i - 1,
    };
    let col = offset - self.starts[line] + 1;
    (line + 1, col)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  Lex,
  Parse,
  Semantic,
  Codegen,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Phase::Lex => "lex",
      Phase::Parse => "parse",
      Phase::Semantic => "semantic",
      Phase::Codegen => "codegen",
    };
    write!(f, "{s}")
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
    };
    write!(f, "{s}")
  }
}

/// The closed taxonomy from spec §7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
  // Lex
  UnexpectedCharacter,
  UnterminatedString,
  InconsistentIndentation,
  MixedTabsAndSpaces,
  InvalidNumber,
  // Parse
  UnexpectedToken,
  MissingColon,
  MissingCloser,
  UnsupportedConstruct,
  EmptyBlock,
  // Semantic
  UndefinedVariable,
  ArityMismatch,
  TypeMismatch,
  ReturnOutsideFunction,
  BreakOutsideLoop,
  Redefinition,
  // Codegen
  InternalInvariant,
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{self:?}")
  }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
  pub phase: Phase,
  pub severity: Severity,
  pub line: usize,
  pub column: usize,
  pub kind: Kind,
  pub message: String,
  pub span: Span,
}

impl Diagnostic {
  pub fn new(
    phase: Phase,
    severity: Severity,
    kind: Kind,
    span: Span,
    index: &LineIndex,
    message: impl Into<String>,
  ) -> Self {
    let (line, column) = index.line_col(span.start);
    Self {
      phase,
      severity,
      line,
      column,
      kind,
      message: message.into(),
      span,
    }
  }

  /// Render a colorized, source-annotated report using `pyrite_diag`. This is
  /// the pretty variant; [`Diagnostic`]'s [`fmt::Display`] impl is the stable
  /// plain-text format from spec §7 and is what tests assert against.
  pub fn to_report(&self, src: &str) -> String {
    let builder = match self.severity {
      Severity::Error => Report::error(),
      Severity::Warning => Report::warn(),
    };
    builder
      .source(src)
      .message(format!("{}: {}", self.kind, self.message))
      .span(self.span)
      .build()
      .emit_to_string()
      .unwrap_or_default()
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} at line {}:{}: {}: {}",
      self.phase, self.severity, self.line, self.column, self.kind, self.message
    )
  }
}

/// The shared sink every phase appends to. Phases never clear it; the driver
/// (here, [`crate::compile`]) inspects it between phases to decide whether to
/// halt (spec §7: "the driver halts before a phase runs if the prior phase
/// produced any error-severity diagnostic").
#[derive(Default)]
pub struct Diagnostics {
  items: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, diagnostic: Diagnostic) {
    self.items.push(diagnostic);
  }

  pub fn has_errors(&self) -> bool {
    self.items.iter().any(|d| d.severity == Severity::Error)
  }

  pub fn into_vec(self) -> Vec<Diagnostic> {
    self.items
  }

  pub fn as_slice(&self) -> &[Diagnostic] {
    &self.items
  }

  /// The exit-code policy from spec §6: 0 success, 1 lex, 2 parse,
  /// 3 semantic, 4 codegen, 5 internal. Internal-invariant diagnostics always
  /// win regardless of phase, since they indicate a compiler bug rather than
  /// a problem with the user's source.
  pub fn exit_code(&self) -> u8 {
    if self
      .items
      .iter()
      .any(|d| d.severity == Severity::Error && d.kind == Kind::InternalInvariant)
    {
      return 5;
    }
    let first_error_phase = self
      .items
      .iter()
      .find(|d| d.severity == Severity::Error)
      .map(|d| d.phase);
    match first_error_phase {
      None => 0,
      Some(Phase::Lex) => 1,
      Some(Phase::Parse) => 2,
      Some(Phase::Semantic) => 3,
      Some(Phase::Codegen) => 4,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_index_basic() {
    let index = LineIndex::new("abc\ndef\nghi");
    assert_eq!(index.line_col(0), (1, 1));
    assert_eq!(index.line_col(3), (1, 4));
    assert_eq!(index.line_col(4), (2, 1));
    assert_eq!(index.line_col(10), (3, 3));
  }

  #[test]
  fn display_format_matches_spec() {
    let index = LineIndex::new("y = z + 1\n");
    let diagnostic = Diagnostic::new(
      Phase::Semantic,
      Severity::Error,
      Kind::UndefinedVariable,
      Span { start: 4, end: 5 },
      &index,
      "z",
    );
    assert_eq!(
      diagnostic.to_string(),
      "semantic error at line 1:5: UndefinedVariable: z"
    );
  }
}
