//! A four-pass compiler front-end — lexer, parser, resolver, three-address
//! code emitter — for a small indentation-sensitive scripting language.
//!
//! [`compile`] is the only entry point THE CORE exposes: it is a pure
//! function from a source string to a [`CompileResult`], accumulating
//! diagnostics from whichever phases run rather than raising on the first
//! error. Phases run in declared order and the pipeline halts before a phase
//! whose predecessor produced an error-severity diagnostic; it never panics
//! on malformed user input (see `error.rs`).

pub mod ast;
pub mod diagnostics;
pub mod emit;
mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod resolver;

pub use diagnostics::Diagnostic;
pub use error::{Error, Result};
pub use lexer::Token;

use diagnostics::{Diagnostics, LineIndex};
use ir::Instruction;
use resolver::Scope;

/// Configuration for a single [`compile`] call.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
  /// Include `tokens`, `ast` and `symbol_tables` in the result. Off by
  /// default: most callers only want diagnostics and IR.
  pub debug: bool,
  /// Run the emitter and include `instructions` in the result.
  pub emit_ir: bool,
}

impl Default for CompileOptions {
  fn default() -> Self {
    CompileOptions { debug: false, emit_ir: true }
  }
}

/// The outcome of one [`compile`] call.
pub struct CompileResult<'src> {
  pub success: bool,
  pub diagnostics: Vec<Diagnostic>,
  pub tokens: Option<Vec<Token<'src>>>,
  pub ast: Option<ast::Program<'src>>,
  pub symbol_tables: Option<Vec<Scope>>,
  pub instructions: Option<Vec<Instruction>>,
}

impl<'src> CompileResult<'src> {
  /// `0` on success; otherwise the exit-code policy: 1 lex, 2 parse,
  /// 3 semantic, 4 codegen, 5 internal. `InternalInvariant` always wins
  /// regardless of phase, since it indicates a compiler bug rather than a
  /// problem with the user's source.
  pub fn exit_code(&self) -> u8 {
    use diagnostics::{Kind, Phase, Severity};
    if self
      .diagnostics
      .iter()
      .any(|d| d.severity == Severity::Error && d.kind == Kind::InternalInvariant)
    {
      return 5;
    }
    match self.diagnostics.iter().find(|d| d.severity == Severity::Error).map(|d| d.phase) {
      None => 0,
      Some(Phase::Lex) => 1,
      Some(Phase::Parse) => 2,
      Some(Phase::Semantic) => 3,
      Some(Phase::Codegen) => 4,
    }
  }

  /// The stable `<n>: <payload>` text form of `instructions`, if present.
  pub fn render_ir(&self) -> Option<String> {
    self.instructions.as_deref().map(ir::render)
  }

  /// Convenience for callers that want `?` instead of checking `success`:
  /// turns a failed compile into `Err(Error::Diagnostics(..))`.
  pub fn into_result(self) -> Result<Self> {
    if self.success {
      Ok(self)
    } else {
      Err(Error::Diagnostics(self.diagnostics))
    }
  }
}

/// Compiles `source`, running as many phases as the diagnostics produced so
/// far allow. Two calls on the same `source` produce byte-identical
/// results: there is no shared mutable state across invocations.
pub fn compile(source: &str, options: CompileOptions) -> CompileResult<'_> {
  let mut diagnostics = Diagnostics::new();
  let index = LineIndex::new(source);

  let tokens = lexer::tokenize(source, &mut diagnostics);

  let mut ast = None;
  let mut symbol_tables = None;
  let mut instructions = None;

  if !diagnostics.has_errors() {
    let program = parser::parse(&tokens, &mut diagnostics, &index);

    if !diagnostics.has_errors() {
      let resolved = resolver::resolve(&program, &mut diagnostics, &index);
      if !diagnostics.has_errors() && options.emit_ir {
        instructions = Some(emit::emit(&program, &mut diagnostics, &index));
      }
      symbol_tables = Some(resolved.scopes);
    }

    ast = Some(program);
  }

  let success = !diagnostics.has_errors();
  CompileResult {
    success,
    diagnostics: diagnostics.into_vec(),
    tokens: if options.debug { Some(tokens) } else { None },
    ast: if options.debug { ast } else { None },
    symbol_tables: if options.debug { symbol_tables } else { None },
    instructions,
  }
}

#[cfg(test)]
mod tests;
