//! Indentation-aware tokenizer.
//!
//! Tokenization happens eagerly: [`tokenize`] walks the whole source once and
//! returns a flat `Vec<Token>` already containing synthesized `NEWLINE`,
//! `INDENT` and `DEDENT` markers, terminated by `EOF`. A logos-derived
//! [`RawKind`] lexer produces the "physical" tokens; indentation bookkeeping
//! and keyword/reserved-word classification happen in [`Lexer::run`].

use beef::lean::Cow;
use logos::Logos;
use span::Span;

use crate::diagnostics::{Diagnostic, Diagnostics, Kind, LineIndex, Phase, Severity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
  Integer,
  Float,
  String,
  Boolean,
  None_,
  Identifier,
  Reserved,

  If,
  Elif,
  Else,
  While,
  For,
  In,
  Def,
  Return,
  And,
  Or,
  Not,
  Break,
  Continue,
  Pass,

  Plus,
  Minus,
  Star,
  StarStar,
  Slash,
  Percent,
  Equal,
  EqualEqual,
  BangEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,

  LParen,
  RParen,
  LBracket,
  RBracket,
  LBrace,
  RBrace,
  Comma,
  Colon,
  Semicolon,
  Dot,
  Arrow,
  At,

  Newline,
  Indent,
  Dedent,
  Eof,

  /// Produced in place of a token the lexer could not make sense of, so the
  /// parser still sees a well-formed stream after a lex error.
  Error,
}

impl TokenKind {
  pub fn name(self) -> &'static str {
    match self {
      TokenKind::Integer => "integer",
      TokenKind::Float => "float",
      TokenKind::String => "string",
      TokenKind::Boolean => "boolean",
      TokenKind::None_ => "none",
      TokenKind::Identifier => "identifier",
      TokenKind::Reserved => "reserved word",
      TokenKind::If => "if",
      TokenKind::Elif => "elif",
      TokenKind::Else => "else",
      TokenKind::While => "while",
      TokenKind::For => "for",
      TokenKind::In => "in",
      TokenKind::Def => "def",
      TokenKind::Return => "return",
      TokenKind::And => "and",
      TokenKind::Or => "or",
      TokenKind::Not => "not",
      TokenKind::Break => "break",
      TokenKind::Continue => "continue",
      TokenKind::Pass => "pass",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Star => "*",
      TokenKind::StarStar => "**",
      TokenKind::Slash => "/",
      TokenKind::Percent => "%",
      TokenKind::Equal => "=",
      TokenKind::EqualEqual => "==",
      TokenKind::BangEqual => "!=",
      TokenKind::Less => "<",
      TokenKind::LessEqual => "<=",
      TokenKind::Greater => ">",
      TokenKind::GreaterEqual => ">=",
      TokenKind::LParen => "(",
      TokenKind::RParen => ")",
      TokenKind::LBracket => "[",
      TokenKind::RBracket => "]",
      TokenKind::LBrace => "{",
      TokenKind::RBrace => "}",
      TokenKind::Comma => ",",
      TokenKind::Colon => ":",
      TokenKind::Semicolon => ";",
      TokenKind::Dot => ".",
      TokenKind::Arrow => "->",
      TokenKind::At => "@",
      TokenKind::Newline => "<newline>",
      TokenKind::Indent => "<indent>",
      TokenKind::Dedent => "<dedent>",
      TokenKind::Eof => "<eof>",
      TokenKind::Error => "<error>",
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Int(i64),
  Float(f64),
  Str(String),
  Bool(bool),
  None,
}

#[derive(Clone, Debug)]
pub struct Token<'src> {
  pub kind: TokenKind,
  pub lexeme: Cow<'src, str>,
  pub value: Option<Value>,
  pub line: usize,
  pub column: usize,
  pub span: Span,
}

impl<'src> Token<'src> {
  fn new(kind: TokenKind, lexeme: &'src str, span: Span, line: usize, column: usize) -> Self {
    Token {
      kind,
      lexeme: Cow::borrowed(lexeme),
      value: None,
      line,
      column,
      span,
    }
  }
}

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Logos, PartialEq)]
enum RawKind {
  #[token("if")]
  Kw_If,
  #[token("elif")]
  Kw_Elif,
  #[token("else")]
  Kw_Else,
  #[token("while")]
  Kw_While,
  #[token("for")]
  Kw_For,
  #[token("in")]
  Kw_In,
  #[token("def")]
  Kw_Def,
  #[token("return")]
  Kw_Return,
  #[token("True")]
  Kw_True,
  #[token("False")]
  Kw_False,
  #[token("None")]
  Kw_None,
  #[token("and")]
  Kw_And,
  #[token("or")]
  Kw_Or,
  #[token("not")]
  Kw_Not,
  #[token("break")]
  Kw_Break,
  #[token("continue")]
  Kw_Continue,
  #[token("pass")]
  Kw_Pass,
  #[token("import")]
  Kw_Import,
  #[token("from")]
  Kw_From,
  #[token("as")]
  Kw_As,
  #[token("class")]
  Kw_Class,

  #[token("(")]
  LParen,
  #[token(")")]
  RParen,
  #[token("[")]
  LBracket,
  #[token("]")]
  RBracket,
  #[token("{")]
  LBrace,
  #[token("}")]
  RBrace,
  #[token(",")]
  Comma,
  #[token(":")]
  Colon,
  #[token(";")]
  Semicolon,
  #[token("->")]
  Arrow,
  #[token(".")]
  Dot,
  #[token("@")]
  At,

  #[token("==")]
  EqualEqual,
  #[token("!=")]
  BangEqual,
  #[token("<=")]
  LessEqual,
  #[token("<")]
  Less,
  #[token(">=")]
  GreaterEqual,
  #[token(">")]
  Greater,
  #[token("=")]
  Equal,
  #[token("+")]
  Plus,
  #[token("-")]
  Minus,
  #[token("**")]
  StarStar,
  #[token("*")]
  Star,
  #[token("/")]
  Slash,
  #[token("%")]
  Percent,

  #[regex("[0-9]+")]
  Integer,
  #[regex(r"[0-9]+\.[0-9]+")]
  Float,
  #[regex(r#"'([^'\\\n]|\\.)*'|"([^"\\\n]|\\.)*""#)]
  Str,
  #[regex("[A-Za-z_][A-Za-z0-9_]*")]
  Ident,

  #[doc(hidden)]
  #[regex(r"(\r?\n[ \t]*)+", priority = 10)]
  _Indent,
  #[doc(hidden)]
  #[regex(r"[ \t]+")]
  _Whitespace,
  #[doc(hidden)]
  #[regex(r"#[^\n]*")]
  _Comment,

  #[error]
  Error,
}

/// Indentation column stack, bottom always 0. Mirrors the algorithm in the
/// data-model section: equal column → nothing; greater → push + INDENT;
/// lesser → pop (+ DEDENT) until the top is `<=` the new column.
struct IndentStack {
  stack: Vec<u64>,
}

impl IndentStack {
  fn new() -> Self {
    IndentStack { stack: vec![0] }
  }

  fn top(&self) -> u64 {
    *self.stack.last().expect("indent stack is never empty")
  }

  fn push(&mut self, column: u64) {
    self.stack.push(column);
  }

  fn pop(&mut self) -> u64 {
    self
      .stack
      .pop()
      .expect("indent stack is never emptied below the bottom sentinel");
    self.top()
  }
}

/// Decodes the escape sequences `\n \t \r \\ \' \"` from a raw, quote-delimited
/// source slice (quotes included). Unrecognized escapes pass through
/// unchanged (backslash kept), matching the lenient policy documented for
/// this implementation.
fn decode_string(raw: &str) -> String {
  let inner = &raw[1..raw.len() - 1];
  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      match chars.next() {
        Some('n') => out.push('\n'),
        Some('t') => out.push('\t'),
        Some('r') => out.push('\r'),
        Some('\\') => out.push('\\'),
        Some('\'') => out.push('\''),
        Some('"') => out.push('"'),
        Some(other) => {
          out.push('\\');
          out.push(other);
        }
        None => out.push('\\'),
      }
    } else {
      out.push(c);
    }
  }
  out
}

/// Measures the width of a run of leading whitespace, treating a tab as 8
/// columns. Mixing tabs and spaces in one run is rejected.
fn measure_indent(ws: &str) -> (u64, bool) {
  let mixed = ws.contains(' ') && ws.contains('\t');
  let width = ws.chars().fold(0u64, |acc, c| if c == '\t' { acc + 8 } else { acc + 1 });
  (width, mixed)
}

struct Lexer<'src> {
  src: &'src str,
  index: LineIndex,
  indent: IndentStack,
  need_newline: bool,
  /// Indentation measured since the last real token, not yet applied to the
  /// stack: (column, mixed tabs/spaces, position). A blank or comment-only
  /// line measures its own indentation here, overwriting whatever was
  /// pending, so only the indentation of the line that actually precedes the
  /// next real token ever reaches [`Lexer::adjust_indent`].
  pending_indent: Option<(u64, bool, usize)>,
  tokens: Vec<Token<'src>>,
}

impl<'src> Lexer<'src> {
  fn new(src: &'src str) -> Self {
    Lexer {
      src,
      index: LineIndex::new(src),
      indent: IndentStack::new(),
      need_newline: false,
      pending_indent: None,
      tokens: Vec::new(),
    }
  }

  fn push(&mut self, kind: TokenKind, lexeme: &'src str, span: Span) -> usize {
    let (line, column) = self.index.line_col(span.start);
    self.tokens.push(Token::new(kind, lexeme, span, line, column));
    self.tokens.len() - 1
  }

  fn push_synthetic(&mut self, kind: TokenKind, at: usize) {
    let (line, column) = self.index.line_col(at);
    self
      .tokens
      .push(Token::new(kind, "", Span { start: at, end: at }, line, column));
  }

  fn error(&self, diagnostics: &mut Diagnostics, kind: Kind, span: Span, message: impl Into<String>) {
    diagnostics.push(Diagnostic::new(Phase::Lex, Severity::Error, kind, span, &self.index, message));
  }

  fn adjust_indent(&mut self, column: u64, mixed: bool, at: usize, diagnostics: &mut Diagnostics) {
    if mixed {
      self.error(
        diagnostics,
        Kind::MixedTabsAndSpaces,
        Span { start: at, end: at },
        "leading whitespace mixes tabs and spaces",
      );
    }
    let top = self.indent.top();
    if column == top {
      return;
    }
    if column > top {
      self.indent.push(column);
      self.push_synthetic(TokenKind::Indent, at);
      return;
    }
    // column < top: pop until top <= column.
    while self.indent.top() > column {
      self.indent.pop();
      self.push_synthetic(TokenKind::Dedent, at);
    }
    if self.indent.top() != column {
      self.error(
        diagnostics,
        Kind::InconsistentIndentation,
        Span { start: at, end: at },
        "indentation does not match any enclosing block",
      );
      // Resynchronize: treat the new column as a valid level so a single
      // bad line doesn't cascade into a wall of dedent errors.
      self.indent.push(column);
    }
  }

  /// Applies the most recently measured indentation, if any line measured
  /// one since the last real token was produced.
  fn flush_pending_indent(&mut self, diagnostics: &mut Diagnostics) {
    if let Some((column, mixed, at)) = self.pending_indent.take() {
      self.adjust_indent(column, mixed, at, diagnostics);
    }
  }

  fn run(mut self, diagnostics: &mut Diagnostics) -> Vec<Token<'src>> {
    let src = self.src;
    let mut raw = RawKind::lexer(src);
    while let Some(kind) = raw.next() {
      let lexeme = raw.slice();
      let span: Span = raw.span().into();

      if kind == RawKind::_Whitespace || kind == RawKind::_Comment {
        continue;
      }

      if kind == RawKind::_Indent {
        // Only the whitespace after the *last* newline in this run matters;
        // blank lines in between never touch the indent stack. The
        // measurement itself is only *recorded* here, not applied: a
        // comment-only or blank line must not affect indentation, and the
        // next `_Indent` run (if any) before real content overwrites this
        // one, so whichever line actually precedes the next real token is
        // the one whose indentation sticks.
        let tail = &lexeme[lexeme.rfind('\n').map(|i| i + 1).unwrap_or(0)..];
        let (column, mixed) = measure_indent(tail);
        if self.need_newline {
          let at = span.start;
          self.push_synthetic(TokenKind::Newline, at);
          self.need_newline = false;
        }
        self.pending_indent = Some((column, mixed, span.end));
        continue;
      }

      self.flush_pending_indent(diagnostics);

      if kind == RawKind::Error {
        if lexeme.starts_with('\'') || lexeme.starts_with('"') {
          self.resync_unterminated_string(&mut raw, lexeme, span, diagnostics);
          continue;
        }
        self.error(diagnostics, Kind::UnexpectedCharacter, span, format!("unexpected character '{lexeme}'"));
        continue;
      }

      match kind {
        RawKind::Integer => {
          // Trailing dot without digits: `Float` didn't match, so the dot,
          // if present, was left behind as a separate token.
          if src[span.end..].starts_with('.')
            && !src[span.end + 1..].starts_with(|c: char| c.is_ascii_digit())
          {
            let bad_span = Span { start: span.start, end: span.end + 1 };
            let bad_lexeme = &src[bad_span.range()];
            raw.bump(1);
            self.error(diagnostics, Kind::InvalidNumber, bad_span, "trailing '.' with no digits after it");
            self.push(TokenKind::Error, bad_lexeme, bad_span);
          } else {
            let value = lexeme.parse::<i64>().unwrap_or(0);
            let idx = self.push(TokenKind::Integer, lexeme, span);
            self.tokens[idx].value = Some(Value::Int(value));
          }
          self.need_newline = true;
        }
        RawKind::Float => {
          let value = lexeme.parse::<f64>().unwrap_or(0.0);
          let idx = self.push(TokenKind::Float, lexeme, span);
          self.tokens[idx].value = Some(Value::Float(value));
          self.need_newline = true;
        }
        RawKind::Str => {
          let value = decode_string(lexeme);
          let idx = self.push(TokenKind::String, lexeme, span);
          self.tokens[idx].value = Some(Value::Str(value));
          self.need_newline = true;
        }
        RawKind::Kw_True => {
          let idx = self.push(TokenKind::Boolean, lexeme, span);
          self.tokens[idx].value = Some(Value::Bool(true));
          self.need_newline = true;
        }
        RawKind::Kw_False => {
          let idx = self.push(TokenKind::Boolean, lexeme, span);
          self.tokens[idx].value = Some(Value::Bool(false));
          self.need_newline = true;
        }
        RawKind::Kw_None => {
          let idx = self.push(TokenKind::None_, lexeme, span);
          self.tokens[idx].value = Some(Value::None);
          self.need_newline = true;
        }
        RawKind::Ident => {
          self.push(TokenKind::Identifier, lexeme, span);
          self.need_newline = true;
        }
        RawKind::Kw_Import | RawKind::Kw_From | RawKind::Kw_As | RawKind::Kw_Class => {
          self.push(TokenKind::Reserved, lexeme, span);
          self.need_newline = true;
        }
        other => {
          let mapped = map_simple(other);
          self.push(mapped, lexeme, span);
          self.need_newline = true;
        }
      }
    }

    let end = self.src.len();
    if self.need_newline {
      self.push_synthetic(TokenKind::Newline, end);
    }
    while self.indent.top() > 0 {
      self.indent.pop();
      self.push_synthetic(TokenKind::Dedent, end);
    }
    self.push_synthetic(TokenKind::Eof, end);
    self.tokens
  }

  fn resync_unterminated_string(
    &mut self,
    raw: &mut logos::Lexer<'src, RawKind>,
    lexeme: &'src str,
    span: Span,
    diagnostics: &mut Diagnostics,
  ) {
    let quote = lexeme.as_bytes()[0];
    let rest = raw.remainder();
    let extra = rest.find(['\n']).unwrap_or(rest.len());
    let full_end = span.end + extra;
    self.error(
      diagnostics,
      Kind::UnterminatedString,
      Span { start: span.start, end: full_end },
      format!("unterminated string starting with {}", quote as char),
    );
    raw.bump(extra);
    self.need_newline = true;
  }
}

fn map_simple(kind: RawKind) -> TokenKind {
  match kind {
    RawKind::Kw_If => TokenKind::If,
    RawKind::Kw_Elif => TokenKind::Elif,
    RawKind::Kw_Else => TokenKind::Else,
    RawKind::Kw_While => TokenKind::While,
    RawKind::Kw_For => TokenKind::For,
    RawKind::Kw_In => TokenKind::In,
    RawKind::Kw_Def => TokenKind::Def,
    RawKind::Kw_Return => TokenKind::Return,
    RawKind::Kw_And => TokenKind::And,
    RawKind::Kw_Or => TokenKind::Or,
    RawKind::Kw_Not => TokenKind::Not,
    RawKind::Kw_Break => TokenKind::Break,
    RawKind::Kw_Continue => TokenKind::Continue,
    RawKind::Kw_Pass => TokenKind::Pass,
    RawKind::LParen => TokenKind::LParen,
    RawKind::RParen => TokenKind::RParen,
    RawKind::LBracket => TokenKind::LBracket,
    RawKind::RBracket => TokenKind::RBracket,
    RawKind::LBrace => TokenKind::LBrace,
    RawKind::RBrace => TokenKind::RBrace,
    RawKind::Comma => TokenKind::Comma,
    RawKind::Colon => TokenKind::Colon,
    RawKind::Semicolon => TokenKind::Semicolon,
    RawKind::Arrow => TokenKind::Arrow,
    RawKind::Dot => TokenKind::Dot,
    RawKind::At => TokenKind::At,
    RawKind::EqualEqual => TokenKind::EqualEqual,
    RawKind::BangEqual => TokenKind::BangEqual,
    RawKind::LessEqual => TokenKind::LessEqual,
    RawKind::Less => TokenKind::Less,
    RawKind::GreaterEqual => TokenKind::GreaterEqual,
    RawKind::Greater => TokenKind::Greater,
    RawKind::Equal => TokenKind::Equal,
    RawKind::Plus => TokenKind::Plus,
    RawKind::Minus => TokenKind::Minus,
    RawKind::StarStar => TokenKind::StarStar,
    RawKind::Star => TokenKind::Star,
    RawKind::Slash => TokenKind::Slash,
    RawKind::Percent => TokenKind::Percent,
    _ => unreachable!("handled by dedicated match arms in Lexer::run"),
  }
}

/// Tokenizes `src` into a flat, EOF-terminated token stream, appending any
/// lexical errors to `diagnostics`. Per §4.1, the driver is responsible for
/// ensuring `src` ends with a newline; a missing trailing newline does not
/// itself produce a diagnostic here (the EOF-draining logic handles it).
pub fn tokenize<'src>(src: &'src str, diagnostics: &mut Diagnostics) -> Vec<Token<'src>> {
  Lexer::new(src).run(diagnostics)
}

#[cfg(test)]
mod tests;
