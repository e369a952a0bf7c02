use super::*;
use crate::diagnostics::Diagnostics;

fn lex(src: &str) -> (Vec<Token<'_>>, Diagnostics) {
  let mut diagnostics = Diagnostics::new();
  let tokens = tokenize(src, &mut diagnostics);
  (tokens, diagnostics)
}

fn kinds(src: &str) -> Vec<TokenKind> {
  lex(src).0.into_iter().map(|t| t.kind).collect()
}

#[test]
fn empty_input_yields_only_eof() {
  assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

#[test]
fn simple_assignment() {
  let kinds = kinds("x = 1\n");
  assert_eq!(
    kinds,
    vec![TokenKind::Identifier, TokenKind::Equal, TokenKind::Integer, TokenKind::Newline, TokenKind::Eof]
  );
}

#[test]
fn indentation_produces_balanced_indent_dedent() {
  let kinds = kinds("if x:\n    y = 1\nz = 2\n");
  let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
  let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
  assert_eq!(indents, dedents);
  assert_eq!(indents, 1);
}

#[test]
fn differently_indented_comment_line_is_invisible_to_indentation() {
  let kinds = kinds("x = 1\n    # note\ny = 2\n");
  assert!(!kinds.contains(&TokenKind::Indent));
  assert!(!kinds.contains(&TokenKind::Dedent));
  assert_eq!(
    kinds,
    vec![
      TokenKind::Identifier,
      TokenKind::Equal,
      TokenKind::Integer,
      TokenKind::Newline,
      TokenKind::Identifier,
      TokenKind::Equal,
      TokenKind::Integer,
      TokenKind::Newline,
      TokenKind::Eof,
    ]
  );
}

#[test]
fn blank_and_comment_lines_inside_a_block_dont_affect_its_indentation() {
  let src = "if x:\n    y = 1\n\n    # still inside\n    z = 2\na = 3\n";
  let kinds = kinds(src);
  let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
  let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
  assert_eq!(indents, 1);
  assert_eq!(dedents, 1);
}

#[test]
fn mixed_tabs_and_spaces_is_rejected() {
  let (_, diagnostics) = lex("if x:\n \t y = 1\n");
  assert!(diagnostics.has_errors());
}

#[test]
fn trailing_dot_without_digits_is_invalid_number() {
  let (_, diagnostics) = lex("x = 5.\n");
  assert!(diagnostics.has_errors());
}

#[test]
fn unterminated_string_is_reported() {
  let (_, diagnostics) = lex("x = \"abc\n");
  assert!(diagnostics.has_errors());
}
