use indoc::indoc;

use super::*;
use crate::diagnostics::Diagnostics;
use crate::lexer::tokenize;

fn parse_src(src: &str) -> (Program<'_>, Diagnostics) {
  let mut diagnostics = Diagnostics::new();
  let index = LineIndex::new(src);
  let tokens = tokenize(src, &mut diagnostics);
  let program = parse(&tokens, &mut diagnostics, &index);
  (program, diagnostics)
}

#[test]
fn assignment_precedence_shape() {
  let (program, diagnostics) = parse_src("x = 10 + 20 * 2\n");
  assert!(!diagnostics.has_errors());
  assert_eq!(program.body.len(), 1);
  match &*program.body[0] {
    StmtKind::Assignment { value, .. } => match &**value {
      ExprKind::BinaryOp { op: BinaryOp::Add, right, .. } => {
        assert!(matches!(&***right, ExprKind::BinaryOp { op: BinaryOp::Mul, .. }));
      }
      other => panic!("expected a binary '+' at the top, found {other:?}"),
    },
    other => panic!("expected an assignment, found {other:?}"),
  }
}

#[test]
fn unary_binds_looser_than_power() {
  // `-x ** 2` is `-(x ** 2)`, not `(-x) ** 2`.
  let (program, diagnostics) = parse_src("y = -x ** 2\n");
  assert!(!diagnostics.has_errors());
  match &*program.body[0] {
    StmtKind::Assignment { value, .. } => match &**value {
      ExprKind::UnaryOp { op: UnaryOp::Neg, operand } => {
        assert!(matches!(&***operand, ExprKind::BinaryOp { op: BinaryOp::Pow, .. }));
      }
      other => panic!("expected a unary negation at the top, found {other:?}"),
    },
    other => panic!("expected an assignment, found {other:?}"),
  }
}

#[test]
fn if_elif_else_block() {
  let src = indoc! {"
    if a:
        x = 1
    elif b:
        x = 2
    else:
        x = 3
  "};
  let (program, diagnostics) = parse_src(src);
  assert!(!diagnostics.has_errors());
  match &*program.body[0] {
    StmtKind::If { elif_blocks, else_block, .. } => {
      assert_eq!(elif_blocks.len(), 1);
      assert!(else_block.is_some());
    }
    other => panic!("expected an if statement, found {other:?}"),
  }
}

#[test]
fn call_requires_identifier_directly_before_paren() {
  // `(f)(1)` is not a call: parenthesized expressions aren't postfix-callable,
  // so the trailing `(1)` is left over and reported as a parse error.
  let (_, diagnostics) = parse_src("x = (f)(1)\n");
  assert!(diagnostics.has_errors());
}

#[test]
fn empty_block_is_reported() {
  let (_, diagnostics) = parse_src("if a:\nx = 1\n");
  assert!(diagnostics.has_errors());
}

#[test]
fn reserved_word_is_unsupported_construct() {
  let (_, diagnostics) = parse_src("class Foo:\n    pass\n");
  assert!(diagnostics.has_errors());
}

#[test]
fn deeply_nested_unary_does_not_overflow() {
  let src = format!("x = {}1\n", "-".repeat(2000));
  let (_, diagnostics) = parse_src(&src);
  // Either it succeeds, or the recursion guard reports a diagnostic; either
  // way the parser must return instead of overflowing the stack.
  let _ = diagnostics.has_errors();
}
