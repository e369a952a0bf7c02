use indoc::indoc;

use super::*;
use crate::ast::{ExprKind, Program, StmtKind};
use crate::diagnostics::Diagnostics;
use crate::lexer::tokenize;
use crate::parser::parse;

fn resolve_src(src: &str) -> Diagnostics {
  let mut diagnostics = Diagnostics::new();
  let index = LineIndex::new(src);
  let tokens = tokenize(src, &mut diagnostics);
  let program = parse(&tokens, &mut diagnostics, &index);
  resolve(&program, &mut diagnostics, &index);
  diagnostics
}

fn resolve_program(src: &str) -> (Program<'_>, Diagnostics) {
  let mut diagnostics = Diagnostics::new();
  let index = LineIndex::new(src);
  let tokens = tokenize(src, &mut diagnostics);
  let program = parse(&tokens, &mut diagnostics, &index);
  resolve(&program, &mut diagnostics, &index);
  (program, diagnostics)
}

#[test]
fn undefined_variable_is_reported() {
  let diagnostics = resolve_src("y = z + 1\n");
  assert!(diagnostics.has_errors());
  let diagnostic = &diagnostics.as_slice()[0];
  assert_eq!(diagnostic.kind, Kind::UndefinedVariable);
  assert_eq!(diagnostic.to_string(), "semantic error at line 1:5: UndefinedVariable: z");
}

#[test]
fn reassignment_joins_int_and_float_to_float() {
  let diagnostics = resolve_src("x = 1\nx = 2.5\n");
  assert!(!diagnostics.has_errors());
}

#[test]
fn function_arity_mismatch_is_reported() {
  let src = indoc! {"
    def add(a, b):
        return a + b
    c = add(1)
  "};
  let diagnostics = resolve_src(src);
  assert!(diagnostics.has_errors());
  assert!(diagnostics.as_slice().iter().any(|d| d.kind == Kind::ArityMismatch));
}

#[test]
fn return_outside_function_is_reported() {
  let diagnostics = resolve_src("return 1\n");
  assert!(diagnostics.as_slice().iter().any(|d| d.kind == Kind::ReturnOutsideFunction));
}

#[test]
fn break_outside_loop_is_reported() {
  let diagnostics = resolve_src("break\n");
  assert!(diagnostics.as_slice().iter().any(|d| d.kind == Kind::BreakOutsideLoop));
}

#[test]
fn break_inside_while_is_fine() {
  let src = indoc! {"
    x = 1
    while x > 0:
        break
  "};
  let diagnostics = resolve_src(src);
  assert!(!diagnostics.has_errors());
}

#[test]
fn redefining_a_function_is_reported() {
  let src = indoc! {"
    def f():
        pass
    def f():
        pass
  "};
  let diagnostics = resolve_src(src);
  assert!(diagnostics.as_slice().iter().any(|d| d.kind == Kind::Redefinition));
}

#[test]
fn recursive_function_resolves_its_own_name() {
  let src = indoc! {"
    def f(n):
        if n <= 1:
            return 1
        return n * f(n - 1)
    r = f(5)
  "};
  let diagnostics = resolve_src(src);
  assert!(!diagnostics.has_errors());
}

#[test]
fn for_loop_variable_is_declared() {
  let src = indoc! {"
    total = 0
    for item in range(10):
        total = total + item
  "};
  let diagnostics = resolve_src(src);
  assert!(!diagnostics.has_errors());
}

#[test]
fn type_mismatch_between_string_and_int() {
  let diagnostics = resolve_src("x = \"a\" - 1\n");
  assert!(diagnostics.as_slice().iter().any(|d| d.kind == Kind::TypeMismatch));
}

#[test]
fn identifier_and_call_nodes_are_linked_to_their_scope() {
  let src = indoc! {"
    def f(n):
        return n
    x = 1
    y = f(x)
  "};
  let (program, diagnostics) = resolve_program(src);
  assert!(!diagnostics.has_errors());

  // `y = f(x)`: the Call node resolves to `f`'s (global) scope, and the
  // Identifier argument `x` resolves to its own (also global) scope.
  match &*program.body[2] {
    StmtKind::Assignment { value, .. } => match &**value {
      ExprKind::Call { args, resolved, .. } => {
        assert!(resolved.get().is_some());
        match &*args[0] {
          ExprKind::Identifier { resolved, .. } => assert!(resolved.get().is_some()),
          other => panic!("expected an identifier argument, found {other:?}"),
        }
      }
      other => panic!("expected a call, found {other:?}"),
    },
    other => panic!("expected an assignment, found {other:?}"),
  }
}

#[test]
fn undefined_identifier_is_left_unresolved() {
  let (program, diagnostics) = resolve_program("y = z\n");
  assert!(diagnostics.has_errors());
  match &*program.body[0] {
    StmtKind::Assignment { value, .. } => match &**value {
      ExprKind::Identifier { resolved, .. } => assert!(resolved.get().is_none()),
      other => panic!("expected an identifier, found {other:?}"),
    },
    other => panic!("expected an assignment, found {other:?}"),
  }
}
