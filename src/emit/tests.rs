use indoc::indoc;

use super::*;
use crate::diagnostics::Diagnostics;
use crate::ir::render;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::resolver::resolve;

fn compile_ir(src: &str) -> (String, Diagnostics) {
  let mut diagnostics = Diagnostics::new();
  let index = LineIndex::new(src);
  let tokens = tokenize(src, &mut diagnostics);
  let program = parse(&tokens, &mut diagnostics, &index);
  resolve(&program, &mut diagnostics, &index);
  let instructions = emit(&program, &mut diagnostics, &index);
  (render(&instructions), diagnostics)
}

#[test]
fn scenario_a_assignment_with_precedence() {
  let (ir, diagnostics) = compile_ir("x = 10 + 20 * 2\n");
  assert!(!diagnostics.has_errors());
  assert_eq!(ir, "1: t1 = 20 * 2\n2: t2 = 10 + t1\n3: x = t2");
}

#[test]
fn scenario_b_if_else() {
  let src = "score = 85\nif score >= 80:\n    grade = 1\nelse:\n    grade = 0\n";
  let (ir, diagnostics) = compile_ir(src);
  assert!(!diagnostics.has_errors());
  assert_eq!(
    ir,
    "1: score = 85\n\
     2: t1 = score >= 80\n\
     3: IF_FALSE t1 GOTO L1\n\
     4: grade = 1\n\
     5: GOTO L2\n\
     6: LABEL L1\n\
     7: grade = 0\n\
     8: LABEL L2"
  );
}

#[test]
fn scenario_c_while_loop() {
  let src = "n = 3\nwhile n > 0:\n    n = n - 1\n";
  let (ir, diagnostics) = compile_ir(src);
  assert!(!diagnostics.has_errors());
  assert_eq!(
    ir,
    "1: n = 3\n\
     2: LABEL L1\n\
     3: t1 = n > 0\n\
     4: IF_FALSE t1 GOTO L2\n\
     5: t2 = n - 1\n\
     6: n = t2\n\
     7: GOTO L1\n\
     8: LABEL L2"
  );
}

#[test]
fn scenario_d_function_with_recursion() {
  let src = indoc! {"
    def f(n):
        if n <= 1:
            return 1
        return n * f(n - 1)
    r = f(5)
  "};
  let (ir, diagnostics) = compile_ir(src);
  assert!(!diagnostics.has_errors());
  assert_eq!(
    ir,
    "1: FUNC_BEGIN f, 1\n\
     2: t1 = n <= 1\n\
     3: IF_FALSE t1 GOTO L1\n\
     4: RETURN 1\n\
     5: LABEL L1\n\
     6: t2 = n - 1\n\
     7: PARAM t2\n\
     8: CALL f, 1, t3\n\
     9: t4 = n * t3\n\
     10: RETURN t4\n\
     11: FUNC_END\n\
     12: PARAM 5\n\
     13: CALL f, 1, t5\n\
     14: r = t5"
  );
}

#[test]
fn scenario_e_undefined_variable_emits_no_instructions() {
  let mut diagnostics = Diagnostics::new();
  let src = "y = z + 1\n";
  let index = LineIndex::new(src);
  let tokens = tokenize(src, &mut diagnostics);
  let program = parse(&tokens, &mut diagnostics, &index);
  resolve(&program, &mut diagnostics, &index);
  assert!(diagnostics.has_errors());
  assert_eq!(diagnostics.as_slice().len(), 1);
  assert_eq!(
    diagnostics.as_slice()[0].to_string(),
    "semantic error at line 1:5: UndefinedVariable: z"
  );
}

#[test]
fn scenario_f_short_circuit_or() {
  let src = "a = 1\nb = 2\nx = a or b\n";
  let (ir, diagnostics) = compile_ir(src);
  assert!(!diagnostics.has_errors());
  assert_eq!(
    ir,
    "1: a = 1\n\
     2: b = 2\n\
     3: IF a GOTO L1\n\
     4: t1 = b\n\
     5: GOTO L2\n\
     6: LABEL L1\n\
     7: t1 = true\n\
     8: LABEL L2\n\
     9: x = t1"
  );
}

#[test]
fn empty_input_yields_zero_instructions() {
  let (ir, diagnostics) = compile_ir("");
  assert!(!diagnostics.has_errors());
  assert_eq!(ir, "");
}

#[test]
fn snapshot_list_literal_and_loop() {
  let src = indoc! {"
    xs = [1, 2, 3]
    total = 0
    for x in xs:
        total = total + x
    print(total)
  "};
  let (ir, diagnostics) = compile_ir(src);
  assert!(!diagnostics.has_errors());
  insta::assert_snapshot!(ir);
}
