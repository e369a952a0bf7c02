use super::*;

#[test]
fn successful_compile_reports_zero_exit_code() {
  let result = compile("x = 1\n", CompileOptions::default());
  assert!(result.success);
  assert_eq!(result.exit_code(), 0);
  assert!(result.instructions.is_some());
  assert!(result.tokens.is_none());
}

#[test]
fn debug_mode_surfaces_tokens_ast_and_symbols() {
  let result = compile("x = 1\n", CompileOptions { debug: true, ..Default::default() });
  assert!(result.tokens.is_some());
  assert!(result.ast.is_some());
  assert!(result.symbol_tables.is_some());
}

#[test]
fn emit_ir_false_skips_codegen() {
  let result = compile("x = 1\n", CompileOptions { debug: false, emit_ir: false });
  assert!(result.success);
  assert!(result.instructions.is_none());
}

#[test]
fn lex_error_halts_before_parse_and_reports_exit_code_one() {
  let result = compile("x = 5.\n", CompileOptions::default());
  assert!(!result.success);
  assert_eq!(result.exit_code(), 1);
  assert!(result.instructions.is_none());
}

#[test]
fn semantic_error_halts_before_codegen_and_reports_exit_code_three() {
  let result = compile("y = z + 1\n", CompileOptions::default());
  assert!(!result.success);
  assert_eq!(result.exit_code(), 3);
  assert!(result.instructions.is_none());
}

#[test]
fn differently_indented_comment_line_compiles() {
  let result = compile("x = 1\n    # note\ny = 2\n", CompileOptions::default());
  assert!(result.success, "diagnostics: {:?}", result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>());
}

#[test]
fn empty_input_compiles_to_nothing() {
  let result = compile("", CompileOptions::default());
  assert!(result.success);
  assert_eq!(result.render_ir(), Some(String::new()));
}

#[test]
fn into_result_converts_failure_to_err() {
  let ok = compile("x = 1\n", CompileOptions::default()).into_result();
  assert!(ok.is_ok());

  let err = compile("y = z + 1\n", CompileOptions::default()).into_result();
  assert!(matches!(err, Err(Error::Diagnostics(ref d)) if !d.is_empty()));
}

#[test]
fn repeated_compiles_are_deterministic() {
  let src = "def f(n):\n    if n <= 1:\n        return 1\n    return n * f(n - 1)\nr = f(5)\n";
  let a = compile(src, CompileOptions::default());
  let b = compile(src, CompileOptions::default());
  assert_eq!(a.render_ir(), b.render_ir());
}

#[test]
fn deeply_nested_indentation_succeeds() {
  let mut src = String::new();
  for i in 0..32 {
    src.push_str(&"    ".repeat(i));
    src.push_str("if True:\n");
  }
  src.push_str(&"    ".repeat(32));
  src.push_str("x = 1\n");
  let result = compile(&src, CompileOptions::default());
  assert!(result.success, "diagnostics: {:?}", result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>());
}
