//! Three-address instruction representation and its stable text format.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "t{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(pub u32);

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "L{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Temp(Temp),
  Ident(String),
  Int(i64),
  Float(f64),
  Str(String),
  Bool(bool),
  None,
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Temp(t) => write!(f, "{t}"),
      Operand::Ident(name) => write!(f, "{name}"),
      Operand::Int(n) => write!(f, "{n}"),
      Operand::Float(n) => write!(f, "{n}"),
      Operand::Str(s) => write!(f, "'{}'", escape(s)),
      Operand::Bool(b) => write!(f, "{b}"),
      Operand::None => write!(f, "none"),
    }
  }
}

fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      '\\' => out.push_str("\\\\"),
      '\'' => out.push_str("\\'"),
      _ => out.push(c),
    }
  }
  out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
  /// `a = b OP c`
  Binary { dst: Temp, op: &'static str, lhs: Operand, rhs: Operand },
  /// `a = OP b`
  Unary { dst: Temp, op: &'static str, operand: Operand },
  /// `a = b`
  Copy { dst: Operand, src: Operand },
  /// `a = b[c]`
  Index { dst: Temp, collection: Operand, key: Operand },
  Label(Label),
  IfGoto { cond: Operand, target: Label },
  IfFalseGoto { cond: Operand, target: Label },
  Goto(Label),
  Param(Operand),
  Call { callee: String, argc: usize, dst: Temp },
  Print(Operand),
  Return(Option<Operand>),
  FuncBegin { name: String, argc: usize },
  FuncEnd,
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instruction::Binary { dst, op, lhs, rhs } => write!(f, "{dst} = {lhs} {op} {rhs}"),
      Instruction::Unary { dst, op, operand } => write!(f, "{dst} = {op} {operand}"),
      Instruction::Copy { dst, src } => write!(f, "{dst} = {src}"),
      Instruction::Index { dst, collection, key } => write!(f, "{dst} = {collection}[{key}]"),
      Instruction::Label(label) => write!(f, "LABEL {label}"),
      Instruction::IfGoto { cond, target } => write!(f, "IF {cond} GOTO {target}"),
      Instruction::IfFalseGoto { cond, target } => write!(f, "IF_FALSE {cond} GOTO {target}"),
      Instruction::Goto(label) => write!(f, "GOTO {label}"),
      Instruction::Param(op) => write!(f, "PARAM {op}"),
      Instruction::Call { callee, argc, dst } => write!(f, "CALL {callee}, {argc}, {dst}"),
      Instruction::Print(op) => write!(f, "PRINT {op}"),
      Instruction::Return(Some(op)) => write!(f, "RETURN {op}"),
      Instruction::Return(None) => write!(f, "RETURN"),
      Instruction::FuncBegin { name, argc } => write!(f, "FUNC_BEGIN {name}, {argc}"),
      Instruction::FuncEnd => write!(f, "FUNC_END"),
    }
  }
}

/// Renders `instructions` in the stable `<n>: <payload>` text format from the
/// external-interfaces section; `n` is the 1-based position in the list.
pub fn render(instructions: &[Instruction]) -> String {
  let mut out = String::new();
  for (i, instr) in instructions.iter().enumerate() {
    if i > 0 {
      out.push('\n');
    }
    out.push_str(&format!("{}: {instr}", i + 1));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_scenario_a() {
    let instructions = vec![
      Instruction::Binary { dst: Temp(1), op: "*", lhs: Operand::Int(20), rhs: Operand::Int(2) },
      Instruction::Binary { dst: Temp(2), op: "+", lhs: Operand::Int(10), rhs: Operand::Temp(Temp(1)) },
      Instruction::Copy { dst: Operand::Ident("x".into()), src: Operand::Temp(Temp(2)) },
    ];
    assert_eq!(
      render(&instructions),
      "1: t1 = 20 * 2\n2: t2 = 10 + t1\n3: x = t2"
    );
  }
}
