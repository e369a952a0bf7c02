//! Three-address code generator.
//!
//! Walks the AST post-order, allocating temporaries and labels from
//! monotonic per-invocation counters (§9's note that these counters must be
//! pipeline-owned rather than global, so independent `compile()` calls never
//! interfere). By the time this runs the resolver has already vetted the
//! program, so emission never itself raises a diagnostic; anything it can't
//! make sense of is an internal-invariant bug, not a user error.

use crate::ast::{BinaryOp, Block, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::diagnostics::{Diagnostic, Diagnostics, Kind, LineIndex, Phase, Severity};
use crate::ir::{Instruction, Label, Operand, Temp};
use crate::lexer::Value as LiteralValue;

struct Emitter<'a> {
  instructions: Vec<Instruction>,
  next_temp: u32,
  next_label: u32,
  /// (continue target, break target), innermost last.
  loop_labels: Vec<(Label, Label)>,
  diagnostics: &'a mut Diagnostics,
  index: &'a LineIndex,
}

pub fn emit(program: &Program, diagnostics: &mut Diagnostics, index: &LineIndex) -> Vec<Instruction> {
  let mut emitter = Emitter {
    instructions: Vec::new(),
    next_temp: 1,
    next_label: 1,
    loop_labels: Vec::new(),
    diagnostics,
    index,
  };
  for stmt in &program.body {
    emitter.emit_stmt(stmt);
  }
  emitter.instructions
}

impl<'a> Emitter<'a> {
  fn new_temp(&mut self) -> Temp {
    let t = Temp(self.next_temp);
    self.next_temp += 1;
    t
  }

  fn new_label(&mut self) -> Label {
    let l = Label(self.next_label);
    self.next_label += 1;
    l
  }

  fn push(&mut self, instr: Instruction) {
    self.instructions.push(instr);
  }

  fn internal_error(&mut self, span: span::Span, message: impl Into<String>) {
    self
      .diagnostics
      .push(Diagnostic::new(Phase::Codegen, Severity::Error, Kind::InternalInvariant, span, self.index, message));
  }

  fn emit_block(&mut self, block: &Block) {
    for stmt in block {
      self.emit_stmt(stmt);
    }
  }

  fn emit_stmt(&mut self, stmt: &Stmt) {
    match &**stmt {
      StmtKind::Assignment { target, value } => {
        let src = self.emit_expr(value);
        self.push(Instruction::Copy { dst: Operand::Ident(target.to_string()), src });
      }
      StmtKind::If { cond, then_block, elif_blocks, else_block } => {
        self.emit_if(cond, then_block, elif_blocks, else_block.as_ref());
      }
      StmtKind::While { cond, body } => {
        let lstart = self.new_label();
        self.push(Instruction::Label(lstart));
        let cond_operand = self.emit_expr(cond);
        let lend = self.new_label();
        self.push(Instruction::IfFalseGoto { cond: cond_operand, target: lend });
        self.loop_labels.push((lstart, lend));
        self.emit_block(body);
        self.loop_labels.pop();
        self.push(Instruction::Goto(lstart));
        self.push(Instruction::Label(lend));
      }
      StmtKind::For { var, iter, body } => self.emit_for(var, iter, body),
      StmtKind::FunctionDef { name, params, body } => {
        self.push(Instruction::FuncBegin { name: name.to_string(), argc: params.len() });
        self.emit_block(body);
        if !matches!(self.instructions.last(), Some(Instruction::Return(_))) {
          self.push(Instruction::Return(None));
        }
        self.push(Instruction::FuncEnd);
      }
      StmtKind::Return { value } => {
        let operand = value.as_ref().map(|e| self.emit_expr(e));
        self.push(Instruction::Return(operand));
      }
      StmtKind::Break => match self.loop_labels.last() {
        Some((_, brk)) => self.push(Instruction::Goto(*brk)),
        None => self.internal_error(stmt.span, "'break' reached codegen outside a loop"),
      },
      StmtKind::Continue => match self.loop_labels.last() {
        Some((cont, _)) => self.push(Instruction::Goto(*cont)),
        None => self.internal_error(stmt.span, "'continue' reached codegen outside a loop"),
      },
      StmtKind::Pass => {}
      StmtKind::ExpressionStatement(expr) => self.emit_expr_statement(expr),
    }
  }

  /// `print(...)` bypasses the generic `PARAM`/`CALL` convention: each
  /// argument becomes its own `PRINT` instruction, in order. Any other
  /// call or bare expression is evaluated for its side effects and its
  /// result, if any, discarded.
  fn emit_expr_statement(&mut self, expr: &Expr) {
    if let ExprKind::Call { callee, args, .. } = &**expr {
      if callee.as_ref() == "print" {
        for arg in args {
          let operand = self.emit_expr(arg);
          self.push(Instruction::Print(operand));
        }
        return;
      }
    }
    self.emit_expr(expr);
  }

  fn emit_if(&mut self, cond: &Expr, then_block: &Block, elifs: &[(Expr, Block)], else_block: Option<&Block>) {
    let cond_operand = self.emit_expr(cond);
    let lnext = self.new_label();
    self.push(Instruction::IfFalseGoto { cond: cond_operand, target: lnext });
    self.emit_block(then_block);

    if elifs.is_empty() && else_block.is_none() {
      self.push(Instruction::Label(lnext));
      return;
    }

    let lend = self.new_label();
    self.push(Instruction::Goto(lend));
    self.push(Instruction::Label(lnext));
    match elifs.split_first() {
      Some(((c, b), rest)) => self.emit_if(c, b, rest, else_block),
      None => {
        if let Some(eb) = else_block {
          self.emit_block(eb);
        }
      }
    }
    self.push(Instruction::Label(lend));
  }

  /// Desugars `for var in iter: body` into an index-counted `while`, since
  /// the stable instruction set has no dedicated loop-over-collection form.
  fn emit_for(&mut self, var: &crate::ast::Ident, iter: &Expr, body: &Block) {
    let iter_operand = self.emit_expr(iter);

    let len_dst = self.new_temp();
    self.push(Instruction::Param(iter_operand.clone()));
    self.push(Instruction::Call { callee: "len".to_string(), argc: 1, dst: len_dst });

    let idx = self.new_temp();
    self.push(Instruction::Copy { dst: Operand::Temp(idx), src: Operand::Int(0) });

    let lstart = self.new_label();
    self.push(Instruction::Label(lstart));
    let cond_dst = self.new_temp();
    self.push(Instruction::Binary { dst: cond_dst, op: "<", lhs: Operand::Temp(idx), rhs: Operand::Temp(len_dst) });
    let lend = self.new_label();
    self.push(Instruction::IfFalseGoto { cond: Operand::Temp(cond_dst), target: lend });

    let elem_dst = self.new_temp();
    self.push(Instruction::Index { dst: elem_dst, collection: iter_operand, key: Operand::Temp(idx) });
    self.push(Instruction::Copy { dst: Operand::Ident(var.to_string()), src: Operand::Temp(elem_dst) });

    self.loop_labels.push((lstart, lend));
    self.emit_block(body);
    self.loop_labels.pop();

    self.push(Instruction::Binary { dst: idx, op: "+", lhs: Operand::Temp(idx), rhs: Operand::Int(1) });
    self.push(Instruction::Goto(lstart));
    self.push(Instruction::Label(lend));
  }

  fn emit_expr(&mut self, expr: &Expr) -> Operand {
    match &**expr {
      ExprKind::Literal(value) => literal_operand(value),
      ExprKind::Identifier { name, .. } => Operand::Ident(name.to_string()),
      ExprKind::BinaryOp { op: BinaryOp::And, left, right } => self.emit_short_circuit(true, left, right),
      ExprKind::BinaryOp { op: BinaryOp::Or, left, right } => self.emit_short_circuit(false, left, right),
      ExprKind::BinaryOp { op, left, right } => {
        let lhs = self.emit_expr(left);
        let rhs = self.emit_expr(right);
        let dst = self.new_temp();
        self.push(Instruction::Binary { dst, op: op.text(), lhs, rhs });
        Operand::Temp(dst)
      }
      ExprKind::UnaryOp { op, operand } => {
        let operand = self.emit_expr(operand);
        let dst = self.new_temp();
        self.push(Instruction::Unary { dst, op: op.text(), operand });
        Operand::Temp(dst)
      }
      ExprKind::Call { callee, args, .. } => {
        let arg_operands: Vec<Operand> = args.iter().map(|a| self.emit_expr(a)).collect();
        for operand in arg_operands {
          self.push(Instruction::Param(operand));
        }
        let dst = self.new_temp();
        self.push(Instruction::Call { callee: callee.to_string(), argc: args.len(), dst });
        Operand::Temp(dst)
      }
      ExprKind::Index { collection, key } => {
        let collection = self.emit_expr(collection);
        let key = self.emit_expr(key);
        let dst = self.new_temp();
        self.push(Instruction::Index { dst, collection, key });
        Operand::Temp(dst)
      }
      ExprKind::ListLiteral(items) => {
        // No dedicated "build list" instruction exists in the stable set;
        // a literal is built the same way any other call result is: push
        // each element, then call the variadic `list` constructor.
        let arg_operands: Vec<Operand> = items.iter().map(|item| self.emit_expr(item)).collect();
        for operand in arg_operands {
          self.push(Instruction::Param(operand));
        }
        let dst = self.new_temp();
        self.push(Instruction::Call { callee: "list".to_string(), argc: items.len(), dst });
        Operand::Temp(dst)
      }
    }
  }

  /// Shared helper for `and`/`or`: `is_and` picks which branch short-circuits.
  fn emit_short_circuit(&mut self, is_and: bool, left: &Expr, right: &Expr) -> Operand {
    let left_operand = self.emit_expr(left);
    let shortcut_label = self.new_label();
    let end_label = self.new_label();
    let dst = self.new_temp();
    if is_and {
      self.push(Instruction::IfFalseGoto { cond: left_operand, target: shortcut_label });
    } else {
      self.push(Instruction::IfGoto { cond: left_operand, target: shortcut_label });
    }
    let right_operand = self.emit_expr(right);
    self.push(Instruction::Copy { dst: Operand::Temp(dst), src: right_operand });
    self.push(Instruction::Goto(end_label));
    self.push(Instruction::Label(shortcut_label));
    self.push(Instruction::Copy { dst: Operand::Temp(dst), src: Operand::Bool(!is_and) });
    self.push(Instruction::Label(end_label));
    Operand::Temp(dst)
  }
}

fn literal_operand(value: &LiteralValue) -> Operand {
  match value {
    LiteralValue::Int(n) => Operand::Int(*n),
    LiteralValue::Float(n) => Operand::Float(*n),
    LiteralValue::Str(s) => Operand::Str(s.clone()),
    LiteralValue::Bool(b) => Operand::Bool(*b),
    LiteralValue::None => Operand::None,
  }
}

#[cfg(test)]
mod tests;
