//! Scoped symbol-table resolution with best-effort type inference.
//!
//! Scopes live in a flat arena (`Vec<Scope>`) indexed by `scope_id`, per the
//! design note about avoiding lifetime entanglement between AST nodes and
//! their enclosing scopes: a [`crate::ast::StmtKind::FunctionDef`] node never
//! holds a pointer to its `Scope`, only an index into this arena.

use indexmap::IndexMap;
use span::Span;

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostics::{Diagnostic, Diagnostics, Kind, LineIndex, Phase, Severity};
use crate::lexer::Value as LiteralValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
  Int,
  Float,
  String,
  Bool,
  List,
  None,
  Function,
  Unknown,
}

impl Type {
  /// Least upper bound in `{int <= float, others incomparable, unknown = top}`.
  pub fn join(self, other: Type) -> Type {
    if self == other {
      return self;
    }
    match (self, other) {
      (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
      _ => Type::Unknown,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
  Variable,
  Function,
  Parameter,
  Builtin,
}

#[derive(Debug, Clone)]
pub struct Symbol {
  pub name: String,
  pub kind: SymbolKind,
  pub ty: Type,
  pub decl_line: usize,
  pub scope_id: usize,
  pub param_count: Option<usize>,
  pub param_names: Option<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct Scope {
  pub parent: Option<usize>,
  pub symbols: IndexMap<String, Symbol>,
}

pub struct ResolveOutput {
  pub scopes: Vec<Scope>,
}

struct Resolver<'a> {
  scopes: Vec<Scope>,
  current: usize,
  loop_depth: u32,
  return_types: Vec<Type>,
  diagnostics: &'a mut Diagnostics,
  index: &'a LineIndex,
}

const BUILTINS: &[(&str, Type)] = &[
  ("print", Type::None),
  ("input", Type::String),
  ("len", Type::Int),
  ("int", Type::Int),
  ("float", Type::Float),
  ("str", Type::String),
  ("bool", Type::Bool),
  ("range", Type::List),
];

pub fn resolve(program: &Program, diagnostics: &mut Diagnostics, index: &LineIndex) -> ResolveOutput {
  let mut global = Scope::default();
  for (name, ty) in BUILTINS {
    global.symbols.insert(
      (*name).to_string(),
      Symbol {
        name: (*name).to_string(),
        kind: SymbolKind::Builtin,
        ty: *ty,
        decl_line: 0,
        scope_id: 0,
        param_count: None,
        param_names: None,
      },
    );
  }

  let mut resolver = Resolver {
    scopes: vec![global],
    current: 0,
    loop_depth: 0,
    return_types: Vec::new(),
    diagnostics,
    index,
  };
  for stmt in &program.body {
    resolver.resolve_stmt(stmt);
  }
  ResolveOutput { scopes: resolver.scopes }
}

impl<'a> Resolver<'a> {
  fn error(&mut self, kind: Kind, span: Span, message: impl Into<String>) {
    self
      .diagnostics
      .push(Diagnostic::new(Phase::Semantic, Severity::Error, kind, span, self.index, message));
  }

  fn line_of(&self, span: Span) -> usize {
    self.index.line_col(span.start).0
  }

  fn lookup(&self, name: &str) -> Option<&Symbol> {
    let mut scope = Some(self.current);
    while let Some(id) = scope {
      if let Some(sym) = self.scopes[id].symbols.get(name) {
        return Some(sym);
      }
      scope = self.scopes[id].parent;
    }
    None
  }

  fn assign(&mut self, name: &str, ty: Type, line: usize) {
    let scope_id = self.current;
    if let Some(existing) = self.scopes[scope_id].symbols.get_mut(name) {
      existing.ty = existing.ty.join(ty);
    } else {
      self.scopes[scope_id].symbols.insert(
        name.to_string(),
        Symbol {
          name: name.to_string(),
          kind: SymbolKind::Variable,
          ty,
          decl_line: line,
          scope_id,
          param_count: None,
          param_names: None,
        },
      );
    }
  }

  fn resolve_block(&mut self, block: &[Stmt]) {
    for stmt in block {
      self.resolve_stmt(stmt);
    }
  }

  fn resolve_stmt(&mut self, stmt: &Stmt) {
    match &**stmt {
      StmtKind::Assignment { target, value } => {
        let ty = self.infer_expr(value);
        let line = self.line_of(target.span);
        self.assign(target, ty, line);
      }
      StmtKind::If { cond, then_block, elif_blocks, else_block } => {
        self.infer_expr(cond);
        self.resolve_block(then_block);
        for (c, b) in elif_blocks {
          self.infer_expr(c);
          self.resolve_block(b);
        }
        if let Some(b) = else_block {
          self.resolve_block(b);
        }
      }
      StmtKind::While { cond, body } => {
        self.infer_expr(cond);
        self.loop_depth += 1;
        self.resolve_block(body);
        self.loop_depth -= 1;
      }
      StmtKind::For { var, iter, body } => {
        let elem_ty = self.infer_for_element_type(iter);
        let line = self.line_of(var.span);
        self.assign(var, elem_ty, line);
        self.loop_depth += 1;
        self.resolve_block(body);
        self.loop_depth -= 1;
      }
      StmtKind::FunctionDef { name, params, body } => self.resolve_function_def(name, params, body),
      StmtKind::Return { value } => {
        let ty = value.as_ref().map(|e| self.infer_expr(e)).unwrap_or(Type::None);
        if let Some(top) = self.return_types.last_mut() {
          *top = top.join(ty);
        } else {
          self.error(Kind::ReturnOutsideFunction, stmt.span, "'return' outside a function");
        }
      }
      StmtKind::Break | StmtKind::Continue => {
        if self.loop_depth == 0 {
          self.error(Kind::BreakOutsideLoop, stmt.span, "'break'/'continue' outside a loop");
        }
      }
      StmtKind::Pass => {}
      StmtKind::ExpressionStatement(expr) => {
        self.infer_expr(expr);
      }
    }
  }

  fn resolve_function_def(&mut self, name: &crate::ast::Ident, params: &[crate::ast::Ident], body: &[Stmt]) {
    let line = self.line_of(name.span);
    if let Some(existing) = self.scopes[self.current].symbols.get(name.as_ref()) {
      if existing.kind == SymbolKind::Function {
        self.error(Kind::Redefinition, name.span, format!("'{}' is already defined as a function in this scope", name.as_ref()));
      }
    }

    let param_names: Vec<String> = params.iter().map(|p| p.as_ref().to_string()).collect();
    self.scopes[self.current].symbols.insert(
      name.as_ref().to_string(),
      Symbol {
        name: name.as_ref().to_string(),
        kind: SymbolKind::Function,
        ty: Type::None,
        decl_line: line,
        scope_id: self.current,
        param_count: Some(params.len()),
        param_names: Some(param_names.clone()),
      },
    );

    let mut func_scope = Scope { parent: Some(self.current), symbols: IndexMap::new() };
    for p in params {
      func_scope.symbols.insert(
        p.as_ref().to_string(),
        Symbol {
          name: p.as_ref().to_string(),
          kind: SymbolKind::Parameter,
          ty: Type::Unknown,
          decl_line: self.line_of(p.span),
          scope_id: self.scopes.len(),
          param_count: None,
          param_names: None,
        },
      );
    }
    self.scopes.push(func_scope);
    let func_scope_id = self.scopes.len() - 1;
    let enclosing = self.current;
    self.current = func_scope_id;
    self.return_types.push(Type::None);

    self.resolve_block(body);

    let return_ty = self.return_types.pop().unwrap_or(Type::None);
    self.current = enclosing;
    if let Some(sym) = self.scopes[enclosing].symbols.get_mut(name.as_ref()) {
      sym.ty = return_ty;
    }
  }

  fn infer_for_element_type(&mut self, iter: &Expr) -> Type {
    if let ExprKind::Call { callee, .. } = &**iter {
      if callee.as_ref() == "range" {
        self.infer_expr(iter);
        return Type::Int;
      }
    }
    self.infer_expr(iter);
    Type::Unknown
  }

  fn infer_expr(&mut self, expr: &Expr) -> Type {
    match &**expr {
      ExprKind::Literal(value) => match value {
        LiteralValue::Int(_) => Type::Int,
        LiteralValue::Float(_) => Type::Float,
        LiteralValue::Str(_) => Type::String,
        LiteralValue::Bool(_) => Type::Bool,
        LiteralValue::None => Type::None,
      },
      ExprKind::Identifier { name, resolved } => match self.lookup(name) {
        Some(sym) => {
          resolved.set(sym.scope_id);
          sym.ty
        }
        None => {
          self.error(Kind::UndefinedVariable, expr.span, name.to_string());
          Type::Unknown
        }
      },
      ExprKind::BinaryOp { op, left, right } => {
        let lt = self.infer_expr(left);
        let rt = self.infer_expr(right);
        self.binary_result_type(*op, lt, rt, expr.span)
      }
      ExprKind::UnaryOp { op, operand } => {
        let ty = self.infer_expr(operand);
        self.unary_result_type(*op, ty, expr.span)
      }
      ExprKind::Call { callee, args, resolved } => self.resolve_call(callee, args, expr.span, resolved),
      // No list/string distinction and no sign check on `key`: this front-end
      // doesn't fold constants, so it can't tell a literal `-1` from any
      // other int-typed expression. Negative indices are accepted here and
      // left to whatever runtime eventually evaluates the emitted `Index`.
      ExprKind::Index { collection, key } => {
        self.infer_expr(collection);
        self.infer_expr(key);
        Type::Unknown
      }
      ExprKind::ListLiteral(items) => {
        for item in items {
          self.infer_expr(item);
        }
        Type::List
      }
    }
  }

  fn resolve_call(&mut self, callee: &crate::ast::Ident, args: &[Expr], span: Span, resolved: &crate::ast::ResolvedScope) -> Type {
    for arg in args {
      self.infer_expr(arg);
    }
    let symbol = match self.lookup(callee) {
      Some(sym) => sym.clone(),
      None => {
        self.error(Kind::UndefinedVariable, callee.span, callee.to_string());
        return Type::Unknown;
      }
    };
    resolved.set(symbol.scope_id);
    match symbol.kind {
      SymbolKind::Function => {
        let expected = symbol.param_count.unwrap_or(0);
        if args.len() != expected {
          self.error(
            Kind::ArityMismatch,
            span,
            format!("'{}' expects {expected} argument(s), found {}", symbol.name, args.len()),
          );
        }
        symbol.ty
      }
      SymbolKind::Builtin => {
        let ok = match symbol.name.as_str() {
          "print" => true,
          "input" => args.len() <= 1,
          "len" | "int" | "float" | "str" | "bool" => args.len() == 1,
          "range" => (1..=3).contains(&args.len()),
          _ => true,
        };
        if !ok {
          self.error(Kind::ArityMismatch, span, format!("'{}' was called with the wrong number of arguments", symbol.name));
        }
        symbol.ty
      }
      SymbolKind::Variable | SymbolKind::Parameter => Type::Unknown,
    }
  }

  fn binary_result_type(&mut self, op: BinaryOp, lt: Type, rt: Type, span: Span) -> Type {
    use BinaryOp::*;
    if matches!(op, And | Or) {
      return Type::Bool;
    }
    if lt == Type::Unknown || rt == Type::Unknown {
      return match op {
        Eq | Ne | Lt | Le | Gt | Ge => Type::Bool,
        _ => Type::Unknown,
      };
    }
    match op {
      Add => match (lt, rt) {
        (Type::Int, Type::Int) => Type::Int,
        (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
        (Type::String, Type::String) => Type::String,
        (Type::List, Type::List) => Type::List,
        _ => self.type_mismatch(op, lt, rt, span),
      },
      Mul if (lt == Type::String || lt == Type::List) && rt == Type::Int => lt,
      Mul if lt == Type::Int && (rt == Type::String || rt == Type::List) => rt,
      Sub | Mul | Pow => match (lt, rt) {
        (Type::Int, Type::Int) => Type::Int,
        (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
        _ => self.type_mismatch(op, lt, rt, span),
      },
      // `/` always yields a float, even for two ints; there's no separate
      // truncating-divide operator.
      Div => match (lt, rt) {
        (Type::Int, Type::Int) | (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
        _ => self.type_mismatch(op, lt, rt, span),
      },
      Mod => match (lt, rt) {
        (Type::Int, Type::Int) => Type::Int,
        (Type::Float, Type::Float) | (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
        _ => self.type_mismatch(op, lt, rt, span),
      },
      Eq | Ne | Lt | Le | Gt | Ge => {
        let numeric = matches!(lt, Type::Int | Type::Float) && matches!(rt, Type::Int | Type::Float);
        if numeric || lt == rt {
          Type::Bool
        } else {
          self.error(Kind::TypeMismatch, span, format!("cannot compare {lt:?} with {rt:?}"));
          Type::Bool
        }
      }
      And | Or => unreachable!("handled above"),
    }
  }

  fn type_mismatch(&mut self, op: BinaryOp, lt: Type, rt: Type, span: Span) -> Type {
    self.error(Kind::TypeMismatch, span, format!("'{}' does not accept {lt:?} and {rt:?}", op.text()));
    Type::Unknown
  }

  fn unary_result_type(&mut self, op: UnaryOp, ty: Type, span: Span) -> Type {
    match op {
      UnaryOp::Not => Type::Bool,
      UnaryOp::Neg | UnaryOp::Pos => {
        if ty == Type::Unknown {
          return Type::Unknown;
        }
        match ty {
          Type::Int => Type::Int,
          Type::Float => Type::Float,
          _ => {
            self.error(Kind::TypeMismatch, span, format!("unary '{}' requires a numeric operand, found {ty:?}", op.text()));
            Type::Unknown
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests;
