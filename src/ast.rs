//! Abstract syntax tree produced by the parser.
//!
//! Every node carries its source span via [`span::Spanned`] so the resolver
//! and emitter can report precise positions without re-threading line/column
//! pairs through every constructor.

use std::cell::Cell;

use beef::lean::Cow;
use span::Spanned;

use crate::lexer::Value as TokenValue;

pub type Ident<'src> = Spanned<Cow<'src, str>>;

/// A non-owning link from an `Identifier`/`Call` node to the symbol it
/// resolves to: the id of the scope (an index into the resolver's scope
/// arena) that owns the name, not a reference to the `Symbol` itself, so the
/// AST stays free of lifetime ties to the resolver's tables. Filled in by
/// the resolver after parsing; `None` until resolved, or permanently if
/// resolution failed (undefined name).
#[derive(Debug, Clone, Default)]
pub struct ResolvedScope(pub Cell<Option<usize>>);

impl ResolvedScope {
  pub fn get(&self) -> Option<usize> {
    self.0.get()
  }

  pub fn set(&self, scope_id: usize) {
    self.0.set(Some(scope_id));
  }
}

#[derive(Debug, Clone)]
pub struct Program<'src> {
  pub body: Vec<Stmt<'src>>,
}

pub type Stmt<'src> = Spanned<StmtKind<'src>>;

#[derive(Debug, Clone)]
pub enum StmtKind<'src> {
  Assignment {
    target: Ident<'src>,
    value: Expr<'src>,
  },
  If {
    cond: Expr<'src>,
    then_block: Block<'src>,
    elif_blocks: Vec<(Expr<'src>, Block<'src>)>,
    else_block: Option<Block<'src>>,
  },
  While {
    cond: Expr<'src>,
    body: Block<'src>,
  },
  For {
    var: Ident<'src>,
    iter: Expr<'src>,
    body: Block<'src>,
  },
  FunctionDef {
    name: Ident<'src>,
    params: Vec<Ident<'src>>,
    body: Block<'src>,
  },
  Return {
    value: Option<Expr<'src>>,
  },
  Break,
  Continue,
  Pass,
  ExpressionStatement(Expr<'src>),
}

pub type Block<'src> = Vec<Stmt<'src>>;

pub type Expr<'src> = Spanned<ExprKind<'src>>;

#[derive(Debug, Clone)]
pub enum ExprKind<'src> {
  Literal(TokenValue),
  Identifier {
    name: Cow<'src, str>,
    resolved: ResolvedScope,
  },
  BinaryOp {
    op: BinaryOp,
    left: Box<Expr<'src>>,
    right: Box<Expr<'src>>,
  },
  UnaryOp {
    op: UnaryOp,
    operand: Box<Expr<'src>>,
  },
  Call {
    callee: Ident<'src>,
    args: Vec<Expr<'src>>,
    resolved: ResolvedScope,
  },
  Index {
    collection: Box<Expr<'src>>,
    key: Box<Expr<'src>>,
  },
  ListLiteral(Vec<Expr<'src>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Pow,
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
  And,
  Or,
}

impl BinaryOp {
  pub fn text(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Mod => "%",
      BinaryOp::Pow => "**",
      BinaryOp::Eq => "==",
      BinaryOp::Ne => "!=",
      BinaryOp::Lt => "<",
      BinaryOp::Le => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::Ge => ">=",
      BinaryOp::And => "and",
      BinaryOp::Or => "or",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Pos,
  Not,
}

impl UnaryOp {
  pub fn text(self) -> &'static str {
    match self {
      UnaryOp::Neg => "-",
      UnaryOp::Pos => "+",
      UnaryOp::Not => "not",
    }
  }
}
