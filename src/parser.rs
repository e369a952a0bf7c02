//! Recursive-descent parser with one token of lookahead.
//!
//! The lexer has already turned indentation into explicit `NEWLINE` /
//! `INDENT` / `DEDENT` tokens, so blocks are parsed by matching those tokens
//! directly rather than tracking a column stack here (contrast with the
//! teacher's parser, which interleaves indent-guards with token consumption
//! because its lexer reports indentation via a side-channel `ws` field
//! instead of real tokens).

use beef::lean::Cow;
use span::{Span, Spanned};

use crate::ast::{BinaryOp, Block, Expr, ExprKind, Ident, Program, ResolvedScope, Stmt, StmtKind, UnaryOp};
use crate::diagnostics::{Diagnostic, Diagnostics, Kind, LineIndex, Phase, Severity};
use crate::lexer::{Token, TokenKind};

struct Parser<'src, 'a> {
  tokens: &'a [Token<'src>],
  pos: usize,
  diagnostics: &'a mut Diagnostics,
  index: &'a LineIndex,
}

pub fn parse<'src>(
  tokens: &[Token<'src>],
  diagnostics: &mut Diagnostics,
  index: &LineIndex,
) -> Program<'src> {
  let mut parser = Parser {
    tokens,
    pos: 0,
    diagnostics,
    index,
  };
  let mut body = Vec::new();
  while !parser.at(TokenKind::Eof) {
    if let Some(stmt) = parser.statement() {
      body.push(stmt);
    }
  }
  Program { body }
}

impl<'src, 'a> Parser<'src, 'a> {
  const MINIMUM_STACK_REQUIRED: usize = 64_000;

  #[cfg(feature = "check-recursion-limit")]
  fn at_recursion_limit(&self) -> bool {
    stacker::remaining_stack()
      .map(|available| available <= Self::MINIMUM_STACK_REQUIRED)
      .unwrap_or(false)
  }

  #[cfg(not(feature = "check-recursion-limit"))]
  fn at_recursion_limit(&self) -> bool {
    false
  }

  fn current(&self) -> &Token<'src> {
    &self.tokens[self.pos]
  }

  fn previous(&self) -> &Token<'src> {
    &self.tokens[self.pos.saturating_sub(1)]
  }

  fn peek(&self, offset: usize) -> &Token<'src> {
    let i = (self.pos + offset).min(self.tokens.len() - 1);
    &self.tokens[i]
  }

  fn at(&self, kind: TokenKind) -> bool {
    self.current().kind == kind
  }

  fn bump(&mut self) -> Token<'src> {
    let token = self.tokens[self.pos].clone();
    if self.pos + 1 < self.tokens.len() {
      self.pos += 1;
    }
    token
  }

  fn bump_if(&mut self, kind: TokenKind) -> bool {
    if self.at(kind) {
      self.bump();
      true
    } else {
      false
    }
  }

  fn error(&mut self, kind: Kind, span: Span, message: impl Into<String>) {
    self
      .diagnostics
      .push(Diagnostic::new(Phase::Parse, Severity::Error, kind, span, self.index, message));
  }

  /// Consumes `kind` if present; otherwise records `kind_on_error` and leaves
  /// the cursor where it was (callers decide whether that is recoverable).
  fn expect(&mut self, kind: TokenKind, kind_on_error: Kind, what: &str) -> bool {
    if self.bump_if(kind) {
      true
    } else {
      let span = self.current().span;
      self.error(kind_on_error, span, format!("expected {what}, found {}", self.current().kind.name()));
      false
    }
  }

  fn expect_colon(&mut self) -> bool {
    self.expect(TokenKind::Colon, Kind::MissingColon, "':'")
  }

  /// Skips tokens up to and including the next NEWLINE at the current block
  /// depth; brackets are tracked so a NEWLINE inside `(...)`/`[...]` doesn't
  /// end the skip early.
  fn synchronize(&mut self) {
    let mut depth: i32 = 0;
    while !self.at(TokenKind::Eof) {
      match self.current().kind {
        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
        TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
        TokenKind::Newline if depth <= 0 => {
          self.bump();
          return;
        }
        TokenKind::Dedent if depth <= 0 => return,
        _ => {}
      }
      self.bump();
    }
  }

  fn statement(&mut self) -> Option<Stmt<'src>> {
    let start_pos = self.pos;
    let result = match self.current().kind {
      TokenKind::If => self.if_stmt(),
      TokenKind::While => self.while_stmt(),
      TokenKind::For => self.for_stmt(),
      TokenKind::Def => self.funcdef_stmt(),
      TokenKind::Return => self.return_stmt(),
      TokenKind::Break => Some(self.keyword_stmt(StmtKind::Break)),
      TokenKind::Continue => Some(self.keyword_stmt(StmtKind::Continue)),
      TokenKind::Pass => Some(self.keyword_stmt(StmtKind::Pass)),
      TokenKind::Reserved => {
        let token = self.bump();
        self.error(
          Kind::UnsupportedConstruct,
          token.span,
          format!("'{}' is not part of the supported language subset", token.lexeme),
        );
        self.synchronize();
        None
      }
      TokenKind::Identifier if self.peek(1).kind == TokenKind::Equal => self.assignment_stmt(),
      TokenKind::Newline => {
        // Blank logical line inside a block; shouldn't normally occur (blank
        // lines don't produce NEWLINE tokens) but is harmless to skip.
        self.bump();
        None
      }
      _ => Some(self.expr_stmt()),
    };

    if self.pos == start_pos {
      let span = self.current().span;
      self.error(Kind::UnexpectedToken, span, "parser made no progress here; skipping a token");
      self.bump();
    }
    result
  }

  fn block(&mut self) -> Block<'src> {
    if !self.bump_if(TokenKind::Newline) {
      let span = self.current().span;
      self.error(Kind::UnexpectedToken, span, format!("expected a newline, found {}", self.current().kind.name()));
      self.synchronize();
      return Vec::new();
    }
    if !self.bump_if(TokenKind::Indent) {
      let span = self.current().span;
      self.error(Kind::EmptyBlock, span, "block has no statements");
      return Vec::new();
    }
    let mut stmts = Vec::new();
    while !self.at(TokenKind::Dedent) && !self.at(TokenKind::Eof) {
      if let Some(stmt) = self.statement() {
        stmts.push(stmt);
      }
    }
    self.expect(TokenKind::Dedent, Kind::UnexpectedToken, "a dedent");
    stmts
  }

  fn identifier(&mut self) -> Ident<'src> {
    if self.at(TokenKind::Identifier) {
      let token = self.bump();
      Spanned::new(token.span, token.lexeme)
    } else {
      let span = self.current().span;
      self.error(Kind::UnexpectedToken, span, format!("expected an identifier, found {}", self.current().kind.name()));
      Spanned::new(span, Cow::borrowed(""))
    }
  }

  fn if_stmt(&mut self) -> Option<Stmt<'src>> {
    let start = self.bump().span; // `if`
    let cond = self.expression();
    self.expect_colon();
    let then_block = self.block();

    let mut elif_blocks = Vec::new();
    while self.at(TokenKind::Elif) {
      self.bump();
      let c = self.expression();
      self.expect_colon();
      let b = self.block();
      elif_blocks.push((c, b));
    }

    let else_block = if self.bump_if(TokenKind::Else) {
      self.expect_colon();
      Some(self.block())
    } else {
      None
    };

    let end = self.previous().span;
    Some(Spanned::new(
      start.join(end),
      StmtKind::If { cond, then_block, elif_blocks, else_block },
    ))
  }

  fn while_stmt(&mut self) -> Option<Stmt<'src>> {
    let start = self.bump().span; // `while`
    let cond = self.expression();
    self.expect_colon();
    let body = self.block();
    let end = self.previous().span;
    Some(Spanned::new(start.join(end), StmtKind::While { cond, body }))
  }

  fn for_stmt(&mut self) -> Option<Stmt<'src>> {
    let start = self.bump().span; // `for`
    let var = self.identifier();
    self.expect(TokenKind::In, Kind::UnexpectedToken, "'in'");
    let iter = self.expression();
    self.expect_colon();
    let body = self.block();
    let end = self.previous().span;
    Some(Spanned::new(start.join(end), StmtKind::For { var, iter, body }))
  }

  fn funcdef_stmt(&mut self) -> Option<Stmt<'src>> {
    let start = self.bump().span; // `def`
    let name = self.identifier();
    self.expect(TokenKind::LParen, Kind::UnexpectedToken, "'('");
    let mut params = Vec::new();
    if !self.at(TokenKind::RParen) {
      params.push(self.identifier());
      while self.bump_if(TokenKind::Comma) && !self.at(TokenKind::RParen) {
        params.push(self.identifier());
      }
    }
    self.expect(TokenKind::RParen, Kind::MissingCloser, "')'");
    self.expect_colon();
    let body = self.block();
    let end = self.previous().span;
    Some(Spanned::new(start.join(end), StmtKind::FunctionDef { name, params, body }))
  }

  fn return_stmt(&mut self) -> Option<Stmt<'src>> {
    let start = self.bump().span; // `return`
    let value = if self.at(TokenKind::Newline) {
      None
    } else {
      Some(self.expression())
    };
    let end = self.previous().span;
    self.expect(TokenKind::Newline, Kind::UnexpectedToken, "a newline");
    Some(Spanned::new(start.join(end), StmtKind::Return { value }))
  }

  fn keyword_stmt(&mut self, kind: StmtKind<'src>) -> Stmt<'src> {
    let token = self.bump();
    self.expect(TokenKind::Newline, Kind::UnexpectedToken, "a newline");
    Spanned::new(token.span, kind)
  }

  fn assignment_stmt(&mut self) -> Option<Stmt<'src>> {
    let token = self.bump(); // identifier
    let target = Spanned::new(token.span, token.lexeme);
    self.bump(); // `=`
    let value = self.expression();
    let end = self.previous().span;
    self.expect(TokenKind::Newline, Kind::UnexpectedToken, "a newline");
    Some(Spanned::new(target.span.join(end), StmtKind::Assignment { target, value }))
  }

  fn expr_stmt(&mut self) -> Stmt<'src> {
    let value = self.expression();
    let span = value.span;
    self.expect(TokenKind::Newline, Kind::UnexpectedToken, "a newline");
    Spanned::new(span, StmtKind::ExpressionStatement(value))
  }

  // --- expressions, in ascending precedence order ---

  fn expression(&mut self) -> Expr<'src> {
    self.or_expr()
  }

  fn or_expr(&mut self) -> Expr<'src> {
    let mut left = self.and_expr();
    while self.bump_if(TokenKind::Or) {
      let right = self.and_expr();
      left = combine(left, BinaryOp::Or, right);
    }
    left
  }

  fn and_expr(&mut self) -> Expr<'src> {
    let mut left = self.equality_expr();
    while self.bump_if(TokenKind::And) {
      let right = self.equality_expr();
      left = combine(left, BinaryOp::And, right);
    }
    left
  }

  fn equality_expr(&mut self) -> Expr<'src> {
    let mut left = self.comparison_expr();
    loop {
      let op = match self.current().kind {
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::Ne,
        _ => break,
      };
      self.bump();
      let right = self.comparison_expr();
      left = combine(left, op, right);
    }
    left
  }

  fn comparison_expr(&mut self) -> Expr<'src> {
    let mut left = self.additive_expr();
    loop {
      let op = match self.current().kind {
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        _ => break,
      };
      self.bump();
      let right = self.additive_expr();
      left = combine(left, op, right);
    }
    left
  }

  fn additive_expr(&mut self) -> Expr<'src> {
    let mut left = self.multiplicative_expr();
    loop {
      let op = match self.current().kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        _ => break,
      };
      self.bump();
      let right = self.multiplicative_expr();
      left = combine(left, op, right);
    }
    left
  }

  fn multiplicative_expr(&mut self) -> Expr<'src> {
    let mut left = self.unary_expr();
    loop {
      let op = match self.current().kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => break,
      };
      self.bump();
      let right = self.unary_expr();
      left = combine(left, op, right);
    }
    left
  }

  /// Lower precedence than `**`: `-x ** 2` parses as `-(x ** 2)`.
  fn unary_expr(&mut self) -> Expr<'src> {
    let op = match self.current().kind {
      TokenKind::Minus => UnaryOp::Neg,
      TokenKind::Plus => UnaryOp::Pos,
      TokenKind::Not => UnaryOp::Not,
      _ => return self.power_expr(),
    };
    let start = self.bump().span;
    let operand = self.unary_expr(); // right-to-left chaining
    let span = start.join(operand.span);
    Spanned::new(span, ExprKind::UnaryOp { op, operand: Box::new(operand) })
  }

  fn power_expr(&mut self) -> Expr<'src> {
    let base = self.primary_expr();
    if self.bump_if(TokenKind::StarStar) {
      let exponent = self.power_expr(); // right-associative
      combine(base, BinaryOp::Pow, exponent)
    } else {
      base
    }
  }

  /// Primary atom plus postfix `[index]` chains.
  fn primary_expr(&mut self) -> Expr<'src> {
    let mut expr = self.primary_atom();
    while self.at(TokenKind::LBracket) {
      let start = expr.span.start;
      self.bump();
      let key = self.expression();
      self.expect(TokenKind::RBracket, Kind::MissingCloser, "']'");
      let end = self.previous().span.end;
      expr = Spanned::new(
        Span { start, end },
        ExprKind::Index { collection: Box::new(expr), key: Box::new(key) },
      );
    }
    expr
  }

  fn primary_atom(&mut self) -> Expr<'src> {
    if self.at_recursion_limit() {
      let span = self.current().span;
      self.error(Kind::UnexpectedToken, span, "maximum expression nesting depth exceeded");
      return Spanned::new(span, ExprKind::Literal(crate::lexer::Value::None));
    }

    let token = self.current().clone();
    match token.kind {
      TokenKind::Integer | TokenKind::Float | TokenKind::String | TokenKind::Boolean | TokenKind::None_ => {
        self.bump();
        Spanned::new(token.span, ExprKind::Literal(token.value.unwrap_or(crate::lexer::Value::None)))
      }
      TokenKind::Identifier => {
        if self.peek(1).kind == TokenKind::LParen {
          let name = Spanned::new(token.span, token.lexeme);
          self.bump(); // identifier
          self.bump(); // `(`
          let args = self.call_args();
          self.expect(TokenKind::RParen, Kind::MissingCloser, "')'");
          let end = self.previous().span.end;
          Spanned::new(
            Span { start: name.span.start, end },
            ExprKind::Call { callee: name, args, resolved: ResolvedScope::default() },
          )
        } else {
          self.bump();
          Spanned::new(token.span, ExprKind::Identifier { name: token.lexeme, resolved: ResolvedScope::default() })
        }
      }
      TokenKind::LBracket => {
        self.bump();
        let mut items = Vec::new();
        if !self.at(TokenKind::RBracket) {
          items.push(self.expression());
          while self.bump_if(TokenKind::Comma) && !self.at(TokenKind::RBracket) {
            items.push(self.expression());
          }
        }
        self.expect(TokenKind::RBracket, Kind::MissingCloser, "']'");
        let end = self.previous().span.end;
        Spanned::new(Span { start: token.span.start, end }, ExprKind::ListLiteral(items))
      }
      TokenKind::LParen => {
        self.bump();
        let inner = self.expression();
        self.expect(TokenKind::RParen, Kind::MissingCloser, "')'");
        inner
      }
      _ => {
        self.error(Kind::UnexpectedToken, token.span, format!("unexpected token {}", token.kind.name()));
        Spanned::new(token.span, ExprKind::Literal(crate::lexer::Value::None))
      }
    }
  }

  fn call_args(&mut self) -> Vec<Expr<'src>> {
    let mut args = Vec::new();
    if !self.at(TokenKind::RParen) {
      args.push(self.expression());
      while self.bump_if(TokenKind::Comma) && !self.at(TokenKind::RParen) {
        args.push(self.expression());
      }
    }
    args
  }
}

fn combine<'src>(left: Expr<'src>, op: BinaryOp, right: Expr<'src>) -> Expr<'src> {
  let span = left.span.join(right.span);
  Spanned::new(span, ExprKind::BinaryOp { op, left: Box::new(left), right: Box::new(right) })
}

#[cfg(test)]
mod tests;
