//! Recursive-descent parser.
//!
//! Precedence, loosest to tightest:
//! `or -> and -> equality -> comparison -> additive -> multiplicative ->
//! unary -> subscript -> call -> primary`. Each level is one method that
//! calls the next; call binds inside primary (only a bare identifier can
//! be called), and subscript wraps whatever primary/call produced so
//! `f()[0]` and `arr[0]` both parse through the same loop.

use crate::ast::*;
use lockc_lex::{Token, TokenKind};
use lockc_util::{Handler, LocksError, Span};

/// Tokens that can start a new statement; used to resynchronize after a
/// syntax error so one parse reports every error in the file.
const SYNC_KINDS: &[fn(&TokenKind) -> bool] = &[
    |k| matches!(k, TokenKind::Semicolon),
    |k| matches!(k, TokenKind::Eof),
    |k| matches!(k, TokenKind::Var),
    |k| matches!(k, TokenKind::Fun),
    |k| matches!(k, TokenKind::RightBrace),
    |k| matches!(k, TokenKind::Return),
];

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a mut Handler,
}

type PResult<T> = Result<T, ()>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        Self { tokens, pos: 0, handler }
    }

    pub fn parse_program(mut self) -> Program {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        stmts
    }

    // ---- token stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> PResult<&Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            self.handler.report(LocksError::syntax(message, tok.span.line, tok.span.column));
            Err(())
        }
    }

    fn expect_semicolon(&mut self) -> PResult<()> {
        if self.matches(&TokenKind::Semicolon) {
            Ok(())
        } else {
            let prev = self.previous().span;
            self.handler.report(LocksError::syntax("Expected ';'", prev.line, prev.column));
            Err(())
        }
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if SYNC_KINDS.iter().any(|f| f(&self.peek().kind)) {
                return;
            }
            self.advance();
        }
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }

    // ---- declarations & statements ----

    fn declaration(&mut self) -> PResult<Stmt> {
        if self.matches(&TokenKind::Var) {
            self.var_decl()
        } else if self.matches(&TokenKind::Fun) {
            self.fun_decl()
        } else {
            self.statement()
        }
    }

    fn var_decl(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        let name = self.identifier_name("Expected variable name")?;
        let init = if self.matches(&TokenKind::Equal) { Some(self.expression()?) } else { None };
        self.expect_semicolon()?;
        Ok(Stmt::VarDecl { name, init, span: self.span_from(start) })
    }

    fn fun_decl(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        let name = self.identifier_name("Expected function name")?;
        self.expect(TokenKind::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.identifier_name("Expected parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "Expected ')' after parameters")?;
        self.expect(TokenKind::LeftBrace, "Expected '{' before function body")?;
        let body = self.block_stmts()?;
        Ok(Stmt::FunDecl { name, params, body, span: self.span_from(start) })
    }

    fn identifier_name(&mut self, message: &str) -> PResult<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => {
                let tok = self.peek().clone();
                self.handler.report(LocksError::syntax(message, tok.span.line, tok.span.column));
                Err(())
            }
        }
    }

    fn statement(&mut self) -> PResult<Stmt> {
        if self.matches(&TokenKind::LeftBrace) {
            let start = self.previous().span;
            let stmts = self.block_stmts()?;
            Ok(Stmt::Block(stmts, self.span_from(start)))
        } else if self.matches(&TokenKind::If) {
            self.if_stmt()
        } else if self.matches(&TokenKind::While) {
            self.while_stmt()
        } else if self.matches(&TokenKind::For) {
            self.for_stmt()
        } else if self.matches(&TokenKind::Return) {
            self.return_stmt()
        } else if self.matches(&TokenKind::Break) {
            let span = self.previous().span;
            self.expect_semicolon()?;
            Ok(Stmt::Break(span))
        } else if self.matches(&TokenKind::Continue) {
            let span = self.previous().span;
            self.expect_semicolon()?;
            Ok(Stmt::Continue(span))
        } else {
            self.expr_or_assign_stmt()
        }
    }

    fn block_stmts(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.expect(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(stmts)
    }

    fn if_stmt(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        self.expect(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RightParen, "Expected ')' after condition")?;
        let then_branch = self.single_or_block()?;
        let else_branch = if self.matches(&TokenKind::Else) { Some(self.single_or_block()?) } else { None };
        Ok(Stmt::If { cond, then_branch, else_branch, span: self.span_from(start) })
    }

    fn while_stmt(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        self.expect(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = self.single_or_block()?;
        Ok(Stmt::While { cond, body, span: self.span_from(start) })
    }

    /// Desugars `for (init; cond; update) body` into
    /// `{ init; while (cond) { body; update; } }`. A missing `cond`
    /// becomes the literal `true`; a missing `init` drops the wrapping
    /// block; a missing `update` leaves the body untouched.
    fn for_stmt(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        self.expect(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = if self.matches(&TokenKind::Semicolon) {
            None
        } else if self.matches(&TokenKind::Var) {
            Some(self.var_decl()?)
        } else {
            Some(self.expr_or_assign_stmt()?)
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            Expr::Bool(true, Span::DUMMY)
        } else {
            self.expression()?
        };
        self.expect_semicolon()?;

        let update = if self.check(&TokenKind::RightParen) { None } else { Some(self.expr_or_assign_no_semi()?) };
        self.expect(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let mut body = self.single_or_block()?;
        if let Some(update) = update {
            body.push(update);
        }
        let span = self.span_from(start);
        let loop_stmt = Stmt::While { cond, body, span };

        Ok(match init {
            Some(init) => Stmt::Block(vec![init, loop_stmt], span),
            None => loop_stmt,
        })
    }

    fn single_or_block(&mut self) -> PResult<Vec<Stmt>> {
        if self.matches(&TokenKind::LeftBrace) {
            self.block_stmts()
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn return_stmt(&mut self) -> PResult<Stmt> {
        let start = self.previous().span;
        let value = if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.expect_semicolon()?;
        Ok(Stmt::Return { value, span: self.span_from(start) })
    }

    fn expr_or_assign_stmt(&mut self) -> PResult<Stmt> {
        let stmt = self.expr_or_assign_no_semi()?;
        self.expect_semicolon()?;
        Ok(stmt)
    }

    fn expr_or_assign_no_semi(&mut self) -> PResult<Stmt> {
        let start = self.peek().span;
        let expr = self.expression()?;
        if self.matches(&TokenKind::Equal) {
            let value = self.expression()?;
            let target = match expr {
                Expr::Identifier(name, _) => AssignTarget::Name(name),
                Expr::Index { target, index, .. } => AssignTarget::Index { target, index },
                other => {
                    let span = other.span();
                    self.handler.report(LocksError::syntax("Invalid assignment target", span.line, span.column));
                    return Err(());
                }
            };
            Ok(Stmt::Assign { target, value, span: self.span_from(start) })
        } else {
            Ok(Stmt::Expr(expr))
        }
    }

    // ---- expressions ----

    fn expression(&mut self) -> PResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        let mut left = self.and_expr()?;
        while self.matches(&TokenKind::Or) {
            let right = self.and_expr()?;
            let span = left.span().to(right.span());
            left = Expr::Logical { op: LogicOp::Or, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        let mut left = self.equality()?;
        while self.matches(&TokenKind::And) {
            let right = self.equality()?;
            let span = left.span().to(right.span());
            left = Expr::Logical { op: LogicOp::And, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = if self.matches(&TokenKind::EqualEqual) {
                BinOp::Eq
            } else if self.matches(&TokenKind::BangEqual) {
                BinOp::NotEq
            } else {
                break;
            };
            let right = self.comparison()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut left = self.additive()?;
        loop {
            let op = if self.matches(&TokenKind::Less) {
                BinOp::Lt
            } else if self.matches(&TokenKind::LessEqual) {
                BinOp::LtEq
            } else if self.matches(&TokenKind::Greater) {
                BinOp::Gt
            } else if self.matches(&TokenKind::GreaterEqual) {
                BinOp::GtEq
            } else {
                break;
            };
            let right = self.additive()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn additive(&mut self) -> PResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = if self.matches(&TokenKind::Plus) {
                BinOp::Add
            } else if self.matches(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.multiplicative()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.matches(&TokenKind::Star) {
                BinOp::Mul
            } else if self.matches(&TokenKind::Slash) {
                BinOp::Div
            } else if self.matches(&TokenKind::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            let right = self.unary()?;
            let span = left.span().to(right.span());
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.matches(&TokenKind::Minus) {
            let start = self.previous().span;
            let expr = self.unary()?;
            let span = start.to(expr.span());
            return Ok(Expr::Unary { op: UnOp::Negate, expr: Box::new(expr), span });
        }
        if self.matches(&TokenKind::Bang) {
            let start = self.previous().span;
            let expr = self.unary()?;
            let span = start.to(expr.span());
            return Ok(Expr::Unary { op: UnOp::Not, expr: Box::new(expr), span });
        }
        self.subscript()
    }

    fn subscript(&mut self) -> PResult<Expr> {
        let mut expr = self.call()?;
        while self.matches(&TokenKind::LeftBracket) {
            let index = self.expression()?;
            let close = self.expect(TokenKind::RightBracket, "Expected ']' after index")?.span;
            let span = expr.span().to(close);
            expr = Expr::Index { target: Box::new(expr), index: Box::new(index), span };
        }
        Ok(expr)
    }

    fn call(&mut self) -> PResult<Expr> {
        self.primary()
    }

    fn primary(&mut self) -> PResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Integer(text) => {
                self.advance();
                let value = text.parse::<i64>().unwrap_or(0);
                Ok(Expr::Integer(value, tok.span))
            }
            TokenKind::Double(text) => {
                self.advance();
                let value = text.parse::<f64>().unwrap_or(0.0);
                Ok(Expr::Double(value, text, tok.span))
            }
            TokenKind::Str(text) => {
                self.advance();
                Ok(Expr::Str(text, tok.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, tok.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, tok.span))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil(tok.span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.matches(&TokenKind::LeftParen) {
                    let args = self.call_args()?;
                    let close = self.previous().span;
                    Ok(Expr::Call { callee: name, args, span: tok.span.to(close) })
                } else {
                    Ok(Expr::Identifier(name, tok.span))
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(TokenKind::RightBracket, "Expected ']' after array elements")?.span;
                Ok(Expr::Array(elements, tok.span.to(close)))
            }
            _ => {
                self.handler.report(LocksError::syntax("Expected expression", tok.span.line, tok.span.column));
                Err(())
            }
        }
    }

    fn call_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_lex::Lexer;
    use lockc_util::{Handler, SourceMap};

    fn parse(src: &str) -> (Program, Handler) {
        let mut map = SourceMap::new();
        let file = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        let program = Parser::new(tokens, &mut handler).parse_program();
        (program, handler)
    }

    #[test]
    fn parses_var_decl_with_precedence() {
        let (program, handler) = parse("var x = 1 + 2 * 3;");
        assert!(!handler.had_error());
        match &program[0] {
            Stmt::VarDecl { name, init: Some(Expr::Binary { op: BinOp::Add, right, .. }), .. } => {
                assert_eq!(name, "x");
                assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        let (program, handler) = parse("for (var i = 0; i < 3; i = i + 1) { println(i); }");
        assert!(!handler.had_error());
        match &program[0] {
            Stmt::Block(stmts, _) => {
                assert!(matches!(stmts[0], Stmt::VarDecl { .. }));
                match &stmts[1] {
                    Stmt::While { body, .. } => assert_eq!(body.len(), 2),
                    other => panic!("expected while, got {other:?}"),
                }
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_without_clauses_defaults_condition_true() {
        let (program, handler) = parse("for (;;) { break; }");
        assert!(!handler.had_error());
        assert!(matches!(program[0], Stmt::While { cond: Expr::Bool(true, _), .. }));
    }

    #[test]
    fn missing_semicolon_reports_syntax_error_and_recovers() {
        let (program, handler) = parse("var x = 1\nvar y = 2;");
        assert!(handler.had_error());
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn subscript_assignment_parses() {
        let (program, handler) = parse("a[0] = 5;");
        assert!(!handler.had_error());
        assert!(matches!(program[0], Stmt::Assign { target: AssignTarget::Index { .. }, .. }));
    }
}
