//! lockc-sem — semantic analysis.
//!
//! Resolves every name, checks call arity (including against the seven
//! built-ins, which are pre-registered as arity-1 functions so a mismatch
//! is caught the same way as for a user function), and validates
//! `break`/`continue` nesting. Purely diagnostic: nothing here changes the
//! AST, and a clean run doesn't reject programs a later phase would
//! accept — this pass only narrows, it never guesses a fix.

pub mod scope;

use lockc_par::ast::*;
use lockc_util::{DefIdGenerator, Handler, LocksError};
use scope::{Binding, ScopeTree};

/// Index/name table for the seven built-ins, shared with the compiler and
/// VM so `CALL_NATIVE`'s operand always means the same function.
pub const BUILTINS: &[&str] = &["print", "println", "input", "len", "int", "str", "isinteger"];

/// A coarse compile-time type, tracked only well enough to catch literal
/// arithmetic like `"a" + true` before it reaches the interpreter.
/// `Opaque` covers anything not statically known — a variable load or a
/// call result — and is never flagged by a mismatch check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeTag {
    Number,
    String,
    Boolean,
    Nil,
    Array,
    Function,
    Opaque,
}

pub struct SemanticAnalyzer<'a> {
    scopes: ScopeTree,
    defs: DefIdGenerator,
    loop_depth: u32,
    handler: &'a mut Handler,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(handler: &'a mut Handler) -> Self {
        let mut analyzer =
            Self { scopes: ScopeTree::new(), defs: DefIdGenerator::new(), loop_depth: 0, handler };
        for name in BUILTINS {
            let def_id = analyzer.defs.next();
            analyzer.scopes.declare(name, Binding::Fun { def_id, arity: 1 });
        }
        analyzer
    }

    pub fn analyze(&mut self, program: &Program) {
        self.analyze_block(program);
    }

    fn analyze_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.analyze_stmt(stmt);
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, init, span } => {
                if let Some(init) = init {
                    self.analyze_expr(init);
                }
                if self.scopes.declared_in_current_scope(name) {
                    self.handler.report(LocksError::name(
                        format!("Variable '{name}' is already declared in this scope"),
                        span.line,
                    ));
                }
                let def_id = self.defs.next();
                self.scopes.declare(name, Binding::Var(def_id));
            }
            Stmt::FunDecl { name, params, body, span } => {
                if self.scopes.resolve(name).is_some() {
                    self.handler.report(LocksError::name(format!("'{name}' is already declared"), span.line));
                }
                let def_id = self.defs.next();
                self.scopes.declare(name, Binding::Fun { def_id, arity: params.len() });

                self.scopes.enter_function();
                for param in params {
                    let param_def = self.defs.next();
                    self.scopes.declare(param, Binding::Var(param_def));
                }
                self.analyze_block(body);
                self.scopes.exit_scope();
            }
            Stmt::Expr(expr) => {
                self.analyze_expr(expr);
            }
            Stmt::Assign { target, value, .. } => {
                self.analyze_assign_target(target);
                self.analyze_expr(value);
            }
            Stmt::Block(stmts, _) => self.analyze_block(stmts),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                self.analyze_expr(cond);
                self.analyze_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyze_block(else_branch);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.analyze_expr(cond);
                self.loop_depth += 1;
                self.analyze_block(body);
                self.loop_depth -= 1;
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.analyze_expr(value);
                }
            }
            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.handler.report(LocksError::syntax("'break' outside of a loop", span.line, span.column));
                }
            }
            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.handler
                        .report(LocksError::syntax("'continue' outside of a loop", span.line, span.column));
                }
            }
        }
    }

    fn analyze_assign_target(&mut self, target: &AssignTarget) {
        match target {
            AssignTarget::Name(name) => {
                if self.scopes.resolve(name).is_none() {
                    self.handler.report(LocksError::name(format!("'{name}' is not defined"), 0));
                }
            }
            AssignTarget::Index { target, index } => {
                self.analyze_expr(target);
                self.analyze_expr(index);
            }
        }
    }

    /// Walks an expression, resolving names and checking call arity, and
    /// returns its coarse type tag so arithmetic operands can be compared.
    /// `variable`/`call` results are opaque — the analyzer never rejects an
    /// operation just because one side isn't known until runtime.
    fn analyze_expr(&mut self, expr: &Expr) -> TypeTag {
        match expr {
            Expr::Integer(..) | Expr::Double(..) => TypeTag::Number,
            Expr::Str(..) => TypeTag::String,
            Expr::Bool(..) => TypeTag::Boolean,
            Expr::Nil(..) => TypeTag::Nil,
            Expr::Array(elements, _) => {
                for e in elements {
                    self.analyze_expr(e);
                }
                TypeTag::Array
            }
            Expr::Identifier(name, span) => match self.scopes.resolve(name) {
                Some(Binding::Var(_)) => TypeTag::Opaque,
                Some(Binding::Fun { .. }) => TypeTag::Function,
                None => {
                    self.handler.report(LocksError::name(format!("'{name}' is not defined"), span.line));
                    TypeTag::Opaque
                }
            },
            Expr::Unary { op, expr, .. } => {
                let tag = self.analyze_expr(expr);
                match op {
                    UnOp::Negate => tag,
                    UnOp::Not => TypeTag::Opaque,
                }
            }
            Expr::Binary { op, left, right, span } => {
                let left_tag = self.analyze_expr(left);
                let right_tag = self.analyze_expr(right);
                if is_arithmetic(*op) {
                    self.check_arithmetic_operands(*op, left_tag, right_tag, span.line);
                }
                left_tag
            }
            Expr::Logical { left, right, .. } => {
                let left_tag = self.analyze_expr(left);
                self.analyze_expr(right);
                left_tag
            }
            Expr::Index { target, index, .. } => {
                self.analyze_expr(target);
                self.analyze_expr(index);
                TypeTag::Opaque
            }
            Expr::Call { callee, args, span } => {
                for arg in args {
                    self.analyze_expr(arg);
                }
                match self.scopes.resolve(callee) {
                    Some(Binding::Fun { arity, .. }) => {
                        if arity != args.len() {
                            self.handler.report(LocksError::type_err(format!(
                                "'{callee}' takes {arity} argument(s) but {} were given",
                                args.len()
                            )));
                        }
                    }
                    Some(Binding::Var(_)) => {
                        self.handler.report(LocksError::type_err(format!("'{callee}' is not a function")));
                    }
                    None => self.handler.report(LocksError::name(format!("'{callee}' is not defined"), span.line)),
                }
                TypeTag::Opaque
            }
        }
    }

    /// Arithmetic nodes compare their operands' tags and raise `TypeErr` on
    /// a literal-vs-literal mismatch; either side being `Opaque` (unknown
    /// until runtime) is left for the interpreter to catch.
    fn check_arithmetic_operands(&mut self, op: BinOp, left: TypeTag, right: TypeTag, line: u32) {
        if left == TypeTag::Opaque || right == TypeTag::Opaque {
            return;
        }
        if left != right {
            self.handler.report(LocksError::type_err(format!(
                "cannot apply '{}' to '{}' and '{}' (line {line})",
                op_symbol(op),
                tag_name(left),
                tag_name(right)
            )));
        }
    }
}

fn is_arithmetic(op: BinOp) -> bool {
    matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod)
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::NotEq => "!=",
        BinOp::Lt => "<",
        BinOp::LtEq => "<=",
        BinOp::Gt => ">",
        BinOp::GtEq => ">=",
    }
}

fn tag_name(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Number => "number",
        TypeTag::String => "string",
        TypeTag::Boolean => "boolean",
        TypeTag::Nil => "nil",
        TypeTag::Array => "array",
        TypeTag::Function => "function",
        TypeTag::Opaque => "variable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_lex::Lexer;
    use lockc_par::Parser;
    use lockc_util::SourceMap;

    fn analyze(src: &str) -> Handler {
        let mut map = SourceMap::new();
        let file = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        let program = Parser::new(tokens, &mut handler).parse_program();
        SemanticAnalyzer::new(&mut handler).analyze(&program);
        handler
    }

    #[test]
    fn undefined_name_is_a_name_error() {
        let handler = analyze("println(x);");
        assert!(handler.had_error());
        assert!(matches!(handler.diagnostics()[0].error, LocksError::Name { .. }));
    }

    #[test]
    fn arity_mismatch_is_a_type_error() {
        let handler = analyze("fun id(a, b) { return a; } id(1);");
        assert!(handler.had_error());
        assert!(matches!(handler.diagnostics()[0].error, LocksError::Type { .. }));
    }

    #[test]
    fn calling_a_variable_is_a_type_error() {
        let handler = analyze("var x = 1; x();");
        assert!(handler.had_error());
        assert!(matches!(handler.diagnostics()[0].error, LocksError::Type { .. }));
    }

    #[test]
    fn adding_a_string_literal_to_a_bool_literal_is_a_type_error() {
        let handler = analyze("var x = \"a\" + true;");
        assert!(handler.had_error());
        assert!(matches!(handler.diagnostics()[0].error, LocksError::Type { .. }));
    }

    #[test]
    fn arithmetic_between_two_numbers_is_fine() {
        let handler = analyze("var x = 1 + 2;");
        assert!(!handler.had_error());
    }

    #[test]
    fn arithmetic_against_a_variable_is_never_flagged_by_the_analyzer() {
        let handler = analyze("var x = 1; var y = x + true;");
        assert!(!handler.had_error());
    }

    #[test]
    fn comparing_a_string_to_a_number_is_not_flagged() {
        let handler = analyze("var x = \"a\" == 1;");
        assert!(!handler.had_error());
    }

    #[test]
    fn variable_declared_inside_if_is_visible_after_it() {
        let handler = analyze("fun f() { if (true) { var y = 5; } return y; }");
        assert!(!handler.had_error());
    }

    #[test]
    fn redeclaring_a_variable_in_the_same_scope_errors() {
        let handler = analyze("var x = 1; var x = 2;");
        assert!(handler.had_error());
    }

    #[test]
    fn break_outside_loop_errors() {
        let handler = analyze("break;");
        assert!(handler.had_error());
    }

    #[test]
    fn nested_loop_break_is_fine() {
        let handler = analyze("while (true) { while (true) { break; } break; }");
        assert!(!handler.had_error());
    }
}
