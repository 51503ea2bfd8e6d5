//! Lowers an analyzed AST to the textual intermediate representation the
//! assembler consumes.
//!
//! Top-level variables are tracked by name as they're declared and always
//! addressed through `LOAD_GLOBAL`/`STORE_GLOBAL`, regardless of which
//! function later reads them; every other name is `LOAD_LOCAL`/
//! `STORE_LOCAL` against the currently-compiling function's own frame.
//! This is a stricter version of the source interpreter's name resolution:
//! the VM has no notion of walking a caller's locals, only a fixed set of
//! globals declared in the top-level script body plus each function's own
//! parameters and locals.

use crate::ir::{Constant, IrFunction, IrModule};
use lockc_par::ast::*;
use lockc_sem::BUILTINS;
use rustc_hash::FxHashSet;

pub fn compile(program: &Program) -> IrModule {
    let mut c = Compiler::new();
    c.compile_program(program);
    c.finish()
}

struct Compiler {
    constants: Vec<Constant>,
    functions: Vec<IrFunction>,
    current_fn: usize,
    global_vars: FxHashSet<String>,
    label_ctr: u32,
    loop_stack: Vec<(String, String)>,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            constants: Vec::new(),
            functions: vec![IrFunction { name: "main".to_string(), argc: 0, lines: Vec::new() }],
            current_fn: 0,
            global_vars: FxHashSet::default(),
            label_ctr: 0,
            loop_stack: Vec::new(),
        }
    }

    fn finish(self) -> IrModule {
        let mut functions = self.functions;
        functions[0].lines.push("END".to_string());
        IrModule { constants: self.constants, functions }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.functions[self.current_fn].lines.push(line.into());
    }

    fn label(&mut self, text: impl Into<String>) {
        self.functions[self.current_fn].lines.push(format!(".{}", text.into()));
    }

    fn add_constant(&mut self, c: Constant) -> usize {
        self.constants.push(c);
        self.constants.len() - 1
    }

    fn generate_label(&mut self) -> String {
        let label = format!("L{}", self.label_ctr);
        self.label_ctr += 1;
        label
    }

    fn is_main(&self) -> bool {
        self.current_fn == 0
    }

    fn compile_program(&mut self, program: &Program) {
        self.compile_block(program);
    }

    fn compile_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.compile_stmt(stmt);
        }
    }

    fn compile_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, init, .. } => {
                match init {
                    Some(expr) => self.compile_expr(expr),
                    None => self.emit("LOAD_NIL"),
                }
                if self.is_main() {
                    self.global_vars.insert(name.clone());
                    self.emit(format!("STORE_GLOBAL {name}"));
                } else {
                    self.emit(format!("STORE_LOCAL {name}"));
                }
            }
            Stmt::FunDecl { name, params, body, .. } => self.compile_fun_decl(name, params, body),
            Stmt::Expr(expr) => self.compile_expr(expr),
            Stmt::Assign { target, value, .. } => {
                self.compile_expr(value);
                match target {
                    AssignTarget::Name(name) => {
                        if self.global_vars.contains(name) {
                            self.emit(format!("STORE_GLOBAL {name}"));
                        } else {
                            self.emit(format!("STORE_LOCAL {name}"));
                        }
                    }
                    AssignTarget::Index { target, index } => {
                        self.compile_expr(target);
                        self.compile_expr(index);
                        self.emit("STORE_SUBSCR");
                    }
                }
            }
            Stmt::Block(stmts, _) => self.compile_block(stmts),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                let end_if = self.generate_label();
                let skip_then = self.generate_label();
                self.compile_expr(cond);
                self.emit(format!("POP_JMP_IF_FALSE {skip_then}"));
                self.compile_block(then_branch);
                self.emit(format!("GOTO {end_if}"));
                self.label(skip_then);
                if let Some(else_branch) = else_branch {
                    self.compile_block(else_branch);
                }
                self.label(end_if);
            }
            Stmt::While { cond, body, .. } => {
                let loop_start = self.generate_label();
                let loop_end = self.generate_label();
                self.label(loop_start.clone());
                self.compile_expr(cond);
                self.emit(format!("POP_JMP_IF_FALSE {loop_end}"));
                self.loop_stack.push((loop_start.clone(), loop_end.clone()));
                self.compile_block(body);
                self.loop_stack.pop();
                self.emit(format!("GOTO {loop_start}"));
                self.label(loop_end);
            }
            Stmt::Return { value, .. } => {
                match value {
                    Some(expr) => self.compile_expr(expr),
                    None => self.emit("LOAD_NIL"),
                }
                self.emit("RETURN_VALUE");
            }
            Stmt::Break(_) => {
                let (_, end) = self.loop_stack.last().expect("break outside a loop").clone();
                self.emit(format!("GOTO {end}"));
            }
            Stmt::Continue(_) => {
                let (start, _) = self.loop_stack.last().expect("continue outside a loop").clone();
                self.emit(format!("GOTO {start}"));
            }
        }
    }

    fn compile_fun_decl(&mut self, name: &str, params: &[String], body: &[Stmt]) {
        self.functions.push(IrFunction { name: name.to_string(), argc: params.len(), lines: Vec::new() });
        let outer_fn = self.current_fn;
        self.current_fn = self.functions.len() - 1;
        let outer_loops = std::mem::take(&mut self.loop_stack);

        for param in params {
            self.emit(format!("STORE_LOCAL {param}"));
        }
        self.compile_block(body);

        if !self.functions[self.current_fn].lines.iter().any(|l| l == "RETURN_VALUE") {
            self.emit("LOAD_NIL");
            self.emit("RETURN_VALUE");
        }

        self.loop_stack = outer_loops;
        self.current_fn = outer_fn;
    }

    fn compile_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Integer(i, _) => {
                if (0..256).contains(i) {
                    self.emit(format!("BIPUSH {i}"));
                } else {
                    let idx = self.add_constant(Constant::Int(*i));
                    self.emit(format!("LOAD_CONST {idx}"));
                }
            }
            Expr::Double(_, text, _) => {
                let idx = self.add_constant(Constant::Double(text.clone()));
                self.emit(format!("LOAD_CONST {idx}"));
            }
            Expr::Str(s, _) => {
                let idx = self.add_constant(Constant::Str(s.clone()));
                self.emit(format!("LOAD_CONST {idx}"));
            }
            Expr::Bool(true, _) => self.emit("LOAD_TRUE"),
            Expr::Bool(false, _) => self.emit("LOAD_FALSE"),
            Expr::Nil(_) => self.emit("LOAD_NIL"),
            Expr::Array(elements, _) => {
                for e in elements {
                    self.compile_expr(e);
                }
                self.emit(format!("BUILD_LIST {}", elements.len()));
            }
            Expr::Identifier(name, _) => {
                if self.global_vars.contains(name) {
                    self.emit(format!("LOAD_GLOBAL {name}"));
                } else {
                    self.emit(format!("LOAD_LOCAL {name}"));
                }
            }
            Expr::Unary { op: UnOp::Negate, expr, .. } => match &**expr {
                // Constant-fold literal negation so `-5` doesn't cost a
                // runtime UNARY_NEGATIVE over a freshly pushed constant.
                Expr::Integer(i, _) => {
                    let idx = self.add_constant(Constant::Int(-i));
                    self.emit(format!("LOAD_CONST {idx}"));
                }
                Expr::Double(_, text, _) => {
                    let idx = self.add_constant(Constant::Double(format!("-{text}")));
                    self.emit(format!("LOAD_CONST {idx}"));
                }
                other => {
                    self.compile_expr(other);
                    self.emit("UNARY_NEGATIVE");
                }
            },
            Expr::Unary { op: UnOp::Not, expr, .. } => {
                self.compile_expr(expr);
                self.emit("UNARY_NOT");
            }
            Expr::Binary { op, left, right, .. } => {
                self.compile_expr(left);
                self.compile_expr(right);
                self.emit(binary_opcode(*op));
            }
            Expr::Logical { op: LogicOp::And, left, right, .. } => {
                self.compile_expr(left);
                self.compile_expr(right);
                self.emit("BINARY_AND");
            }
            Expr::Logical { op: LogicOp::Or, left, right, .. } => {
                self.compile_expr(left);
                self.compile_expr(right);
                self.emit("BINARY_OR");
            }
            Expr::Index { target, index, .. } => {
                self.compile_expr(target);
                self.compile_expr(index);
                self.emit("BINARY_SUBSCR");
            }
            Expr::Call { callee, args, .. } => {
                for a in args {
                    self.compile_expr(a);
                }
                if let Some(idx) = BUILTINS.iter().position(|b| b == callee) {
                    self.emit(format!("CALL_NATIVE {idx}"));
                } else {
                    self.emit(format!("CALL_FUNCTION {callee}"));
                }
            }
        }
    }
}

fn binary_opcode(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "BINARY_ADD",
        BinOp::Sub => "BINARY_SUBTRACT",
        BinOp::Mul => "BINARY_MULTIPLY",
        BinOp::Div => "BINARY_DIVIDE",
        BinOp::Mod => "BINARY_MODULO",
        BinOp::Eq => "CMPEQ",
        BinOp::NotEq => "CMPNE",
        BinOp::Lt => "CMPLT",
        BinOp::LtEq => "CMPLE",
        BinOp::Gt => "CMPGT",
        BinOp::GtEq => "CMPGE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_lex::Lexer;
    use lockc_par::Parser;
    use lockc_util::{FileId, Handler, SourceMap};

    fn parse(src: &str) -> Program {
        let mut map = SourceMap::new();
        let file: FileId = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        Parser::new(tokens, &mut handler).parse_program()
    }

    #[test]
    fn top_level_var_uses_global_opcodes() {
        let module = compile(&parse("var x = 1; x = 2;"));
        let main = &module.functions[0];
        assert!(main.lines.iter().any(|l| l.starts_with("STORE_GLOBAL x")));
        assert!(main.lines.iter().any(|l| l.starts_with("LOAD_GLOBAL x") || l.starts_with("STORE_GLOBAL x")));
    }

    #[test]
    fn function_params_are_locals() {
        let module = compile(&parse("fun f(a) { return a; }"));
        let f = module.functions.iter().find(|f| f.name == "f").unwrap();
        assert!(f.lines.iter().any(|l| l == "STORE_LOCAL a"));
        assert!(f.lines.iter().any(|l| l == "LOAD_LOCAL a"));
    }

    #[test]
    fn missing_return_gets_implicit_nil() {
        let module = compile(&parse("fun f() { var x = 1; }"));
        let f = module.functions.iter().find(|f| f.name == "f").unwrap();
        assert_eq!(f.lines.last().unwrap(), "RETURN_VALUE");
    }

    #[test]
    fn break_jumps_to_loop_end_label() {
        let module = compile(&parse("while (true) { break; }"));
        let main = &module.functions[0];
        let goto_lines: Vec<&String> = main.lines.iter().filter(|l| l.starts_with("GOTO")).collect();
        assert!(!goto_lines.is_empty());
    }

    #[test]
    fn builtin_call_uses_call_native() {
        let module = compile(&parse("println(\"hi\");"));
        let main = &module.functions[0];
        assert!(main.lines.iter().any(|l| l.starts_with("CALL_NATIVE 1")));
    }

    #[test]
    fn negative_integer_literal_is_constant_folded() {
        let module = compile(&parse("var x = -5;"));
        let main = &module.functions[0];
        assert!(!main.lines.iter().any(|l| l == "UNARY_NEGATIVE"));
    }
}
