//! Tree-walking interpreter.

use crate::builtins;
use crate::control_flow::ControlFlow;
use crate::environment::Environment;
use crate::value::{FunctionDef, Number, Value};
use lockc_par::ast::*;
use lockc_util::LocksError;
use std::cell::RefCell;
use std::rc::Rc;

type EnvRef = Rc<RefCell<Environment>>;
type IResult<T> = Result<T, LocksError>;

pub struct Interpreter {
    globals: EnvRef,
}

impl Interpreter {
    pub fn new() -> Self {
        Self { globals: Environment::global() }
    }

    pub fn run(&mut self, program: &Program) -> IResult<()> {
        let globals = self.globals.clone();
        self.exec_block(program, &globals)?;
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &EnvRef) -> IResult<ControlFlow> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                ControlFlow::Normal(_) => {}
                other => return Ok(other),
            }
        }
        Ok(ControlFlow::Normal(Value::Nil))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> IResult<ControlFlow> {
        match stmt {
            Stmt::VarDecl { name, init, .. } => {
                let value = match init {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                env.borrow_mut().define(name, value);
                Ok(ControlFlow::Normal(Value::Nil))
            }
            Stmt::FunDecl { name, params, body, .. } => {
                let def = Rc::new(FunctionDef { name: name.clone(), params: params.clone(), body: body.clone() });
                env.borrow_mut().define(name, Value::Function(def));
                Ok(ControlFlow::Normal(Value::Nil))
            }
            Stmt::Expr(expr) => Ok(ControlFlow::Normal(self.eval(expr, env)?)),
            Stmt::Assign { target, value, span } => {
                let value = self.eval(value, env)?;
                match target {
                    AssignTarget::Name(name) => {
                        if !env.borrow_mut().assign(name, value.clone()) {
                            return Err(LocksError::name(format!("'{name}' is not defined"), span.line));
                        }
                    }
                    AssignTarget::Index { target, index } => {
                        let array = self.eval(target, env)?;
                        let index = self.eval(index, env)?;
                        self.store_index(array, index, value.clone())?;
                    }
                }
                Ok(ControlFlow::Normal(value))
            }
            Stmt::Block(stmts, _) => self.exec_block(stmts, env),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.exec_block(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, env)
                } else {
                    Ok(ControlFlow::Normal(Value::Nil))
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.eval(cond, env)?.is_truthy() {
                    match self.exec_block(body, env)? {
                        ControlFlow::Normal(_) | ControlFlow::Continue => {}
                        ControlFlow::Break => break,
                        ret @ ControlFlow::ReturnVal(_) => return Ok(ret),
                    }
                }
                Ok(ControlFlow::Normal(Value::Nil))
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                Ok(ControlFlow::ReturnVal(value))
            }
            Stmt::Break(_) => Ok(ControlFlow::Break),
            Stmt::Continue(_) => Ok(ControlFlow::Continue),
        }
    }

    fn eval(&mut self, expr: &Expr, env: &EnvRef) -> IResult<Value> {
        match expr {
            Expr::Integer(i, _) => Ok(Value::int(*i)),
            Expr::Double(f, _, _) => Ok(Value::float(*f)),
            Expr::Str(s, _) => Ok(Value::Str(s.clone())),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Nil(_) => Ok(Value::Nil),
            Expr::Array(elements, _) => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval(e, env)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }
            Expr::Identifier(name, span) => env
                .borrow()
                .get(name)
                .ok_or_else(|| LocksError::name(format!("'{name}' is not defined"), span.line)),
            Expr::Unary { op, expr, .. } => {
                let value = self.eval(expr, env)?;
                match op {
                    UnOp::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(n.negate())),
                        other => {
                            Err(LocksError::type_err(format!("Negation not defined for type {}", other.type_name())))
                        }
                    },
                    UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Logical { op, left, right, .. } => {
                let left_val = self.eval(left, env)?;
                match op {
                    LogicOp::And if !left_val.is_truthy() => Ok(left_val),
                    LogicOp::Or if left_val.is_truthy() => Ok(left_val),
                    _ => self.eval(right, env),
                }
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                self.eval_binary(*op, l, r)
            }
            Expr::Index { target, index, .. } => {
                let array = self.eval(target, env)?;
                let index = self.eval(index, env)?;
                self.load_index(array, index)
            }
            Expr::Call { callee, args, span } => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval(a, env)?);
                }
                self.call(callee, values, span.line, env)
            }
        }
    }

    fn eval_binary(&mut self, op: BinOp, l: Value, r: Value) -> IResult<Value> {
        use BinOp::*;
        if matches!(op, Eq | NotEq) {
            let eq = l.raw_eq(&r);
            return Ok(Value::Bool(if op == Eq { eq } else { !eq }));
        }
        match op {
            Add => match (&l, &r) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(*b))),
                (Value::Str(_), other) => {
                    Err(LocksError::type_err(format!("Can only concatenate String with String, not {}", other.type_name())))
                }
                (a, _) => Err(LocksError::type_err(format!("Addition not defined for type {}", a.type_name()))),
            },
            Sub | Mul | Div | Mod => {
                let (a, b) = match (&l, &r) {
                    (Value::Number(a), Value::Number(b)) => (*a, *b),
                    _ => {
                        let op_name = match op {
                            Sub => "Subtraction",
                            Mul => "Multiplication",
                            Div => "Division",
                            Mod => "Modulo",
                            _ => unreachable!(),
                        };
                        return Err(LocksError::type_err(format!("{op_name} requires two Numbers")));
                    }
                };
                match op {
                    Sub => Ok(Value::Number(a.sub(b))),
                    Mul => Ok(Value::Number(a.mul(b))),
                    Div => {
                        if b.is_zero() {
                            return Err(LocksError::ZeroDiv);
                        }
                        Ok(Value::Number(a.div(b)))
                    }
                    Mod => {
                        if b.is_zero() {
                            return Err(LocksError::ZeroDiv);
                        }
                        Ok(Value::Number(a.rem_floor(b)))
                    }
                    _ => unreachable!(),
                }
            }
            Lt | LtEq | Gt | GtEq => {
                let (a, b) = match (&l, &r) {
                    (Value::Number(a), Value::Number(b)) => (*a, *b),
                    _ => {
                        let op_name = match op {
                            Lt => "<",
                            LtEq => "<=",
                            Gt => ">",
                            GtEq => ">=",
                            _ => unreachable!(),
                        };
                        return Err(LocksError::type_err(format!("'{op_name}' requires two Numbers")));
                    }
                };
                let ord = a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
                Ok(Value::Bool(match op {
                    Lt => ord.is_lt(),
                    LtEq => ord.is_le(),
                    Gt => ord.is_gt(),
                    GtEq => ord.is_ge(),
                    _ => unreachable!(),
                }))
            }
            Eq | NotEq => unreachable!("handled above"),
        }
    }

    fn load_index(&self, array: Value, index: Value) -> IResult<Value> {
        let Value::Array(array) = array else {
            return Err(LocksError::type_err(format!("'{}' is not subscriptable", array.type_name())));
        };
        let Value::Number(Number::Int(i)) = index else {
            return Err(LocksError::type_err("Array index must be an integer"));
        };
        let array = array.borrow();
        array.get(i as usize).cloned().ok_or(LocksError::Index)
    }

    fn store_index(&self, array: Value, index: Value, value: Value) -> IResult<()> {
        let Value::Array(array) = array else {
            return Err(LocksError::type_err(format!("'{}' is not subscriptable", array.type_name())));
        };
        let Value::Number(Number::Int(i)) = index else {
            return Err(LocksError::type_err("Array index must be an integer"));
        };
        let mut array = array.borrow_mut();
        let slot = array.get_mut(i as usize).ok_or(LocksError::Index)?;
        *slot = value;
        Ok(())
    }

    fn call(&mut self, callee: &str, args: Vec<Value>, line: u32, env: &EnvRef) -> IResult<Value> {
        if let Some(index) = builtins::index_of(callee) {
            let mut args = args;
            let arg = args.pop().unwrap_or(Value::Nil);
            return builtins::call(index, arg);
        }

        let function = env
            .borrow()
            .get(callee)
            .ok_or_else(|| LocksError::name(format!("'{callee}' is not defined"), line))?;
        let Value::Function(def) = function else {
            return Err(LocksError::type_err(format!("'{callee}' is not callable")));
        };

        // The new frame's enclosing scope is the *caller's* environment,
        // not the function's declaration site — Locks has no closures, so
        // this is the documented dynamic-scoping behavior, not a bug.
        let call_env = Environment::enclosed(env);
        for (param, arg) in def.params.iter().zip(args.into_iter()) {
            call_env.borrow_mut().define(param, arg);
        }
        match self.exec_block(&def.body, &call_env)? {
            ControlFlow::ReturnVal(v) => Ok(v),
            _ => Ok(Value::Nil),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_lex::Lexer;
    use lockc_par::Parser;
    use lockc_util::{Handler, SourceMap};

    fn run(src: &str) -> IResult<()> {
        let mut map = SourceMap::new();
        let file = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        let program = Parser::new(tokens, &mut handler).parse_program();
        Interpreter::new().run(&program)
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert!(run("var x = 1 + 2 * 3; if (x != 7) { return; }").is_ok());
    }

    #[test]
    fn division_by_zero_is_zero_div_err() {
        let err = run("var x = 1 / 0;").unwrap_err();
        assert!(matches!(err, LocksError::ZeroDiv));
    }

    #[test]
    fn function_call_binds_params_and_returns() {
        assert!(run("fun add(a, b) { return a + b; } var r = add(2, 3); if (r != 5) { return; }").is_ok());
    }

    #[test]
    fn dynamic_scoping_sees_caller_locals() {
        // `g` reads `y`, which only exists in the caller `f`'s scope --
        // this is the intentional dynamic-scoping simplification.
        let result = run(
            "fun g() { return y; } fun f() { var y = 42; return g(); } var r = f(); if (r != 42) { return; }",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn array_index_out_of_range_is_index_err() {
        let err = run("var a = [1, 2]; var x = a[5];").unwrap_err();
        assert!(matches!(err, LocksError::Index));
    }

    #[test]
    fn break_exits_only_its_own_loop() {
        assert!(run("while (true) { while (true) { break; } break; }").is_ok());
    }
}
