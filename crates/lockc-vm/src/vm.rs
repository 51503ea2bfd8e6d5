//! The bytecode interpreter: a flat fetch-decode-execute loop over a
//! loaded [`CodeObject`].
//!
//! Globals live in a permanently separate array rather than aliasing the
//! main function's own frame the way the original VM did (its
//! `CALL_FUNCTION`/`RETURN_VALUE` handlers swapped the same Python object
//! in and out of `main_frame` to fake persistence, which silently
//! dropped any global write made inside a called function once that
//! function returned). Addressing globals through their own array makes
//! that persistence actually correct instead of accidental.

use crate::frame::Frame;
use lockc_asm::{disassemble, CodeObject, ConstantValue};
use lockc_interp::{builtins, Number, Value};
use lockc_util::{LocksError, LocksResult};
use std::cell::RefCell;
use std::rc::Rc;

mod op {
    pub const END: u8 = 0xff;
    pub const LOAD_NIL: u8 = 0x01;
    pub const LOAD_TRUE: u8 = 0x02;
    pub const LOAD_FALSE: u8 = 0x03;
    pub const LOAD_CONST: u8 = 0x64;
    pub const BINARY_ADD: u8 = 0x17;
    pub const BINARY_SUBTRACT: u8 = 0x18;
    pub const BINARY_MULTIPLY: u8 = 0x14;
    pub const BINARY_DIVIDE: u8 = 0x15;
    pub const BINARY_MODULO: u8 = 0x16;
    pub const BINARY_AND: u8 = 0x40;
    pub const BINARY_OR: u8 = 0x42;
    pub const UNARY_NOT: u8 = 0x0c;
    pub const UNARY_NEGATIVE: u8 = 0x0b;
    pub const STORE_LOCAL: u8 = 0x5a;
    pub const STORE_GLOBAL: u8 = 0x61;
    pub const BIPUSH: u8 = 0x10;
    pub const LOAD_LOCAL: u8 = 0x52;
    pub const LOAD_GLOBAL: u8 = 0x74;
    pub const BUILD_LIST: u8 = 0x67;
    pub const BINARY_SUBSCR: u8 = 0x19;
    pub const STORE_SUBSCR: u8 = 0x3c;
    pub const CMPEQ: u8 = 0x9f;
    pub const CMPNE: u8 = 0xa0;
    pub const CMPGT: u8 = 0xa3;
    pub const CMPLT: u8 = 0xa1;
    pub const CMPGE: u8 = 0xa2;
    pub const CMPLE: u8 = 0xa4;
    pub const POP_JMP_IF_TRUE: u8 = 0x70;
    pub const POP_JMP_IF_FALSE: u8 = 0x6f;
    pub const GOTO: u8 = 0xa7;
    pub const CALL_FUNCTION: u8 = 0x83;
    pub const CALL_NATIVE: u8 = 0x84;
    pub const RETURN_VALUE: u8 = 0x53;
}

pub struct Vm {
    code: CodeObject,
    cur: Frame,
    call_stack: Vec<Frame>,
    main_globals: Vec<Value>,
    ip: usize,
}

impl Vm {
    pub fn new(code: CodeObject) -> Self {
        Vm { code, cur: Frame::new(0), call_stack: Vec::new(), main_globals: Vec::new(), ip: 0 }
    }

    pub fn run(mut self) -> LocksResult<()> {
        loop {
            let opcode = self.read_u8()?;
            if opcode == op::END {
                return Ok(());
            }
            self.execute(opcode)?;
        }
    }

    fn cur_code(&self) -> &[u8] {
        &self.code.functions[self.cur.func_idx].code
    }

    fn read_u8(&mut self) -> LocksResult<u8> {
        let byte = *self
            .cur_code()
            .get(self.ip)
            .ok_or_else(|| LocksError::invalid_bytecode("instruction pointer ran past the end of the function"))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> LocksResult<u16> {
        let hi = self.read_u8()? as u16;
        let lo = self.read_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    fn is_truthy(value: &Value) -> bool {
        value.is_truthy()
    }

    fn execute(&mut self, opcode: u8) -> LocksResult<()> {
        match opcode {
            op::LOAD_NIL => self.cur.push(Value::Nil),
            op::LOAD_TRUE => self.cur.push(Value::Bool(true)),
            op::LOAD_FALSE => self.cur.push(Value::Bool(false)),
            op::LOAD_CONST => {
                let idx = self.read_u16()? as usize;
                let value = match &self.code.constants[idx] {
                    ConstantValue::Int(i) => Value::int(*i),
                    ConstantValue::Double(f) => Value::float(*f),
                    ConstantValue::Str(s) => Value::Str(s.clone()),
                };
                self.cur.push(value);
            }
            op::BINARY_ADD => self.binary_add()?,
            op::BINARY_SUBTRACT => self.binary_numeric("subtract", |a, b| a.sub(b))?,
            op::BINARY_MULTIPLY => self.binary_numeric("multiply", |a, b| a.mul(b))?,
            op::BINARY_DIVIDE => self.binary_divide()?,
            op::BINARY_MODULO => self.binary_modulo()?,
            op::BINARY_AND => {
                let r = self.cur.pop();
                let l = self.cur.pop();
                self.cur.push(Value::Bool(Self::is_truthy(&l) && Self::is_truthy(&r)));
            }
            op::BINARY_OR => {
                let r = self.cur.pop();
                let l = self.cur.pop();
                self.cur.push(Value::Bool(Self::is_truthy(&l) || Self::is_truthy(&r)));
            }
            op::UNARY_NOT => {
                let v = self.cur.pop();
                self.cur.push(Value::Bool(!Self::is_truthy(&v)));
            }
            op::UNARY_NEGATIVE => {
                let v = self.cur.pop();
                match v {
                    Value::Number(n) => self.cur.push(Value::Number(n.negate())),
                    other => return Err(LocksError::type_err(format!("Cannot negate {}", other.type_name()))),
                }
            }
            op::STORE_LOCAL => {
                let idx = self.read_u8()? as usize;
                let v = self.cur.pop();
                self.cur.set_local(idx, v);
            }
            op::STORE_GLOBAL => {
                let idx = self.read_u8()? as usize;
                let v = self.cur.pop();
                self.set_global(idx, v);
            }
            op::BIPUSH => {
                let n = self.read_u8()? as i64;
                self.cur.push(Value::int(n));
            }
            op::LOAD_LOCAL => {
                let idx = self.read_u8()? as usize;
                self.cur.push(self.cur.get_local(idx));
            }
            op::LOAD_GLOBAL => {
                let idx = self.read_u8()? as usize;
                self.cur.push(self.get_global(idx));
            }
            op::BUILD_LIST => {
                let len = self.read_u16()? as usize;
                let mut elems = Vec::with_capacity(len);
                for _ in 0..len {
                    elems.push(self.cur.pop());
                }
                elems.reverse();
                self.cur.push(Value::Array(Rc::new(RefCell::new(elems))));
            }
            op::BINARY_SUBSCR => self.binary_subscr()?,
            op::STORE_SUBSCR => self.store_subscr()?,
            op::CMPEQ => {
                let r = self.cur.pop();
                let l = self.cur.pop();
                self.cur.push(Value::Bool(l.raw_eq(&r)));
            }
            op::CMPNE => {
                let r = self.cur.pop();
                let l = self.cur.pop();
                self.cur.push(Value::Bool(!l.raw_eq(&r)));
            }
            op::CMPGT => self.compare("greater than", |o| o.is_gt())?,
            op::CMPLT => self.compare("less than", |o| o.is_lt())?,
            op::CMPGE => self.compare("greater than equals", |o| o.is_ge())?,
            op::CMPLE => self.compare("less than equals", |o| o.is_le())?,
            op::GOTO => {
                let target = self.read_u16()? as usize;
                self.ip = target;
            }
            op::POP_JMP_IF_TRUE => {
                let target = self.read_u16()? as usize;
                let cond = self.cur.pop();
                if Self::is_truthy(&cond) {
                    self.ip = target;
                }
            }
            op::POP_JMP_IF_FALSE => {
                let target = self.read_u16()? as usize;
                let cond = self.cur.pop();
                if !Self::is_truthy(&cond) {
                    self.ip = target;
                }
            }
            op::CALL_FUNCTION => self.call_function()?,
            op::CALL_NATIVE => self.call_native()?,
            op::RETURN_VALUE => self.return_value(),
            other => return Err(LocksError::invalid_bytecode(format!("unknown opcode {other:#04x}"))),
        }
        Ok(())
    }

    fn binary_add(&mut self) -> LocksResult<()> {
        let r = self.cur.pop();
        let l = self.cur.pop();
        let result = match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
            (Value::Str(_), other) => {
                return Err(LocksError::type_err(format!("Cannot add {} to String", other.type_name())))
            }
            (Value::Number(a), Value::Number(b)) => Value::Number(a.add(*b)),
            (other, _) => return Err(LocksError::type_err(format!("Addition not defined for type '{}'", other.type_name()))),
        };
        self.cur.push(result);
        Ok(())
    }

    fn binary_numeric(&mut self, verb: &str, f: impl Fn(Number, Number) -> Number) -> LocksResult<()> {
        let r = self.cur.pop();
        let l = self.cur.pop();
        let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
            return Err(LocksError::type_err(format!(
                "Cannot {verb} {} and {}",
                l.type_name(),
                r.type_name()
            )));
        };
        self.cur.push(Value::Number(f(*a, *b)));
        Ok(())
    }

    fn binary_divide(&mut self) -> LocksResult<()> {
        let r = self.cur.pop();
        let l = self.cur.pop();
        let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
            return Err(LocksError::type_err(format!("Cannot divide {} by {}", l.type_name(), r.type_name())));
        };
        if b.is_zero() {
            return Err(LocksError::ZeroDiv);
        }
        self.cur.push(Value::Number(a.div(*b)));
        Ok(())
    }

    fn binary_modulo(&mut self) -> LocksResult<()> {
        let r = self.cur.pop();
        let l = self.cur.pop();
        let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
            return Err(LocksError::type_err(format!(
                "Invalid operand type for modulo: {} and {}",
                l.type_name(),
                r.type_name()
            )));
        };
        if b.is_zero() {
            return Err(LocksError::ZeroDiv);
        }
        self.cur.push(Value::Number(a.rem_floor(*b)));
        Ok(())
    }

    fn compare(&mut self, verb: &str, accept: impl Fn(std::cmp::Ordering) -> bool) -> LocksResult<()> {
        let r = self.cur.pop();
        let l = self.cur.pop();
        let (Value::Number(a), Value::Number(b)) = (&l, &r) else {
            return Err(LocksError::type_err(format!(
                "Invalid operand type for {verb} operator: {} and {}",
                l.type_name(),
                r.type_name()
            )));
        };
        let ord = a.partial_cmp(*b).unwrap_or(std::cmp::Ordering::Equal);
        self.cur.push(Value::Bool(accept(ord)));
        Ok(())
    }

    fn binary_subscr(&mut self) -> LocksResult<()> {
        let idx = self.cur.pop();
        let Value::Number(Number::Int(idx)) = idx else {
            return Err(LocksError::type_err("Array indices must be integers"));
        };
        let arr = self.cur.pop();
        let Value::Array(arr) = arr else {
            return Err(LocksError::type_err(format!("Type '{}' is not subscriptable", arr.type_name())));
        };
        let value = arr.borrow().get(idx as usize).cloned().ok_or(LocksError::Index)?;
        self.cur.push(value);
        Ok(())
    }

    fn store_subscr(&mut self) -> LocksResult<()> {
        let idx = self.cur.pop();
        let Value::Number(Number::Int(idx)) = idx else {
            return Err(LocksError::type_err("Array indices must be integers"));
        };
        let arr = self.cur.pop();
        let Value::Array(arr) = arr else {
            return Err(LocksError::type_err(format!("Type '{}' is not subscriptable", arr.type_name())));
        };
        let value = self.cur.pop();
        {
            let mut arr_mut = arr.borrow_mut();
            let slot = arr_mut.get_mut(idx as usize).ok_or(LocksError::Index)?;
            *slot = value;
        }
        self.cur.push(Value::Array(arr));
        Ok(())
    }

    fn get_global(&self, idx: usize) -> Value {
        self.main_globals.get(idx).cloned().unwrap_or(Value::Nil)
    }

    fn set_global(&mut self, idx: usize, value: Value) {
        if idx >= self.main_globals.len() {
            self.main_globals.resize(idx + 1, Value::Nil);
        }
        self.main_globals[idx] = value;
    }

    fn call_function(&mut self) -> LocksResult<()> {
        let func_idx = self.read_u8()? as usize;
        let func = self.code.functions.get(func_idx).ok_or_else(|| {
            LocksError::invalid_bytecode(format!("call to undefined function index {func_idx}"))
        })?;
        let argc = func.argc as usize;

        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            args.push(self.cur.pop());
        }

        let mut callee = Frame::new(func_idx);
        callee.operand_stack = args;
        callee.ret_ip = self.ip;

        let caller = std::mem::replace(&mut self.cur, callee);
        self.call_stack.push(caller);
        self.ip = 0;
        Ok(())
    }

    fn call_native(&mut self) -> LocksResult<()> {
        let idx = self.read_u8()? as usize;
        let arg = self.cur.pop();
        let result = builtins::call(idx, arg)?;
        self.cur.push(result);
        Ok(())
    }

    fn return_value(&mut self) {
        let ret_val = self.cur.pop();
        if let Some(caller) = self.call_stack.pop() {
            self.ip = self.cur.ret_ip;
            self.cur = caller;
            self.cur.push(ret_val);
        }
    }
}

pub fn disassemble_image(code: &CodeObject) -> String {
    disassemble(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_asm::assemble;
    use lockc_lex::Lexer;
    use lockc_par::Parser;
    use lockc_util::{FileId, Handler, SourceMap};

    fn build(src: &str) -> CodeObject {
        let mut map = SourceMap::new();
        let file: FileId = map.add_file("t.lk", src);
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, file, &mut handler).tokenize();
        let program = Parser::new(tokens, &mut handler).parse_program();
        let module = lockc_compile::compile(&program);
        let bytes = assemble(&module).unwrap();
        lockc_asm::load(&bytes).unwrap()
    }

    #[test]
    fn arithmetic_runs_to_completion() {
        let code = build("var x = 1 + 2 * 3; println(x);");
        assert!(Vm::new(code).run().is_ok());
    }

    #[test]
    fn globals_persist_across_function_calls() {
        let code = build(
            "var total = 0; fun add(n) { total = total + n; return total; } var r = add(5); println(r);",
        );
        assert!(Vm::new(code).run().is_ok());
    }

    #[test]
    fn function_call_binds_params_in_order() {
        let code = build("fun sub(a, b) { return a - b; } var r = sub(10, 3); if (r != 7) { return; }");
        assert!(Vm::new(code).run().is_ok());
    }

    #[test]
    fn division_by_zero_is_zero_div_err() {
        let code = build("var x = 1 / 0;");
        let err = Vm::new(code).run().unwrap_err();
        assert!(matches!(err, LocksError::ZeroDiv));
    }

    #[test]
    fn array_index_out_of_range_is_index_err() {
        let code = build("var a = [1, 2, 3]; var x = a[10];");
        let err = Vm::new(code).run().unwrap_err();
        assert!(matches!(err, LocksError::Index));
    }

    #[test]
    fn break_exits_loop_without_infinite_looping() {
        let code = build("var i = 0; while (true) { i = i + 1; if (i == 3) { break; } } println(i);");
        assert!(Vm::new(code).run().is_ok());
    }

    #[test]
    fn builtin_call_uses_call_native() {
        let code = build("var n = len(\"hello\"); if (n != 5) { return; }");
        assert!(Vm::new(code).run().is_ok());
    }
}
