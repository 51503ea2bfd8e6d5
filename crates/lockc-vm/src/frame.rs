//! A call's activation record: its own operand stack and local-variable
//! slots, which function it's executing, and where to resume the caller
//! once it returns.

use lockc_interp::Value;

#[derive(Debug, Default)]
pub struct Frame {
    pub func_idx: usize,
    pub locals: Vec<Value>,
    pub operand_stack: Vec<Value>,
    pub ret_ip: usize,
}

impl Frame {
    pub fn new(func_idx: usize) -> Self {
        Frame { func_idx, locals: Vec::new(), operand_stack: Vec::new(), ret_ip: 0 }
    }

    pub fn get_local(&self, idx: usize) -> Value {
        self.locals.get(idx).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_local(&mut self, idx: usize, value: Value) {
        if idx >= self.locals.len() {
            self.locals.resize(idx + 1, Value::Nil);
        }
        self.locals[idx] = value;
    }

    pub fn push(&mut self, v: Value) {
        self.operand_stack.push(v);
    }

    pub fn pop(&mut self) -> Value {
        self.operand_stack.pop().expect("operand stack underflow")
    }
}
