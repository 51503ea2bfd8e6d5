//! Explicit control-flow propagation.
//!
//! The original interpreter threaded `break`/`continue`/`return` through
//! sentinel string values returned alongside normal results, which could
//! silently misfire past nested loops or from inside a function body that
//! reused the same sentinel text as a string literal. This enum makes the
//! four outcomes a statement can produce exhaustive and impossible to
//! confuse with an ordinary value.

use crate::value::Value;

#[derive(Debug, Clone)]
pub enum ControlFlow {
    Normal(Value),
    Continue,
    Break,
    ReturnVal(Value),
}
