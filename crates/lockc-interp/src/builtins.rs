//! The seven built-in functions, indices 0-6, shared by the tree-walking
//! interpreter and the VM's `CALL_NATIVE`. Every one takes exactly one
//! argument; arity beyond that is rejected earlier, in semantic analysis.
//!
//! `len`/`int`/`isinteger` raise proper `TypeErr`/`ValueErr` here — this
//! matches the original's actually-wired-up standard library, not its
//! earlier, looser draft.

use crate::value::{Number, Value};
use lockc_util::LocksError;
use std::io::Write;

pub const NAMES: [&str; 7] = ["print", "println", "input", "len", "int", "str", "isinteger"];

pub fn arity(_name: &str) -> usize {
    1
}

pub fn index_of(name: &str) -> Option<usize> {
    NAMES.iter().position(|n| *n == name)
}

pub fn call(index: usize, arg: Value) -> Result<Value, LocksError> {
    match index {
        0 => print(arg),
        1 => println(arg),
        2 => input(arg),
        3 => len(arg),
        4 => int(arg),
        5 => str_(arg),
        6 => isinteger(arg),
        _ => unreachable!("builtin index out of range"),
    }
}

fn print(arg: Value) -> Result<Value, LocksError> {
    print!("{}", arg.display_string());
    std::io::stdout().flush().ok();
    Ok(Value::Nil)
}

fn println(arg: Value) -> Result<Value, LocksError> {
    println!("{}", arg.display_string());
    Ok(Value::Nil)
}

fn input(arg: Value) -> Result<Value, LocksError> {
    print!("{}", arg.display_string());
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok();
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::Str(line))
}

fn len(arg: Value) -> Result<Value, LocksError> {
    match arg {
        Value::Str(s) => Ok(Value::int(s.chars().count() as i64)),
        Value::Array(a) => Ok(Value::int(a.borrow().len() as i64)),
        other => Err(LocksError::type_err(format!(
            "Invalid argument type for len, '{}'",
            other.type_name()
        ))),
    }
}

fn int(arg: Value) -> Result<Value, LocksError> {
    match arg {
        Value::Number(Number::Int(i)) => Ok(Value::int(i)),
        Value::Number(Number::Float(f)) => Ok(Value::int(f as i64)),
        Value::Bool(b) => Ok(Value::int(if b { 1 } else { 0 })),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::int)
            .map_err(|_| LocksError::value(format!("Invalid literal for conversion to int, '{s}'"))),
        other => Err(LocksError::value(format!(
            "Invalid argument type for int, '{}'",
            other.type_name()
        ))),
    }
}

fn str_(arg: Value) -> Result<Value, LocksError> {
    Ok(Value::Str(arg.canonical_string()))
}

fn isinteger(arg: Value) -> Result<Value, LocksError> {
    match arg {
        Value::Str(s) => Ok(Value::Bool(s.trim().parse::<i64>().is_ok())),
        _ => Err(LocksError::type_err("Argument for 'isinteger' must be of type String")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_rejects_non_string_non_array() {
        let err = len(Value::Nil).unwrap_err();
        assert!(matches!(err, LocksError::Type { .. }));
    }

    #[test]
    fn int_parses_strings_and_rejects_garbage() {
        assert!(matches!(int(Value::Str("42".into())).unwrap(), Value::Number(Number::Int(42))));
        let err = int(Value::Str("nope".into())).unwrap_err();
        assert!(matches!(err, LocksError::Value { .. }));
    }

    #[test]
    fn int_converts_bools_to_zero_or_one() {
        assert!(matches!(int(Value::Bool(true)).unwrap(), Value::Number(Number::Int(1))));
        assert!(matches!(int(Value::Bool(false)).unwrap(), Value::Number(Number::Int(0))));
    }

    #[test]
    fn int_rejects_other_types_with_a_value_error() {
        let err = int(Value::Nil).unwrap_err();
        assert!(matches!(err, LocksError::Value { .. }));
    }

    #[test]
    fn isinteger_requires_a_string_argument() {
        assert!(isinteger(Value::int(3)).is_err());
        assert_eq!(isinteger(Value::Str("3".into())).unwrap().is_truthy(), true);
        assert_eq!(isinteger(Value::Str("3.5".into())).unwrap().is_truthy(), false);
    }

    #[test]
    fn str_keeps_quotes_on_string_values() {
        let Value::Str(rendered) = str_(Value::Str("hi".into())).unwrap() else { panic!() };
        assert_eq!(rendered, "\"hi\"");
    }
}
