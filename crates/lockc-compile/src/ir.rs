//! The textual intermediate representation emitted by the compiler and
//! consumed by the assembler. One line per directive or instruction,
//! `.label` lines mark jump targets, blank lines and indentation are
//! cosmetic only.

use std::fmt;

/// A constant pool entry as it appears in the textual IR: `i <int>`,
/// `d <float>` or `s "<text>"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Double(String),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "i {i}"),
            Constant::Double(text) => write!(f, "d {text}"),
            Constant::Str(s) => write!(f, "s \"{s}\""),
        }
    }
}

/// One emitted function body: its parameter count and the ordered lines of
/// its textual bytecode (instructions and `.label` markers), not yet
/// resolved to addresses — that's the assembler's job.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub argc: usize,
    pub lines: Vec<String>,
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fn {}", self.name)?;
        writeln!(f, "argc {}", self.argc)?;
        for line in &self.lines {
            if line.starts_with('.') {
                writeln!(f, "{line}")?;
            } else {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

/// A complete compiled module: constant pool plus one function per
/// declared `fun`, always including `main`.
#[derive(Debug, Clone)]
pub struct IrModule {
    pub constants: Vec<Constant>,
    pub functions: Vec<IrFunction>,
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cpc {}", self.constants.len())?;
        for c in &self.constants {
            writeln!(f, "{c}")?;
        }
        writeln!(f)?;
        for func in &self.functions {
            writeln!(f, "{func}")?;
        }
        Ok(())
    }
}
