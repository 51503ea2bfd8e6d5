//! Lowers an analyzed Locks AST into the textual bytecode IR the assembler
//! turns into a binary image.

pub mod compiler;
pub mod ir;

pub use compiler::compile;
pub use ir::{Constant, IrFunction, IrModule};
