//! Renders a loaded [`CodeObject`] back to a readable textual form. This
//! is a read-only, human-facing view — it doesn't reconstruct the
//! original variable/label names, since those never survive assembly.

use crate::code::{CodeObject, ConstantValue};
use crate::opcode::byte_to_mnemonic;
use std::fmt::Write as _;

pub fn disassemble(code: &CodeObject) -> String {
    let mut out = String::new();

    writeln!(out, "constants ({}):", code.constants.len()).unwrap();
    for (i, c) in code.constants.iter().enumerate() {
        let rendered = match c {
            ConstantValue::Int(v) => format!("i {v}"),
            ConstantValue::Double(v) => format!("d {v}"),
            ConstantValue::Str(v) => format!("s \"{v}\""),
        };
        writeln!(out, "  [{i}] {rendered}").unwrap();
    }

    writeln!(out).unwrap();
    for (i, func) in code.functions.iter().enumerate() {
        writeln!(out, "function {i} (argc {}):", func.argc).unwrap();
        disassemble_function(&mut out, &func.code);
        writeln!(out).unwrap();
    }

    out
}

fn disassemble_function(out: &mut String, code: &[u8]) {
    let mut ip = 0usize;
    while ip < code.len() {
        let byte = code[ip];
        let Some(mnemonic) = byte_to_mnemonic(byte) else {
            writeln!(out, "  {ip:04} <unknown opcode {byte:#04x}>").unwrap();
            ip += 1;
            continue;
        };
        match mnemonic {
            "LOAD_CONST" | "BUILD_LIST" | "GOTO" | "POP_JMP_IF_TRUE" | "POP_JMP_IF_FALSE" => {
                let arg = ((code[ip + 1] as u16) << 8) | code[ip + 2] as u16;
                writeln!(out, "  {ip:04} {mnemonic} {arg}").unwrap();
                ip += 3;
            }
            "STORE_LOCAL" | "LOAD_LOCAL" | "STORE_GLOBAL" | "LOAD_GLOBAL" | "BIPUSH" | "CALL_FUNCTION" | "CALL_NATIVE" => {
                writeln!(out, "  {ip:04} {mnemonic} {}", code[ip + 1]).unwrap();
                ip += 2;
            }
            _ => {
                writeln!(out, "  {ip:04} {mnemonic}").unwrap();
                ip += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::FuncInfo;

    #[test]
    fn disassembles_a_simple_function() {
        let code = CodeObject {
            constants: vec![ConstantValue::Int(1)],
            functions: vec![FuncInfo { argc: 0, code: vec![0x64, 0x00, 0x00, 0xff] }],
        };
        let text = disassemble(&code);
        assert!(text.contains("LOAD_CONST 0"));
        assert!(text.contains("END"));
    }
}
