//! Two-pass textual-IR-to-binary assembler.
//!
//! Pass one walks each function's lines to resolve `.label` markers to
//! byte offsets within that function's own code stream (labels never
//! cross function boundaries — every jump target lives in the same
//! function as its jump). Pass two emits the actual instruction bytes,
//! resolving variable names to per-scope slot indices and function names
//! to function-pool indices along the way.

use crate::encoding::{encode_double_literal, encode_integer, TAG_DOUBLE, TAG_INTEGER, TAG_STRING};
use crate::opcode::{mnemonic_to_byte, size_of, MAGIC};
use lockc_compile::{Constant, IrFunction, IrModule};
use lockc_util::{FxHashMap, LocksError, LocksResult};

pub fn assemble(module: &IrModule) -> LocksResult<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);

    out.push(((module.constants.len() >> 8) & 0xff) as u8);
    out.push((module.constants.len() & 0xff) as u8);
    for c in &module.constants {
        encode_constant(&mut out, c)?;
    }

    let fn_index: FxHashMap<String, u16> =
        module.functions.iter().enumerate().map(|(i, f)| (f.name.clone(), i as u16)).collect();

    out.push(((module.functions.len() >> 8) & 0xff) as u8);
    out.push((module.functions.len() & 0xff) as u8);

    let mut global_vars: FxHashMap<String, u16> = FxHashMap::default();
    for func in &module.functions {
        assemble_function(&mut out, func, &fn_index, &mut global_vars)?;
    }

    Ok(out)
}

fn encode_constant(out: &mut Vec<u8>, c: &Constant) -> LocksResult<()> {
    match c {
        Constant::Int(i) => {
            out.push(TAG_INTEGER);
            out.extend_from_slice(&encode_integer(*i));
        }
        Constant::Double(text) => {
            out.push(TAG_DOUBLE);
            out.extend_from_slice(&encode_double_literal(text)?);
        }
        Constant::Str(s) => {
            out.push(TAG_STRING);
            out.extend_from_slice(s.as_bytes());
            out.push(0x00);
        }
    }
    Ok(())
}

fn resolve_labels(func: &IrFunction) -> LocksResult<FxHashMap<String, u16>> {
    let mut labels = FxHashMap::default();
    let mut offset: u32 = 0;
    for line in &func.lines {
        if let Some(label) = line.strip_prefix('.') {
            labels.insert(label.to_string(), offset as u16);
            continue;
        }
        let mnemonic = line.split(' ').next().unwrap_or(line);
        let size = size_of(mnemonic)
            .ok_or_else(|| LocksError::invalid_bytecode(format!("unknown instruction '{mnemonic}'")))?;
        offset += size as u32;
    }
    Ok(labels)
}

fn slot(vars: &mut FxHashMap<String, u16>, name: &str) -> u16 {
    if let Some(&idx) = vars.get(name) {
        idx
    } else {
        let idx = vars.len() as u16;
        vars.insert(name.to_string(), idx);
        idx
    }
}

fn assemble_function(
    out: &mut Vec<u8>,
    func: &IrFunction,
    fn_index: &FxHashMap<String, u16>,
    global_vars: &mut FxHashMap<String, u16>,
) -> LocksResult<()> {
    let labels = resolve_labels(func)?;
    let mut local_vars: FxHashMap<String, u16> = FxHashMap::default();
    let mut code: Vec<u8> = Vec::new();

    for line in &func.lines {
        if line.starts_with('.') {
            continue;
        }
        let mut parts = line.splitn(2, ' ');
        let mnemonic = parts.next().unwrap_or(line);
        let operand = parts.next();
        let byte = mnemonic_to_byte(mnemonic)
            .ok_or_else(|| LocksError::invalid_bytecode(format!("unknown instruction '{mnemonic}'")))?;
        code.push(byte);

        match mnemonic {
            "GOTO" | "POP_JMP_IF_TRUE" | "POP_JMP_IF_FALSE" => {
                let label = operand.unwrap_or_default();
                let target = *labels
                    .get(label)
                    .ok_or_else(|| LocksError::invalid_bytecode(format!("undefined label '{label}'")))?;
                code.push(((target >> 8) & 0xff) as u8);
                code.push((target & 0xff) as u8);
            }
            "CALL_FUNCTION" => {
                let name = operand.unwrap_or_default();
                let idx = *fn_index
                    .get(name)
                    .ok_or_else(|| LocksError::invalid_bytecode(format!("undefined function '{name}'")))?;
                code.push(idx as u8);
            }
            "STORE_LOCAL" | "LOAD_LOCAL" => {
                code.push(slot(&mut local_vars, operand.unwrap_or_default()) as u8);
            }
            "STORE_GLOBAL" | "LOAD_GLOBAL" => {
                code.push(slot(global_vars, operand.unwrap_or_default()) as u8);
            }
            "LOAD_CONST" | "BUILD_LIST" => {
                let n: u16 = operand
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| LocksError::invalid_bytecode(format!("bad operand for '{mnemonic}'")))?;
                code.push(((n >> 8) & 0xff) as u8);
                code.push((n & 0xff) as u8);
            }
            "BIPUSH" | "CALL_NATIVE" => {
                let n: u8 = operand
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| LocksError::invalid_bytecode(format!("bad operand for '{mnemonic}'")))?;
                code.push(n);
            }
            _ => {}
        }
    }

    out.push(((func.argc >> 8) & 0xff) as u8);
    out.push((func.argc & 0xff) as u8);
    out.push(((code.len() >> 8) & 0xff) as u8);
    out.push((code.len() & 0xff) as u8);
    out.extend_from_slice(&code);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockc_compile::ir::{Constant, IrFunction, IrModule};

    fn sample_module() -> IrModule {
        IrModule {
            constants: vec![Constant::Str("hi".to_string())],
            functions: vec![IrFunction {
                name: "main".to_string(),
                argc: 0,
                lines: vec!["LOAD_CONST 0".to_string(), "CALL_NATIVE 1".to_string(), "END".to_string()],
            }],
        }
    }

    #[test]
    fn output_starts_with_magic_number() {
        let bytes = assemble(&sample_module()).unwrap();
        assert_eq!(&bytes[0..4], &MAGIC);
    }

    #[test]
    fn undefined_label_is_an_assembler_error() {
        let mut module = sample_module();
        module.functions[0].lines.push("GOTO nowhere".to_string());
        assert!(assemble(&module).is_err());
    }

    #[test]
    fn globals_get_consistent_indices_across_functions() {
        let module = IrModule {
            constants: vec![],
            functions: vec![
                IrFunction { name: "main".to_string(), argc: 0, lines: vec!["STORE_GLOBAL x".to_string(), "END".to_string()] },
                IrFunction {
                    name: "f".to_string(),
                    argc: 0,
                    lines: vec!["LOAD_GLOBAL x".to_string(), "RETURN_VALUE".to_string()],
                },
            ],
        };
        assert!(assemble(&module).is_ok());
    }
}
