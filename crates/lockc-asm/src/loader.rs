//! Decodes a binary image back into a [`CodeObject`] the VM can execute.

use crate::code::{CodeObject, ConstantValue, FuncInfo};
use crate::encoding::{decode_double, decode_integer, TAG_DOUBLE, TAG_INTEGER, TAG_STRING};
use crate::opcode::MAGIC;
use lockc_util::{LocksError, LocksResult};

pub fn load(bytes: &[u8]) -> LocksResult<CodeObject> {
    let mut cursor = Cursor { bytes, pos: 0 };
    cursor.expect_magic()?;

    let mut code = CodeObject::new();
    let cp_count = cursor.u16()?;
    for _ in 0..cp_count {
        code.constants.push(cursor.constant()?);
    }

    let fp_count = cursor.u16()?;
    for _ in 0..fp_count {
        code.functions.push(cursor.function()?);
    }

    Ok(code)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn expect_magic(&mut self) -> LocksResult<()> {
        if self.bytes.len() < 10 || self.bytes[0..4] != MAGIC {
            return Err(LocksError::invalid_bytecode("missing or corrupt magic number"));
        }
        self.pos = 4;
        Ok(())
    }

    fn u8(&mut self) -> LocksResult<u8> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| LocksError::invalid_bytecode("unexpected end of image"))?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> LocksResult<u16> {
        let hi = self.u8()? as u16;
        let lo = self.u8()? as u16;
        Ok((hi << 8) | lo)
    }

    fn bytes(&mut self, n: usize) -> LocksResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(LocksError::invalid_bytecode("unexpected end of image"));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn constant(&mut self) -> LocksResult<ConstantValue> {
        let tag = self.u8()?;
        match tag {
            TAG_INTEGER => Ok(ConstantValue::Int(decode_integer(self.bytes(8)?))),
            TAG_DOUBLE => Ok(ConstantValue::Double(decode_double(self.bytes(8)?))),
            TAG_STRING => {
                let mut raw = Vec::new();
                loop {
                    let b = self.u8()?;
                    if b == 0x00 {
                        break;
                    }
                    raw.push(b);
                }
                String::from_utf8(raw)
                    .map(ConstantValue::Str)
                    .map_err(|_| LocksError::invalid_bytecode("string constant is not valid UTF-8"))
            }
            other => Err(LocksError::invalid_bytecode(format!("unknown constant tag {other:#x}"))),
        }
    }

    fn function(&mut self) -> LocksResult<FuncInfo> {
        let argc = self.u16()?;
        let code_len = self.u16()? as usize;
        let code = self.bytes(code_len)?.to_vec();
        Ok(FuncInfo { argc, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use lockc_compile::ir::{Constant, IrFunction, IrModule};

    #[test]
    fn round_trips_a_minimal_module() {
        let module = IrModule {
            constants: vec![Constant::Int(42), Constant::Str("hi".to_string())],
            functions: vec![IrFunction {
                name: "main".to_string(),
                argc: 0,
                lines: vec!["LOAD_CONST 0".to_string(), "END".to_string()],
            }],
        };
        let bytes = assemble(&module).unwrap();
        let loaded = load(&bytes).unwrap();
        assert_eq!(loaded.constants.len(), 2);
        assert_eq!(loaded.constants[0], ConstantValue::Int(42));
        assert_eq!(loaded.constants[1], ConstantValue::Str("hi".to_string()));
        assert_eq!(loaded.functions.len(), 1);
    }

    #[test]
    fn rejects_images_with_bad_magic() {
        let err = load(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, LocksError::InvalidBytecode { .. }));
    }
}
